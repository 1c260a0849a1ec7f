//! Initial schema.
//!
//! - `users`: display profiles keyed by the upstream account id
//! - `books`: scorebooks and ledgers, soft-deleted via `deleted_at`
//! - `members`: participants of a book with their running balance
//! - `transfers`: immutable balance movements between two members
//!
//! Account ids are not foreign keys: identities live upstream and a profile
//! row is optional.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Nickname,
    AvatarUrl,
    CreatedAt,
}

#[derive(Iden)]
enum Books {
    Table,
    Id,
    Kind,
    Name,
    LocationText,
    OwnerUserId,
    Status,
    InviteCode,
    ShareDisabled,
    CreatedAt,
    UpdatedAt,
    EndedAt,
    EndReason,
    DeletedAt,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    BookId,
    UserId,
    Role,
    Nickname,
    AvatarUrl,
    Remark,
    BalanceMinor,
    JoinedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    BookId,
    FromMemberId,
    ToMemberId,
    AmountMinor,
    Note,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Nickname).string().not_null())
                    .col(
                        ColumnDef::new(Users::AvatarUrl)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Books
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Books::Kind).string().not_null())
                    .col(ColumnDef::new(Books::Name).string().not_null())
                    .col(ColumnDef::new(Books::LocationText).string())
                    .col(ColumnDef::new(Books::OwnerUserId).string().not_null())
                    .col(
                        ColumnDef::new(Books::Status)
                            .string()
                            .not_null()
                            .default("recording"),
                    )
                    .col(ColumnDef::new(Books::InviteCode).string().not_null())
                    .col(
                        ColumnDef::new(Books::ShareDisabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Books::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Books::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Books::EndedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Books::EndReason).string())
                    .col(ColumnDef::new(Books::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-books-invite_code-unique")
                    .table(Books::Table)
                    .col(Books::InviteCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-books-status-kind")
                    .table(Books::Table)
                    .col(Books::Status)
                    .col(Books::Kind)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Members::BookId).string().not_null())
                    .col(ColumnDef::new(Members::UserId).string())
                    .col(ColumnDef::new(Members::Role).string().not_null())
                    .col(ColumnDef::new(Members::Nickname).string().not_null())
                    .col(
                        ColumnDef::new(Members::AvatarUrl)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Members::Remark).string())
                    .col(
                        ColumnDef::new(Members::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Members::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Members::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-members-book_id")
                            .from(Members::Table, Members::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // NULL user ids (unlinked ledger members) never collide.
        manager
            .create_index(
                Index::create()
                    .name("idx-members-book_id-user_id-unique")
                    .table(Members::Table)
                    .col(Members::BookId)
                    .col(Members::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-user_id")
                    .table(Members::Table)
                    .col(Members::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::BookId).string().not_null())
                    .col(ColumnDef::new(Transfers::FromMemberId).string().not_null())
                    .col(ColumnDef::new(Transfers::ToMemberId).string().not_null())
                    .col(
                        ColumnDef::new(Transfers::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::Note)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-book_id")
                            .from(Transfers::Table, Transfers::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-from_member_id")
                            .from(Transfers::Table, Transfers::FromMemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-to_member_id")
                            .from(Transfers::Table, Transfers::ToMemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-book_id-created_at")
                    .table(Transfers::Table)
                    .col(Transfers::BookId)
                    .col(Transfers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
