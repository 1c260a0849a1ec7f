use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    AddMemberCmd, Amount, BindMemberCmd, Book, BookKind, EngineError, JoinCmd, Member, MemberRole,
    ResultEngine, Transfer, UpdateMemberCmd, members,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

const DEFAULT_MEMBER_NICKNAME: &str = "Member";

/// Note recorded when the owner clears a member's remark.
pub(super) const REMARK_CLEARED: &str = "remark cleared";

/// Outcome of a join: `joined` is false when the caller was already a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    pub member: Member,
    pub joined: bool,
}

/// Edited ledger member plus the zero-amount transfer logging a remark change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberUpdate {
    pub member: Member,
    pub remark_event: Option<Transfer>,
}

impl Engine {
    /// The caller's member in a live book. Remarks are blank for non-owners.
    pub async fn membership(&self, book_id: Uuid, user_id: &str) -> ResultEngine<Member> {
        with_tx!(self, |db_tx| {
            let book = self.require_visible_book(&db_tx, book_id).await?;
            let mut member = self.require_member(&db_tx, book_id, user_id).await?;
            if !book.is_owner(user_id) {
                member.remark = None;
            }
            Ok(member)
        })
    }

    /// Self-service join of a scorebook. Idempotent per user.
    pub async fn join_book(&self, cmd: JoinCmd) -> ResultEngine<JoinOutcome> {
        let outcome = self
            .with_book_lock(cmd.book_id, |engine, db_tx, book| {
                Box::pin(async move { engine.join_locked(db_tx, &book, cmd).await })
            })
            .await?;
        if outcome.joined {
            tracing::info!(book_id = %outcome.member.book_id, member_id = %outcome.member.id, "member joined");
        }
        Ok(outcome)
    }

    pub(super) async fn join_locked(
        &self,
        db: &DatabaseTransaction,
        book: &Book,
        cmd: JoinCmd,
    ) -> ResultEngine<JoinOutcome> {
        book.require_kind(BookKind::Scorebook)?;
        if let Some(existing) = self.member_of_user(db, book.id, &cmd.user_id).await? {
            let mut model: members::ActiveModel = (&existing).into();
            model.updated_at = ActiveValue::Set(Utc::now());
            let member = Member::try_from(model.update(db).await?)?;
            return Ok(JoinOutcome {
                member,
                joined: false,
            });
        }
        book.require_recording()?;

        let profile = self.profile(db, &cmd.user_id).await?;
        let nickname = normalize_optional_text(cmd.nickname.as_deref())
            .or_else(|| profile.as_ref().map(|p| p.nickname.clone()))
            .unwrap_or_else(|| DEFAULT_MEMBER_NICKNAME.to_string());
        let avatar_url = normalize_optional_text(cmd.avatar_url.as_deref())
            .or_else(|| profile.map(|p| p.avatar_url))
            .unwrap_or_default();
        let member = Member::new(
            book.id,
            Some(cmd.user_id),
            MemberRole::Member,
            nickname,
            avatar_url,
        );
        members::ActiveModel::from(&member).insert(db).await?;
        self.touch_book(db, book.id).await?;
        Ok(JoinOutcome {
            member,
            joined: true,
        })
    }

    /// A scorebook member edits their own nickname/avatar. Allowed at any status.
    pub async fn update_my_profile(
        &self,
        book_id: Uuid,
        user_id: &str,
        nickname: Option<&str>,
        avatar_url: Option<&str>,
    ) -> ResultEngine<Member> {
        let user_id = user_id.to_string();
        let nickname = normalize_optional_text(nickname);
        let avatar_url = normalize_optional_text(avatar_url);
        self.with_book_lock(book_id, |engine, db_tx, book| {
            Box::pin(async move {
                book.require_kind(BookKind::Scorebook)?;
                let me = engine.require_member(db_tx, book.id, &user_id).await?;
                let mut model: members::ActiveModel = (&me).into();
                if let Some(nickname) = nickname {
                    model.nickname = ActiveValue::Set(nickname);
                }
                if let Some(avatar_url) = avatar_url {
                    model.avatar_url = ActiveValue::Set(avatar_url);
                }
                model.updated_at = ActiveValue::Set(Utc::now());
                let member = Member::try_from(model.update(db_tx).await?)?;
                engine.touch_book(db_tx, book.id).await?;
                Ok(member)
            })
        })
        .await
    }

    /// Owner adds an unlinked ("virtual") member to a recording ledger.
    pub async fn add_member(&self, cmd: AddMemberCmd) -> ResultEngine<Member> {
        let nickname = normalize_required_name(&cmd.nickname, "nickname")?;
        let AddMemberCmd {
            book_id,
            user_id,
            avatar_url,
            remark,
            ..
        } = cmd;
        self.with_book_lock(book_id, |engine, db_tx, book| {
            Box::pin(async move {
                book.require_kind(BookKind::Ledger)?;
                engine.require_owner(db_tx, &book, &user_id).await?;
                book.require_recording()?;
                let mut member = Member::new(
                    book.id,
                    None,
                    MemberRole::Member,
                    nickname,
                    normalize_optional_text(avatar_url.as_deref()).unwrap_or_default(),
                );
                member.remark = normalize_optional_text(remark.as_deref());
                members::ActiveModel::from(&member).insert(db_tx).await?;
                engine.touch_book(db_tx, book.id).await?;
                Ok(member)
            })
        })
        .await
    }

    /// Edit a ledger member.
    ///
    /// The owner may change nickname, avatar and remark of anyone. Other
    /// members may only change their own nickname and avatar. A remark change
    /// is logged as a zero-amount transfer from the owner to the member.
    pub async fn update_member(&self, cmd: UpdateMemberCmd) -> ResultEngine<MemberUpdate> {
        let nickname = cmd
            .nickname
            .as_deref()
            .map(|nickname| normalize_required_name(nickname, "nickname"))
            .transpose()?;
        let UpdateMemberCmd {
            book_id,
            user_id,
            member_id,
            avatar_url,
            remark,
            ..
        } = cmd;
        self.with_book_lock(book_id, |engine, db_tx, book| {
            Box::pin(async move {
                book.require_kind(BookKind::Ledger)?;
                book.require_recording()?;
                let caller = engine.require_member(db_tx, book.id, &user_id).await?;
                let target = engine.require_book_member(db_tx, book.id, member_id).await?;
                let owner_edit = book.is_owner(&user_id);
                if !owner_edit {
                    if !target.belongs_to(&user_id) {
                        return Err(EngineError::Forbidden(
                            "members can only edit themselves".to_string(),
                        ));
                    }
                    if remark.is_some() {
                        return Err(EngineError::Forbidden(
                            "only the owner can set remarks".to_string(),
                        ));
                    }
                }

                let now = Utc::now();
                let mut model: members::ActiveModel = (&target).into();
                if let Some(nickname) = nickname {
                    model.nickname = ActiveValue::Set(nickname);
                }
                if let Some(avatar_url) = normalize_optional_text(avatar_url.as_deref()) {
                    model.avatar_url = ActiveValue::Set(avatar_url);
                }
                let new_remark = remark.as_deref().map(|r| normalize_optional_text(Some(r)));
                let remark_changed = new_remark
                    .as_ref()
                    .is_some_and(|new_remark| *new_remark != target.remark);
                if let Some(new_remark) = new_remark {
                    model.remark = ActiveValue::Set(new_remark);
                }
                model.updated_at = ActiveValue::Set(now);
                let mut member = Member::try_from(model.update(db_tx).await?)?;
                engine.touch_book(db_tx, book.id).await?;

                // The owner's own member has no counterpart to log against.
                let remark_event = if remark_changed && caller.id != member.id {
                    let note = member
                        .remark
                        .clone()
                        .unwrap_or_else(|| REMARK_CLEARED.to_string());
                    let event = engine
                        .insert_transfer(db_tx, &book, &caller, &member, Amount::ZERO, note)
                        .await?;
                    Some(event)
                } else {
                    None
                };
                if !owner_edit {
                    member.remark = None;
                }
                Ok(MemberUpdate {
                    member,
                    remark_event,
                })
            })
        })
        .await
    }

    /// Link the caller's account to an unlinked ledger member.
    pub async fn bind_member(&self, cmd: BindMemberCmd) -> ResultEngine<Member> {
        let BindMemberCmd {
            book_id,
            user_id,
            member_id,
            nickname,
            avatar_url,
        } = cmd;
        let nickname = normalize_optional_text(nickname.as_deref());
        let avatar_url = normalize_optional_text(avatar_url.as_deref());
        let member = self
            .with_book_lock(book_id, |engine, db_tx, book| {
                Box::pin(async move {
                    book.require_kind(BookKind::Ledger)?;
                    book.require_recording()?;
                    if book.share_disabled {
                        return Err(EngineError::Forbidden("share disabled".to_string()));
                    }
                    if engine.member_of_user(db_tx, book.id, &user_id).await?.is_some() {
                        return Err(EngineError::Conflict(
                            "already a member of this book".to_string(),
                        ));
                    }
                    engine.require_book_member(db_tx, book.id, member_id).await?;

                    let mut update = members::Entity::update_many()
                        .col_expr(members::Column::UserId, Expr::value(user_id))
                        .col_expr(members::Column::UpdatedAt, Expr::value(Utc::now()));
                    if let Some(nickname) = nickname {
                        update = update.col_expr(members::Column::Nickname, Expr::value(nickname));
                    }
                    if let Some(avatar_url) = avatar_url {
                        update =
                            update.col_expr(members::Column::AvatarUrl, Expr::value(avatar_url));
                    }
                    let result = update
                        .filter(members::Column::Id.eq(member_id.to_string()))
                        .filter(members::Column::UserId.is_null())
                        .exec(db_tx)
                        .await?;
                    if result.rows_affected == 0 {
                        return Err(EngineError::Conflict(
                            "member is already linked".to_string(),
                        ));
                    }
                    engine.touch_book(db_tx, book.id).await?;
                    let mut member = engine.require_book_member(db_tx, book.id, member_id).await?;
                    member.remark = None;
                    Ok(member)
                })
            })
            .await?;
        tracing::info!(book_id = %book_id, member_id = %member.id, "ledger member bound");
        Ok(member)
    }
}
