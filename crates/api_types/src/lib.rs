use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod book {
    use super::*;
    use crate::member::MemberView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BookKind {
        Scorebook,
        Ledger,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BookStatus {
        Recording,
        Ended,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookNew {
        pub kind: BookKind,
        pub name: String,
        pub location_text: Option<String>,
        /// Owner nickname; defaults to the caller's profile.
        pub nickname: Option<String>,
        pub avatar_url: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookUpdate {
        pub name: Option<String>,
        /// Ledgers only.
        pub share_disabled: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookListQuery {
        pub kind: Option<BookKind>,
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookView {
        pub id: Uuid,
        pub kind: BookKind,
        pub name: String,
        pub location_text: Option<String>,
        pub owner_user_id: String,
        pub status: BookStatus,
        pub invite_code: String,
        pub share_disabled: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub ended_at: Option<DateTime<Utc>>,
        /// True when the idle sweep ended the book.
        pub auto_ended: bool,
    }

    /// Response of `POST /books`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookCreated {
        pub book: BookView,
        pub owner: MemberView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookSummaryView {
        pub book: BookView,
        pub member_count: u64,
        pub transfer_count: u64,
        pub my_member_id: Uuid,
        pub my_role: crate::member::MemberRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookListResponse {
        pub books: Vec<BookSummaryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookDetailView {
        pub book: BookView,
        pub me: MemberView,
        pub members: Vec<MemberView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookEndedView {
        pub book: BookView,
        pub winners: Vec<MemberView>,
    }
}

pub mod member {
    use super::*;
    use crate::transfer::TransferView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Owner,
        Member,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: Uuid,
        pub book_id: Uuid,
        /// `None` for unlinked ledger members.
        pub user_id: Option<String>,
        pub role: MemberRole,
        pub nickname: String,
        pub avatar_url: String,
        /// Only visible to the ledger owner.
        pub remark: Option<String>,
        pub balance: f64,
        pub joined_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct JoinRequest {
        pub nickname: Option<String>,
        pub avatar_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinResponse {
        pub member: MemberView,
        /// False when the caller already was a member.
        pub joined: bool,
    }

    /// Owner adds an unlinked ledger member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub nickname: String,
        pub avatar_url: Option<String>,
        pub remark: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MemberUpdate {
        pub nickname: Option<String>,
        pub avatar_url: Option<String>,
        /// Owner only. An empty string clears the remark.
        pub remark: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpdateResponse {
        pub member: MemberView,
        pub remark_event: Option<TransferView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BindRequest {
        pub nickname: Option<String>,
        pub avatar_url: Option<String>,
    }

    /// Self-service nickname/avatar change inside one book.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MyMemberUpdate {
        pub nickname: Option<String>,
        pub avatar_url: Option<String>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub nickname: String,
        pub avatar_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileView {
        pub user_id: String,
        pub nickname: String,
        pub avatar_url: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecordKind {
        Income,
        Expense,
    }

    /// Scorebook transfer from the caller's member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub to_member_id: Uuid,
        /// Decimal with at most two fraction digits.
        pub amount: f64,
        pub note: Option<String>,
    }

    /// Ledger record between the owner and `member_id`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerRecordNew {
        pub member_id: Uuid,
        pub kind: RecordKind,
        pub amount: f64,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransferListQuery {
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        pub book_id: Uuid,
        pub from_member_id: Uuid,
        pub to_member_id: Uuid,
        pub amount: f64,
        pub note: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferListResponse {
        /// Newest first.
        pub transfers: Vec<TransferView>,
    }
}

pub mod invite {
    use super::*;
    use crate::book::{BookKind, BookStatus};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvitePreview {
        pub book_id: Uuid,
        pub kind: BookKind,
        pub name: String,
        pub status: BookStatus,
        pub share_disabled: bool,
        pub updated_at: DateTime<Utc>,
    }
}
