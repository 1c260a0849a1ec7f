//! Conversions from engine results to the wire types in `api_types`.

use api_types::{
    book::{
        BookDetailView, BookEndedView, BookKind as ApiBookKind, BookStatus as ApiBookStatus,
        BookSummaryView, BookView,
    },
    invite::InvitePreview as ApiInvitePreview,
    member::{MemberRole as ApiMemberRole, MemberView},
    transfer::{RecordKind as ApiRecordKind, TransferView},
    user::ProfileView,
};
use engine::{
    Book, BookDetail, BookKind, BookStatus, BookSummary, EndReason, EndedBook, InvitePreview,
    Member, MemberRole, Profile, RecordKind, Transfer,
};

pub(crate) fn map_kind(kind: BookKind) -> ApiBookKind {
    match kind {
        BookKind::Scorebook => ApiBookKind::Scorebook,
        BookKind::Ledger => ApiBookKind::Ledger,
    }
}

pub(crate) fn engine_kind(kind: ApiBookKind) -> BookKind {
    match kind {
        ApiBookKind::Scorebook => BookKind::Scorebook,
        ApiBookKind::Ledger => BookKind::Ledger,
    }
}

pub(crate) fn engine_record_kind(kind: ApiRecordKind) -> RecordKind {
    match kind {
        ApiRecordKind::Income => RecordKind::Income,
        ApiRecordKind::Expense => RecordKind::Expense,
    }
}

fn map_status(status: BookStatus) -> ApiBookStatus {
    match status {
        BookStatus::Recording => ApiBookStatus::Recording,
        BookStatus::Ended => ApiBookStatus::Ended,
    }
}

fn map_role(role: MemberRole) -> ApiMemberRole {
    match role {
        MemberRole::Owner => ApiMemberRole::Owner,
        MemberRole::Member => ApiMemberRole::Member,
    }
}

pub(crate) fn book_view(book: &Book) -> BookView {
    BookView {
        id: book.id,
        kind: map_kind(book.kind),
        name: book.name.clone(),
        location_text: book.location_text.clone(),
        owner_user_id: book.owner_user_id.clone(),
        status: map_status(book.status),
        invite_code: book.invite_code.clone(),
        share_disabled: book.share_disabled,
        created_at: book.created_at,
        updated_at: book.updated_at,
        ended_at: book.ended_at,
        auto_ended: book.end_reason == Some(EndReason::Idle),
    }
}

pub(crate) fn member_view(member: &Member) -> MemberView {
    MemberView {
        id: member.id,
        book_id: member.book_id,
        user_id: member.user_id.clone(),
        role: map_role(member.role),
        nickname: member.nickname.clone(),
        avatar_url: member.avatar_url.clone(),
        remark: member.remark.clone(),
        balance: member.balance.as_f64(),
        joined_at: member.joined_at,
        updated_at: member.updated_at,
    }
}

pub(crate) fn transfer_view(transfer: &Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        book_id: transfer.book_id,
        from_member_id: transfer.from_member_id,
        to_member_id: transfer.to_member_id,
        amount: transfer.amount.as_f64(),
        note: transfer.note.clone(),
        created_at: transfer.created_at,
    }
}

pub(crate) fn summary_view(summary: &BookSummary) -> BookSummaryView {
    BookSummaryView {
        book: book_view(&summary.book),
        member_count: summary.member_count,
        transfer_count: summary.transfer_count,
        my_member_id: summary.my_member_id,
        my_role: map_role(summary.my_role),
    }
}

pub(crate) fn detail_view(detail: &BookDetail) -> BookDetailView {
    BookDetailView {
        book: book_view(&detail.book),
        me: member_view(&detail.me),
        members: detail.members.iter().map(member_view).collect(),
    }
}

pub(crate) fn ended_view(ended: &EndedBook) -> BookEndedView {
    BookEndedView {
        book: book_view(&ended.book),
        winners: ended.winners.iter().map(member_view).collect(),
    }
}

pub(crate) fn invite_view(preview: &InvitePreview) -> ApiInvitePreview {
    ApiInvitePreview {
        book_id: preview.book_id,
        kind: map_kind(preview.kind),
        name: preview.name.clone(),
        status: map_status(preview.status),
        share_disabled: preview.share_disabled,
        updated_at: preview.updated_at,
    }
}

pub(crate) fn profile_view(profile: &Profile) -> ProfileView {
    ProfileView {
        user_id: profile.user_id.clone(),
        nickname: profile.nickname.clone(),
        avatar_url: profile.avatar_url.clone(),
        created_at: profile.created_at,
    }
}
