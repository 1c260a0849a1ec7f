#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

use engine::{
    Amount, Book, BookKind, CreateBookCmd, Engine, InviteCodes, JoinCmd, Member,
    database::{self, Storage},
};
use migration::MigratorTrait;
use tempfile::TempDir;
use uuid::Uuid;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CAROL: &str = "carol";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_with(&Storage::Memory, None).await
}

pub async fn engine_with_codes(codes: Arc<dyn InviteCodes>) -> (Engine, DatabaseConnection) {
    engine_with(&Storage::Memory, Some(codes)).await
}

/// Engine over a WAL database file with a multi-connection pool. Keep the
/// `TempDir` alive for the duration of the test.
pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::File(dir.path().join("tally.db"));
    let (engine, db) = engine_with(&storage, None).await;
    (engine, db, dir)
}

async fn engine_with(
    storage: &Storage,
    codes: Option<Arc<dyn InviteCodes>>,
) -> (Engine, DatabaseConnection) {
    let db = database::connect(storage, 8).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for (id, nickname) in [(ALICE, "Alice"), (BOB, "Bob"), (CAROL, "Carol")] {
        add_user(&db, id, nickname).await;
    }
    let mut builder = Engine::builder().database(db.clone());
    if let Some(codes) = codes {
        builder = builder.invite_codes(codes);
    }
    let engine = builder.build().await.unwrap();
    (engine, db)
}

pub async fn add_user(db: &DatabaseConnection, id: &str, nickname: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (id, nickname, avatar_url, created_at) VALUES (?, ?, ?, ?)",
        vec![
            id.into(),
            nickname.into(),
            format!("https://avatars.test/{id}.png").into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

pub fn amount(value: &str) -> Amount {
    value.parse().unwrap()
}

pub async fn new_book(engine: &Engine, owner: &str, kind: BookKind) -> (Book, Member) {
    engine
        .create_book(CreateBookCmd::new(owner, kind, "Friday night"))
        .await
        .unwrap()
}

/// Scorebook owned by alice that bob and carol joined.
pub async fn scorebook_with_players(engine: &Engine) -> (Book, Member, Member, Member) {
    let (book, alice) = new_book(engine, ALICE, BookKind::Scorebook).await;
    let bob = engine
        .join_book(JoinCmd::new(book.id, BOB))
        .await
        .unwrap()
        .member;
    let carol = engine
        .join_book(JoinCmd::new(book.id, CAROL))
        .await
        .unwrap()
        .member;
    (book, alice, bob, carol)
}

pub async fn balances(engine: &Engine, book_id: Uuid, viewer: &str) -> Vec<(Uuid, Amount)> {
    engine
        .book_detail(book_id, viewer)
        .await
        .unwrap()
        .members
        .iter()
        .map(|m| (m.id, m.balance))
        .collect()
}

pub async fn balance_of(engine: &Engine, book_id: Uuid, viewer: &str, member_id: Uuid) -> Amount {
    balances(engine, book_id, viewer)
        .await
        .into_iter()
        .find_map(|(id, balance)| (id == member_id).then_some(balance))
        .unwrap()
}

pub async fn backdate_book(db: &DatabaseConnection, book_id: Uuid, at: DateTime<Utc>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE books SET created_at = ?, updated_at = ? WHERE id = ?",
        vec![at.into(), at.into(), book_id.to_string().into()],
    ))
    .await
    .unwrap();
}

pub async fn backdate_transfers(db: &DatabaseConnection, book_id: Uuid, at: DateTime<Utc>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE transfers SET created_at = ? WHERE book_id = ?",
        vec![at.into(), book_id.to_string().into()],
    ))
    .await
    .unwrap();
}

/// Invite codes handed out in order, repeating the last one forever.
#[derive(Debug)]
pub struct ScriptedCodes {
    codes: Vec<&'static str>,
    next: std::sync::atomic::AtomicUsize,
}

impl ScriptedCodes {
    pub fn new(codes: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            codes,
            next: std::sync::atomic::AtomicUsize::new(0),
        })
    }
}

impl InviteCodes for ScriptedCodes {
    fn generate(&self) -> String {
        let index = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            .min(self.codes.len() - 1);
        self.codes[index].to_string()
    }
}
