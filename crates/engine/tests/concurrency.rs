use std::{collections::HashMap, sync::Arc, time::Duration};

use engine::{Amount, BookKind, EngineError, JoinCmd, Page, RecordTransferCmd};
use sea_orm::{ConnectionTrait, Statement, TransactionTrait};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::task::JoinSet;
use uuid::Uuid;

mod common;

use common::{ALICE, BOB, balances, engine_with_file_db, new_book};

const PLAYERS: usize = 5;
const TRANSFERS: usize = 60;

/// Scorebook with `PLAYERS` members; returns `(user_id, member_id)` pairs.
async fn table(engine: &engine::Engine) -> (Uuid, Vec<(String, Uuid)>) {
    let (book, owner) = new_book(engine, ALICE, BookKind::Scorebook).await;
    let mut players = vec![(ALICE.to_string(), owner.id)];
    for n in 1..PLAYERS {
        let user_id = format!("player-{n}");
        let member = engine
            .join_book(JoinCmd::new(book.id, user_id.as_str()))
            .await
            .unwrap()
            .member;
        players.push((user_id, member.id));
    }
    (book.id, players)
}

fn random_plan(rng: &mut StdRng) -> Vec<(usize, usize, Amount)> {
    (0..TRANSFERS)
        .map(|_| {
            let from = rng.random_range(0..PLAYERS);
            let to = (from + rng.random_range(1..PLAYERS)) % PLAYERS;
            (from, to, Amount::new(rng.random_range(1..=5_000)))
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_match_sequential_oracle() {
    let (engine, _db, _dir) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let (book_id, players) = table(&engine).await;
    let plan = random_plan(&mut StdRng::seed_from_u64(0x7a11));

    let mut oracle: HashMap<Uuid, Amount> = players.iter().map(|(_, id)| (*id, Amount::ZERO)).collect();
    for (from, to, amount) in &plan {
        *oracle.entry(players[*from].1).or_default() -= *amount;
        *oracle.entry(players[*to].1).or_default() += *amount;
    }

    let mut tasks = JoinSet::new();
    for (from, to, amount) in plan {
        let engine = Arc::clone(&engine);
        let user_id = players[from].0.clone();
        let to_member = players[to].1;
        tasks.spawn(async move {
            engine
                .record_transfer(RecordTransferCmd::new(book_id, user_id, to_member, amount))
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let actual: HashMap<Uuid, Amount> = balances(&engine, book_id, ALICE).await.into_iter().collect();
    assert_eq!(actual, oracle);
    assert_eq!(actual.values().copied().sum::<Amount>(), Amount::ZERO);

    let log = engine
        .list_transfers(book_id, ALICE, Page::new(Some(200), None))
        .await
        .unwrap();
    assert_eq!(log.len(), TRANSFERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn end_racing_transfers_keeps_committed_work_only() {
    let (engine, _db, _dir) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let (book_id, players) = table(&engine).await;
    let plan = random_plan(&mut StdRng::seed_from_u64(0xe0d));

    let mut tasks = JoinSet::new();
    for (index, (from, to, amount)) in plan.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        let user_id = players[from].0.clone();
        let from_member = players[from].1;
        let to_member = players[to].1;
        tasks.spawn(async move {
            if index == TRANSFERS / 2 {
                engine.end_book(book_id, ALICE).await.map(|_| None)
            } else {
                engine
                    .record_transfer(RecordTransferCmd::new(book_id, user_id, to_member, amount))
                    .await
                    .map(|_| Some((from_member, to_member, amount)))
            }
        });
    }

    let mut oracle: HashMap<Uuid, Amount> = players.iter().map(|(_, id)| (*id, Amount::ZERO)).collect();
    let mut committed = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(Some((from, to, amount))) => {
                committed += 1;
                *oracle.entry(from).or_default() -= amount;
                *oracle.entry(to).or_default() += amount;
            }
            Ok(None) => {}
            Err(err) => assert!(matches!(err, EngineError::BookEnded(_))),
        }
    }

    let actual: HashMap<Uuid, Amount> = balances(&engine, book_id, ALICE).await.into_iter().collect();
    assert_eq!(actual, oracle);
    let log = engine
        .list_transfers(book_id, ALICE, Page::new(Some(200), None))
        .await
        .unwrap();
    assert_eq!(log.len(), committed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_create_one_member() {
    let (engine, _db, _dir) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let (book, _) = new_book(&engine, ALICE, BookKind::Scorebook).await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { engine.join_book(JoinCmd::new(book.id, "zoe")).await });
    }
    let mut joined = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap().unwrap().joined {
            joined += 1;
        }
    }

    assert_eq!(joined, 1);
    assert_eq!(balances(&engine, book.id, ALICE).await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn locked_book_does_not_block_reads_of_other_books() {
    let (engine, db, _dir) = engine_with_file_db().await;
    let (locked, _) = new_book(&engine, ALICE, BookKind::Scorebook).await;
    let (other, _) = new_book(&engine, BOB, BookKind::Scorebook).await;

    // Hold the same write lock a mutation of `locked` takes.
    let tx = db.begin().await.unwrap();
    tx.execute(Statement::from_sql_and_values(
        tx.get_database_backend(),
        "UPDATE books SET id = id WHERE id = ?",
        vec![locked.id.to_string().into()],
    ))
    .await
    .unwrap();

    let detail = tokio::time::timeout(Duration::from_secs(2), engine.book_detail(other.id, BOB))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.book.id, other.id);
    let listed = tokio::time::timeout(
        Duration::from_secs(2),
        engine.list_books(ALICE, None, Page::default()),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(listed.len(), 1);

    tx.rollback().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transfers_on_different_books_all_commit() {
    let (engine, _db, _dir) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let (first, first_players) = table(&engine).await;
    let (second, second_players) = table(&engine).await;

    let mut tasks = JoinSet::new();
    for (book_id, players) in [(first, first_players), (second, second_players)] {
        for (from, to, amount) in random_plan(&mut StdRng::seed_from_u64(0xb00c)) {
            let engine = Arc::clone(&engine);
            let user_id = players[from].0.clone();
            let to_member = players[to].1;
            tasks.spawn(async move {
                engine
                    .record_transfer(RecordTransferCmd::new(book_id, user_id, to_member, amount))
                    .await
            });
        }
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    for book_id in [first, second] {
        let total: Amount = balances(&engine, book_id, ALICE)
            .await
            .into_iter()
            .map(|(_, balance)| balance)
            .sum();
        assert_eq!(total, Amount::ZERO);
        let log = engine
            .list_transfers(book_id, ALICE, Page::new(Some(200), None))
            .await
            .unwrap();
        assert_eq!(log.len(), TRANSFERS);
    }
}
