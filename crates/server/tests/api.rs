use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use engine::{
    Engine,
    database::{self, Storage},
};
use server::{ServerState, realtime::Hub, router, sweep::IdleSweep};

struct TestApp {
    router: Router,
    engine: Arc<Engine>,
    hub: Arc<Hub>,
    db: DatabaseConnection,
}

async fn app() -> TestApp {
    let db = database::connect(&Storage::Memory, 1).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(
        Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap(),
    );
    let hub = Arc::new(Hub::new());
    let router = router(ServerState::new(Arc::clone(&engine), Arc::clone(&hub)));
    TestApp {
        router,
        engine,
        hub,
        db,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header("x-user-id", user);
        }
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_book(&self, user: &str, kind: &str) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/books",
                Some(user),
                Some(json!({ "kind": kind, "name": "Game night" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

fn id(value: &Value) -> String {
    value.as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_user_are_unauthorized() {
    let app = app().await;

    let (status, _) = app.call("GET", "/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/books", Some("  "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scorebook_flow_over_http() {
    let app = app().await;
    let created = app.create_book("alice", "scorebook").await;
    let book_id = id(&created["book"]["id"]);
    let owner_id = id(&created["owner"]["id"]);
    let code = id(&created["book"]["invite_code"]);
    assert_eq!(created["owner"]["role"], "owner");
    assert_eq!(created["owner"]["nickname"], "Owner");

    // Invite preview is public.
    let (status, preview) = app
        .call("GET", &format!("/invites/{}", code.to_lowercase()), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["book_id"], book_id.as_str());
    assert_eq!(preview["status"], "recording");

    let (status, joined) = app
        .call(
            "POST",
            &format!("/invites/{code}/join"),
            Some("bob"),
            Some(json!({ "nickname": "Bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["joined"], true);

    let (status, transfer) = app
        .call(
            "POST",
            &format!("/books/{book_id}/transfers"),
            Some("bob"),
            Some(json!({ "to_member_id": owner_id, "amount": 10.5, "note": "river" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transfer["amount"], 10.5);

    let (status, list) = app
        .call("GET", &format!("/books/{book_id}/transfers?limit=10"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["transfers"].as_array().unwrap().len(), 1);
    assert_eq!(list["transfers"][0]["note"], "river");

    let (status, books) = app
        .call("GET", "/books?kind=scorebook", Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books["books"][0]["member_count"], 2);
    assert_eq!(books["books"][0]["transfer_count"], 1);
    assert_eq!(books["books"][0]["my_role"], "member");

    let (status, ended) = app
        .call("POST", &format!("/books/{book_id}/end"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["book"]["status"], "ended");
    assert_eq!(ended["book"]["auto_ended"], false);
    assert_eq!(ended["winners"][0]["id"], owner_id.as_str());
    assert_eq!(ended["winners"][0]["balance"], 10.5);

    let (status, _) = app
        .call("DELETE", &format!("/books/{book_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .call("GET", &format!("/invites/{code}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn engine_errors_map_to_status_codes() {
    let app = app().await;
    let created = app.create_book("alice", "scorebook").await;
    let book_id = id(&created["book"]["id"]);
    let owner_id = id(&created["owner"]["id"]);
    app.call("POST", &format!("/books/{book_id}/join"), Some("bob"), Some(json!({})))
        .await;

    let (status, _) = app
        .call(
            "POST",
            &format!("/books/{book_id}/transfers"),
            Some("bob"),
            Some(json!({ "to_member_id": owner_id, "amount": 10.005 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .call("GET", &format!("/books/{book_id}"), Some("mallory"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("GET", &format!("/books/{}", Uuid::new_v4()), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("DELETE", &format!("/books/{book_id}"), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.call("POST", &format!("/books/{book_id}/end"), Some("alice"), None)
        .await;
    let (status, _) = app
        .call(
            "POST",
            &format!("/books/{book_id}/transfers"),
            Some("bob"),
            Some(json!({ "to_member_id": owner_id, "amount": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn ledger_events_hide_notes_and_remarks() {
    let app = app().await;
    let created = app.create_book("alice", "ledger").await;
    let book_id = id(&created["book"]["id"]);
    let room = Uuid::parse_str(&book_id).unwrap();

    let (status, member) = app
        .call(
            "POST",
            &format!("/books/{book_id}/members"),
            Some("alice"),
            Some(json!({ "nickname": "Bob", "remark": "cousin" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let member_id = id(&member["id"]);

    let (status, bound) = app
        .call(
            "POST",
            &format!("/books/{book_id}/members/{member_id}/bind"),
            Some("bob"),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bound["user_id"], "bob");
    assert!(bound["remark"].is_null());

    let mut subscription = app.hub.join(room);
    let (status, record) = app
        .call(
            "POST",
            &format!("/books/{book_id}/records"),
            Some("alice"),
            Some(json!({
                "member_id": member_id,
                "kind": "expense",
                "amount": 42,
                "note": "concert tickets",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["note"], "concert tickets");
    assert_eq!(record["from_member_id"], member_id.as_str());

    let frame = subscription.recv().await.unwrap();
    let event: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(event["type"], "record.created");
    assert_eq!(event["data"]["record"]["note"], "");
    assert_eq!(event["data"]["record"]["amount"], 42.0);

    let (status, update) = app
        .call(
            "PATCH",
            &format!("/books/{book_id}/members/{member_id}"),
            Some("alice"),
            Some(json!({ "remark": "favourite cousin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(update["remark_event"]["amount"], 0.0);
    let frame = subscription.recv().await.unwrap();
    let event: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(event["type"], "member.updated");
    assert!(event["data"]["member"].get("remark").is_none());
    // The zero-amount remark record stays out of the room.
    let quiet = tokio::time::timeout(Duration::from_millis(100), subscription.recv()).await;
    assert!(quiet.is_err());

    let (status, detail) = app
        .call("GET", &format!("/books/{book_id}"), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail["me"]["remark"].is_null());

    let (status, list) = app
        .call("GET", &format!("/books/{book_id}/transfers"), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["transfers"].as_array().unwrap().len(), 1);
    assert_eq!(list["transfers"][0]["note"], "");
}

#[tokio::test]
async fn profile_round_trip() {
    let app = app().await;

    let (status, _) = app.call("GET", "/me/profile", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, profile) = app
        .call(
            "PUT",
            "/me/profile",
            Some("alice"),
            Some(json!({ "nickname": "Alice" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["nickname"], "Alice");

    let created = app.create_book("alice", "scorebook").await;
    assert_eq!(created["owner"]["nickname"], "Alice");
}

async fn backdate(db: &DatabaseConnection, book_id: &str, days: i64) {
    let at = Utc::now() - chrono::Duration::days(days);
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE books SET created_at = ? WHERE id = ?",
        vec![at.into(), book_id.into()],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn sweep_broadcasts_auto_ended_books_once() {
    let app = app().await;
    let created = app.create_book("alice", "scorebook").await;
    let book_id = id(&created["book"]["id"]);
    backdate(&app.db, &book_id, 10).await;

    let mut subscription = app.hub.join(Uuid::parse_str(&book_id).unwrap());
    let sweep = IdleSweep::new(Arc::clone(&app.engine), Arc::clone(&app.hub));

    assert_eq!(sweep.run_once().await, 1);
    let event: Value = serde_json::from_str(&subscription.recv().await.unwrap()).unwrap();
    assert_eq!(event["type"], "book.ended");
    assert_eq!(event["data"]["autoEnded"], true);

    assert_eq!(sweep.run_once().await, 0);

    let (_, detail) = app
        .call("GET", &format!("/books/{book_id}"), Some("alice"), None)
        .await;
    assert_eq!(detail["book"]["auto_ended"], true);
}

#[tokio::test]
async fn sweep_task_stops_on_cancel() {
    let app = app().await;
    let created = app.create_book("alice", "scorebook").await;
    let book_id = id(&created["book"]["id"]);
    backdate(&app.db, &book_id, 10).await;
    let mut subscription = app.hub.join(Uuid::parse_str(&book_id).unwrap());

    let shutdown = CancellationToken::new();
    let sweep = IdleSweep::new(Arc::clone(&app.engine), Arc::clone(&app.hub))
        .interval(Duration::from_secs(3600))
        .timeout(Duration::from_secs(5));
    let handle = tokio::spawn(sweep.run(shutdown.clone()));

    // The first run happens immediately.
    let frame = tokio::time::timeout(Duration::from_secs(5), subscription.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(frame.contains("book.ended"));

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
