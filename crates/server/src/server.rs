use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{books, invites, members, realtime::Hub, transfers, user, ws};
use engine::Engine;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub hub: Arc<Hub>,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, hub: Arc<Hub>) -> Self {
        Self { engine, hub }
    }
}

/// Account id of the caller, set by the upstream authenticator.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);

/// `TypedHeader` for the trusted user id header
///
/// Authenticated requests must contain a non-empty "x-user-id" entry.
#[derive(Debug)]
struct UserIdHeader(String);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

async fn auth(
    user_header: Result<TypedHeader<UserIdHeader>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Ok(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let authenticated = Router::new()
        .route("/books", post(books::create).get(books::list))
        .route(
            "/books/{book_id}",
            get(books::detail)
                .patch(books::update)
                .delete(books::delete),
        )
        .route("/books/{book_id}/end", post(books::end))
        .route("/books/{book_id}/join", post(members::join))
        .route("/books/{book_id}/me", patch(members::update_me))
        .route("/books/{book_id}/members", post(members::add))
        .route(
            "/books/{book_id}/members/{member_id}",
            patch(members::update),
        )
        .route(
            "/books/{book_id}/members/{member_id}/bind",
            post(members::bind),
        )
        .route(
            "/books/{book_id}/transfers",
            get(transfers::list).post(transfers::create),
        )
        .route("/books/{book_id}/records", post(transfers::record))
        .route("/books/{book_id}/ws", get(ws::subscribe))
        .route("/invites/{code}/join", post(invites::join))
        .route("/me/profile", put(user::upsert).get(user::get))
        .route_layer(middleware::from_fn(auth));

    Router::new()
        .route("/invites/{code}", get(invites::preview))
        .merge(authenticated)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
