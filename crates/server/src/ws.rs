//! WebSocket subscription to a book's realtime room.

use axum::{
    Extension,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use crate::{
    ServerError,
    realtime::Subscription,
    server::{CurrentUser, ServerState},
};

/// Upgrade to a WebSocket streaming the book's events. Members only.
pub async fn subscribe(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ServerError> {
    state.engine.membership(book_id, &user_id).await?;
    let hub = state.hub.clone();
    Ok(upgrade.on_upgrade(move |socket| async move {
        let subscription = hub.join(book_id);
        serve(socket, subscription).await;
    }))
}

async fn serve(socket: WebSocket, mut subscription: Subscription) {
    let room = subscription.room();
    let connection_id = subscription.connection_id();
    tracing::debug!(room = %room, connection_id, "websocket connected");

    let (mut outbound, mut inbound) = socket.split();
    loop {
        tokio::select! {
            frame = subscription.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                if outbound.send(Message::Text(frame.as_ref().into())).await.is_err() {
                    break;
                }
            }
            message = inbound.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients have nothing to say; pings are answered by axum.
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(room = %room, connection_id, "websocket closed");
}
