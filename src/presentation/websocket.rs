// WebSocket transport for the ingestion protocol
use crate::application::ingestion_service::{IngestionService, SessionState};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

/// Upgrade and run one client connection as its own task.
pub async fn ingest_socket(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let service = state.ingestion_service.clone();
    ws.on_upgrade(move |socket| async move {
        let (outgoing, incoming) = socket.split();
        serve_connection(service, peer.to_string(), incoming, outgoing).await;
    })
}

/// Protocol loop over any text-frame transport. Returns when the client
/// closes or the transport fails; the session is unregistered either way.
pub async fn serve_connection<I, O, E>(
    service: IngestionService,
    peer: String,
    mut incoming: I,
    mut outgoing: O,
) where
    I: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    O: Sink<Message> + Unpin,
    O::Error: Display,
{
    let mut session = service.open_session(peer);

    if let Some(ack) = session.greet() {
        let sent = match serde_json::to_string(&ack) {
            Ok(text) => outgoing.send(Message::Text(text)).await.map_err(|e| e.to_string()),
            Err(err) => Err(err.to_string()),
        };
        if let Err(err) = sent {
            tracing::warn!("Failed to acknowledge {}: {}", session.peer(), err);
            session.close();
            return;
        }
    }

    debug_assert_eq!(session.state(), SessionState::Streaming);
    while let Some(frame) = incoming.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!("Transport error from {}: {}", session.peer(), err);
                break;
            }
        };

        let reply = service.handle_text(&session, &text).await;
        if let Err(err) = outgoing.send(Message::Text(reply.to_json())).await {
            tracing::debug!("Failed to reply to {}: {}", session.peer(), err);
            break;
        }
    }

    let id = session.id();
    session.close();
    tracing::info!(
        "Client {} disconnected (connection {:?}, {} active)",
        session.peer(),
        id,
        service.connections().active()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::connections::ConnectionRegistry;
    use crate::application::snapshot_publisher::NoopPublisher;
    use crate::application::telemetry_store::TelemetryStore;
    use crate::domain::anomaly::Thresholds;
    use futures::channel::mpsc;
    use futures::stream;
    use serde_json::Value;

    fn service() -> IngestionService {
        IngestionService::new(
            Arc::new(TelemetryStore::new(300, Thresholds::default())),
            Arc::new(NoopPublisher),
            ConnectionRegistry::new(),
        )
    }

    async fn run(service: &IngestionService, frames: Vec<Message>) -> Vec<Value> {
        let incoming = stream::iter(frames.into_iter().map(Ok::<_, std::io::Error>));
        let (tx, rx) = mpsc::unbounded();
        serve_connection(service.clone(), "127.0.0.1:50000".to_string(), incoming, tx).await;

        rx.map(|message| match message {
            Message::Text(text) => serde_json::from_str(&text).expect("reply is JSON"),
            other => panic!("unexpected frame {other:?}"),
        })
        .collect()
        .await
    }

    fn text(body: &str) -> Message {
        Message::Text(body.to_string())
    }

    #[tokio::test]
    async fn acknowledges_then_answers_every_frame() {
        let service = service();
        let replies = run(
            &service,
            vec![
                text("not json"),
                Message::Ping(vec![1]),
                text(r#"{"type":"reactor_data","dados":{"plasma_temperature":2.1e8}}"#),
                text(r#"{"type":"ping","timestamp":7}"#),
            ],
        )
        .await;

        assert_eq!(replies.len(), 4);
        assert_eq!(replies[0]["tipo"], "conexao_estabelecida");
        assert_eq!(replies[1]["type"], "erro");
        assert_eq!(replies[2]["status"], "dados_reator_recebidos");
        assert_eq!(replies[3]["type"], "pong");
        assert_eq!(replies[3]["timestamp"], 7);

        let snapshot = service.store().current_snapshot();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(serde_json::to_value(snapshot.status).unwrap(), "CRITICAL");
    }

    #[tokio::test]
    async fn close_frame_ends_session_and_unregisters() {
        let service = service();
        let replies = run(
            &service,
            vec![
                Message::Close(None),
                text(r#"{"type":"turbine_data","dados":{}}"#),
            ],
        )
        .await;

        assert_eq!(replies.len(), 1);
        assert_eq!(service.connections().active(), 0);
        assert_eq!(service.store().current_snapshot().revision, 0);
    }

    #[tokio::test]
    async fn transport_error_closes_only_that_connection() {
        let service = service();
        let other = service.open_session("127.0.0.1:50001");

        let frames: Vec<Result<Message, std::io::Error>> = vec![
            Ok(text(r#"{"type":"turbine_data","dados":{"flow_rate":3}}"#)),
            Err(std::io::Error::other("reset by peer")),
            Ok(text(r#"{"type":"raw_data_request"}"#)),
        ];
        let (tx, rx) = mpsc::unbounded();
        serve_connection(service.clone(), "127.0.0.1:50000".to_string(), stream::iter(frames), tx)
            .await;

        let replies: Vec<Message> = rx.collect().await;
        assert_eq!(replies.len(), 2);
        assert_eq!(service.connections().active(), 1);
        assert_eq!(service.store().current_snapshot().revision, 1);
        drop(other);
        assert_eq!(service.connections().active(), 0);
    }

    #[tokio::test]
    async fn binary_frames_are_decoded_as_text() {
        let service = service();
        let replies = run(
            &service,
            vec![Message::Binary(br#"{"type":"ping","timestamp":"abc"}"#.to_vec())],
        )
        .await;
        assert_eq!(replies[1]["timestamp"], "abc");
    }
}
