/// Axum webserver implementation
///
/// Main server lifecycle management including startup, shutdown, and graceful termination
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::{
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// This function blocks until `shutdown` is called
pub async fn start_server(state: Arc<AppState>) -> Result<(), String> {
    let addr = state.config.bind_address();
    let port = state.config.webserver.port;

    logger::info(
        LogTag::Webserver,
        &format!("Starting webserver on {}", addr),
    );

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another process is listening on port {}. Stop it or start Mist with --port <n>.",
            addr, port
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Port {} requires elevated privileges on this system.\n\
             Consider using a port above 1024 or running with appropriate permissions.",
            addr, port
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    logger::info(
        LogTag::Webserver,
        &format!(
            "Webserver listening on http://{} (websocket at {})",
            addr, state.config.webserver.ws_path
        ),
    );

    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    serve(listener, state, shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");

    Ok(())
}

/// Serve on an already bound listener until `shutdown_signal` completes
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown_signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    SHUTDOWN_NOTIFY.notify_one();
}

/// Build the Axum application with all routes and middleware
pub fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state).layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::Row;
    use crate::config::Config;
    use crate::engine::Mist;
    use crate::models::fixtures::*;
    use crate::store::SqliteStore;
    use crate::templates::TemplateRenderer;
    use crate::webserver::ws::Message;
    use futures::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsFrame};
    use uuid::Uuid;

    struct TestServer {
        addr: SocketAddr,
        store: Arc<SqliteStore>,
        mist: Arc<Mist>,
        stop: oneshot::Sender<()>,
    }

    async fn spawn_server() -> TestServer {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mist = Mist::new(store.clone(), Arc::new(TemplateRenderer::new()));
        mist.register(Row).await;

        let state = Arc::new(AppState::new(Config::default(), mist.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, state, async {
            let _ = stopped.await;
        }));

        TestServer {
            addr,
            store,
            mist,
            stop,
        }
    }

    async fn next_text<S>(stream: &mut S) -> String
    where
        S: StreamExt<Item = Result<WsFrame, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            let frame = timeout(Duration::from_secs(2), stream.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("stream ended")
                .expect("websocket error");
            if let WsFrame::Text(text) = frame {
                return text;
            }
        }
    }

    #[tokio::test]
    async fn test_websocket_end_to_end() {
        let server = spawn_server().await;
        let url = format!("ws://{}/mist/ws", server.addr);
        let (mut socket, _) = connect_async(url).await.unwrap();

        assert_eq!(
            next_text(&mut socket).await,
            r#"{ "msg": "Server Welcome Message" }"#
        );

        socket
            .send(WsFrame::Text(Message::subscribe("Row").encode().unwrap()))
            .await
            .unwrap();
        assert_eq!(
            next_text(&mut socket).await,
            r#"{"msg":"Subscribed to Row"}"#
        );

        socket
            .send(WsFrame::Text(Message::subscribe("Nope").encode().unwrap()))
            .await
            .unwrap();
        assert_eq!(
            next_text(&mut socket).await,
            r#"{"error":"Component 'Nope' not found"}"#
        );

        let id = Uuid::new_v4();
        server.store.create(&header(id, "a")).unwrap();
        server.store.create(&detail(id, "b")).unwrap();
        server.store.update(&header(id, "a")).await.unwrap();

        match Message::decode(&next_text(&mut socket).await).unwrap() {
            Message::ComponentUpdate {
                component,
                id: update_id,
                html,
                ..
            } => {
                assert_eq!(component, "Row");
                assert_eq!(update_id, Some(id));
                assert!(html.contains('a'));
                assert!(html.contains('b'));
            }
            other => panic!("unexpected message {:?}", other),
        }

        // No second update for the same mutation
        assert!(timeout(Duration::from_millis(100), socket.next())
            .await
            .is_err());

        socket.close(None).await.unwrap();
        for _ in 0..50 {
            if server.mist.clients().is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(server.mist.clients().is_empty().await);

        let _ = server.stop.send(());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_updates() {
        let server = spawn_server().await;
        let url = format!("ws://{}/mist/ws", server.addr);
        let (mut socket, _) = connect_async(url).await.unwrap();
        next_text(&mut socket).await;

        socket
            .send(WsFrame::Text(Message::subscribe("Row").encode().unwrap()))
            .await
            .unwrap();
        next_text(&mut socket).await;
        socket
            .send(WsFrame::Text(Message::unsubscribe("Row").encode().unwrap()))
            .await
            .unwrap();
        assert_eq!(
            next_text(&mut socket).await,
            r#"{"msg":"Unsubscribed to Row"}"#
        );

        let id = Uuid::new_v4();
        server.store.create(&header(id, "a")).unwrap();
        server.store.update(&header(id, "a")).await.unwrap();

        assert!(timeout(Duration::from_millis(100), socket.next())
            .await
            .is_err());

        let _ = server.stop.send(());
    }
}
