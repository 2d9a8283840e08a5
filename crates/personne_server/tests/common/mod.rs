use personne_core::db::open_db_in_memory;
use personne_server::app;
use personne_server::state::AppState;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const RESET_TOKEN: &str = "test-reset-token";

/// Live server bound to an ephemeral port, stopped on drop.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_server(reset_token: Option<&str>) -> TestServer {
    let conn = open_db_in_memory().unwrap();
    let state = AppState::new(conn, reset_token.map(str::to_string));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    TestServer {
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
        shutdown: Some(shutdown_tx),
    }
}
