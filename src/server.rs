use crate::protocol::framing::{read_raw_line, write_message};
use crate::protocol::message::{QueryRequest, QueryResponse};
use crate::storage::QueryStore;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

/// A process exposing one logical database over the wire protocol.
///
/// Trust model: the server executes arbitrary query text received from the
/// network. Federation members are assumed mutually trusted; there is no
/// authentication in this protocol, which is an explicit non-goal rather
/// than an oversight.
pub struct DataServer {
    database_name: String,
    store: Arc<dyn QueryStore>,
}

impl DataServer {
    pub fn new(database_name: impl Into<String>, store: Arc<dyn QueryStore>) -> Self {
        Self {
            database_name: database_name.into(),
            store,
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Bind a listening endpoint and serve indefinitely.
    ///
    /// Only the bind itself is fatal. Per-query failures are answered on
    /// the channel and the loop resumes.
    pub async fn serve(self: Arc<Self>, bind_addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;
        info!(database = %self.database_name, addr = %addr, "data server listening");
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener. Tests bind port 0 and pass the
    /// listener in to learn the ephemeral address.
    pub async fn serve_on(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream, peer).await {
                    warn!(database = %server.database_name, peer = %peer, "connection ended: {}", e);
                }
            });
        }
    }

    /// Strict request/reply turn-taking: read one request, send one
    /// response, repeat until the peer closes the channel.
    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> io::Result<()> {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        while let Some(line) = read_raw_line(&mut reader).await? {
            let response = match serde_json::from_str::<QueryRequest>(&line) {
                Ok(request) => {
                    info!(database = %self.database_name, peer = %peer, query = %request.query, "received query");
                    self.execute(&request.query).await
                }
                Err(e) => {
                    warn!(database = %self.database_name, peer = %peer, "malformed request: {}", e);
                    QueryResponse::failure(format!("missing or malformed 'query' field: {}", e))
                }
            };
            write_message(&mut write_half, &response).await?;
        }
        Ok(())
    }

    /// Run the text as-is against the local store. Failures never escape
    /// this boundary: they become the response's `error` field, with no
    /// partial row data alongside.
    pub async fn execute(&self, sql: &str) -> QueryResponse {
        match self.store.execute(sql).await {
            Ok(result) => {
                info!(
                    database = %self.database_name,
                    rows = result.rows.len(),
                    "query executed"
                );
                QueryResponse::success(result.columns, result.rows)
            }
            Err(e) => {
                error!(database = %self.database_name, "query failed: {}", e);
                QueryResponse::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Channel;
    use crate::storage::SqliteStore;

    async fn spawn_server() -> SocketAddr {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .execute_batch(
                r#"
                CREATE TABLE prices (commodity TEXT, price INTEGER);
                INSERT INTO prices VALUES ('Rice', 2100);
                "#,
            )
            .await
            .unwrap();

        let server = Arc::new(DataServer::new("crop_prices", Arc::new(store)));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve_on(listener));
        addr
    }

    #[tokio::test]
    async fn test_serve_answers_queries() {
        let addr = spawn_server().await;
        let mut channel = Channel::connect(&addr.to_string()).await.unwrap();

        let response = channel
            .exchange(&QueryRequest::new("SELECT * FROM prices"))
            .await
            .unwrap();
        assert!(response.error.is_none());
        assert_eq!(response.columns.unwrap(), vec!["commodity", "price"]);
        assert_eq!(response.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execution_error_does_not_kill_serve_loop() {
        let addr = spawn_server().await;
        let mut channel = Channel::connect(&addr.to_string()).await.unwrap();

        let bad = channel
            .exchange(&QueryRequest::new("SELECT * FROM missing"))
            .await
            .unwrap();
        assert!(bad.error.unwrap().contains("no such table"));
        assert!(bad.data.is_none());

        // Same channel is still served after the failed query.
        let good = channel
            .exchange(&QueryRequest::new("SELECT * FROM prices"))
            .await
            .unwrap();
        assert!(good.error.is_none());
        assert_eq!(good.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error_response() {
        use crate::protocol::framing::read_message;
        use tokio::io::AsyncWriteExt;

        let addr = spawn_server().await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half.write_all(b"{\"not_query\": 1}\n").await.unwrap();
        let response: QueryResponse = read_message(&mut reader).await.unwrap().unwrap();
        assert!(response.error.unwrap().contains("query"));
    }
}
