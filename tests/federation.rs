// End-to-end federation tests against real data servers on ephemeral ports.

use agrifed::federation::Federator;
use agrifed::models::{ServerDescriptor, ServerRegistry};
use agrifed::server::DataServer;
use agrifed::storage::{QueryStore, SqliteStore};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_data_server(database_name: &str, fixture_sql: &str) -> (SocketAddr, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store.execute_batch(fixture_sql).await.unwrap();

    let server = Arc::new(DataServer::new(database_name, store.clone() as Arc<dyn QueryStore>));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_on(listener));
    (addr, store)
}

async fn spawn_prices_server() -> (SocketAddr, Arc<SqliteStore>) {
    spawn_data_server(
        "crop_prices",
        r#"
        CREATE TABLE prices (commodity TEXT, price INTEGER);
        INSERT INTO prices VALUES ('Rice', 2100);
        INSERT INTO prices VALUES ('Wheat', 1800);
        "#,
    )
    .await
}

fn descriptor(addr: SocketAddr, database_name: &str, tables: &[&str]) -> ServerDescriptor {
    ServerDescriptor::new(
        addr.ip().to_string(),
        addr.port(),
        database_name,
        tables.iter().map(|t| t.to_string()).collect(),
    )
}

fn single_server_federator(addr: SocketAddr) -> Federator {
    let registry = ServerRegistry::from_descriptors(vec![descriptor(
        addr,
        "crop_prices",
        &["prices"],
    )])
    .unwrap();
    Federator::new(registry)
}

/// A listener that counts connection attempts and serves nothing. Used to
/// prove no dispatch happens on routing failures.
async fn counting_sink(counter: Arc<AtomicUsize>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    held.push(stream);
                }
                Err(_) => break,
            }
        }
    });
    addr
}

#[tokio::test]
async fn scenario_a_projection_without_predicate() {
    let (addr, _store) = spawn_prices_server().await;
    let federator = single_server_federator(addr);

    let result = federator
        .execute_federated("SELECT commodity, price FROM prices")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["commodity", "price"]);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0]["commodity"], json!("Rice"));
    assert_eq!(result.rows[0]["price"], json!(2100));
    assert_eq!(result.rows[1]["commodity"], json!("Wheat"));
    assert_eq!(result.rows[1]["price"], json!(1800));
}

#[tokio::test]
async fn scenario_b_filter_before_projection() {
    let (addr, _store) = spawn_prices_server().await;
    let federator = single_server_federator(addr);

    let result = federator
        .execute_federated("SELECT commodity FROM prices WHERE price > 2000")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["commodity"]);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["commodity"], json!("Rice"));
    assert!(result.rows[0].get("price").is_none());
}

#[tokio::test]
async fn scenario_c_remote_execution_error_propagates() {
    // The registry claims ownership of a table the store does not have.
    let (addr, _store) = spawn_data_server("crop_prices", "CREATE TABLE other (x INTEGER);").await;
    let federator = single_server_federator(addr);

    let err = federator
        .execute_federated("SELECT * FROM prices")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "REMOTE_EXECUTION_ERROR");
    assert!(err.to_string().contains("no such table"), "got: {}", err);
}

#[tokio::test]
async fn scenario_d_routing_error_before_any_dispatch() {
    let dispatches = Arc::new(AtomicUsize::new(0));
    let first = counting_sink(dispatches.clone()).await;
    let second = counting_sink(dispatches.clone()).await;

    let registry = ServerRegistry::from_descriptors(vec![
        descriptor(first, "crop_prices", &["prices"]),
        descriptor(second, "crop_data", &["crops"]),
    ])
    .unwrap();
    let federator = Federator::new(registry);

    let err = federator
        .execute_federated("SELECT * FROM soil")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ROUTING_ERROR");
    assert_eq!(dispatches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn federated_wildcard_matches_raw_server_execution() {
    let (addr, store) = spawn_prices_server().await;
    let federator = single_server_federator(addr);

    let federated = federator
        .execute_federated("SELECT * FROM prices")
        .await
        .unwrap();
    let raw = store.execute("SELECT * FROM prices").await.unwrap();

    assert_eq!(federated.columns, raw.columns);
    assert_eq!(federated.rows, raw.rows);
}

#[tokio::test]
async fn federated_query_is_idempotent() {
    let (addr, _store) = spawn_prices_server().await;
    let federator = single_server_federator(addr);

    let first = federator
        .execute_federated("SELECT commodity FROM prices WHERE price >= 1800")
        .await
        .unwrap();
    let second = federator
        .execute_federated("SELECT commodity FROM prices WHERE price >= 1800")
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn multi_server_rows_concatenate_in_plan_order() {
    let (prices_addr, _prices) = spawn_prices_server().await;
    let (soil_addr, _soil) = spawn_data_server(
        "soil_data",
        r#"
        CREATE TABLE soil (district TEXT, ph REAL);
        INSERT INTO soil VALUES ('Nashik', 6.8);
        "#,
    )
    .await;

    let registry = ServerRegistry::from_descriptors(vec![
        descriptor(prices_addr, "crop_prices", &["prices"]),
        descriptor(soil_addr, "soil_data", &["soil"]),
    ])
    .unwrap();
    let federator = Federator::new(registry);

    let result = federator
        .execute_federated("SELECT * FROM soil, prices")
        .await
        .unwrap();

    // FROM-list order wins, not registry order.
    assert_eq!(result.columns, vec!["district", "ph", "commodity", "price"]);
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.rows[0]["district"], json!("Nashik"));
    assert_eq!(result.rows[1]["commodity"], json!("Rice"));
    assert_eq!(result.rows[2]["commodity"], json!("Wheat"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind-then-drop guarantees nothing listens on the port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let federator = single_server_federator(addr);
    let err = federator
        .execute_federated("SELECT * FROM prices")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "TRANSPORT_ERROR");
}

#[tokio::test]
async fn hung_server_hits_the_dispatch_timeout() {
    // Accepts the connection but never replies.
    let addr = counting_sink(Arc::new(AtomicUsize::new(0))).await;

    let registry = ServerRegistry::from_descriptors(vec![descriptor(
        addr,
        "crop_prices",
        &["prices"],
    )])
    .unwrap();
    let federator =
        Federator::new(registry).with_dispatch_timeout(Duration::from_millis(200));

    let err = federator
        .execute_federated("SELECT * FROM prices")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "TRANSPORT_ERROR");
    assert!(err.to_string().contains("no response"), "got: {}", err);
}

#[tokio::test]
async fn partial_failure_fails_the_whole_call() {
    let (prices_addr, _prices) = spawn_prices_server().await;
    // Second server's store lacks the table its descriptor claims.
    let (soil_addr, _soil) =
        spawn_data_server("soil_data", "CREATE TABLE other (x INTEGER);").await;

    let registry = ServerRegistry::from_descriptors(vec![
        descriptor(prices_addr, "crop_prices", &["prices"]),
        descriptor(soil_addr, "soil_data", &["soil"]),
    ])
    .unwrap();
    let federator = Federator::new(registry);

    let err = federator
        .execute_federated("SELECT * FROM prices, soil")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "REMOTE_EXECUTION_ERROR");
    assert!(err.to_string().contains("soil_data"));
}

#[tokio::test]
async fn on_disk_store_round_trip() {
    // Same path a deployed server takes: a database file on disk.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crop_prices.db");

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    store
        .execute_batch(
            r#"
            CREATE TABLE prices (commodity TEXT, price INTEGER);
            INSERT INTO prices VALUES ('Maize', 1450);
            "#,
        )
        .await
        .unwrap();

    let server = Arc::new(DataServer::new("crop_prices", store as Arc<dyn QueryStore>));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_on(listener));

    let federator = single_server_federator(addr);
    let result = federator
        .execute_federated("SELECT commodity FROM prices")
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["commodity"], json!("Maize"));
}
