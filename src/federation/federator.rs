use crate::decomposer::QueryDecomposer;
use crate::error::FederationError;
use crate::federation::merge::{self, TableBatch};
use crate::models::{FederatedResultSet, ServerDescriptor, ServerRegistry};
use crate::protocol::{Channel, QueryRequest};
use futures::future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One entry of a route plan: a FROM-list table resolved to its owning
/// server.
#[derive(Debug, Clone)]
pub struct RouteTarget {
    pub plan_index: usize,
    pub registry_index: usize,
    pub table: String,
    pub server: ServerDescriptor,
}

/// The coordinator: owns the (immutable, injected) server registry and
/// drives one federated query end-to-end per `execute_federated` call.
///
/// No state is shared or mutated across calls, so one `Federator` serves
/// concurrent callers freely.
pub struct Federator {
    registry: ServerRegistry,
    dispatch_timeout: Duration,
}

impl Federator {
    pub fn new(registry: ServerRegistry) -> Self {
        Self {
            registry,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// A hung server must not block a federated call indefinitely; expiry
    /// is reported like any other transport failure from that server.
    pub fn with_dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Resolve each FROM-list table to its owning server.
    ///
    /// Ownership may overlap (replicas); the tie-break is first-registered
    /// wins. A table owned by no server is a routing error surfaced before
    /// any dispatch, never a silent skip.
    pub fn route(&self, from_tables: &[String]) -> Result<Vec<RouteTarget>, FederationError> {
        let mut plan = Vec::with_capacity(from_tables.len());
        for (plan_index, table) in from_tables.iter().enumerate() {
            let owners = self.registry.owners_of(table);
            let (registry_index, server) = owners.first().copied().ok_or_else(|| {
                FederationError::Routing(format!("no registered server owns table '{}'", table))
            })?;
            if owners.len() > 1 {
                debug!(
                    table = %table,
                    winner = %server.database_name,
                    owners = owners.len(),
                    "table owned by multiple servers; first-registered wins"
                );
            }
            plan.push(RouteTarget {
                plan_index,
                registry_index,
                table: table.clone(),
                server: server.clone(),
            });
        }
        Ok(plan)
    }

    /// Fetch one whole table from one server.
    ///
    /// The coordinator always sends `SELECT * FROM <table>` and defers
    /// projection and filtering to the merge engine, so servers never need
    /// to understand the predicate grammar. One channel per dispatch keeps
    /// the request/reply turn-taking trivially satisfied.
    pub async fn dispatch(&self, target: &RouteTarget) -> Result<TableBatch, FederationError> {
        let server_name = target.server.database_name.clone();
        let address = target.server.address();
        let request = QueryRequest::full_table(&target.table);

        let exchange = async {
            let mut channel = Channel::connect(&address).await.map_err(|e| {
                FederationError::transport(
                    &server_name,
                    format!("failed to open channel to {}: {}", address, e),
                )
            })?;
            channel
                .exchange(&request)
                .await
                .map_err(|e| FederationError::transport(&server_name, e.to_string()))
        };

        let response = timeout(self.dispatch_timeout, exchange)
            .await
            .map_err(|_| {
                FederationError::transport(
                    &server_name,
                    format!("no response within {:?}", self.dispatch_timeout),
                )
            })??;

        if let Some(message) = response.error {
            return Err(FederationError::remote(&server_name, message));
        }
        let rows = response.data.ok_or_else(|| {
            FederationError::transport(
                &server_name,
                "malformed response: neither data nor error present",
            )
        })?;
        // Servers predating the columns field derive the schema from the
        // first row.
        let columns = response.columns.unwrap_or_else(|| {
            rows.first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default()
        });

        debug!(
            server = %server_name,
            table = %target.table,
            rows = rows.len(),
            "dispatch completed"
        );

        Ok(TableBatch {
            plan_index: target.plan_index,
            table: target.table.clone(),
            server: server_name,
            columns,
            rows,
        })
    }

    /// Drive one federated query end-to-end: decompose, route, dispatch to
    /// every owning server concurrently, then merge.
    ///
    /// Any failed dispatch fails the whole call with that error; partial
    /// results are never silently presented as complete. When several
    /// dispatches fail, the first in plan order is reported.
    pub async fn execute_federated(
        &self,
        raw_query: &str,
    ) -> Result<FederatedResultSet, FederationError> {
        let query_id = Uuid::new_v4();
        info!(%query_id, query = %raw_query, "federated query started");

        let result = self.run_federated(raw_query).await;
        match &result {
            Ok(result_set) => {
                info!(%query_id, rows = result_set.row_count(), "federated query completed");
            }
            Err(e) => {
                warn!(%query_id, code = e.code(), "federated query failed: {}", e);
            }
        }
        result
    }

    async fn run_federated(
        &self,
        raw_query: &str,
    ) -> Result<FederatedResultSet, FederationError> {
        let components = QueryDecomposer::decompose(raw_query)?;
        let plan = self.route(&components.from)?;

        // Servers are independent; fan out and join. Results come back in
        // plan order, and merge re-sorts by plan index, so output is
        // identical to sequential dispatch.
        let outcomes = future::join_all(plan.iter().map(|target| self.dispatch(target))).await;
        let mut batches = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            batches.push(outcome?);
        }

        merge::merge(&components, batches)
    }
}
