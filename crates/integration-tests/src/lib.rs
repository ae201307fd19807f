//! Integration tests for TrackScore.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p trackscore-integration-tests
//! ```
//!
//! The tests drive the admin services through in-memory fakes of their
//! seams, so no database or Shopify store is needed.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::{Value, json};
use trackscore_admin::db::RepositoryError;
use trackscore_admin::models::{CancelRequest, OrderInput};
use trackscore_admin::services::{CancelQueue, OrderCanceller, OrderSource, OrderStore};
use trackscore_admin::shopify::{AdminShopifyError, CancelOptions, OrderConnection, OrderNode};
use trackscore_core::{CancelReason, OrderId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Fixtures
// =============================================================================

/// A well-formed GraphQL order node.
#[must_use]
pub fn order_node(id: i64) -> Value {
    json!({
        "id": format!("gid://shopify/Order/{id}"),
        "email": format!("buyer{id}@example.com"),
        "createdAt": "2026-03-01T10:00:00Z",
        "tags": [],
        "displayFinancialStatus": "PENDING",
        "displayFulfillmentStatus": "UNFULFILLED",
        "paymentGatewayNames": ["Cash on Delivery (COD)"],
        "customer": {
            "id": format!("gid://shopify/Customer/{}", 10_000 + id),
            "firstName": "Buyer",
            "lastName": id.to_string()
        },
        "lineItems": {
            "edges": [{ "node": { "product": { "id": "gid://shopify/Product/9" } } }]
        }
    })
}

/// An order node without any product line item.
#[must_use]
pub fn order_node_without_product(id: i64) -> Value {
    let mut node = order_node(id);
    node["lineItems"] = json!({ "edges": [] });
    node
}

/// A page of `nodes`.
///
/// # Panics
///
/// Panics if a node does not deserialize into an order.
#[must_use]
#[allow(clippy::expect_used)]
pub fn page(nodes: Vec<Value>, end_cursor: Option<&str>) -> OrderConnection {
    let edges: Vec<Value> = nodes.into_iter().map(|node| json!({ "node": node })).collect();
    serde_json::from_value(json!({
        "pageInfo": { "hasNextPage": end_cursor.is_some(), "endCursor": end_cursor },
        "edges": edges
    }))
    .expect("fixture page deserializes")
}

/// The mapped form of [`order_node`], ready to upsert.
///
/// # Panics
///
/// Panics if the fixture node fails to map.
#[must_use]
#[allow(clippy::expect_used)]
pub fn order_input(id: i64) -> OrderInput {
    let node: OrderNode = serde_json::from_value(order_node(id)).expect("fixture node deserializes");
    OrderInput::try_from(node).expect("fixture node maps")
}

/// A queued cancel request with the default options.
#[must_use]
pub fn cancel_request(id: i64, order_id: OrderId) -> CancelRequest {
    let options = CancelOptions::default();
    CancelRequest {
        id,
        order_id,
        email: format!("buyer{order_id}@example.com"),
        reason: CancelReason::Customer,
        refund: options.refund,
        restock: options.restock,
        notify_customer: options.notify_customer,
        last_error: None,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Order source
// =============================================================================

/// Scripted order source returning responses in order.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<OrderConnection, AdminShopifyError>>>,
    cursors: Mutex<Vec<Option<String>>>,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(responses: Vec<Result<OrderConnection, AdminShopifyError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            cursors: Mutex::new(Vec::new()),
        }
    }

    /// The `after` cursor of every fetch, in call order.
    #[must_use]
    pub fn cursors(&self) -> Vec<Option<String>> {
        lock(&self.cursors).clone()
    }
}

impl OrderSource for ScriptedSource {
    fn fetch_orders_page(
        &self,
        _first: u32,
        after: Option<String>,
    ) -> impl Future<Output = Result<OrderConnection, AdminShopifyError>> + Send {
        lock(&self.cursors).push(after);
        let next = lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(AdminShopifyError::NotFound("no scripted page left".into())));
        async move { next }
    }
}

// =============================================================================
// Order store
// =============================================================================

/// In-memory order store keyed by order id.
#[derive(Default)]
pub struct MemoryStore {
    orders: Mutex<BTreeMap<OrderId, OrderInput>>,
    failing: HashSet<OrderId>,
}

impl MemoryStore {
    /// A store that rejects the given orders.
    #[must_use]
    pub fn failing_on(ids: impl IntoIterator<Item = OrderId>) -> Self {
        Self {
            orders: Mutex::default(),
            failing: ids.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.orders).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<OrderInput> {
        lock(&self.orders).get(&id).cloned()
    }
}

impl OrderStore for MemoryStore {
    fn upsert_order(
        &self,
        order: &OrderInput,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = if self.failing.contains(&order.order_id) {
            Err(RepositoryError::DataCorruption(format!(
                "order {} rejected",
                order.order_id
            )))
        } else {
            lock(&self.orders).insert(order.order_id, order.clone());
            Ok(())
        };
        async move { result }
    }
}

// =============================================================================
// Canceller
// =============================================================================

/// Canceller that fails for configured orders with a user error.
#[derive(Default)]
pub struct FakeCanceller {
    failures: HashMap<OrderId, String>,
    calls: Mutex<Vec<(OrderId, CancelOptions)>>,
}

impl FakeCanceller {
    #[must_use]
    pub fn failing(failures: impl IntoIterator<Item = (OrderId, &'static str)>) -> Self {
        Self {
            failures: failures
                .into_iter()
                .map(|(id, message)| (id, message.to_string()))
                .collect(),
            calls: Mutex::default(),
        }
    }

    /// Every cancellation attempted, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(OrderId, CancelOptions)> {
        lock(&self.calls).clone()
    }
}

impl OrderCanceller for FakeCanceller {
    fn cancel(
        &self,
        order_id: OrderId,
        options: CancelOptions,
    ) -> impl Future<Output = Result<(), AdminShopifyError>> + Send {
        lock(&self.calls).push((order_id, options));
        let result = self
            .failures
            .get(&order_id)
            .map_or(Ok(()), |message| Err(AdminShopifyError::UserError(message.clone())));
        async move { result }
    }
}

// =============================================================================
// Cancel queue
// =============================================================================

/// In-memory cancel-request queue.
#[derive(Default)]
pub struct MemoryQueue {
    requests: Mutex<BTreeMap<OrderId, CancelRequest>>,
}

impl MemoryQueue {
    #[must_use]
    pub fn with(requests: impl IntoIterator<Item = CancelRequest>) -> Self {
        Self {
            requests: Mutex::new(requests.into_iter().map(|r| (r.order_id, r)).collect()),
        }
    }

    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<CancelRequest> {
        lock(&self.requests).get(&order_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.requests).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CancelQueue for MemoryQueue {
    fn pending(
        &self,
        order_ids: &[OrderId],
    ) -> impl Future<Output = Result<Vec<CancelRequest>, RepositoryError>> + Send {
        let requests = lock(&self.requests);
        let found = order_ids
            .iter()
            .filter_map(|id| requests.get(id).cloned())
            .collect();
        async move { Ok(found) }
    }

    fn resolve(&self, order_id: OrderId) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = lock(&self.requests)
            .remove(&order_id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound);
        async move { result }
    }

    fn mark_failed(
        &self,
        order_id: OrderId,
        error: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = lock(&self.requests)
            .get_mut(&order_id)
            .map(|request| request.last_error = Some(error.to_string()))
            .ok_or(RepositoryError::NotFound);
        async move { result }
    }
}
