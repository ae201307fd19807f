//! GraphQL operation definitions for the Shopify Admin API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` over the
//! documents in `graphql/admin/queries/`, with hand-written variable and
//! response types limited to the fields this service reads.

use graphql_client::{GraphQLQuery, QueryBody};

// =============================================================================
// Order queries
// =============================================================================

pub struct GetOrders;

pub mod get_orders {
    use serde::{Deserialize, Serialize};

    use crate::shopify::types::OrderConnection;

    pub const OPERATION_NAME: &str = "GetOrders";
    pub const QUERY: &str = include_str!("../../../graphql/admin/queries/orders.graphql");

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub orders: OrderConnection,
    }
}

impl GraphQLQuery for GetOrders {
    type Variables = get_orders::Variables;
    type ResponseData = get_orders::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_orders::QUERY,
            operation_name: get_orders::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Order mutations
// =============================================================================

pub struct OrderCancel;

pub mod order_cancel {
    use serde::{Deserialize, Serialize};
    use trackscore_core::CancelReason;

    pub const OPERATION_NAME: &str = "OrderCancel";
    pub const QUERY: &str = include_str!("../../../graphql/admin/queries/order_cancel.graphql");

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub order_id: String,
        pub reason: CancelReason,
        pub refund: bool,
        pub restock: bool,
        pub notify_customer: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub order_cancel: Option<OrderCancelPayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrderCancelPayload {
        pub job: Option<Job>,
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Job {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserError {
        pub field: Option<Vec<String>>,
        pub message: String,
    }
}

impl GraphQLQuery for OrderCancel {
    type Variables = order_cancel::Variables;
    type ResponseData = order_cancel::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: order_cancel::QUERY,
            operation_name: order_cancel::OPERATION_NAME,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_orders_body() {
        let body = GetOrders::build_query(get_orders::Variables {
            first: 250,
            after: None,
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["operationName"], "GetOrders");
        assert_eq!(json["variables"]["first"], 250);
        assert!(json["variables"]["after"].is_null());
        assert!(json["query"].as_str().unwrap().contains("orders(first: $first"));
    }

    #[test]
    fn test_order_cancel_variables_use_graphql_enum() {
        let body = OrderCancel::build_query(order_cancel::Variables {
            order_id: "gid://shopify/Order/1".to_string(),
            reason: trackscore_core::CancelReason::Customer,
            refund: true,
            restock: true,
            notify_customer: true,
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["variables"]["orderId"], "gid://shopify/Order/1");
        assert_eq!(json["variables"]["reason"], "CUSTOMER");
        assert_eq!(json["variables"]["notifyCustomer"], true);
    }
}
