//! Order operations.

use tracing::instrument;
use trackscore_core::OrderId;

use super::{
    AdminClient, AdminShopifyError,
    queries::{GetOrders, OrderCancel, get_orders, order_cancel},
};
use crate::shopify::types::{CancelOptions, OrderConnection};

impl AdminClient {
    /// Get one page of orders.
    ///
    /// # Arguments
    ///
    /// * `first` - Number of orders to return (Shopify caps this at 250)
    /// * `after` - Cursor for pagination
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self))]
    pub async fn get_orders_page(
        &self,
        first: u32,
        after: Option<String>,
    ) -> Result<OrderConnection, AdminShopifyError> {
        let variables = get_orders::Variables {
            first: i64::from(first),
            after,
        };

        let response = self.execute::<GetOrders>(variables).await?;

        Ok(response.orders)
    }

    /// Cancel an order.
    ///
    /// Returns the id of the background job Shopify started, if any.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::UserError` with the first user error
    /// message if Shopify rejects the cancellation, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(
        &self,
        id: OrderId,
        options: CancelOptions,
    ) -> Result<Option<String>, AdminShopifyError> {
        let variables = order_cancel::Variables {
            order_id: id.gid(),
            reason: options.reason,
            refund: options.refund,
            restock: options.restock,
            notify_customer: options.notify_customer,
        };

        let response = self.execute::<OrderCancel>(variables).await?;

        let payload = response.order_cancel.ok_or_else(|| {
            AdminShopifyError::NotFound(format!("orderCancel payload for order {id}"))
        })?;

        if let Some(first) = payload.user_errors.into_iter().next() {
            return Err(AdminShopifyError::UserError(first.message));
        }

        Ok(payload.job.map(|job| job.id))
    }
}
