//! Daily order summary: counts and net revenue for the previous day(s).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use {
    merchbell_commerce::{CommerceClient, OrdersPageRequest},
    merchbell_store::{MetaStore, Tenant, TenantMeta},
};

use crate::{Result, money::render_money};

const FULFILLED: &str = "FULFILLED";
const REFUNDED: &str = "REFUNDED";

pub struct SummaryAggregator {
    commerce: Arc<CommerceClient>,
    page_size: u32,
    lookback_days: i64,
}

impl SummaryAggregator {
    #[must_use]
    pub fn new(commerce: Arc<CommerceClient>, page_size: u32, lookback_days: i64) -> Self {
        Self {
            commerce,
            page_size,
            lookback_days,
        }
    }

    /// Four-line digest of the orders created in the window.
    ///
    /// Every order lands in exactly one bucket: fulfilled, refunded, or
    /// new. Refunds subtract their total from revenue, new orders add it,
    /// fulfilled orders were counted when they were new. The window is
    /// bounded by calendar dates, closed at the start and open at the end.
    pub async fn summarize(
        &self,
        store: &dyn MetaStore,
        tenant: &Tenant,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let end = now.date_naive();
        let start = end - Duration::days(self.lookback_days);
        let filter = format!("created_at:>={start} created_at:<{end}");

        let mut new_orders = 0u32;
        let mut fulfilled = 0u32;
        let mut refunded = 0u32;
        let mut revenue = 0.0f64;

        let mut cursor = None;
        loop {
            let page = self
                .commerce
                .orders_page(
                    &tenant.shop_domain,
                    &tenant.access_token,
                    &OrdersPageRequest {
                        filter: filter.clone(),
                        page_size: self.page_size,
                        cursor,
                        include_line_items: false,
                    },
                )
                .await?;

            for order in &page.orders {
                let total: f64 = order.total_price.parse().unwrap_or_default();
                if order.fulfillment_status == FULFILLED {
                    fulfilled += 1;
                } else if order.financial_status == REFUNDED {
                    refunded += 1;
                    revenue -= total;
                } else {
                    new_orders += 1;
                    revenue += total;
                }
            }

            if page.orders.len() < self.page_size as usize || page.cursor.is_none() {
                break;
            }
            cursor = page.cursor;
        }

        let meta = TenantMeta::new(store, &tenant.id);
        let template = meta.money_format().await?.unwrap_or_default();
        Ok(vec![
            format!("New orders: {new_orders}"),
            format!("Completed orders: {fulfilled}"),
            format!("Cancelled orders: {refunded}"),
            format!("Total revenue: {}", render_money(&template, revenue)),
        ])
    }
}
