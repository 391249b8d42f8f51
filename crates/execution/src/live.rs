// In crates/execution/src/live.rs

use crate::{Broker, Result};
use api_client::ApiClient;
use async_trait::async_trait;
use core_types::{OrderConfirmation, OrderIntent, PositionSnapshot, Symbol};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};

/// A broker that places real orders through the Alpaca trading API.
///
/// Whether those orders hit a paper or a live account depends only on the
/// client's base URL.
#[derive(Debug)]
pub struct LiveBroker {
    /// The API client for communicating with Alpaca.
    api_client: ApiClient,

    account_logged: AtomicBool,
}

impl LiveBroker {
    /// Creates a new `LiveBroker`.
    ///
    /// # Arguments
    ///
    /// * `api_client`: An authenticated Alpaca client
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            api_client,
            account_logged: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Broker for LiveBroker {
    fn name(&self) -> &'static str {
        "AlpacaBroker"
    }

    async fn equity(&self) -> Result<Decimal> {
        let account = self.api_client.get_account().await?;
        if !self.account_logged.swap(true, Ordering::Relaxed) {
            tracing::info!(
                account_id = %account.id,
                status = %account.status,
                equity = %account.equity,
                buying_power = %account.buying_power,
                "Connected to brokerage account."
            );
        }
        Ok(account.equity)
    }

    async fn positions(&self) -> Result<Vec<PositionSnapshot>> {
        let positions = self.api_client.list_positions().await?;
        Ok(positions
            .iter()
            .map(|p| PositionSnapshot {
                symbol: Symbol(p.symbol.clone()),
                quantity: p.signed_qty(),
            })
            .collect())
    }

    async fn submit_order(&self, order: &OrderIntent) -> Result<OrderConfirmation> {
        tracing::info!(?order, "Submitting live order...");
        let confirmation = self
            .api_client
            .place_market_order(&order.symbol, order.side, order.quantity)
            .await?;
        Ok(confirmation)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        self.api_client.cancel_order(order_id).await?;
        Ok(())
    }
}
