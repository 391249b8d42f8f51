// In crates/execution/src/simulated.rs

use crate::{Broker, Error, Result};
use async_trait::async_trait;
use core_types::{OrderConfirmation, OrderIntent, PositionSnapshot, Side, Symbol};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Book {
    equity: Decimal,
    positions: HashMap<Symbol, Decimal>,
    orders: Vec<OrderConfirmation>,
    next_id: u64,
    reject_orders: bool,
    fail_queries: bool,
}

/// An in-memory broker for paper runs and tests.
///
/// Orders fill instantly at no cost. Positions are tracked per symbol so a
/// controller reading them back sees the effect of its own orders. Equity is
/// whatever was last set; fills do not move it.
#[derive(Debug)]
pub struct SimulatedBroker {
    book: Mutex<Book>,
}

impl SimulatedBroker {
    pub fn new(equity: Decimal) -> Self {
        Self {
            book: Mutex::new(Book {
                equity,
                ..Book::default()
            }),
        }
    }

    /// Seeds an open position. A negative quantity is a short.
    pub fn with_position(self, symbol: Symbol, quantity: Decimal) -> Self {
        self.book().positions.insert(symbol, quantity);
        self
    }

    pub fn set_equity(&self, equity: Decimal) {
        self.book().equity = equity;
    }

    /// Makes every subsequent `submit_order` fail.
    pub fn reject_orders(&self, reject: bool) {
        self.book().reject_orders = reject;
    }

    /// Makes every subsequent equity and position query fail.
    pub fn fail_queries(&self, fail: bool) {
        self.book().fail_queries = fail;
    }

    /// Every order confirmed so far, oldest first.
    pub fn submitted_orders(&self) -> Vec<OrderConfirmation> {
        self.book().orders.clone()
    }

    fn book(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_queries(book: &Book) -> Result<()> {
        if book.fail_queries {
            return Err(Error::BrokerUnavailable {
                reason: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Broker for SimulatedBroker {
    fn name(&self) -> &'static str {
        "SimulatedBroker"
    }

    async fn equity(&self) -> Result<Decimal> {
        let book = self.book();
        Self::check_queries(&book)?;
        Ok(book.equity)
    }

    async fn positions(&self) -> Result<Vec<PositionSnapshot>> {
        let book = self.book();
        Self::check_queries(&book)?;
        Ok(book
            .positions
            .iter()
            .filter(|(_, qty)| !qty.is_zero())
            .map(|(symbol, qty)| PositionSnapshot {
                symbol: symbol.clone(),
                quantity: *qty,
            })
            .collect())
    }

    async fn submit_order(&self, order: &OrderIntent) -> Result<OrderConfirmation> {
        let mut book = self.book();
        if book.reject_orders {
            return Err(Error::OrderRejected {
                reason: "simulated rejection".to_string(),
            });
        }
        if order.quantity == 0 {
            return Err(Error::OrderRejected {
                reason: "quantity must be positive".to_string(),
            });
        }

        let delta = Decimal::from(order.quantity);
        let held = book.positions.entry(order.symbol.clone()).or_default();
        match order.side {
            Side::Buy => *held += delta,
            Side::Sell => *held -= delta,
        }

        book.next_id += 1;
        let confirmation = OrderConfirmation {
            id: format!("sim-{}", book.next_id),
            symbol: order.symbol.clone(),
            quantity: order.quantity,
            side: order.side,
            status: "filled".to_string(),
        };
        book.orders.push(confirmation.clone());
        tracing::info!(order_id = %confirmation.id, side = %order.side, quantity = order.quantity, symbol = %order.symbol, "Simulated fill.");
        Ok(confirmation)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        // Fills are instant, so there is never anything open to cancel.
        let book = self.book();
        if book.orders.iter().any(|o| o.id == order_id) {
            return Err(Error::OrderRejected {
                reason: format!("order {order_id} is already filled"),
            });
        }
        Err(Error::UnknownOrder(order_id.to_string()))
    }
}
