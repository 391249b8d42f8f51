// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API client error: {0}")]
    ApiClientError(#[from] api_client::Error),

    #[error("Broker unavailable: {reason}")]
    BrokerUnavailable { reason: String },

    #[error("Order rejected: {reason}")]
    OrderRejected { reason: String },

    #[error("Unknown order id: {0}")]
    UnknownOrder(String),

    /// The broker accepted the order but the trade could not be counted.
    #[error("Order {order_id} was placed but not recorded in the risk state: {source}")]
    UnrecordedTrade {
        order_id: String,
        #[source]
        source: risk::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
