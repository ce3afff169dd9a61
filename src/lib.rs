pub mod core;
pub mod exchanges;

pub use core::{config::DeribitConfig, errors::ExchangeError, kernel::Event};
pub use exchanges::deribit::{
    ConnectionState, DeribitRestClient, DeribitWsClient, EventDispatcher, HandlerId,
};
