pub mod api;
pub mod builder;
pub mod client;
pub mod events;
pub mod models;
pub mod rest;
pub mod subscriptions;

// Re-export main types for easier importing
pub use builder::{build_connector, build_rest_client, build_ws_client};
pub use client::{AuthTokens, ConnectionState, DeribitWsClient};
pub use events::{EventDispatcher, HandlerId, EVENT_CONNECTED, EVENT_DISCONNECTED};
pub use rest::DeribitRestClient;
pub use subscriptions::{is_private_channel, ChannelPartition, SubscriptionRegistry};
