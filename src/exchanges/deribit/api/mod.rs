//! Typed request/response methods of [`DeribitWsClient`](super::DeribitWsClient)
//!
//! Each submodule adds an `impl DeribitWsClient` block for one capability
//! area. The methods are thin: they pick the JSON-RPC method name, serialize
//! the params and decode the result. `private/` methods get the access token
//! from the client, callers never pass it.
mod account;
mod authentication;
mod market;
mod session;
mod subscription;
mod supporting;
mod trading;
mod wallet;
