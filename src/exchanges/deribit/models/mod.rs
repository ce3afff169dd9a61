pub mod account;
pub mod auth;
pub mod market;
pub mod session;
pub mod trading;
pub mod wallet;

pub use account::*;
pub use auth::*;
pub use market::*;
pub use session::*;
pub use trading::*;
pub use wallet::*;
