//! Background expiration (feature `service`).
//!
//! [`Ticker`] is a generic repeating timer on its own thread;
//! [`ExpiryService`] uses one to call `expire` on a shared cache.

pub mod expiry;
pub mod ticker;

pub use expiry::{EvictCallback, ExpiryConfig, ExpiryService};
pub use ticker::Ticker;
