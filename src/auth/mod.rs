//! Session storage and token refresh
//!
//! The `SessionStore` is the single mutable slot holding the current bearer
//! token. The `TokenRefresher` repairs an expired session by posting to the
//! refresh endpoint on a bare transport; the `RefreshGate` guarantees at
//! most one refresh runs at a time, with every other caller waiting on the
//! same outcome.

mod refresher;
mod session;

pub use refresher::{RefreshFailure, TokenRefresher};
pub use session::{NullObserver, SessionObserver, SessionStore, SessionToken};

pub(crate) use refresher::{RefreshGate, RefreshOutcome, RefreshTicket};

#[cfg(test)]
mod tests;
