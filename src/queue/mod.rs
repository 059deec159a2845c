//! Serialized request dispatch
//!
//! Throttles outbound HTTP calls to one in flight at a time with a fixed
//! gap between calls, regardless of caller concurrency.
//!
//! # Features
//!
//! - **FIFO Order**: tasks start in exact submission order
//! - **Pacing**: a configurable delay separates the completion of one task
//!   from the start of the next
//! - **Failure Isolation**: a failing task settles only its own caller

mod serial;

pub use serial::{SerialQueue, DEFAULT_DISPATCH_DELAY};

#[cfg(test)]
mod tests;
