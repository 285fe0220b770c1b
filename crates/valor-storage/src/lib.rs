//! valor-storage
//!
//! Session bookkeeping: the bounded in-memory session store and the
//! snapshot persistence port used to survive restarts.

pub mod error;
pub mod flush;
pub mod snapshot;
pub mod store;
