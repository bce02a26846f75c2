//! Service layer driving the version records
//!
//! # Modules
//!
//! - [`refresh`]: One fetch → resolve → store cycle and the staleness rule
//! - [`scheduler`]: Daily background refresh owned by the process lifecycle
//! - [`facade`]: Read path that refreshes missing or stale data on demand
//! - [`server`]: Logging setup, component wiring and the serve loop

pub mod facade;
pub mod refresh;
pub mod scheduler;
pub mod server;
