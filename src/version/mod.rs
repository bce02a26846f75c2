//! Version metadata layer for CPython release tracking
//!
//! This module provides the core functionality for fetching upstream feeds,
//! resolving them into version records, and persisting the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Sources   │────▶│  Resolver   │────▶│    Store    │
//! │ (tags, eol) │     │ (merge)     │     │  (sqlite)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   GitHub    │
//! │ endoflife   │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`store`]: SQLite-based record store keyed by release name
//! - [`resolver`]: Latest-per-series selection and status assignment
//! - [`source`]: Traits for the tag and end-of-life feeds
//! - [`sources`]: Concrete feed clients (GitHub refs, endoflife.date)
//! - [`error`]: Error types for store, source and refresh operations
//! - [`types`]: `VersionRecord` and its enumerations

pub mod error;
pub mod resolver;
pub mod source;
pub mod sources;
pub mod store;
pub mod types;
