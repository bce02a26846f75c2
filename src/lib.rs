pub mod config;
pub mod options;
pub mod service;
pub mod version;
