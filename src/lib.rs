//! bc2relay Library
//!
//! A transparent TCP relay for the Battlefield: Bad Company 2 remote admin
//! protocol. Bytes pass through unmodified in both directions while every
//! complete protocol packet is decoded and printed for debugging.

pub mod config;
pub mod connection;
pub mod protocol;
pub mod relay;
pub mod shutdown;

pub use config::Config;
pub use connection::ConnectionManager;

/// Common error type for the relay
pub type Result<T> = anyhow::Result<T>;
