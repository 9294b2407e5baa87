//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes for webhooks and credit queries
//! - `postgres` - PostgreSQL-backed ports
//! - `memory` - In-memory ports for tests and local runs
//! - `scheduler` - Background decay sweep

pub mod http;
pub mod memory;
pub mod postgres;
pub mod scheduler;

pub use memory::{InMemoryDeliveryEvents, InMemoryLedger};
pub use scheduler::{DecaySweeper, DecaySweeperConfig};
