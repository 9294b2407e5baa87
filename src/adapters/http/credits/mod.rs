//! HTTP adapter for read-only credit queries.

pub mod handlers;
pub mod routes;

pub use routes::credit_routes;
