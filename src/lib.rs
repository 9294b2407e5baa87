//! Guide Ledger - credit accounting for hosted guest guides
//!
//! Owners buy credits through a payment provider; each active workspace then
//! burns credits on a fixed interval until the balance runs out and the
//! account is suspended. Email delivery statuses are recorded alongside as an
//! append-only timeline.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
