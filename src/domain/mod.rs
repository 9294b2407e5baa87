//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `webhook` - Signature verification and webhook error taxonomy
//! - `ledger` - Credit accounts, transactions, purchases and the decay calculator
//! - `payment` - Payment provider event parsing
//! - `delivery` - Email delivery-status events

pub mod delivery;
pub mod foundation;
pub mod ledger;
pub mod payment;
pub mod webhook;
