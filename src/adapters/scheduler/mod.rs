//! In-process scheduling.

mod decay_sweeper;

pub use decay_sweeper::{DecaySweeper, DecaySweeperConfig};
