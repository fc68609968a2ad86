//! Shared Types

pub mod poll;

pub use poll::*;
