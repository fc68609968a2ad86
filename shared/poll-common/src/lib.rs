//! Poll Common Library
//!
//! Shared poll types, draft validation and vote tallying used by the server
//! and its tests. Nothing in this crate performs I/O.

pub mod draft;
pub mod error;
pub mod tally;
pub mod types;

pub use draft::PollDraft;
pub use error::{DraftErrors, ValidationError};
pub use tally::{percentage, tally};
pub use types::*;
