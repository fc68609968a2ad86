//! Rate limiting module for protecting authentication against brute force.
//!
//! Counts sign-in and sign-up attempts per email inside a lockout window.
//! Records live in an in-process map by default, or in Redis when several
//! server instances share the limit.

pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod memory;
pub mod redis;
pub mod store;
pub mod types;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use limiter::*;
pub use memory::*;
pub use redis::*;
pub use store::*;
pub use types::*;
