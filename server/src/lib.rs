//! Polls Server
//!
//! Create polls, vote and view results, with email/password accounts and a
//! brute force guard on sign-in and sign-up.

pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod polls;
pub mod ratelimit;

#[cfg(test)]
mod redis_tests;
