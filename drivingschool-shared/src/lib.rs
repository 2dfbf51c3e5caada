//! # Driving School Shared Library
//!
//! Domain types and business rules behind the driving school API.
//!
//! ## Module Organization
//!
//! - `models`: Students, tutors and lessons with their PostgreSQL queries
//! - `store`: The `Store` trait with PostgreSQL and in-memory backends
//! - `services`: The `School` facade holding scheduling, validation and
//!   certificate rules
//! - `auth`: Password hashing, JWT tokens, authenticated caller context
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
