//! # Driving School API Server Library
//!
//! HTTP surface of the driving school: students, tutors and lessons over
//! JSON, behind a bearer-token gate.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with JSON errors
//! - `middleware`: Auth gate and security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
