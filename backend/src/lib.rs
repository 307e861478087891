//! # Stable Welfare Backend
//!
//! Scheduling and welfare tracking for an equestrian stable: horses, riders,
//! trainers, stable hands, ride bookings and post-training feeding tasks.
//!
//! The heart of the crate is the welfare validator in
//! [`services::welfare`], which decides whether a ride may be booked given a
//! horse's daily workload cap, its mandatory rest after long stretches of
//! work, and the rule that a horse rides in one session at a time.
//!
//! ## Architecture
//!
//! - [`models`]: domain types and time-of-day arithmetic
//! - [`db`]: repository traits, the in-memory store and CRUD services
//! - [`services`]: welfare validation, booking and feeding workflows
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
