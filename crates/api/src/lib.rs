//! Handset catalog API library.
//!
//! Bearer-authenticated REST API over a phone catalog and customer-owned
//! sub-accounts. Exposed as a library so the router can be driven
//! in-process by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
