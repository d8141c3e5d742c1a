//! # Restaurant Shared Library
//!
//! Types and business logic shared by the restaurant API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, session tokens, `token` header middleware
//! - `store`: document store trait with PostgreSQL and in-memory backends
//! - `db`: PostgreSQL pool and migrations backing the document store
//! - `models`: users, orders and tables

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the restaurant shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
