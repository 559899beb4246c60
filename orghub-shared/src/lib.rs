//! # OrgHub Shared Library
//!
//! Domain types, persistence and authentication shared by the OrgHub API.
//!
//! ## Module Organization
//!
//! - `models`: Users, organizations and memberships with their SQL operations
//! - `db`: Connection pool, startup retry and migrations
//! - `store`: The `Store` trait with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, JWTs, bearer parsing and organization checks

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the OrgHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
