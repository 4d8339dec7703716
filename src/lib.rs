//! Coursify Backend Library
//!
//! Course platform API: account registration and approval, token
//! authentication, and course/material/enrollment management over SQLite.
//! The binaries (`coursify`, `seeder`) and the integration tests build on
//! the modules exported here.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

pub use api::{create_router, AppState};
pub use config::Config;
