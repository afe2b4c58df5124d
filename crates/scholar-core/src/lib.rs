//! Core types and trait definitions for the scholar portal.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

pub mod access;
pub mod dates;
pub mod document;
pub mod error;
pub mod forum;
pub mod publication;
pub mod scholar;
pub mod session;
pub mod store;
pub mod upcoming;
pub mod user;

pub use error::{Error, Result};
