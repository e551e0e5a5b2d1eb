//! Core types and trait definitions for the Medala health record store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::EventStore`]; everything above that
//! (namespacing, typed records, aggregation) lives here.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod record;
pub mod records;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
