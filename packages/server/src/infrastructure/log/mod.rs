//! Message Log implementations.
//!
//! The domain layer defines the `MessageLog` trait; this module provides the
//! authoritative server-side implementation.

pub mod inmemory;

pub use inmemory::InMemoryMessageLog;
