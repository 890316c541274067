//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `fanhub-workspace` and
//! enable `desktop` to get the Supabase-backed [`core_service::CoreService`]
//! bootstrap without wiring each crate individually.

#[cfg(feature = "core")]
pub use core_service;
