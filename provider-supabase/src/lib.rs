//! # Supabase Provider
//!
//! Implements `RemoteTableClient` and `AuthGateway` against a Supabase
//! project (PostgREST tables, GoTrue auth, Storage buckets).
//!
//! ## Overview
//!
//! This module provides:
//! - Filtered table reads, inserts and deletes over the PostgREST REST API
//! - Email/password sign-up, sign-in and sign-out against GoTrue
//! - Blob uploads to Storage buckets and public URL resolution
//! - An in-memory session (no persistence) whose access token authorises
//!   every request
//!
//! Requests are sent exactly once. Failures surface to the caller, which
//! decides whether the user re-invokes the action.

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

pub use client::SupabaseClient;
pub use config::SupabaseConfig;
pub use error::{Result, SupabaseError};
