//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux) and for command-line tooling.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`, consumed by HTTP-backed providers such as
//!   `provider-supabase`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use provider_supabase::{SupabaseClient, SupabaseConfig};
//! use std::sync::Arc;
//!
//! let http = Arc::new(ReqwestHttpClient::new()?);
//! let client = SupabaseClient::new(http, SupabaseConfig::new(url, anon_key)?);
//! ```

mod http;

pub use http::ReqwestHttpClient;
