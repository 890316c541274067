//! # Host Bridge Traits
//!
//! Contracts between the fan-app core and the outside world.
//!
//! ## Overview
//!
//! The core never talks to a back end directly. Every capability it needs is
//! expressed here as a trait, and each host (desktop shell, mobile shell, test
//! harness) supplies an implementation:
//!
//! ### Back end
//! - [`RemoteTableClient`](remote::RemoteTableClient) - Filtered row reads, inserts and
//!   deletes against named tables, blob uploads, and resolution of the signed-in user
//! - [`AuthGateway`](remote::AuthGateway) - Sign-up, sign-in and sign-out
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP used by HTTP-backed providers
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should:
//!
//! - Map "no session" conditions to `BridgeError::Unauthorized`
//! - Map storage failures to `BridgeError::Upload`
//! - Keep the remote status code in `BridgeError::Remote` when one exists
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared across async tasks behind an `Arc`.
//!
//! ## Examples
//!
//! ```ignore
//! use bridge_traits::remote::{Filter, RemoteTableClient, SelectQuery};
//!
//! async fn favorites(client: &dyn RemoteTableClient, user_id: &str) -> bridge_traits::error::Result<usize> {
//!     let query = SelectQuery::new("user_favorites").filter(Filter::eq("user_id", user_id));
//!     Ok(client.select(query).await?.len())
//! }
//! ```

pub mod error;
pub mod http;
pub mod remote;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use remote::{
    AuthGateway, AuthUser, Filter, FilterOp, OrderBy, RemoteTableClient, Row, SelectQuery,
};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
