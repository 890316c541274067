//! # Accounts
//!
//! E-mail and password accounts on top of the host's [`AuthGateway`].
//!
//! Sign-up creates the back-end account and then the public profile row the
//! rest of the app reads usernames from. Sessions live in the gateway; this
//! crate only validates input and sequences the calls.
//!
//! [`AuthGateway`]: bridge_traits::AuthGateway

pub mod error;
pub mod manager;

pub use error::{AuthError, Result};
pub use manager::{validate_username, AccountManager, SignUpRequest};
