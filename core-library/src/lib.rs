//! # Library Module
//!
//! Keeps the in-memory views of a fan's favorites, an artist's merchandise
//! and a user's orders consistent with the remote store.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models decoded from back-end rows
//! - Versioned snapshots ([`FavoriteSet`], [`Catalog`], [`OrderHistory`])
//! - Repositories for favorites, artist suggestions, the merchandise catalog,
//!   order history and profiles
//!
//! Every operation is pull-on-demand or push-on-mutation: it issues its
//! remote calls and returns a fresh snapshot. Nothing runs in the background
//! and nothing is retried.

pub mod error;
pub mod models;
pub mod repositories;
pub mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{LibraryError, Result};
pub use snapshot::{Catalog, FavoriteSet, OrderHistory, Revision, RevisionCounter, Versioned};
