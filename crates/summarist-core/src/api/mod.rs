//! Read-only client for the book catalog API.
//!
//! `BookApi` is the seam the rest of the core depends on; `ApiClient` is the
//! HTTP implementation. Tests substitute scripted implementations.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

use std::future::Future;

use futures::future::join_all;

use crate::models::{Book, BookStatus, BookSummary};

/// Book lookup operations the core needs from the remote catalog.
pub trait BookApi: Send + Sync {
    /// Fetch one full record. `ApiError::NotFound` when the id is unknown.
    fn fetch_book(&self, id: &str) -> impl Future<Output = Result<Book, ApiError>> + Send;

    /// Books whose title or author matches `text`.
    fn search_books(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<BookSummary>, ApiError>> + Send;

    /// Books on one of the home shelves.
    fn fetch_books(
        &self,
        status: BookStatus,
    ) -> impl Future<Output = Result<Vec<Book>, ApiError>> + Send;
}

/// Fetch every home shelf concurrently. Each shelf settles independently so
/// one failing endpoint does not blank the others.
pub async fn fetch_shelves<A: BookApi>(api: &A) -> Vec<(BookStatus, Result<Vec<Book>, ApiError>)> {
    let results = join_all(BookStatus::ALL.iter().map(|status| api.fetch_books(*status))).await;
    BookStatus::ALL.into_iter().zip(results).collect()
}
