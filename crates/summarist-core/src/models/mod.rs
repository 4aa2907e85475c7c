//! Data models for the book catalog.
//!
//! - `Book`: full record returned by the book lookup endpoint
//! - `BookSummary`: the projection returned by text search
//! - `BookStatus`: which home shelf a book belongs to

pub mod book;

pub use book::{Book, BookStatus, BookSummary};
