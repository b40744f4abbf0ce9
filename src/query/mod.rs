//! Filtered, sorted, access-scoped document listings.
//!
//! A [`Catalog`] is a snapshot of the repository joined with the project
//! and user facts listings need. [`ListingEngine`] scopes it to what an
//! actor may view, applies a [`DocumentQuery`] and caps the result.

mod catalog;
mod filter;

pub use catalog::{Catalog, ListingEngine};
pub use filter::{DocumentQuery, DocumentSort, SortDirection, SortKey};
