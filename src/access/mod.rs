//! Access resolution for documents and projects.
//!
//! View access is held by the uploader, share recipients, the project's
//! manager and members, and administrators. Manage access is strictly
//! narrower: uploader, project manager, administrator.

mod resolver;

pub use resolver::{AccessGrant, AccessResolver, Actor, DocumentFacts};
