//! Database repositories for data access layer
//!
//! Each repository owns the queries for one table and is exposed to the rest of the
//! workspace through a trait so handlers and the upload pipeline can run against
//! an in-memory store in tests.

pub mod video;

pub use video::{VideoRepository, VideoStore};
