//! Tubely database layer
//!
//! Postgres-backed metadata store for video records.

pub mod db;

pub use db::{VideoRepository, VideoStore};
