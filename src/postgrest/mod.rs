//! REST access to the hosted database.
//!
//! Mirrors the subset of the PostgREST surface the site uses: table
//! reads with filters/ordering, insert, upsert, update, delete and RPC.

pub mod client;

pub use client::{ApiResult, Query, RestClient};
