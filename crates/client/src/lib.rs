//! `vidgen-client` library crate.
//!
//! Caller-side orchestration against the edge server: submit a job, poll it
//! to a terminal state, and pull every artifact to disk. The `vidgen` binary
//! in `main.rs` is a thin CLI over [`pipeline::generate_video`].

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod retriever;
