//! Domain types and pure logic for the video generation relay.
//!
//! Nothing in this crate performs I/O. The generation service client lives
//! in `vidgen-genai`, the credential-holding edge server in `vidgen-api`,
//! and the caller-side orchestration in `vidgen-client`.

pub mod classify;
pub mod credential;
pub mod error;
pub mod generation;
pub mod operation;
pub mod polling;
