//! Client for the external long-running video generation service.
//!
//! [`api::GenAiApi`] wraps the service's REST endpoints. [`jobs`] holds the
//! trusted-side operations (submit, refresh, open artifact) that attach the
//! server credential and enforce the checks that must happen before any
//! outbound call.

pub mod api;
pub mod config;
pub mod jobs;
pub mod wire;
