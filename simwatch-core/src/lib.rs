//! # Simwatch Core
//!
//! Core library for the simwatch admin backend, providing revocable
//! credential tracking and supervised execution of external simulation jobs
//! with live log relay.
//!
//! ## Overview
//!
//! `simwatch-core` is transport-agnostic: nothing in here knows about HTTP
//! or WebSockets. The serving layer wires these pieces together:
//!
//! - **Revocation Cache**: in-memory, concurrency-safe tracking of token
//!   identifiers that were logged out before their natural expiry
//! - **Token Service**: issues signed bearer tokens and resolves presented
//!   ones into a single [`auth::AuthOutcome`] covering every failure mode
//! - **Job Supervisor**: spawns one external process per session, relays
//!   its output line by line to a session-scoped sink, and always finishes
//!   the stream with exactly one terminal event
//!
//! ## Architecture
//!
//! The crate is organized into two modules:
//!
//! - [`auth`]: credential issuance, resolution, and revocation
//! - [`jobs`]: job lifecycle, event model, and process supervision

pub mod auth;
pub mod jobs;

pub use auth::{
    AuthError, AuthOutcome, Claims, IssuedToken, OperatorIdentity, RevocationCache, TokenService,
};
pub use jobs::{
    JobConfig, JobError, JobEvent, JobEventSink, JobState, JobSupervisor, RunnerConfig,
};
