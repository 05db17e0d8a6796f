//! # Turnstile (Count-Limited Session Gateway)
//!
//! `turnstile` ships three cooperating HTTP services in one binary:
//!
//! - **auth**: registers accounts, logs users in and owns the session token
//!   registry. Every token may be validated a fixed number of times (5 by
//!   default); the validation that brings the counter to zero still succeeds,
//!   but the token is evicted in the same step and its cookie is cleared.
//! - **gateway**: the only client-facing entry point for data. Every protected
//!   call is validated against `auth` first and, only on success, forwarded to
//!   `backend`.
//! - **backend**: serves the data collections (`character`, `location`,
//!   `episode`) and refuses any request that does not carry the gateway's
//!   internal provenance header.
//!
//! ## Token Registry
//!
//! The registry is a sharded concurrent map. Decrement and eviction happen
//! while holding the entry's shard lock, so concurrent validations of the same
//! token observe a strictly decreasing sequence of counts and only one caller
//! ever sees zero. Tokens that are issued but never exhausted are removed by a
//! periodic sweep once their absolute expiry passes.
//!
//! ## Response Envelope
//!
//! Every endpoint answers with `{"status": "success"|"error", "message": ..., "data": ...}`.

pub mod auth;
pub mod backend;
pub mod cli;
pub mod cookie;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod health;
pub mod resource;
pub mod server;
pub mod tokens;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Common prefix of every credential and data route.
pub const API_PREFIX: &str = "/api/v1";
