//! # Authgate (credential authentication and permission gating)
//!
//! `authgate` authenticates callers against two credential backends and
//! authorizes them against a group/scope permission model.
//!
//! ## Authentication
//!
//! Username/password pairs are checked against a static local credential table
//! first. A local match always wins, even when the same username exists at the
//! identity provider. Anything else falls through to the remote identity
//! provider, which may answer with a step-up challenge. The only supported
//! step-up factor is an out-of-band push approval, polled at a fixed interval
//! until it resolves, the provider reports a timeout, or the local deadline
//! elapses.
//!
//! Bearer tokens bypass the state machine entirely: a [`token::TokenVerifier`]
//! turns them into token identities carrying their scopes.
//!
//! ## Authorization
//!
//! - **Group identities** (local or remote) hold a permission when they are a
//!   member of the group mapped to it.
//! - **Token identities** hold a permission when their scopes contain it verbatim.
//! - Unmapped permissions are never granted.

pub mod authenticator;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod identity;
pub mod mfa;
pub mod permissions;
pub mod remote;
pub mod service;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
