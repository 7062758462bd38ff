//! # Enirejo (Account Gateway)
//!
//! `enirejo` is a thin account gateway in front of a managed identity provider
//! and a document store. It exposes two endpoints:
//!
//! - **`POST /signup`**: validates the request, checks the document store for an
//!   existing account with the same email, asks the identity provider for a new
//!   credential and stores an account record (`email`, `role`, `createdAt`) under
//!   the provider-issued uid.
//! - **`POST /login`**: looks up the account by email and returns its role.
//!
//! ## Backends
//!
//! The gateway only talks to the [`backend::IdentityProvider`] and
//! [`backend::DocumentStore`] traits. The managed deployment uses the Identity
//! Toolkit REST API and a Postgres `JSONB` document table; the `memory` backend
//! keeps everything in-process for local development and tests.
//!
//! ## Known gaps
//!
//! - **Uniqueness is a pre-check.** Two concurrent signups for the same email can
//!   both pass the lookup before either writes its record.
//! - **Login does not verify passwords.** The presence of the email is enough to
//!   return the stored role.
//! - **No compensation.** If the record write fails after the credential was
//!   created, the credential is left behind in the identity provider.

pub mod api;
pub mod backend;
pub mod cli;
pub mod gateway;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
