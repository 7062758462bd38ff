//! Route handlers for the account gateway.
//!
//! Handlers only translate HTTP to [`crate::gateway::AccountGateway`] calls and
//! back; validation and backend sequencing live in the gateway.

pub mod health;
pub mod login;
pub mod signup;
