//! Maps validated CLI arguments to the server action.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_ALLOWED_ORIGIN, ARG_PORT, backend};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);
    let allowed_origin = matches
        .get_one::<String>(ARG_ALLOWED_ORIGIN)
        .cloned()
        .context("missing required argument: --allowed-origin")?;

    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let backend_opts = backend::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        allowed_origin,
        backend: backend_opts.backend,
        users_collection: backend_opts.users_collection,
    }))
}
