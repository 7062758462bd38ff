use crate::backend::identity_toolkit::DEFAULT_IDENTITY_URL;
use crate::gateway::DEFAULT_USERS_COLLECTION;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser};
use secrecy::SecretString;

pub const ARG_BACKEND: &str = "backend";
pub const ARG_DSN: &str = "dsn";
pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_IDENTITY_API_KEY: &str = "identity-api-key";
pub const ARG_USERS_COLLECTION: &str = "users-collection";

pub const BACKEND_MANAGED: &str = "managed";
pub const BACKEND_MEMORY: &str = "memory";

/// Where accounts and credentials live.
#[derive(Clone)]
pub enum Backend {
    /// Identity Toolkit REST API plus the Postgres document store.
    Managed {
        dsn: String,
        identity_url: String,
        identity_api_key: SecretString,
    },
    /// Everything in process, lost on restart.
    Memory,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managed {
                dsn, identity_url, ..
            } => f
                .debug_struct("Managed")
                .field("dsn", &redact_dsn(dsn))
                .field("identity_url", identity_url)
                .field("identity_api_key", &"***")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub backend: Backend,
    pub users_collection: String,
}

impl Options {
    /// Parse backend arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the managed backend is selected without its
    /// connection arguments.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let kind = matches
            .get_one::<String>(ARG_BACKEND)
            .map_or(BACKEND_MANAGED, String::as_str);

        let backend = if kind == BACKEND_MEMORY {
            Backend::Memory
        } else {
            Backend::Managed {
                dsn: read_required(matches, ARG_DSN)?,
                identity_url: matches
                    .get_one::<String>(ARG_IDENTITY_URL)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string()),
                identity_api_key: SecretString::from(read_required(
                    matches,
                    ARG_IDENTITY_API_KEY,
                )?),
            }
        };

        let users_collection = matches
            .get_one::<String>(ARG_USERS_COLLECTION)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USERS_COLLECTION.to_string());

        Ok(Self {
            backend,
            users_collection,
        })
    }
}

fn read_required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("missing required argument: --{id}"))
}

/// DSN with the password replaced, for logs.
#[must_use]
pub fn redact_dsn(dsn: &str) -> String {
    match url::Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND)
                .long(ARG_BACKEND)
                .help("Account backend: managed (identity provider + Postgres) or memory")
                .env("ENIREJO_BACKEND")
                .default_value(BACKEND_MANAGED)
                .value_parser(PossibleValuesParser::new([BACKEND_MANAGED, BACKEND_MEMORY])),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Document store connection string (required for managed backend)")
                .env("ENIREJO_DSN"),
        )
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Identity Toolkit base URL, point it at the auth emulator for local runs")
                .env("ENIREJO_IDENTITY_URL")
                .default_value(DEFAULT_IDENTITY_URL),
        )
        .arg(
            Arg::new(ARG_IDENTITY_API_KEY)
                .long(ARG_IDENTITY_API_KEY)
                .help("Identity provider API key (required for managed backend)")
                .env("ENIREJO_IDENTITY_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_USERS_COLLECTION)
                .long(ARG_USERS_COLLECTION)
                .help("Collection holding account records")
                .env("ENIREJO_USERS_COLLECTION")
                .default_value(DEFAULT_USERS_COLLECTION),
        )
}
