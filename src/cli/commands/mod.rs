pub mod backend;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

use self::backend::{ARG_BACKEND, ARG_DSN, ARG_IDENTITY_API_KEY, BACKEND_MEMORY};

pub const ARG_PORT: &str = "port";
pub const ARG_ALLOWED_ORIGIN: &str = "allowed-origin";

/// Validate that the managed backend has what it needs to connect.
///
/// # Errors
/// Returns an error string if the managed backend is selected but the DSN or
/// the identity provider key is missing.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let backend = matches.get_one::<String>(ARG_BACKEND).map(String::as_str);

    if backend == Some(BACKEND_MEMORY) {
        return Ok(());
    }

    for required in [ARG_DSN, ARG_IDENTITY_API_KEY] {
        let present = matches
            .get_one::<String>(required)
            .is_some_and(|value| !value.trim().is_empty());

        if !present {
            return Err(format!(
                "Missing required argument: --{required} (required for managed backend)"
            ));
        }
    }

    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("enirejo")
        .about("Account gateway for signup and login")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("5000")
                .env("ENIREJO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ALLOWED_ORIGIN)
                .long(ARG_ALLOWED_ORIGIN)
                .help("Only origin allowed to call the API (credentials allowed)")
                .env("ENIREJO_ALLOWED_ORIGIN")
                .default_value("http://localhost:3000"),
        );

    let command = backend::with_args(command);
    logging::with_args(command)
}
