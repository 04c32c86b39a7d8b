//! fbsql-session - connection string inspector.
//!
//! Prints the connection string and driver property list a session would hand
//! to the Firebird driver for the given flags, environment or DSN.

use clap::Parser;
use fbsql_session::config::Config;
use fbsql_session::db::connection_string::{
    ConnectionProperties, PROP_PASSWORD, build_connection_string, driver_properties,
    effective_properties,
};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let settings = match config.connection_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid connection settings");
            return Err(e.into());
        }
    };
    debug!(
        host = %settings.host,
        port = settings.port,
        connection_type = %settings.connection_type,
        "Resolved connection settings"
    );

    let options = effective_properties(&settings, &ConnectionProperties::new());
    let mut properties = driver_properties(&settings, &options);
    properties.set(PROP_PASSWORD, "********");

    let output = serde_json::json!({
        "connection_string": build_connection_string(&settings, &options),
        "connection_type": settings.connection_type,
        "query_timeout_secs": settings.query_timeout,
        "properties": properties,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
