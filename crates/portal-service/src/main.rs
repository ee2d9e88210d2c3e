//! Main entry point for the portal backend.
//!
//! Loads the configuration, wires the configured storage, auth and image
//! implementations into a portal engine, and serves the page, image and
//! health routes over HTTP.

use clap::Parser;
use portal_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod inertia;
mod middleware;
mod server;

/// Command-line arguments for the portal service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/portal.toml", env = "PORTAL_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started portal");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.portal.id);

	let portal = factory_registry::build_portal_from_config(config)?;
	server::start_server(Arc::new(portal)).await?;

	tracing::info!("Stopped portal");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_defaults() {
		let args = Args::try_parse_from(["portal"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config/portal.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args =
			Args::try_parse_from(["portal", "--config", "custom.toml", "-l", "debug"]).unwrap();
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}
}
