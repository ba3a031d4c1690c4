//! Stuber - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use stuber::config::{ConfigOverrides, ServerConfig};
use stuber::StubServer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "stuber",
    about = "Configurable stubbing tool meant to provide mocked stub services, typically for testing",
    version
)]
struct Args {
    /// Optional path to a YAML config file
    #[arg(short = 'c', long, visible_aliases = ["cfg", "config"])]
    config_file: Option<PathBuf>,

    /// HTTP port to listen on
    #[arg(long, env = "STUBER_HTTP_PORT")]
    http_port: Option<u16>,

    /// HTTPS port to listen on
    #[arg(long, env = "STUBER_HTTPS_PORT")]
    tls_port: Option<u16>,

    /// TLS certificate file for HTTPS
    #[arg(long, env = "STUBER_TLS_CERT")]
    tls_cert: Option<PathBuf>,

    /// TLS key file for HTTPS
    #[arg(long, env = "STUBER_TLS_KEY")]
    tls_key: Option<PathBuf>,

    /// Data directory for stub JSON files
    #[arg(short = 'd', long, visible_aliases = ["dir", "data"], env = "STUBER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Load the fixture files and exit
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            http_port: self.http_port,
            tls_port: self.tls_port,
            tls_cert: self.tls_cert.clone(),
            tls_key: self.tls_key.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config_file {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            ServerConfig::from_file(path)?
        }
        None => ServerConfig::default(),
    }
    .merge(args.overrides());
    config.validate()?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let server = match StubServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Unable to load routes");
            return Err(e.into());
        }
    };

    if args.validate {
        println!(
            "Fixtures are valid ({} routes defined)",
            server.routes().len()
        );
        for (route, file) in server.routes().routes() {
            println!("  {} -> {}", route, file.display());
        }
        return Ok(());
    }

    server.run().await
}
