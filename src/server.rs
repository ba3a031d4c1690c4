//! HTTP and HTTPS listeners.
//!
//! Plain HTTP is always served. HTTPS is served alongside it when a
//! certificate and key are configured; if either file is missing the HTTPS
//! listener is skipped with an error and HTTP keeps running.

use crate::config::ServerConfig;
use crate::error::LoadError;
use crate::routes::RouteTable;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Stub server bound to a loaded route table.
pub struct StubServer {
    config: ServerConfig,
    routes: RouteTable,
}

impl StubServer {
    /// Build the route table from the configured data directory.
    pub fn new(config: ServerConfig) -> Result<Self, LoadError> {
        let routes = RouteTable::build(&config.data_dir)?;
        Ok(Self { config, routes })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Axum router serving every bound route.
    pub fn router(&self) -> Router {
        self.routes.clone().into_router(self.config.body_limit)
    }

    /// Serve until Ctrl+C.
    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let handle = Handle::new();

        if let (Some(cert), Some(key)) = (&self.config.tls_cert, &self.config.tls_key) {
            let addr = SocketAddr::from(([0, 0, 0, 0], self.config.tls_port));
            match load_tls(cert, key).await {
                Ok(tls) => {
                    info!(port = self.config.tls_port, "HTTPS listening");
                    let app = app.clone();
                    let handle = handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = axum_server::bind_rustls(addr, tls)
                            .handle(handle)
                            .serve(app.into_make_service())
                            .await
                        {
                            error!(error = %e, "HTTPS server failed");
                        }
                    });
                }
                Err(e) => error!(error = %e, "HTTPS disabled"),
            }
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        info!(port = self.config.http_port, "HTTP listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(handle))
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// Load the TLS certificate and key, checking both files exist first.
pub async fn load_tls(cert: &Path, key: &Path) -> anyhow::Result<RustlsConfig> {
    if !cert.exists() {
        anyhow::bail!("unable to access TLS cert file {}", cert.display());
    }
    if !key.exists() {
        anyhow::bail!("unable to access TLS key file {}", key.display());
    }
    Ok(RustlsConfig::from_pem_file(cert, key).await?)
}

/// Wait for Ctrl+C, then drain the HTTPS listener too.
async fn shutdown_signal(tls: Handle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    tls.graceful_shutdown(Some(Duration::from_secs(10)));
}
