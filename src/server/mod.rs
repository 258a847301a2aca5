//! Single-threaded connection server.
//!
//! Connections are serviced one at a time: the listener is not polled for
//! the next client until the current one is closed, so additional clients
//! wait in the OS accept backlog.

pub mod connection;
pub mod handshake;
pub mod request;
pub mod response;
pub mod static_files;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::json::JsonLayout;
use crate::system::collector::Sampler;
use handshake::PushFraming;
use static_files::StaticFiles;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub push_interval: Duration,
    pub read_timeout: Option<Duration>,
    pub layout: JsonLayout,
    pub framing: PushFraming,
    pub static_files: StaticFiles,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        ServerOptions {
            push_interval: Duration::from_millis(config.push_interval_ms.max(1)),
            read_timeout: (config.read_timeout_ms > 0)
                .then(|| Duration::from_millis(config.read_timeout_ms)),
            layout: JsonLayout::from_str_config(&config.json_layout),
            framing: PushFraming::from_str_config(&config.push_framing),
            static_files: StaticFiles::new(&config.static_root, config.index_file.clone()),
        }
    }
}

pub struct Server<S> {
    listener: TcpListener,
    sampler: S,
    options: ServerOptions,
}

impl<S: Sampler> Server<S> {
    /// Bind the listening socket. Failure here is fatal for the process.
    pub async fn bind(host: &str, port: u16, sampler: S, options: ServerOptions) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .wrap_err_with(|| format!("failed to listen on {host}:{port}"))?;
        Ok(Server {
            listener,
            sampler,
            options,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .wrap_err("listener has no local address")
    }

    /// Serve until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "unable to listen for Ctrl+C, serving until killed");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves, abandoning any connection in flight.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, "server listening");
        }

        tokio::pin!(shutdown);
        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };
            debug!(%peer, "client connected");

            tokio::select! {
                _ = &mut shutdown => break,
                served = connection::serve(stream, &mut self.sampler, &self.options) => {
                    if let Err(err) = served {
                        debug!(%peer, error = %err, "connection ended with error");
                    }
                    debug!(%peer, "connection closed");
                }
            }
        }

        info!("shutting down");
        Ok(())
    }
}
