use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use stepwise_http::connection::HttpConnection;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::{ConfigError, ServerConfig};
use crate::dispatcher::{Dispatcher, Resources};
use crate::resource::ResourceHandler;

#[derive(Debug)]
pub struct ServerBuilder {
    resources: Resources,
    address: Option<Vec<SocketAddr>>,
    config: ServerConfig,
    error: Option<ServerBuildError>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { resources: Resources::new(), address: None, config: ServerConfig::default(), error: None }
    }

    #[must_use]
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        match address.to_socket_addrs() {
            Ok(addresses) => self.address = Some(addresses.collect()),
            Err(source) => self.error = Some(ServerBuildError::InvalidAddress { source }),
        }
        self
    }

    #[must_use]
    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    #[must_use]
    pub fn resource(mut self, resource: impl ResourceHandler + 'static) -> Self {
        self.resources.add(resource);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let address = self.address.filter(|address| !address.is_empty()).ok_or(ServerBuildError::MissingAddress)?;
        if self.resources.is_empty() {
            return Err(ServerBuildError::MissingResources);
        }
        self.config.validate()?;

        Ok(Server { dispatcher: Arc::new(Dispatcher::new(self.resources)), address, config: self.config })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
    #[error("at least one resource must be registered")]
    MissingResources,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    address: Vec<SocketAddr>,
    config: ServerConfig,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Installs an INFO level log subscriber, binds the configured address and serves forever.
    pub async fn start(self) -> io::Result<()> {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            warn!(cause = %e, "log subscriber already installed");
        }

        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(e);
            }
        };

        self.serve(tcp_listener).await;
        Ok(())
    }

    /// Accepts connections from `tcp_listener`, each served on its own task.
    pub async fn serve(self, tcp_listener: TcpListener) {
        info!(resources = ?self.dispatcher.resources(), "serving");
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let dispatcher = Arc::clone(&self.dispatcher);
            let sizing = self.config.sizing.clone();
            let timing = self.config.timing.clone();

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::with_capacity(reader, writer, sizing.read_buffer_capacity)
                    .missing_content_timeout(timing.missing_content_timeout())
                    .poll_interval(timing.poll_interval());
                match connection.process(dispatcher).await {
                    Ok(()) => {
                        info!(%remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(%remote_addr, cause = %e, "service has error, connection shutdown");
                    }
                }
            });
        }
    }
}
