//! HTTP surface for `ontotag`: the predefined use-case queries and the
//! ontology management routes.
//!
//! ```ignore
//! use ontotag_server::{OntotagServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = OntotagServer::new(&ServerConfig::default())?;
//!     server.run().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;

use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct OntotagServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    router: Router,
}

impl OntotagServer {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let state = Arc::new(AppState::new(config.to_config()?));
        let router = routes::build_router(state.clone());
        Ok(Self {
            addr: config.listen_addr,
            state,
            router,
        })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get the router for testing
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(
            "Listening on {} (media root {})",
            self.addr,
            self.state.config().media_root.display()
        );
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
