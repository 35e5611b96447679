use anyhow::Result;
use clap::Parser;
use log::info;
use ontotag_server::{OntotagServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    ontotag::init_logging();
    let cmd = ServerConfig::parse();
    // ONTOTAG_LOG wins over the flags
    if std::env::var("ONTOTAG_LOG").is_err() {
        std::env::set_var("RUST_LOG", cmd.log_level());
    }
    env_logger::init();

    let server = OntotagServer::new(&cmd)?;
    info!(
        "Starting ontotag {} on {}",
        env!("CARGO_PKG_VERSION"),
        cmd.listen_addr
    );
    server.run().await
}
