use log::{info, warn};
use neural_playground::{configs::ServerConfig, server};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("received Ctrl-C, shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!("failed to listen for Ctrl-C: {e}"),
            }
        }
    });

    server::serve(config, shutdown).await?;
    Ok(())
}
