use anyhow::Result;

use courtside::config::AppConfig;
use courtside::logging;
use courtside::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, _secrets) = AppConfig::load()?;

    logging::init_logging(&config.monitoring)?;

    tracing::info!(
        season = config.season.current,
        bind = %config.server.bind,
        port = config.server.port,
        "Courtside starting"
    );

    let state = AppState::new(config)?;
    server::serve(state).await
}
