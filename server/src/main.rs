use tokio::net::TcpListener;
use todo_server::{config::Config, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(config.log_format);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        seeded = config.seed_sample_data,
        slow_request_ms = config.slow_request_threshold.as_millis() as u64,
        "listening"
    );
    todo_server::run(listener, AppState::from_config(&config)).await?;
    Ok(())
}
