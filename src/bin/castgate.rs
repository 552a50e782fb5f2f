use anyhow::Result;
use castgate::cli::{start, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = start()?;

    let result = action.execute().await;

    telemetry::shutdown_tracer();

    result
}
