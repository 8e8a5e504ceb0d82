use into_the_wild_backend::run_server;
use into_the_wild_config::get_config;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = get_config()?;
    run_server(config).await?;
    Ok(())
}
