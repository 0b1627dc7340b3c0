mod app;
mod athlete;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::{App, Args};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = App::new(Args::parse())?;
    app.run()?;

    Ok(())
}
