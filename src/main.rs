use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coracle::app::AppContext;
use coracle::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new()?;

    match cli.command {
        Commands::Fetch {
            url,
            method,
            data,
            headers_file,
            no_redirects,
        } => {
            commands::fetch(&ctx, &url, &method, data, headers_file.as_deref(), no_redirects)
                .await?;
        }
        Commands::Read { url } => {
            commands::read(&ctx, &url).await?;
        }
        Commands::Serve { port } => {
            commands::serve(&ctx, port).await?;
        }
        Commands::Browse { raw } => {
            commands::browse(&ctx, raw).await?;
        }
    }

    Ok(())
}
