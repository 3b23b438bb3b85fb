use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use backglass_host::{init_logging, run, StartupOptions};

#[derive(Parser, Debug)]
#[command(name = "backglass", version, about = "Load and validate a backglass machine config")]
struct Cli {
    /// Config directory. Repeat to layer directories; later ones override earlier ones.
    #[arg(long = "config-dir", default_value = "config")]
    config_dirs: Vec<PathBuf>,

    /// Validate only; do not build widget effect pipelines.
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Default log level (RUST_LOG directives take precedence).
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Print the startup summary as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let options = StartupOptions {
        config_dirs: cli.config_dirs,
        check_only: cli.check,
    };
    let summary = run(&options).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        print!("{}", summary);
    }

    if cli.check {
        tracing::info!("Machine config OK");
    }
    Ok(())
}
