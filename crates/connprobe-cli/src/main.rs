use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use connprobe_core::env_file::DEFAULT_ENV_FILE;

mod commands;
pub mod console;

#[derive(Parser)]
#[command(
    name = "connprobe",
    about = "Verify connectivity and read/write access to a MongoDB deployment",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<commands::Commands>,

    #[command(flatten)]
    probe: commands::probe::ProbeArgs,

    /// Path to the KEY=VALUE file holding the connection settings
    #[arg(long, env = "CONNPROBE_ENV_FILE", default_value = DEFAULT_ENV_FILE, global = true)]
    env_file: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        None => commands::probe::execute(&cli.env_file, cli.probe).await?,
        Some(commands::Commands::Validate(args)) => {
            commands::validate::execute(&cli.env_file, args).await?
        }
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
