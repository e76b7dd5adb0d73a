use anyhow::Result;
use clap::{Parser, Subcommand};

use condensr::config::{StaticConfig, get_config, set_config};
use condensr::runtime::modes;
use condensr::system::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "condensr", version, about = "Link shortening and click analytics service")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print a sample configuration, or write it to a file
    ConfigGen {
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Command::ConfigGen { output }) = &cli.command {
        return modes::generate_config(output.as_deref());
    }

    set_config(StaticConfig::load_from(&cli.config));
    let config = get_config();

    // guard 必须存活到进程结束，否则缓冲日志会丢失
    let _log_guard = init_logging(&config.logging)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => modes::run_migrations_only(&config).await,
        #[cfg(feature = "server")]
        Command::Serve => modes::run_server(&config).await,
        #[cfg(not(feature = "server"))]
        Command::Serve => anyhow::bail!("condensr was built without the `server` feature"),
        Command::ConfigGen { .. } => Ok(()),
    }
}
