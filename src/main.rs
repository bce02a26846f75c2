use std::path::PathBuf;

use clap::{Parser, Subcommand};

use python_versions::config::{db_path, log_path};
use python_versions::options::BuildOptions;
use python_versions::service::server::{App, init_logging, load_config, run_server};

#[derive(Parser)]
#[command(name = "python-versions")]
#[command(version, about = "Keeps CPython release metadata in sync with upstream feeds")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh daily in the background until interrupted (default)
    Serve,
    /// Print the known versions, refreshing first if they are stale
    List {
        #[arg(long)]
        json: bool,
    },
    /// Run a single refresh cycle
    Refresh,
    /// Decode build-script fields given as key=value and check the version is known
    CheckOptions {
        #[arg(value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let db = cli.db.unwrap_or_else(db_path);
    let app = App::build(config, &db)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(app).await,
        Command::List { json } => {
            let versions = app.service.get_versions().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&versions)?);
            } else {
                for v in versions {
                    println!(
                        "{:<16} {:<18} {:<12} {}",
                        v.name,
                        v.level.as_str(),
                        v.status.as_str(),
                        v.last_updated.to_rfc3339()
                    );
                }
            }
            Ok(())
        }
        Command::Refresh => {
            let written = app.refresher.run_cycle().await?;
            println!("Stored {} versions", written);
            Ok(())
        }
        Command::CheckOptions { fields } => {
            let options = BuildOptions::from_form(fields)?;
            options.validate_against(&app.service.get_versions().await?)?;
            println!("{}", serde_json::to_string_pretty(&options)?);
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&log_path())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
