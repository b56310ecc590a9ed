//! Binary entrypoint for the bunkerbot CLI.
//!
//! Commands:
//! - `start` - run the bot (long polling)
//! - `init` - create a starter `config.toml`
//! - `status` - print the active room and pool summary
//!
//! See the library crate docs for module-level details: `bunkerbot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use bunkerbot::bot::BotServer;
use bunkerbot::config::Config;
use bunkerbot::storage::Storage;

#[derive(Parser)]
#[command(name = "bunkerbot")]
#[command(about = "A Telegram bot that runs the Bunker party game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start,
    /// Initialize a new configuration file
    Init,
    /// Show the active room and attribute pool summary
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config, cli.verbose);
            info!("Starting bunkerbot v{}", env!("CARGO_PKG_VERSION"));

            let server = BotServer::new(config).await?;
            server.run().await?;
        }
        Commands::Init => {
            init_logging(&Config::default(), cli.verbose);
            if tokio::fs::metadata(&cli.config).await.is_ok() {
                eprintln!("Config file {} already exists, not overwriting.", cli.config);
                std::process::exit(1);
            }
            Config::create_default(&cli.config).await?;
            println!("Created {}. Fill in the telegram and sheet sections.", cli.config);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config, cli.verbose);

            let storage = Storage::connect(&config.storage.database_url).await?;
            storage.migrate().await?;

            match storage.active_room().await? {
                Some(room) => {
                    let players = storage.players(&room.code).await?;
                    println!("Active room: {} (created {})", room.code, room.created_at);
                    println!("Players: {}", players.len());
                    for player in players {
                        println!("  • {}", player.name);
                    }
                }
                None => println!("No active room."),
            }

            let pool = storage.load_pool().await?;
            println!("Attribute pool:");
            for (category, count) in pool.summary() {
                println!("  {}: {} values", category, count);
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Config, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();

    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // teloxide's own polling loop is chatty at debug
    builder.filter_module("teloxide", log::LevelFilter::Warn);

    if let Some(ref file) = config.logging.file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
        {
            let mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                writeln!(fmt, "{}", line)
            });
        }
    }

    let _ = builder.try_init();
}
