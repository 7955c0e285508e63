use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use gallery_cache_core::store::QUOTA_EVICTION_FRACTION;
use gallery_cache_core::{CacheStore, Clock, SystemClock};
use serde_json::Value;
use std::path::PathBuf;

use gallery_cache_cli::cache::open_store;
use gallery_cache_cli::config::{AppConfig, ConfigManager};
use gallery_cache_cli::output::{OutputFormat, formatter_for};
use gallery_cache_cli::terminal;

#[derive(Parser)]
#[command(name = "gallery-cache")]
#[command(author, version, about = "Gallery Cache - inspect and maintain the gallery data cache", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Use this store file instead of the configured storage
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum StoreCommand {
    /// Print a cached payload as JSON
    Get {
        /// Cache type (e.g. brands, images)
        cache_type: String,

        /// Entry identifier within the type
        #[arg(long, default_value = "")]
        id: String,
    },

    /// Store a JSON payload
    Put {
        /// Cache type (e.g. brands, images)
        cache_type: String,

        /// Payload as a JSON document
        json: String,

        /// Entry identifier within the type
        #[arg(long, default_value = "")]
        id: String,
    },

    /// List cached entries
    List {
        /// Output format (defaults to output.default_format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show cache size and per-type counts
    Stats {
        /// Output format (defaults to output.default_format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Remove expired and corrupted entries
    Sweep {
        /// Keep sweeping every store.sweep_interval_seconds until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Remove the lowest priority, oldest entries
    Evict {
        /// Share of entries to remove, between 0 and 1
        #[arg(long, default_value_t = QUOTA_EVICTION_FRACTION)]
        fraction: f64,
    },

    /// Clear one type, one entry, or the whole cache
    Clear {
        /// Cache type to clear; everything when omitted
        cache_type: Option<String>,

        /// Clear only this identifier
        #[arg(long, requires = "cache_type")]
        id: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g., store.preset)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., store.policies.images.ttl_seconds)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,

    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("gallery_cache_core", log::LevelFilter::Debug)
            .filter_module("gallery_cache_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let manager = ConfigManager::new();

    match cli.command {
        Commands::Config { command } => config_command(manager, command),
        Commands::Store(command) => {
            let mut config = manager.load()?;
            config.apply_cli_overrides(cli.store);
            store_command(command, &config).await
        }
    }
}

async fn store_command(command: StoreCommand, config: &AppConfig) -> Result<()> {
    let use_color = terminal::use_color(config.output.color_enabled);
    if !use_color {
        colored::control::set_override(false);
    }

    let store = open_store(config)?;
    log::debug!(
        "Opened {} store under namespace {}",
        store.backend().name(),
        store.namespace()
    );

    match command {
        StoreCommand::Get { cache_type, id } => get_command(&store, &cache_type, &id)?,
        StoreCommand::Put {
            cache_type,
            json,
            id,
        } => put_command(&store, &cache_type, &json, &id)?,
        StoreCommand::List { format } => {
            let mut entries = store.entries();
            entries.sort_by(|a, b| a.key.cmp(&b.key));

            let formatter = formatter_for(resolve_format(format, config), use_color);
            print!(
                "{}",
                formatter.format_entries(&entries, SystemClock.now_millis())?
            );
        }
        StoreCommand::Stats { format } => {
            let formatter = formatter_for(resolve_format(format, config), use_color);
            print!("{}", formatter.format_stats(&store.stats())?);
        }
        StoreCommand::Sweep { watch } => {
            let removed = store.evict_expired();
            eprintln!("{}", format!("Removed {removed} expired entries").green());

            if watch {
                let interval = config.store.sweep_interval();
                eprintln!("Sweeping every {}s, press Ctrl-C to stop", interval.as_secs());
                let sweeper = store.spawn_sweeper(interval);
                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for Ctrl-C")?;
                sweeper.shutdown().await;
            }
        }
        StoreCommand::Evict { fraction } => {
            let evicted = store
                .evict_by_priority(fraction)
                .context("Failed to evict entries")?;
            eprintln!("{}", format!("Evicted {evicted} entries").green());
        }
        StoreCommand::Clear { cache_type, id } => {
            let removed = match &cache_type {
                Some(cache_type) => store.clear_type(cache_type, id.as_deref()),
                None => store.clear_all(),
            };
            eprintln!("{}", format!("Cleared {removed} entries").green());
        }
    }

    Ok(())
}

fn resolve_format(requested: Option<OutputFormat>, config: &AppConfig) -> OutputFormat {
    requested.unwrap_or(config.output.default_format)
}

fn get_command(store: &CacheStore, cache_type: &str, id: &str) -> Result<()> {
    match store.get::<Value>(cache_type, id) {
        Some(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        None => {
            eprintln!("{}", format!("Not cached: {cache_type} ({id})").yellow());
            std::process::exit(1);
        }
    }
}

fn put_command(store: &CacheStore, cache_type: &str, json: &str, id: &str) -> Result<()> {
    let payload: Value = serde_json::from_str(json).context("Payload is not valid JSON")?;

    if !store.put_value(cache_type, payload, id) {
        anyhow::bail!("Failed to store {cache_type} ({id}); see the log for details");
    }

    let policy = store.policy_for(cache_type);
    eprintln!(
        "{}",
        format!(
            "Cached {cache_type} for {}s (priority {})",
            policy.ttl.as_secs(),
            policy.priority
        )
        .green()
    );
    Ok(())
}

fn config_command(mut manager: ConfigManager, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Get { key } => match manager.get(&key) {
            Ok(value) => {
                println!("{value}");
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::Set { key, value } => match manager.set(&key, &value) {
            Ok(()) => {
                eprintln!("{}", format!("Set {key} = {value}").green());
                eprintln!(
                    "Configuration saved to: {}",
                    manager.get_config_path().display()
                );
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::List => match manager.list() {
            Ok(items) => {
                eprintln!("{}", "Configuration:".bold().blue());
                eprintln!("Config file: {}", manager.get_config_path().display());
                eprintln!();

                // Group items by section
                let mut sections: std::collections::BTreeMap<String, Vec<(String, String)>> =
                    std::collections::BTreeMap::new();

                for (key, value) in items {
                    let (section, rest) = key.split_once('.').unwrap_or(("general", &key));
                    sections
                        .entry(section.to_string())
                        .or_default()
                        .push((rest.to_string(), value));
                }

                for (section, items) in sections {
                    println!("[{}]", section.yellow());
                    for (key, value) in items {
                        println!("  {} = {}", key.cyan(), value);
                    }
                    println!();
                }
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
    }

    Ok(())
}
