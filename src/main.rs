//! crudagent: talk to the items database through a local model.
//!
//! Usage:
//!   crudagent ask <QUERY>      Run one query through the agent
//!   crudagent chat             Interactive session
//!   crudagent tools            Show the tool catalogue
//!   crudagent items <CMD>      Call the items API directly
//!   crudagent setup            Write the config file interactively

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crudagent::agent::{self, Dispatcher};
use crudagent::config::{self, AgentConfig};
use crudagent::items::ItemStore;
use crudagent::types::{Item, ItemUpdate, NewItem};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "crudagent")]
#[command(version)]
#[command(about = "Function-calling agent for a CRUD items API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one query to the agent and print the answer.
    Ask {
        /// The request, e.g. "create an item named John aged 25".
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Start an interactive session. Type `exit` to quit.
    Chat,

    /// List the tools offered to the model.
    Tools,

    /// Call the items backend directly, without the model.
    Items {
        #[command(subcommand)]
        command: ItemsCommand,
    },

    /// Run the interactive setup wizard.
    Setup,
}

#[derive(Subcommand, Debug)]
enum ItemsCommand {
    /// List all items.
    List,
    /// Show one item.
    Get { id: i64 },
    /// Create an item.
    Create { name: String, age: i64 },
    /// Update an item; only the given fields change.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<i64>,
    },
    /// Delete an item.
    Delete { id: i64 },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(config::resolve_path)
        .unwrap_or_else(config::default_config_path);

    let cfg = load(&config_path)?;
    init_logging(cli.log_level.as_deref().unwrap_or(&cfg.log_level));

    match cli.command {
        Commands::Ask { query } => cmd_ask(&cfg, &query.join(" ")).await,
        Commands::Chat => cmd_chat(&cfg).await,
        Commands::Tools => cmd_tools(&cfg),
        Commands::Items { command } => cmd_items(&cfg, command).await,
        Commands::Setup => {
            crudagent::setup::run_setup_wizard(&config_path)?;
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load(config_path: &Path) -> Result<AgentConfig> {
    config::load_config(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn dispatcher(cfg: &AgentConfig) -> Result<Dispatcher> {
    let store = agent::build_store(cfg)?;
    agent::build_dispatcher(cfg, store)
}

async fn cmd_ask(cfg: &AgentConfig, query: &str) -> Result<()> {
    let dispatcher = dispatcher(cfg)?;
    let answer = dispatcher.process_query(query).await;
    println!("{}", answer);
    Ok(())
}

async fn cmd_chat(cfg: &AgentConfig) -> Result<()> {
    let dispatcher = dispatcher(cfg)?;
    info!(
        "Chat session: model '{}' at {}, {} tools",
        cfg.model,
        cfg.model_api_url,
        dispatcher.registry().len()
    );

    println!("{} Assistant ready! Type 'exit' to quit.", ">>>".green().bold());
    println!("Example commands:");
    println!("- Show me all items in the database");
    println!("- Create a new item with name John and age 25");
    println!("- Update item 1 with name Mary");
    println!("- Delete item with ID 3");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    loop {
        print!("\n{} ", "You:".bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = dispatcher.process_query(query).await;
        let label = if answer.starts_with("Error:") {
            "Assistant:".red().bold()
        } else {
            "Assistant:".cyan().bold()
        };
        println!("\n{} {}", label, answer);
    }

    println!("{} Bye.", "<<<".red().bold());
    Ok(())
}

fn cmd_tools(cfg: &AgentConfig) -> Result<()> {
    let dispatcher = dispatcher(cfg)?;

    println!();
    println!("{}", "=== Tools ===".bold());
    for def in dispatcher.registry().describe_all() {
        println!();
        println!("  {}  {}", def.name.bold(), def.description.dimmed());
        for p in &def.params {
            let required = if p.required { "required" } else { "optional" };
            println!(
                "    {:<10} {:<8} {:<9} {}",
                p.name,
                p.kind.to_string(),
                required,
                p.description
            );
        }
    }
    println!();
    Ok(())
}

async fn cmd_items(cfg: &AgentConfig, command: ItemsCommand) -> Result<()> {
    let store: Arc<dyn ItemStore> = agent::build_store(cfg)?;

    match command {
        ItemsCommand::List => {
            let items = store.list_all().await?;
            if items.is_empty() {
                println!("{}", "(no items)".dimmed());
            }
            for item in &items {
                print_item(item);
            }
        }
        ItemsCommand::Get { id } => print_item(&store.get_by_id(id).await?),
        ItemsCommand::Create { name, age } => {
            let item = store.create(&NewItem { name, age }).await?;
            println!("{} created", "OK".green().bold());
            print_item(&item);
        }
        ItemsCommand::Update { id, name, age } => {
            let update = ItemUpdate { name, age };
            if update.is_empty() {
                anyhow::bail!("Nothing to update: pass --name and/or --age");
            }
            let item = store.update(id, &update).await?;
            println!("{} updated", "OK".green().bold());
            print_item(&item);
        }
        ItemsCommand::Delete { id } => {
            let ack = store.delete(id).await?;
            println!("{} {}", "OK".green().bold(), ack.message);
        }
    }
    Ok(())
}

fn print_item(item: &Item) {
    println!("  {:>4}  {:<24} {}", item.id, item.name, item.age);
}
