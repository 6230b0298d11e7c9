//! Thumbtrack CLI - Run the server, rebuild the index and query a running server

use std::sync::Arc;

use anyhow::{bail, Result};
use thumbtrack_client::ThumbtrackClient;
use thumbtrack_core::Pin;
use thumbtrack_search::{reindex_all, IndexHealth, IndexLocation, IndexStore};
use thumbtrack_server::ServerConfig;
use thumbtrack_store::MemoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("thumbtrack=info".parse()?))
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "help" | "--help" | "-h" => print_help(),
        "server" => run_server().await?,
        "reindex" => {
            if args.get(2).map(String::as_str) == Some("--offline") {
                reindex_offline().await?;
            } else {
                reindex().await?;
            }
        }
        "search" => {
            if args.len() < 3 {
                eprintln!("Usage: thumbtrack-cli search <query> [tag...]");
                return Ok(());
            }
            search(&args[2], args[3..].to_vec()).await?;
        }
        "tag" => {
            if args.len() < 3 {
                eprintln!("Usage: thumbtrack-cli tag <tag>");
                return Ok(());
            }
            browse_tag(&args[2]).await?;
        }
        "suggest" => {
            if args.len() < 3 {
                eprintln!("Usage: thumbtrack-cli suggest <prefix>");
                return Ok(());
            }
            suggest(&args[2]).await?;
        }
        "tags" => popular_tags().await?,
        "trending" => trending().await?,
        "health" => health().await?,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_help();
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"Thumbtrack CLI - Pin search and recommendations

USAGE:
    thumbtrack-cli <COMMAND> [OPTIONS]

COMMANDS:
    help                Show this help message
    server              Start the Thumbtrack server
    reindex             Ask the running server to rebuild its search index
    reindex --offline   Rebuild the index directly from the snapshot file
    search              Search pins by text and optional tags
    tag                 Browse pins carrying a tag
    suggest             Autocomplete titles and tags
    tags                Show the most used tags
    trending            Show this week's trending pins
    health              Show server status

ENVIRONMENT:
    THUMBTRACK_ADDR        Server bind address (default 127.0.0.1:9877)
    THUMBTRACK_INDEX_DIR   Search index directory (default: in memory)
    THUMBTRACK_DATA        Snapshot file backing the store
    THUMBTRACK_SERVER      Server URL for client commands (default http://127.0.0.1:9877)

EXAMPLES:
    thumbtrack-cli server
    thumbtrack-cli search "sourdough" baking
    thumbtrack-cli suggest piz
    THUMBTRACK_DATA=./pins.json THUMBTRACK_INDEX_DIR=./index thumbtrack-cli reindex --offline
"#
    );
}

async fn run_server() -> Result<()> {
    use thumbtrack_server::run_server;

    let config = ServerConfig::from_env()?;
    println!("Starting Thumbtrack server on {}...", config.addr);
    run_server(config).await?;
    Ok(())
}

async fn reindex() -> Result<()> {
    let client = connect().await?;
    let indexed = client.reindex().await?;
    println!("Reindexed {} pins", indexed);
    Ok(())
}

async fn reindex_offline() -> Result<()> {
    let config = ServerConfig::from_env()?;
    let (Some(data_file), Some(index_dir)) = (config.data_file, config.index_dir) else {
        bail!("offline reindex needs THUMBTRACK_DATA and THUMBTRACK_INDEX_DIR");
    };

    let store = MemoryStore::open(&data_file).await?;
    let index = IndexStore::initialize(
        IndexLocation::Directory(index_dir),
        Arc::new(IndexHealth::new()),
    )
    .await;
    if !index.is_available() {
        bail!("search index could not be opened");
    }

    let indexed = reindex_all(&store, &index).await?;
    info!("Offline reindex of {:?} complete", data_file);
    println!("Reindexed {} pins", indexed);
    Ok(())
}

async fn search(query: &str, tags: Vec<String>) -> Result<()> {
    let client = connect().await?;
    let response = client.search(query, tags, None, None).await?;
    let p = response.pagination;
    println!(
        "{} results (page {} of {})",
        p.total,
        p.page,
        p.total_pages.max(1)
    );
    print_pins(&response.pins);
    Ok(())
}

async fn browse_tag(tag: &str) -> Result<()> {
    let client = connect().await?;
    let response = client.pins_by_tag(tag, None, None).await?;
    println!("{} pins tagged '{}'", response.pagination.total, tag);
    print_pins(&response.pins);
    Ok(())
}

async fn suggest(prefix: &str) -> Result<()> {
    let client = connect().await?;
    for suggestion in client.suggest(prefix).await? {
        println!("  {}", suggestion);
    }
    Ok(())
}

async fn popular_tags() -> Result<()> {
    let client = connect().await?;
    let tags = client.popular_tags().await?;

    if tags.is_empty() {
        println!("No tags yet");
    } else {
        for tag in tags {
            println!("  {:>5}  {}", tag.count, tag.tag);
        }
    }
    Ok(())
}

async fn trending() -> Result<()> {
    let client = connect().await?;
    let pins = client.trending().await?;
    if pins.is_empty() {
        println!("Nothing trending this week");
    }
    print_pins(&pins);
    Ok(())
}

async fn health() -> Result<()> {
    let client = connect().await?;
    let health = client.health().await?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

fn print_pins(pins: &[Pin]) {
    for pin in pins {
        println!("  {}  {} (@{})", pin.id, pin.title, pin.author.username);
        if !pin.tags.is_empty() {
            println!("        #{}", pin.tags.join(" #"));
        }
    }
}

async fn connect() -> Result<ThumbtrackClient> {
    let url = std::env::var("THUMBTRACK_SERVER").unwrap_or_else(|_| "http://127.0.0.1:9877".to_string());
    let client = ThumbtrackClient::connect(&url).await?;
    Ok(client)
}
