use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use chroma_client::{
    Collection, Config, DistanceFunction, Document, GetQuery, Metadata, SimilarityQuery,
};

#[derive(Parser)]
#[command(name = "chroma", version, about = "Talk to a ChromaDB server from the shell")]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = "chroma.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with default settings
    Init,
    /// Check that the server is alive
    Heartbeat,
    /// Print the server version
    Version,
    /// Wipe every collection on the server
    Reset,
    /// List collections
    List,
    /// Create a collection
    Create {
        name: String,
        /// Distance function: l2, cosine or ip
        #[arg(long, default_value = "l2")]
        distance: DistanceFunction,
        /// Return the existing collection instead of failing
        #[arg(long)]
        get_or_create: bool,
    },
    /// Delete a collection by name
    Delete { name: String },
    /// Count documents in a collection
    Count { collection: String },
    /// Add one document, embedding its text
    Add {
        collection: String,
        id: String,
        text: String,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Fetch documents by id or filter
    Get {
        collection: String,
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Metadata filter as JSON
        #[arg(long = "where")]
        where_metadata: Option<String>,
        /// Document content filter as JSON
        #[arg(long)]
        where_document: Option<String>,
    },
    /// Similarity search by text
    Query {
        collection: String,
        text: String,
        #[arg(short, long, default_value_t = 10)]
        n: usize,
        #[arg(long = "where")]
        where_metadata: Option<String>,
        #[arg(long)]
        where_document: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chroma=info,chroma_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let client = || config.client();

    match cli.command {
        Commands::Init => {
            config.save(&cli.config)?;
            println!("wrote {}", cli.config.display());
            Ok(())
        }
        Commands::Heartbeat => print(&json!({ "heartbeat": client()?.heartbeat()? })),
        Commands::Version => print(&json!({ "version": client()?.version()? })),
        Commands::Reset => print(&json!({ "reset": client()?.reset()? })),
        Commands::List => {
            let collections: Vec<Value> = client()?
                .list_collections()?
                .iter()
                .map(describe)
                .collect();
            print(&collections)
        }
        Commands::Create {
            name,
            distance,
            get_or_create,
        } => {
            let client = client()?;
            let collection = if get_or_create {
                client.get_or_create_collection(&name, distance, None)?
            } else {
                client.create_collection(&name, distance, None)?
            };
            print(&describe(&collection))
        }
        Commands::Delete { name } => {
            client()?.delete_collection(&name)?;
            print(&json!({ "deleted": name }))
        }
        Commands::Count { collection } => {
            let count = client()?.get_collection(&collection)?.count()?;
            print(&json!({ "count": count }))
        }
        Commands::Add {
            collection,
            id,
            text,
            metadata,
        } => {
            let embedder = config.embedder()?;
            let mut doc = Document::new(id, text);
            if let Some(raw) = metadata {
                doc = doc.with_metadata(parse_json::<Metadata>("--metadata", &raw)?);
            }
            client()?
                .get_collection(&collection)?
                .add(std::slice::from_ref(&doc), &embedder)?;
            print(&json!({ "added": doc.id }))
        }
        Commands::Get {
            collection,
            ids,
            where_metadata,
            where_document,
        } => {
            let mut query = GetQuery::new().ids(ids);
            if let Some(raw) = where_metadata {
                query = query.where_metadata(parse_json("--where", &raw)?);
            }
            if let Some(raw) = where_document {
                query = query.where_document(parse_json("--where-document", &raw)?);
            }
            print(&client()?.get_collection(&collection)?.get(&query)?)
        }
        Commands::Query {
            collection,
            text,
            n,
            where_metadata,
            where_document,
        } => {
            let embedder = config.embedder()?;
            let mut query = SimilarityQuery::new(text).n_results(n);
            if let Some(raw) = where_metadata {
                query = query.where_metadata(parse_json("--where", &raw)?);
            }
            if let Some(raw) = where_document {
                query = query.where_document(parse_json("--where-document", &raw)?);
            }
            print(&client()?.get_collection(&collection)?.query(&query, &embedder)?)
        }
    }
}

fn describe(collection: &Collection) -> Value {
    json!({
        "name": collection.name(),
        "id": collection.id(),
        "metadata": collection.metadata(),
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(flag: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("parsing {flag} as JSON"))
}

fn print(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
