//! Restman - command line front end
//!
//! Loads settings, logs to `restman.log` in the data directory and runs one
//! subcommand against the stored collections.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::Level;
use url::Url;

use restman::constants::{APP_VERSION, LOG_FILE};
use restman::importer;
use restman::network::format_body;
use restman::{
    parse_curl, to_curl, AppState, Call, CurlOptions, HttpExecutor, JsonStorage, Settings,
};

#[derive(Parser)]
#[command(name = "restman")]
#[command(about = "Manage and run collections of REST calls")]
#[command(version = APP_VERSION)]
struct Cli {
    #[arg(long, help = "Enable debug logging", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List collections and their calls
    List,
    /// Show a call with its effective URL and auth
    Show { call_id: String },
    /// Import an OpenAPI document from a file or URL
    Import { source: String },
    /// Add a call from curl-like flags
    Add {
        url: String,
        #[arg(short, long, help = "Target collection name")]
        collection: String,
        #[arg(short = 'X', long = "request")]
        method: Option<String>,
        #[arg(short, long)]
        data: Option<String>,
        #[arg(long)]
        data_raw: Option<String>,
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Add a call from a full cURL command
    Curl {
        command: String,
        #[arg(short, long, help = "Target collection name")]
        collection: String,
    },
    /// Send a call and print the response
    Run { call_id: String },
    /// Print a call as a cURL command
    ExportCurl { call_id: String },
    /// Remove a collection and its calls
    Remove { collection_id: String },
    /// Print validation messages for a collection
    Validate { collection_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let data_dir = settings.data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;

    // Initialize logging to file
    let _guard = init_logging(&data_dir, cli.debug);

    let mut state = AppState::load(Box::new(JsonStorage::in_dir(&data_dir)))?;

    match cli.command {
        Command::List => list(&state),
        Command::Show { call_id } => show(&state, &call_id)?,
        Command::Import { source } => {
            let collection = importer::import_source(&source)
                .await
                .with_context(|| format!("import of {} did not complete", source))?;
            let calls = collection.calls.len();
            let id = state.import_collection(collection)?;
            println!("Imported {} calls into collection {}", calls, id);
        }
        Command::Add {
            url,
            collection,
            method,
            data,
            data_raw,
            headers,
            name,
        } => {
            check_url(&url)?;
            let options = CurlOptions {
                url,
                method,
                data: data.unwrap_or_default(),
                data_raw: data_raw.unwrap_or_default(),
                headers,
                user: None,
            };
            let mut call = options.into_call();
            if let Some(name) = name {
                call.name = name;
            }
            add(&mut state, &settings, &collection, call)?;
        }
        Command::Curl {
            command,
            collection,
        } => {
            let call = parse_curl(&command)?;
            add(&mut state, &settings, &collection, call)?;
        }
        Command::Run { call_id } => run(&state, &settings, &call_id).await?,
        Command::ExportCurl { call_id } => {
            let Some(request) = state.prepare_request(&call_id) else {
                bail!("no call with id {}", call_id);
            };
            println!("{}", to_curl(&request));
        }
        Command::Remove { collection_id } => {
            if !state.remove_collection(&collection_id)? {
                bail!("no collection with id {}", collection_id);
            }
            println!("Removed collection {}", collection_id);
        }
        Command::Validate { collection_id } => {
            let Some(collection) = state.collection(&collection_id) else {
                bail!("no collection with id {}", collection_id);
            };
            let errors = collection.validate();
            if errors.is_empty() {
                println!("{} is valid", collection.name);
            }
            for error in errors {
                println!("- {}", error);
            }
        }
    }

    Ok(())
}

fn init_logging(dir: &Path, debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .init();
    guard
}

/// Calls given on the command line need a scheme and a host
fn check_url(url: &str) -> anyhow::Result<()> {
    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => Ok(()),
        _ => bail!("invalid URL provided: {}", url),
    }
}

fn list(state: &AppState) {
    if state.collections().is_empty() {
        println!("No collections");
        return;
    }
    for collection in state.collections() {
        println!("{}  {}  {}", collection.id, collection.name, collection.description());
        for call in &collection.calls {
            println!(
                "  {}  {:<3}  {}  ({} params, {} headers)",
                call.id,
                call.method_short(),
                call.title(),
                call.params_count(),
                call.headers_count()
            );
        }
    }
}

fn show(state: &AppState, call_id: &str) -> anyhow::Result<()> {
    let (Some(call), Some(request)) = (state.find_call(call_id), state.prepare_request(call_id))
    else {
        bail!("no call with id {}", call_id);
    };

    println!("{}  {}", call.method, call.title());
    println!("URL:  {}", request.url);
    let auth = request
        .auth
        .as_ref()
        .map(|a| a.kind().as_str().to_string())
        .unwrap_or_else(|| "none".to_string());
    println!("Auth: {}", auth);
    for header in &call.headers {
        println!("  {}", header);
    }
    if !call.data.is_empty() {
        println!("Body ({}):", call.data_type);
        println!("{}", call.data);
    }
    Ok(())
}

fn add(
    state: &mut AppState,
    settings: &Settings,
    collection: &str,
    mut call: Call,
) -> anyhow::Result<()> {
    call.headers.extend(settings.header_lines());
    let call_id = call.id.clone();
    let collection_id = state.add_to_collection(collection, call)?;
    println!("Added call {} to collection {}", call_id, collection_id);
    Ok(())
}

async fn run(state: &AppState, settings: &Settings, call_id: &str) -> anyhow::Result<()> {
    let Some(request) = state.prepare_request(call_id) else {
        bail!("no call with id {}", call_id);
    };

    let (cancel_tx, cancel_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(());
        }
    });

    let executor = HttpExecutor::new(settings.timeout());
    let result = executor.execute_cancellable(&request, cancel_rx).await?;

    println!(
        "{} {}  {} bytes  {} ms",
        request.method, result.status, result.bytes, result.time_ms
    );
    println!("{}", format_body(&result.body));
    Ok(())
}
