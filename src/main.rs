use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloudbox::config::AppConfig;
use cloudbox::models::image::ImageRecord;
use cloudbox::services::api_client::{ApiClient, DeleteOutcome};
use cloudbox::services::auth_service::AuthService;
use cloudbox::services::gallery_service::GalleryService;
use cloudbox::services::health_service::{BackendStatus, HealthMonitor};
use cloudbox::services::upload_service::{UploadService, UploadSource};
use cloudbox::store::{CredentialStore, SessionStore, SqliteStore};
use cloudbox::view::{self, GalleryQuery, GalleryView, SortOrder};
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "CloudBox photo upload & gallery client")]
struct Cli {
    /// Base URL of the CloudBox API (overrides CLOUDBOX_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path of the local state database (overrides CLOUDBOX_STORE_PATH)
    #[arg(long, global = true)]
    store_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in
    Register {
        username: String,
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign in with a stored password (or the reset override)
    Login { username: String, password: String },
    /// Clear the current session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Set the global override password ("forgot password")
    ResetPassword { new_password: String },
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Tag to attach; repeatable, first one becomes the primary tag
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List your images through the view pipeline
    Gallery {
        /// Sort order: newest or oldest
        #[arg(long, default_value = "newest")]
        sort: String,
        /// Free-text filter over filenames and tags
        #[arg(long, default_value = "")]
        search: String,
        /// Show only records sharing filename (+ size) with another
        #[arg(long)]
        duplicates: bool,
        /// Partition the result by primary tag
        #[arg(long)]
        group_by_tag: bool,
        /// Narrow the fetch to one tag server-side
        #[arg(long)]
        tag: Option<String>,
        /// Emit the view as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete one image
    Delete { image_id: String },
    /// Show storage totals for your account
    Usage,
    /// Probe backend liveness (once, or continuously with --watch)
    Health {
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.api_url.clone(), cli.store_path.clone());
    tracing::debug!("running with config: {:?}", config);

    // Make sure the state file's directory exists before SQLite opens it.
    if let Some(parent) = Path::new(&config.store_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let store = SqliteStore::open(&config.store_path)
        .await
        .with_context(|| format!("opening local store at {}", config.store_path))?;
    let auth = AuthService::new(store.clone());
    let client = ApiClient::new(config.api_url.clone());

    match cli.command {
        Command::Register { username, password, email } => {
            auth.register(&username, email.as_deref(), &password).await?;
            println!("registered and signed in as {username}");
        }
        Command::Login { username, password } => {
            auth.login(&username, &password).await?;
            println!("signed in as {username}");
        }
        Command::Logout => {
            auth.logout().await?;
            println!("signed out");
        }
        Command::Whoami => match auth.current_user().await? {
            Some(username) => println!("{username}"),
            None => println!("not signed in"),
        },
        Command::ResetPassword { new_password } => {
            auth.reset_password(&new_password).await?;
            println!("override password set; it now unlocks any existing account");
        }
        Command::Upload { files, tags } => {
            let user_id = require_user(&auth).await?;
            let sources = read_sources(&files).await?;
            let report = UploadService::new(client).upload_batch(&user_id, &tags, sources).await;

            let (ok, failed) = report.tally();
            println!("{ok} uploaded, {failed} failed");
            for failure in &report.failed {
                eprintln!("  {}: {}", failure.filename, failure.error);
            }
        }
        Command::Gallery { sort, search, duplicates, group_by_tag, tag, json } => {
            let user_id = require_user(&auth).await?;
            let gallery = GalleryService::new(client);
            let records = gallery.list(&user_id, tag.as_deref()).await?;

            let query = GalleryQuery {
                sort_order: parse_sort_order(&sort)?,
                search_query: search,
                duplicates_only: duplicates,
                group_by_tag,
            };
            let gallery_view = view::build_view(&records, &query);
            let visible = records_in(&gallery_view);
            let display_urls = gallery.resolve_display_urls(&visible).await;

            if json {
                let payload = json!({
                    "view": gallery_view,
                    "display_urls": display_urls,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_view(&gallery_view, &display_urls);
            }
        }
        Command::Delete { image_id } => {
            let user_id = require_user(&auth).await?;
            match GalleryService::new(client).delete(&user_id, &image_id).await? {
                DeleteOutcome::Deleted => println!("deleted {image_id}"),
                DeleteOutcome::Partial(errors) => {
                    println!("partially deleted {image_id}; retrying is safe");
                    for error in errors {
                        eprintln!("  {error}");
                    }
                }
            }
        }
        Command::Usage => {
            let user_id = require_user(&auth).await?;
            let usage = client.storage_usage(&user_id).await?;
            println!(
                "{} files, {} bytes ({} MB)",
                usage.file_count, usage.total_bytes, usage.total_mb
            );
        }
        Command::Health { watch } => {
            let monitor = HealthMonitor::new(client);
            if watch {
                let (status_tx, mut status_rx) = watch::channel(BackendStatus::Checking);
                tokio::spawn(monitor.run(status_tx));
                while status_rx.changed().await.is_ok() {
                    println!("backend: {}", status_rx.borrow().label());
                }
            } else {
                println!("backend: {}", monitor.probe().await.label());
            }
        }
    }

    Ok(())
}

/// Commands that act on owned records need a signed-in user.
async fn require_user<S: CredentialStore + SessionStore>(auth: &AuthService<S>) -> Result<String> {
    auth.current_user()
        .await?
        .context("not signed in; run `cloudbox login` first")
}

/// Read the given paths into upload sources, inferring content types from
/// extensions the way the browser reported them.
async fn read_sources(files: &[PathBuf]) -> Result<Vec<UploadSource>> {
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("{} has no usable filename", path.display()))?
            .to_string();
        sources.push(UploadSource {
            content_type: content_type_for(path).to_string(),
            filename,
            bytes: bytes.into(),
        });
    }
    Ok(sources)
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn parse_sort_order(raw: &str) -> Result<SortOrder> {
    match raw.to_ascii_lowercase().as_str() {
        "newest" => Ok(SortOrder::Newest),
        "oldest" => Ok(SortOrder::Oldest),
        other => anyhow::bail!("unknown sort order `{other}` (expected newest or oldest)"),
    }
}

fn records_in(gallery_view: &GalleryView) -> Vec<ImageRecord> {
    gallery_view.records().into_iter().cloned().collect()
}

fn print_view(gallery_view: &GalleryView, display_urls: &HashMap<String, String>) {
    if gallery_view.is_empty() {
        println!("No images found. Time to upload some!");
        return;
    }
    match gallery_view {
        GalleryView::Flat(records) => {
            for record in records {
                print_record(record, display_urls);
            }
        }
        GalleryView::Grouped(groups) => {
            for group in groups {
                println!("# {} ({})", group.tag, group.records.len());
                for record in &group.records {
                    print_record(record, display_urls);
                }
            }
        }
    }
}

fn print_record(record: &ImageRecord, display_urls: &HashMap<String, String>) {
    let uploaded = record.upload_timestamp().format("%Y-%m-%d %H:%M");
    let url = display_urls
        .get(&record.image_id)
        .map(String::as_str)
        .unwrap_or("(still loading)");
    println!(
        "{}  {}  [{}]  {}  {}",
        record.image_id,
        record.original_filename,
        record.primary_tag(),
        uploaded,
        url
    );
}
