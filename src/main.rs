use std::sync::Arc;

use clap::{Parser, Subcommand};
use photoshelf::config::Settings;
use photoshelf::server;
use photoshelf::store::ArtifactStore;
use photoshelf::warm;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photoshelf")]
#[command(about = "Self-hosted photo album server")]
#[command(long_about = "\
Self-hosted photo album server

Your filesystem is the data source. Directories under the source root become
albums; the jpg/jpeg/png/webp files inside them become photos. Thumbnails,
previews, and enhanced renders are generated on first request and cached
under the cache directory:

  cache/
  ├── original/albums/<album>/{thumbnails,previews}/<photo>.jpg
  └── enhanced/albums/<album>/{thumbnails,previews,full}/<photo>.jpg

Accounts live in a plain users file, one `username:password` per line.
Every flag can also be set through its environment variable (ALBUMS_SOURCE_DIR,
CACHE_DIR, USERS_FILE, LISTEN_ADDR, SESSION_SECRET, ROOT_PATH); a .env file
in the working directory is loaded at startup.")]
#[command(version = version_string())]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Pre-generate thumbnail and preview artifacts for every album
    Warm {
        /// Also warm the enhanced variants
        #[arg(long)]
        enhanced: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("photoshelf=info,tower_http=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let settings = Arc::new(cli.settings);
            tracing::info!(
                addr = %settings.listen_addr,
                source = %settings.source_dir.display(),
                cache = %settings.cache_dir.display(),
                root_path = %settings.root_path,
                "starting photoshelf"
            );

            let app = server::app(Arc::clone(&settings), Arc::new(ArtifactStore::new()));
            let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Warm { enhanced } => {
            let settings = cli.settings;
            let stats = tokio::task::spawn_blocking(move || {
                warm::warm(&settings, &ArtifactStore::new(), enhanced)
            })
            .await?;
            println!("Cache: {stats}");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
