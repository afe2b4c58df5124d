//! scholar-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `SCHOLAR_*` environment variables, opens the SQLite store, and serves the
//! portal over HTTP.
//!
//! # First run
//!
//! Create the initial administrator, entering the password on stdin:
//!
//! ```sh
//! cargo run -p scholar-server --bin server -- --bootstrap-admin admin@uni.edu
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use scholar_api::password;
use scholar_core::{
  store::PortalStore,
  user::{NewUser, Role, normalize_email},
};
use scholar_server::{
  AppState, ServerConfig, documents::BlobStore, mail::LogMailer,
};
use scholar_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PhD scholar portal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create an admin account with this email (password from stdin) and exit.
  #[arg(long, value_name = "EMAIL")]
  bootstrap_admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let pass = read_password()?;
    let hash = password::hash(&pass)?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SCHOLAR").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(email) = cli.bootstrap_admin {
    return bootstrap_admin(&store, &email).await;
  }

  let blobs = BlobStore::new(expand_tilde(&server_cfg.upload_dir));
  blobs
    .ensure_root()
    .await
    .with_context(|| format!("failed to create {:?}", blobs.root()))?;

  let state = AppState {
    store:  Arc::new(store),
    mailer: Arc::new(LogMailer),
    blobs:  Arc::new(blobs),
    config: Arc::new(server_cfg.clone()),
  };

  let app = scholar_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn bootstrap_admin(store: &SqliteStore, email: &str) -> anyhow::Result<()> {
  let email = normalize_email(email);
  if store.find_user_by_email(&email).await?.is_some() {
    anyhow::bail!("{email} is already registered");
  }

  let pass = read_password()?;
  password::validate(&pass)?;
  let password_hash = password::hash(&pass)?;

  let user = store
    .create_user(NewUser {
      name: email.split('@').next().unwrap_or(&email).to_string(),
      email,
      role: Role::Admin,
      password_hash,
    })
    .await?;
  tracing::info!(user_id = %user.user_id, email = %user.email, "admin created");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
