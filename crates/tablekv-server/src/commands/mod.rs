//! CLI command implementations.

pub mod delete;
pub mod get;
pub mod put;
pub mod serve;

pub use delete::DeleteCommand;
pub use get::GetCommand;
pub use put::PutCommand;
pub use serve::ServeCommand;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tablekv::KvAdapter;
use tablekv_server::{Config, load_config};
use tablekv_sql::{SharedAdapter, SqliteAdapter};

/// Options shared by every command that touches the database
#[derive(Args)]
pub struct DatabaseArgs {
    /// Config file (defaults to tablekv.toml found upwards from the cwd)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite path, `:memory:` or `sqlite://` URL
    #[arg(long)]
    pub database: Option<String>,

    /// Table holding the records
    #[arg(long)]
    pub table: Option<String>,
}

impl DatabaseArgs {
    /// Load the config file and apply command-line overrides
    pub fn config(&self) -> Result<Config> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
        if let Some(table) = &self.table {
            config.database.table = table.clone();
        }
        Ok(config)
    }
}

pub fn open_database(config: &Config) -> Result<SharedAdapter> {
    let db = SqliteAdapter::open(&config.database.path)?;
    Ok(Arc::new(db))
}

/// Open the configured table, creating it if needed
pub async fn open_kv(args: &DatabaseArgs) -> Result<KvAdapter> {
    let config = args.config()?;
    let db = open_database(&config)?;
    let kv = KvAdapter::with_table(db, &config.database.table)?;
    kv.initialize().await?;
    Ok(kv)
}
