//! Serve command - run the HTTP routes.

use super::{DatabaseArgs, open_database};
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tablekv_server::AppState;
use tablekv_server::server;

#[derive(Args)]
pub struct ServeCommand {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn run(&self) -> Result<()> {
        let mut config = self.db.config()?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let db = open_database(&config)?;
        tracing::info!(
            database = %config.database.path,
            table = %config.database.table,
            "opened database"
        );

        let state = Arc::new(AppState::new(db, config.database.table.clone()));
        let listener = server::bind(config.server.socket_addr()?).await?;

        server::serve(listener, state, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}
