//! Delete command - remove a key.

use super::{DatabaseArgs, open_kv};
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct DeleteCommand {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Key to remove
    pub key: String,
}

impl DeleteCommand {
    pub async fn run(&self) -> Result<()> {
        let kv = open_kv(&self.db).await?;
        let ack = kv.delete(&self.key).await?;
        println!("{}", serde_json::to_string(&ack)?);
        Ok(())
    }
}
