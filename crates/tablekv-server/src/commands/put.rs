//! Put command - write a key.

use super::{DatabaseArgs, open_kv};
use anyhow::Result;
use clap::Args;
use tablekv::{PutOptions, PutValue};

#[derive(Args)]
pub struct PutCommand {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Key to write
    pub key: String,

    /// Value to store
    pub value: String,

    /// Parse the value as JSON instead of storing it as text
    #[arg(long, conflicts_with = "base64")]
    pub json: bool,

    /// The value is base64; store the decoded bytes
    #[arg(long)]
    pub base64: bool,

    /// Absolute expiry, epoch milliseconds
    #[arg(long)]
    pub expiration: Option<f64>,

    /// Expiry in seconds from now
    #[arg(long)]
    pub ttl: Option<f64>,
}

impl PutCommand {
    fn put_value(&self) -> Result<PutValue> {
        if self.json {
            let json: serde_json::Value = serde_json::from_str(&self.value)?;
            Ok(PutValue::try_from(json)?)
        } else if self.base64 {
            Ok(PutValue::from(tablekv::codec::decode_binary(&self.value)?))
        } else {
            Ok(PutValue::from(self.value.as_str()))
        }
    }

    pub async fn run(&self) -> Result<()> {
        let kv = open_kv(&self.db).await?;
        let options = PutOptions {
            expiration: self.expiration,
            expiration_ttl: self.ttl,
        };

        let ack = kv.put(&self.key, self.put_value()?, options).await?;
        println!("{}", serde_json::to_string(&ack)?);
        Ok(())
    }
}
