//! Get command - print a key's value as JSON.

use super::{DatabaseArgs, open_kv};
use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::Value as JsonValue;
use tablekv::{GetOptions, ValueType};

#[derive(Clone, Copy, ValueEnum)]
pub enum TypeArg {
    String,
    Json,
    ArrayBuffer,
    Stream,
}

impl From<TypeArg> for ValueType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::String => ValueType::Text,
            TypeArg::Json => ValueType::Json,
            TypeArg::ArrayBuffer => ValueType::ArrayBuffer,
            TypeArg::Stream => ValueType::Stream,
        }
    }
}

#[derive(Args)]
pub struct GetCommand {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Key to read
    pub key: String,

    /// How to interpret the stored value
    #[arg(long = "type", value_enum, default_value = "string")]
    pub value_type: TypeArg,
}

impl GetCommand {
    pub async fn run(&self) -> Result<()> {
        let kv = open_kv(&self.db).await?;

        let value = kv
            .get(&self.key, GetOptions::new(self.value_type.into()))
            .await?;
        let json = match value {
            Some(value) => value.into_json().await,
            None => JsonValue::Null,
        };
        // let a lazy expiry delete finish before the process exits
        kv.settle().await;

        println!("{}", serde_json::to_string(&json)?);
        Ok(())
    }
}
