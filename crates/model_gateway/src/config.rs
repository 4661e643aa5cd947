use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use webs_core::{config::ProviderDefinition, Error, Result};

/// Provider table loaded from a standalone `providers.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTable {
    pub providers: Vec<ProviderDefinition>,
}

impl ProviderTable {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::config(format!("Failed to read provider table: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse provider table: {}", e)))?;

        for provider in &table.providers {
            provider.validate()?;
        }
        Ok(table)
    }
}
