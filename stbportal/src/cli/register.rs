use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::device::{FileRegistry, register_device};

#[derive(Parser, Debug)]
pub struct RegisterCommand {
    /// Device MAC address (AA:BB:CC:DD:EE:FF)
    pub mac: String,

    /// Registry file to write to
    #[arg(short, long, env = "STBPORTAL_REGISTRY")]
    pub registry: PathBuf,
}

impl RegisterCommand {
    pub async fn run(self) -> Result<()> {
        let registry = FileRegistry::open(&self.registry)
            .await
            .with_context(|| format!("Failed to open device registry {}", self.registry.display()))?;

        let record = register_device(Some(&registry), &self.mac)
            .await
            .with_context(|| format!("Failed to register '{}'", self.mac))?;

        println!(
            "Registered {} in {} ({})",
            record.mac,
            registry.path().display(),
            record.registered.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(())
    }
}
