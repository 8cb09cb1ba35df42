use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::backend::LocalBackend;
use crate::booking::Booking;
use crate::config::{config, BackendKind};

/// Replaces the local backend's bookings table with the rows in a JSON file
pub struct SeedCommand {
    pub file: PathBuf,
}

impl SeedCommand {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }

    pub async fn execute(&self) -> Result<()> {
        let settings = &config()?.backend;
        if settings.kind != BackendKind::Local {
            bail!("seeding only applies to the local backend (set backend.kind = \"local\")");
        }

        let raw = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("reading {}", self.file.display()))?;
        let bookings: Vec<Booking> =
            serde_json::from_slice(&raw).with_context(|| format!("parsing {}", self.file.display()))?;

        let count = bookings.len();
        let backend = LocalBackend::from_config(settings);
        backend.seed_bookings(bookings).await?;
        println!("🌱 Loaded {count} bookings into {}", backend.root().display());
        Ok(())
    }
}
