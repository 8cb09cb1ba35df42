use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::config::CrewdeskConfig;

const CONFIG_FILE: &str = "crewdesk.toml";

/// Writes a default configuration file, refusing to clobber one without `--force`
pub struct InitCommand {
    pub force: bool,
    pub dir: PathBuf,
}

impl InitCommand {
    pub fn new(force: bool) -> Self {
        Self {
            force,
            dir: PathBuf::from("."),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        if path.exists() && !self.force {
            return Err(anyhow!(
                "{} already exists; re-run with --force to overwrite it",
                path.display()
            ));
        }

        CrewdeskConfig::default().save_to_file(&path)?;
        println!("✅ Wrote {}", path.display());
        println!("   💡 Set backend.url and backend.anon_key, or kind = \"local\" to work offline");
        Ok(())
    }
}
