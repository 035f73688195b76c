use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depgate_schema::Schema;
use depgate_validation::Accumulation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Schema SDL path, relative to the config file.
    pub schema: PathBuf,

    #[serde(default)]
    pub accumulation: Accumulation,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let mut config = toml::from_str::<Config>(
            &std::fs::read_to_string(path)
                .with_context(|| format!("Failed to load config file '{}'.", path.display()))?,
        )
        .with_context(|| format!("Failed to parse config file '{}'.", path.display()))?;

        if let Some(dir) = path.parent() {
            config.schema = dir.join(&config.schema);
        }
        Ok(config)
    }

    pub fn load_schema(&self) -> Result<Schema> {
        let sdl = std::fs::read_to_string(&self.schema).with_context(|| {
            format!("Failed to load schema file '{}'.", self.schema.display())
        })?;
        Schema::parse(&sdl)
            .with_context(|| format!("Invalid schema file '{}'.", self.schema.display()))
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
