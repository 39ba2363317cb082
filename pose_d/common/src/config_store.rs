use crate::PoseConfig;
use anyhow::{bail, Context, Result};
use log::info;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct ConfigStore {
    pub data: PoseConfig,
    storage_path: PathBuf,
}

impl ConfigStore {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            data: PoseConfig::default(),
            storage_path: storage_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Transform config ids must be unique within a file.
    fn check_ids(data: &PoseConfig) -> Result<()> {
        let mut seen = HashSet::new();
        for config in &data.configs {
            if !seen.insert(config.instance_id) {
                bail!(
                    "Transform config id {} is declared more than once",
                    config.instance_id
                );
            }
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config dir: {:?}", parent))?;
            }
        }
        let file = File::create(&self.storage_path).context("Failed to create config file")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.data)
            .context("Failed to serialize config")?;
        writer.flush().context("Failed to write config file")?;
        info!("Saved config to {:?}", self.storage_path);
        Ok(())
    }

    pub fn load(&mut self) -> Result<()> {
        if !self.storage_path.exists() {
            info!(
                "No config file found at {:?}, using defaults",
                self.storage_path
            );
            return Ok(());
        }

        let file = File::open(&self.storage_path).context("Failed to open config file")?;
        let reader = BufReader::new(file);
        let data: PoseConfig =
            serde_json::from_reader(reader).context("Failed to deserialize config")?;

        Self::check_ids(&data)
            .with_context(|| format!("Invalid config file {:?}", self.storage_path))?;

        self.data = data;
        info!("Loaded config from {:?}", self.storage_path);
        Ok(())
    }

    /// Loads the file, or writes the defaults there when it does not exist yet.
    pub fn load_or_create(&mut self) -> Result<()> {
        if self.storage_path.exists() {
            self.load()
        } else {
            info!("Config not found. Creating default at {:?}", self.storage_path);
            self.data = PoseConfig::default();
            self.save()
        }
    }
}
