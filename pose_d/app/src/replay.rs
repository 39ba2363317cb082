//! Hand frames recorded as JSON lines, one `HandFrame` per line.

use anyhow::{Context, Result};
use api::{HandFrame, HandTrackingSource};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

pub struct ReplaySource {
    path: Option<PathBuf>,
    reader: Option<Box<dyn BufRead + Send>>,
    line_no: usize,
    skipped: usize,
}

impl ReplaySource {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            reader: None,
            line_no: 0,
            skipped: 0,
        }
    }

    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            path: None,
            reader: Some(Box::new(reader)),
            line_no: 0,
            skipped: 0,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl HandTrackingSource for ReplaySource {
    fn initialize(&mut self) -> Result<()> {
        if self.reader.is_some() {
            return Ok(());
        }
        let Some(path) = &self.path else {
            anyhow::bail!("Replay source has neither a path nor a reader");
        };
        let file = File::open(path)
            .with_context(|| format!("Failed to open frame recording {:?}", path))?;
        self.reader = Some(Box::new(BufReader::new(file)));
        info!("Replaying hand frames from {:?}", path);
        Ok(())
    }

    fn update(&mut self, frame: &mut HandFrame) -> Result<bool> {
        let Some(reader) = self.reader.as_mut() else {
            anyhow::bail!("Replay source is not initialized");
        };

        let mut line = String::new();
        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read line {}", self.line_no + 1))?;
            if read == 0 {
                return Ok(false);
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<HandFrame>(trimmed) {
                Ok(parsed) => {
                    *frame = parsed;
                    return Ok(true);
                }
                Err(e) => {
                    warn!("Skipping malformed frame on line {}: {}", self.line_no, e);
                    self.skipped += 1;
                }
            }
        }
    }

    fn unload(&mut self) {
        self.reader = None;
    }
}
