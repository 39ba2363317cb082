mod replay;

use anyhow::{Context, Result};
use api::{HandFrame, HandTrackingSource};
use common::config_store::ConfigStore;
use common::{FeatureWatch, TransformConfig, TransformFeatureStateProvider};
use log::{debug, error, info, trace, warn};
use replay::ReplaySource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MAX_REALTIME_GAP: f64 = 1.0;

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Keeps the watches whose config is registered and has thresholds for the feature.
fn usable_watches(provider: &TransformFeatureStateProvider, watches: &[FeatureWatch]) -> Vec<FeatureWatch> {
    watches
        .iter()
        .filter(|w| match provider.config(w.config_id) {
            Ok(config) if config.thresholds_for(w.feature).is_some() => true,
            Ok(_) => {
                warn!(
                    "Ignoring watch on {:?}: config {} has no thresholds for it",
                    w.feature, w.config_id
                );
                false
            }
            Err(e) => {
                warn!("Ignoring watch on {:?}: {}", w.feature, e);
                false
            }
        })
        .copied()
        .collect()
}

/// Registers every config, stopping at the first one the provider rejects.
fn register_configs(
    provider: &mut TransformFeatureStateProvider,
    configs: &[TransformConfig],
) -> Result<()> {
    for transform_config in configs.iter().cloned() {
        let id = transform_config.instance_id;
        provider
            .register_config(transform_config)
            .with_context(|| format!("✗ Failed to register transform config {}", id))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    info!("Starting...");
    debug!("Debug logging is active");
    trace!("Trace logging is active");

    let args: Vec<String> = std::env::args().collect();
    let config_path = arg_value(&args, "--config").unwrap_or("config.json");

    let mut store = ConfigStore::new(config_path);
    store
        .load_or_create()
        .with_context(|| format!("Failed to load config {:?}", store.path()))?;
    let config = store.data.clone();
    info!("Loaded Config: {:?}", config.provider);

    let frames_path = arg_value(&args, "--frames").unwrap_or(&config.frames_path);
    let realtime = config.realtime || args.iter().any(|a| a == "--realtime");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received Ctrl-C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let mut provider = TransformFeatureStateProvider::new(config.provider.clone());
    register_configs(&mut provider, &config.configs)?;
    let watches = usable_watches(&provider, &config.watches);
    if watches.is_empty() {
        warn!("No usable watches configured; no states will be reported.");
    }

    let mut source = ReplaySource::open(frames_path);
    source.initialize()?;

    let mut frame = HandFrame::default();
    let mut last_time: Option<f64> = None;
    let mut frames = 0usize;
    let mut dropped = 0usize;
    let mut transitions = 0usize;

    while running.load(Ordering::SeqCst) {
        match source.update(&mut frame) {
            Ok(true) => {}
            Ok(false) => {
                info!("End of recording reached.");
                break;
            }
            Err(e) => {
                error!("Failed to read frame: {:#}", e);
                break;
            }
        }

        if realtime {
            if let Some(last) = last_time {
                let gap = (frame.time - last).clamp(0.0, MAX_REALTIME_GAP);
                thread::sleep(Duration::from_secs_f64(gap));
            }
            last_time = Some(frame.time);
        }

        if let Err(e) = provider.tick(&frame) {
            warn!("Dropping frame: {}", e);
            dropped += 1;
            continue;
        }
        frames += 1;

        for watch in &watches {
            if let Err(e) = provider.current_state(watch.config_id, watch.feature) {
                error!("Failed to read {:?} of config {}: {}", watch.feature, watch.config_id, e);
            }
            #[cfg(feature = "xtralog")]
            if let Ok(Some(value)) = provider.feature_value(watch.config_id, watch.feature) {
                trace!("Config {} {:?} value {:.2}", watch.config_id, watch.feature, value);
            }
        }

        for t in provider.drain_transitions() {
            transitions += 1;
            info!(
                "[{}] config {} {:?}: {} -> {}",
                t.tick_id,
                t.config_id,
                t.feature,
                t.from.as_deref().unwrap_or("<unset>"),
                t.to.as_deref().unwrap_or("<unset>")
            );
        }
    }

    source.unload();
    provider.shutdown();
    info!(
        "Processed {} frame(s), dropped {}, skipped {} malformed line(s), {} transition(s).",
        frames,
        dropped,
        source.skipped(),
        transitions
    );
    Ok(())
}
