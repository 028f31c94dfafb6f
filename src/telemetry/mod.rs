//! # Telemetry Module
//!
//! Logs published channel updates.
//!
//! This module handles:
//! - Following the channel store's snapshot stream
//! - Formatting the channels written by each batch with registry units
//! - Stopping cleanly on shutdown

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::ChannelRegistry;
use crate::state::ChannelSnapshot;

/// Channel update sink that writes each batch to the log
#[derive(Debug, Clone)]
pub struct UpdateLogger {
    registry: Arc<ChannelRegistry>,
}

impl UpdateLogger {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Format the channels written by the snapshot's latest batch
    ///
    /// Lines follow registry order. Numeric channels carry their unit symbol.
    pub fn format_batch(&self, snapshot: &ChannelSnapshot) -> Vec<String> {
        let written = snapshot.last_batch_keys();

        self.registry
            .descriptors()
            .iter()
            .filter(|d| written.contains(&d.key))
            .filter_map(|d| {
                let value = snapshot.value(d.key)?;
                Some(match d.unit {
                    Some(unit) => format!("{} = {} {}", d.name, value, unit.symbol()),
                    None => format!("{} = {}", d.name, value),
                })
            })
            .collect()
    }

    /// Log one snapshot
    pub fn log(&self, snapshot: &ChannelSnapshot) {
        let lines = self.format_batch(snapshot);
        info!(
            "Batch #{}: {} channel(s) updated",
            snapshot.sequence(),
            lines.len()
        );
        for line in lines {
            info!("  {}", line);
        }
    }

    /// Log every published snapshot until cancelled or the store goes away
    pub async fn run(
        self,
        mut updates: watch::Receiver<Arc<ChannelSnapshot>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        debug!("Channel store closed");
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    self.log(&snapshot);
                }
            }
        }
    }
}
