use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::exercise::Exercise;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Host-tunable pacing. Form thresholds are fixed and do not live here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    /// How often a frame is pulled and analyzed while recording.
    pub analysis_interval_ms: u64,
    /// Pause between stop and report, so the UI can show its "analyzing" state.
    pub finalize_delay_ms: u64,
    /// Estimator calls slower than this are dropped as no-pose frames.
    pub estimator_timeout_ms: u64,
    pub default_exercise: Exercise,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            analysis_interval_ms: 500,
            finalize_delay_ms: 2000,
            estimator_timeout_ms: 2000,
            default_exercise: Exercise::Squat,
        }
    }
}

impl AnalysisSettings {
    pub fn analysis_interval(&self) -> Duration {
        // A zero period would make the ticker panic
        Duration::from_millis(self.analysis_interval_ms.max(1))
    }

    pub fn finalize_delay(&self) -> Duration {
        Duration::from_millis(self.finalize_delay_ms)
    }

    pub fn estimator_timeout(&self) -> Duration {
        Duration::from_millis(self.estimator_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredSettings {
    analysis: AnalysisSettings,
}

/// JSON-file backed settings, read once and written through on update.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StoredSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring malformed settings in {}: {}", path.display(), err);
                StoredSettings::default()
            })
        } else {
            StoredSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn analysis(&self) -> Result<AnalysisSettings> {
        let guard = self
            .data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        Ok(guard.analysis.clone())
    }

    pub fn update_analysis(&self, settings: AnalysisSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.analysis = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: StoredSettings = serde_json::from_str(&contents)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &StoredSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
