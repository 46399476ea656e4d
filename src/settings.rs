//! Widget settings
//!
//! Tunables for the particle emitter and UI timings. Every field has a
//! default, so a partial JSON document is enough. Nothing is persisted: the
//! web build reads an optional inline JSON block, the native demo an optional
//! file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Particles ===
    /// Ambient pointer particles
    pub particles: bool,
    /// Live particle cap (oldest evicted first)
    pub max_particles: usize,
    /// Particles per pointer-move burst
    pub move_burst: usize,
    /// Particles per click burst
    pub click_burst: usize,
    /// Minimum gap between pointer-move bursts (ms)
    pub spawn_interval_ms: f64,
    /// Fixed RNG seed; the host picks one when absent
    pub seed: Option<u64>,

    // === UI timings (ms) ===
    pub toast_duration_ms: f64,
    pub feedback_fade_ms: f64,
    pub autovalidate_delay_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: true,
            max_particles: MAX_PARTICLES,
            move_burst: MOVE_BURST,
            click_burst: CLICK_BURST,
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            seed: None,

            toast_duration_ms: TOAST_DURATION_MS,
            feedback_fade_ms: FEEDBACK_FADE_MS,
            autovalidate_delay_ms: AUTOVALIDATE_DELAY_MS,
        }
    }
}

impl Settings {
    /// Parse and validate a JSON settings document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.particles && self.max_particles == 0 {
            return Err(SettingsError::Invalid(
                "max_particles must be at least 1 when particles are enabled".into(),
            ));
        }
        let timings = [
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("toast_duration_ms", self.toast_duration_ms),
            ("feedback_fade_ms", self.feedback_fade_ms),
            ("autovalidate_delay_ms", self.autovalidate_delay_ms),
        ];
        for (name, value) in timings {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Effective particle cap (0 when particles are off)
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.max_particles
        }
    }

    /// Id of the inline JSON element the web build reads
    pub const ELEMENT_ID: &'static str = "tracker-settings";

    /// Load settings from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        match text {
            Some(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from #{}", Self::ELEMENT_ID);
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring settings: {}", e);
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from an optional JSON file (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::from_json(&json)
            .with_context(|| format!("parsing settings from {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
