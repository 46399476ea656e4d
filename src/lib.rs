//! Shipment Tracker - a token-gated tracking widget
//!
//! Core modules:
//! - `token`: Token gate (input normalization and validation)
//! - `timeline`: Cancellable scheduler and the scripted roadmap sequencer
//! - `particles`: Ambient pointer-driven particle emitter
//! - `ui`: Toasts, inline feedback and input tint
//! - `app`: Composition root driven by host time
//! - `platform`: Browser glue (wasm32 only)
//! - `settings`: Tunables loaded from JSON

pub mod app;
pub mod particles;
pub mod platform;
pub mod settings;
pub mod timeline;
pub mod token;
pub mod ui;

pub use app::{TrackerApp, UiTask};
pub use particles::{Particle, ParticleEmitter};
pub use settings::{Settings, SettingsError};
pub use timeline::{NodeState, Scheduler, TaskHandle, TimelineSequencer, VisualProgressState};
pub use token::{TokenError, TokenGate};

/// Widget configuration constants
pub mod consts {
    /// The single accepted tracking token
    pub const ACCEPTED_TOKEN: &str = "AU46718ED4H2";
    /// Required token length after normalization
    pub const TOKEN_LEN: usize = 12;

    /// Delay before a query-parameter token is validated
    pub const AUTOVALIDATE_DELAY_MS: f64 = 500.0;
    /// How long an inline error line stays before fading
    pub const FEEDBACK_FADE_MS: f64 = 3000.0;
    /// Default toast lifetime
    pub const TOAST_DURATION_MS: f64 = 7000.0;
    /// Gap between the paused stage firing and its notification
    pub const PAUSE_NOTICE_DELAY_MS: f64 = 800.0;

    /// Live particle cap (oldest evicted first)
    pub const MAX_PARTICLES: usize = 15;
    /// Minimum gap between pointer-move bursts
    pub const SPAWN_INTERVAL_MS: f64 = 50.0;
    /// Particles per pointer-move burst
    pub const MOVE_BURST: usize = 3;
    /// Particles per click burst
    pub const CLICK_BURST: usize = 8;

    /// Per-frame particle physics
    pub const PARTICLE_GRAVITY: f32 = 0.05;
    pub const PARTICLE_DAMPING: f32 = 0.98;
    pub const PARTICLE_SPREAD: f32 = 15.0;
    pub const PARTICLE_MAX_SPEED: f32 = 2.0;
    pub const SPARKLE_CHANCE: f64 = 0.3;
    /// Life at or below this is spent; absorbs f32 drift in `life -= decay`
    pub const PARTICLE_MIN_LIFE: f32 = 1e-5;
}
