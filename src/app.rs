//! Composition root
//!
//! `TrackerApp` owns every piece of page state and is driven entirely by the
//! host: DOM events become method calls, and each animation frame calls
//! `frame` with the current time. The host reads the getters back to draw.

use glam::Vec2;

use crate::particles::ParticleEmitter;
use crate::settings::Settings;
use crate::timeline::{PAUSE_NOTICE, Scheduler, TaskHandle, TimelineEvent, TimelineSequencer};
use crate::token::{TokenError, TokenGate};
use crate::ui::{Feedback, FeedbackTone, InputTone, ToastKind, ToastSlot};

/// Delayed UI work outside the roadmap script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiTask {
    /// Validate a query-parameter token
    AutoValidate,
    /// Hide toast with this id
    DismissToast(u64),
    /// Fade an inline error line
    FadeFeedback,
}

#[derive(Debug, Clone)]
pub struct TrackerApp {
    settings: Settings,
    gate: TokenGate,
    sequencer: TimelineSequencer,
    emitter: ParticleEmitter,
    toast: ToastSlot,
    tasks: Scheduler<UiTask>,
    toast_dismiss: Option<TaskHandle>,
    feedback_fade: Option<TaskHandle>,
    feedback: Option<Feedback>,
    input_tone: InputTone,
    track_visible: bool,
    roadmap_visible: bool,
    shut_down: bool,
}

impl TrackerApp {
    /// `seed` is used unless the settings pin one
    pub fn new(settings: Settings, seed: u64) -> Self {
        let seed = settings.seed.unwrap_or(seed);
        log::info!("Tracker initialized (particle seed {})", seed);
        Self {
            emitter: ParticleEmitter::new(&settings, seed),
            settings,
            gate: TokenGate::new(),
            sequencer: TimelineSequencer::new(),
            toast: ToastSlot::new(),
            tasks: Scheduler::new(),
            toast_dismiss: None,
            feedback_fade: None,
            feedback: None,
            input_tone: InputTone::Neutral,
            track_visible: false,
            roadmap_visible: false,
            shut_down: false,
        }
    }

    /// Fill the field from the address bar and validate shortly after
    pub fn prefill(&mut self, raw: &str, now_ms: f64) {
        self.tasks.advance_to(now_ms);
        self.gate.prefill(raw);
        self.tasks
            .schedule(self.settings.autovalidate_delay_ms, UiTask::AutoValidate);
        log::info!("Token prefilled from query string");
    }

    /// Keystroke: normalize the field and retint it. Returns the new value.
    pub fn input(&mut self, raw: &str) -> &str {
        self.gate.input(raw);
        self.input_tone = if self.gate.value().trim().is_empty() {
            self.feedback = None;
            InputTone::Neutral
        } else if self.gate.is_current_valid() {
            InputTone::Valid
        } else {
            InputTone::Invalid
        };
        self.gate.value()
    }

    /// Validate button / Enter key.
    ///
    /// After `shutdown` the field is only classified; no page state changes.
    pub fn validate(&mut self, now_ms: f64) -> Result<(), TokenError> {
        if self.shut_down {
            log::debug!("Validate ignored after shutdown");
            return crate::token::check(self.gate.value());
        }
        self.tasks.advance_to(now_ms);
        if let Some(handle) = self.feedback_fade.take() {
            self.tasks.cancel(handle);
        }

        let outcome = self.gate.submit();
        match &outcome {
            Ok(()) => {
                self.feedback = Some(Feedback::valid());
                self.track_visible = true;
            }
            Err(err) => {
                self.feedback = Some(Feedback::error(err));
                self.feedback_fade = Some(
                    self.tasks
                        .schedule(self.settings.feedback_fade_ms, UiTask::FadeFeedback),
                );
                self.show_toast(err.to_string(), ToastKind::Error);
                self.track_visible = false;
                self.roadmap_visible = false;
                self.sequencer.cancel_pending();
            }
        }
        outcome
    }

    /// Track button. Ignored while the gate is locked or after shutdown.
    pub fn track(&mut self, now_ms: f64) -> bool {
        if self.shut_down {
            log::debug!("Track ignored after shutdown");
            return false;
        }
        if !self.gate.is_unlocked() {
            log::warn!("Track requested without a validated token");
            return false;
        }
        self.roadmap_visible = true;
        self.sequencer.start(now_ms);
        true
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, now_ms: f64) -> usize {
        self.emitter.on_pointer_move(Vec2::new(x, y), now_ms)
    }

    pub fn pointer_click(&mut self, x: f32, y: f32) -> usize {
        self.emitter.on_pointer_click(Vec2::new(x, y))
    }

    /// One display frame: fire due timers, then step particles once.
    /// Returns the outcome of an auto-validation that ran during this frame.
    pub fn frame(&mut self, now_ms: f64) -> Option<Result<(), TokenError>> {
        if self.shut_down {
            return None;
        }

        let mut validated = None;
        while let Some(fired) = self.tasks.pop_due(now_ms) {
            match fired.payload {
                UiTask::AutoValidate => {
                    let outcome = self.validate(fired.due_ms);
                    match &outcome {
                        Ok(()) => log::debug!("Query token validated"),
                        Err(e) => log::debug!("Query token rejected: {:?}", e),
                    }
                    validated = Some(outcome);
                }
                UiTask::DismissToast(id) => {
                    self.toast.dismiss(id);
                    self.toast_dismiss = None;
                }
                UiTask::FadeFeedback => {
                    if self
                        .feedback
                        .as_ref()
                        .is_some_and(|f| f.tone == FeedbackTone::Error)
                    {
                        self.feedback = None;
                    }
                    self.feedback_fade = None;
                }
            }
        }
        self.tasks.advance_to(now_ms);

        for event in self.sequencer.advance(now_ms) {
            if event == TimelineEvent::Paused {
                self.show_toast(PAUSE_NOTICE, ToastKind::Info);
            }
        }

        self.emitter.update();
        validated
    }

    fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        if let Some(handle) = self.toast_dismiss.take() {
            self.tasks.cancel(handle);
        }
        let id = self.toast.show(message, kind);
        self.toast_dismiss = Some(
            self.tasks
                .schedule(self.settings.toast_duration_ms, UiTask::DismissToast(id)),
        );
    }

    /// Page-unload hook. Returns ids of particles whose visuals must go.
    pub fn shutdown(&mut self) -> Vec<u64> {
        self.shut_down = true;
        let tasks = self.tasks.cancel_all();
        let cues = self.sequencer.cancel_pending();
        log::info!("Shutting down ({} ui tasks, {} cues cancelled)", tasks, cues);
        self.toast_dismiss = None;
        self.feedback_fade = None;
        self.emitter.shutdown()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gate(&self) -> &TokenGate {
        &self.gate
    }

    pub fn sequencer(&self) -> &TimelineSequencer {
        &self.sequencer
    }

    pub fn emitter(&self) -> &ParticleEmitter {
        &self.emitter
    }

    pub fn toast(&self) -> &ToastSlot {
        &self.toast
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn input_tone(&self) -> InputTone {
        self.input_tone
    }

    pub fn is_track_visible(&self) -> bool {
        self.track_visible
    }

    pub fn is_roadmap_visible(&self) -> bool {
        self.roadmap_visible
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// UI tasks still queued
    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ACCEPTED_TOKEN;

    fn app() -> TrackerApp {
        TrackerApp::new(Settings::default(), 42)
    }

    #[test]
    fn test_input_tone() {
        let mut app = app();
        assert_eq!(app.input("au4"), "AU4");
        assert_eq!(app.input_tone(), InputTone::Invalid);
        app.input("au46718ed4h2");
        assert_eq!(app.input_tone(), InputTone::Valid);
        app.input("");
        assert_eq!(app.input_tone(), InputTone::Neutral);
    }

    #[test]
    fn test_emptying_field_hides_feedback() {
        let mut app = app();
        app.input("AB");
        let _ = app.validate(0.0);
        assert!(app.feedback().is_some());
        app.input("");
        assert!(app.feedback().is_none());
    }

    #[test]
    fn test_error_feedback_fades() {
        let mut app = app();
        app.input("AB");
        assert_eq!(app.validate(0.0), Err(TokenError::FormatInvalid));
        app.frame(2999.0);
        assert!(app.feedback().is_some());
        app.frame(3000.0);
        assert!(app.feedback().is_none());
    }

    #[test]
    fn test_success_feedback_does_not_fade() {
        let mut app = app();
        app.input("AB");
        let _ = app.validate(0.0);
        app.input(ACCEPTED_TOKEN);
        assert!(app.validate(1000.0).is_ok());
        app.frame(10_000.0);
        assert_eq!(app.feedback(), Some(&Feedback::valid()));
    }

    #[test]
    fn test_error_toast_dismisses() {
        let mut app = app();
        app.input("");
        let _ = app.validate(0.0);
        assert_eq!(
            app.toast().current().map(|t| t.message.as_str()),
            Some("Please enter a tracking token")
        );
        assert_eq!(app.toast().current().map(|t| t.kind), Some(ToastKind::Error));
        app.frame(6999.0);
        assert!(app.toast().current().is_some());
        app.frame(7000.0);
        assert!(app.toast().current().is_none());
    }

    #[test]
    fn test_track_requires_unlock() {
        let mut app = app();
        assert!(!app.track(0.0));
        assert!(!app.is_roadmap_visible());
        assert_eq!(app.sequencer().runs(), 0);
    }

    #[test]
    fn test_prefill_autovalidates() {
        let mut app = app();
        app.prefill(ACCEPTED_TOKEN, 0.0);
        assert_eq!(app.frame(499.0), None);
        assert!(!app.is_track_visible());
        assert_eq!(app.frame(516.0), Some(Ok(())));
        assert_eq!(app.frame(533.0), None);
        assert!(app.is_track_visible());
        assert!(app.gate().is_unlocked());
    }

    #[test]
    fn test_relock_abandons_run() {
        let mut app = app();
        app.input(ACCEPTED_TOKEN);
        let _ = app.validate(0.0);
        app.track(0.0);
        app.frame(1000.0);
        app.input("AB");
        let _ = app.validate(1500.0);
        assert!(!app.is_roadmap_visible());
        assert_eq!(app.sequencer().pending_cues(), 0);
    }

    #[test]
    fn test_shutdown_stops_everything() {
        let mut app = app();
        app.input(ACCEPTED_TOKEN);
        let _ = app.validate(0.0);
        app.track(0.0);
        app.pointer_click(10.0, 10.0);
        let cleared = app.shutdown();
        assert_eq!(cleared.len(), 8);
        assert_eq!(app.pending_tasks(), 0);
        assert_eq!(app.sequencer().pending_cues(), 0);

        app.frame(10_000.0);
        assert_eq!(app.sequencer().state().progress_percent, 0);
        assert_eq!(app.pointer_click(10.0, 10.0), 0);
    }

    #[test]
    fn test_validate_and_track_inert_after_shutdown() {
        let mut app = app();
        app.shutdown();

        app.input(ACCEPTED_TOKEN);
        assert!(app.validate(0.0).is_ok());
        assert!(!app.gate().is_unlocked());
        assert!(!app.is_track_visible());
        assert!(app.feedback().is_none());

        assert!(!app.track(0.0));
        assert!(!app.is_roadmap_visible());
        assert_eq!(app.sequencer().runs(), 0);
        assert_eq!(app.frame(5000.0), None);
        assert_eq!(app.pending_tasks(), 0);

        app.input("AB");
        assert_eq!(app.validate(6000.0), Err(TokenError::FormatInvalid));
        assert!(app.toast().current().is_none());
    }

    #[test]
    fn test_rejected_query_token_reported_by_frame() {
        let mut app = app();
        app.prefill("AB", 0.0);
        assert_eq!(app.frame(500.0), Some(Err(TokenError::FormatInvalid)));
        assert!(!app.is_track_visible());
    }
}
