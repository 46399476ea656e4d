//! Transient UI pieces: toast, inline token feedback, field tint

use crate::token::TokenError;

/// Inline confirmation shown under the token field
pub const TOKEN_VALID_TEXT: &str = "✔ Token Valid - Ready to Track";

/// Toast styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

impl ToastKind {
    /// CSS border/background pair
    pub fn colors(&self) -> (&'static str, &'static str) {
        match self {
            ToastKind::Info => ("var(--gold)", "#1c1c1c"),
            ToastKind::Error => ("#f44336", "#2c1c1c"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

/// Single toast area; a new toast replaces the current one
#[derive(Debug, Clone, Default)]
pub struct ToastSlot {
    current: Option<Toast>,
    next_id: u64,
}

impl ToastSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast and return its id (used to dismiss exactly this one)
    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.next_id += 1;
        let toast = Toast {
            id: self.next_id,
            message: message.into(),
            kind,
        };
        log::debug!("Toast #{}: {}", toast.id, toast.message);
        self.current = Some(toast);
        self.next_id
    }

    /// Hide the toast if it is still the one identified by `id`
    pub fn dismiss(&mut self, id: u64) -> bool {
        if self.current.as_ref().is_some_and(|t| t.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    Success,
    Error,
}

impl FeedbackTone {
    pub fn color(&self) -> &'static str {
        match self {
            FeedbackTone::Success => "#4caf50",
            FeedbackTone::Error => "#f44336",
        }
    }
}

/// The line under the token field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub tone: FeedbackTone,
}

impl Feedback {
    pub fn valid() -> Self {
        Self {
            text: TOKEN_VALID_TEXT.to_string(),
            tone: FeedbackTone::Success,
        }
    }

    pub fn error(err: &TokenError) -> Self {
        Self {
            text: format!("✗ {}", err),
            tone: FeedbackTone::Error,
        }
    }
}

/// Border tint while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputTone {
    #[default]
    Neutral,
    Valid,
    Invalid,
}

impl InputTone {
    /// Inline border style, `None` to restore the stylesheet default
    pub fn border(&self) -> Option<&'static str> {
        match self {
            InputTone::Neutral => None,
            InputTone::Valid => Some("2px solid #4caf50"),
            InputTone::Invalid => Some("2px solid #f44336"),
        }
    }
}
