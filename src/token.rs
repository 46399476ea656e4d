//! Token gate
//!
//! Normalizes what the user types and checks it against the single accepted
//! token. Validation is a plain string comparison; everything else here is
//! about which message the user sees.

use thiserror::Error;

use crate::consts::{ACCEPTED_TOKEN, TOKEN_LEN};

/// Why a submitted token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Please enter a tracking token")]
    EmptyInput,
    #[error("Invalid token format. Must be 12 uppercase alphanumeric characters.")]
    FormatInvalid,
    #[error("Invalid Token")]
    TokenMismatch,
}

/// Force uppercase, keep only `[A-Z0-9]`, truncate to the token length
pub fn normalize(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(TOKEN_LEN)
        .collect()
}

/// True iff `token` is exactly the accepted value (case-sensitive)
#[inline]
pub fn validate(token: &str) -> bool {
    token == ACCEPTED_TOKEN
}

/// Classify a submitted token. Surrounding whitespace is ignored.
pub fn check(token: &str) -> Result<(), TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::EmptyInput);
    }
    if validate(token) {
        return Ok(());
    }
    if token.chars().count() == TOKEN_LEN {
        Err(TokenError::TokenMismatch)
    } else {
        Err(TokenError::FormatInvalid)
    }
}

/// Field contents plus the unlock flag for the Track action
#[derive(Debug, Clone, Default)]
pub struct TokenGate {
    value: String,
    unlocked: bool,
}

impl TokenGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keystroke path: the field is rewritten to its normalized form
    pub fn input(&mut self, raw: &str) -> &str {
        self.value = normalize(raw);
        &self.value
    }

    /// Programmatic fill (query parameter). Bypasses keystroke normalization,
    /// exactly like assigning the field's value does in the browser.
    pub fn prefill(&mut self, raw: &str) {
        self.value = raw.to_string();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check the current field value and update the unlock state
    pub fn submit(&mut self) -> Result<(), TokenError> {
        let outcome = check(&self.value);
        self.unlocked = outcome.is_ok();
        match outcome {
            Ok(()) => log::info!("Token accepted"),
            Err(e) => log::debug!("Token rejected: {:?}", e),
        }
        outcome
    }

    /// Whether the Track action is available
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Live validity of the field while typing (no unlock side effects)
    pub fn is_current_valid(&self) -> bool {
        validate(self.value.trim())
    }
}
