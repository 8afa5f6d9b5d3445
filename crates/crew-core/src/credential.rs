//! Credential gate.
//!
//! Holds the backend API key and whether it was last judged valid. A key is
//! only sent to the validation endpoint when it is at least
//! [`MIN_ATTEMPT_LEN`] characters long. When the endpoint cannot be reached
//! the store drops into a degraded mode and accepts any key of at least
//! [`MIN_PLAUSIBLE_LEN`] characters, so an unreachable validator never locks
//! the user out.

use async_trait::async_trait;

use crate::settings::{Settings, SettingsManager, UiPreferences};

/// Shorter keys are rejected without a network round trip.
pub const MIN_ATTEMPT_LEN: usize = 10;
/// Length a key needs to be accepted in degraded mode, and to count as
/// present at all.
pub const MIN_PLAUSIBLE_LEN: usize = 20;

/// The validator could not give a definitive answer (transport failure,
/// non-success status, unparseable body).
#[derive(Debug, thiserror::Error)]
#[error("key validator unavailable: {0}")]
pub struct ValidatorUnavailable(pub String);

/// Something that can ask the backend whether a key works.
#[async_trait]
pub trait KeyValidator: Send + Sync {
    async fn validate_key(&self, key: &str) -> Result<bool, ValidatorUnavailable>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Too short to bother the validator.
    TooShort,
    /// The validator answered.
    Confirmed(bool),
    /// The validator was unreachable; the length heuristic decided.
    Degraded(bool),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        match self {
            ValidationOutcome::TooShort => false,
            ValidationOutcome::Confirmed(valid) | ValidationOutcome::Degraded(valid) => *valid,
        }
    }
}

/// Persisted credential plus UI preferences.
#[derive(Debug)]
pub struct CredentialStore {
    settings: Settings,
    manager: Option<SettingsManager>,
}

impl CredentialStore {
    /// Load from disk (defaults when missing). Every mutation is written back.
    pub fn load(manager: SettingsManager) -> Self {
        let settings = manager.load_or_default();
        Self {
            settings,
            manager: Some(manager),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            settings: Settings::default(),
            manager: None,
        }
    }

    pub fn credential(&self) -> &str {
        &self.settings.credential.api_key
    }

    pub fn is_validated(&self) -> bool {
        self.settings.credential.valid
    }

    pub fn preferences(&self) -> &UiPreferences {
        &self.settings.ui
    }

    pub fn set_preferences(&mut self, ui: UiPreferences) {
        self.settings.ui = ui;
        self.persist();
    }

    /// Replace the stored key and mark it unvalidated.
    pub fn set_credential(&mut self, value: impl Into<String>) {
        self.settings.credential.api_key = value.into();
        self.settings.credential.valid = false;
        self.persist();
    }

    /// Validate `key` and, unless it was too short to try, store it together
    /// with the verdict. Never fails; see the module docs for the fallback.
    pub async fn validate(&mut self, key: &str, validator: &dyn KeyValidator) -> ValidationOutcome {
        let key = key.trim();
        if key.chars().count() < MIN_ATTEMPT_LEN {
            self.settings.credential.valid = false;
            self.persist();
            return ValidationOutcome::TooShort;
        }

        let outcome = match validator.validate_key(key).await {
            Ok(valid) => ValidationOutcome::Confirmed(valid),
            Err(e) => {
                let plausible = key.chars().count() >= MIN_PLAUSIBLE_LEN;
                tracing::warn!(error = %e, accepted = plausible, "key validation degraded to length check");
                ValidationOutcome::Degraded(plausible)
            }
        };

        self.settings.credential.api_key = key.to_string();
        self.settings.credential.valid = outcome.is_valid();
        self.persist();
        outcome
    }

    /// Erase the key and its validity flag.
    pub fn clear(&mut self) {
        self.settings.credential.api_key.clear();
        self.settings.credential.valid = false;
        self.persist();
    }

    /// A plausible key is stored, whatever its validity.
    pub fn has_credential(&self) -> bool {
        self.credential().chars().count() >= MIN_PLAUSIBLE_LEN
    }

    /// A plausible key is stored and was judged valid.
    pub fn has_valid_credential(&self) -> bool {
        self.has_credential() && self.is_validated()
    }

    fn persist(&self) {
        if let Some(manager) = &self.manager {
            if let Err(e) = manager.save(&self.settings) {
                tracing::warn!(path = %manager.path().display(), error = %e, "failed to persist settings");
            }
        }
    }
}
