use serde::{Deserialize, Serialize};

/// Snapshot of the menu preferences for the frontend
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub audio_enabled: bool,
    pub premium_purchased: bool,
}

impl Default for PreferenceRecord {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            premium_purchased: false,
        }
    }
}

/// Opaque handle to an open billing session
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// What a finished verification concluded
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Purchased,
    NotPurchased,
}

/// Where the purchase verifier currently is
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case", tag = "phase", content = "verdict")]
pub enum VerifierPhase {
    #[default]
    Idle,
    SessionStarting,
    QueryingPurchases,
    Done(Verdict),
}

impl VerifierPhase {
    /// A session is being opened or queried
    pub fn is_busy(&self) -> bool {
        matches!(self, VerifierPhase::SessionStarting | VerifierPhase::QueryingPurchases)
    }
}

/// Result of a restore-purchase request, as seen by the caller
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    Purchased,
    NotPurchased,
    /// A verification was already in flight; nothing was started
    AlreadyRunning,
    /// The screen closed before the service answered
    Discarded,
}

impl From<Verdict> for RestoreOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Purchased => RestoreOutcome::Purchased,
            Verdict::NotPurchased => RestoreOutcome::NotPurchased,
        }
    }
}

/// Screens reachable from the menu
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    HowToPlay,
    Credits,
}

/// Toast payload emitted to the webview
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub long: bool,
}

/// Errors from the preference store
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors from the purchase service
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("Could not open billing session: {0}")]
    SessionOpenFailed(String),

    #[error("Purchase query failed: {0}")]
    QueryFailed(String),

    #[error("Billing service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Purchase list signature verification failed")]
    SignatureInvalid,
}

/// Errors from handing a URL to another app
#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    #[error("No installed app can handle {0}")]
    NotInstalled(String),

    #[error("Launch failed: {0}")]
    Failed(String),
}

macro_rules! serialize_as_display {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.serialize_str(&self.to_string())
                }
            }
        )*
    };
}

serialize_as_display!(SettingsError, BillingError, LaunchError);
