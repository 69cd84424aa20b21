/// Preference namespace, also the file stem of the preferences file
pub const SHARED_PREFS: &str = "sharedPrefs";

/// Preference keys. Installed data depends on these, never rename them.
pub const KEY_PREMIUM_PURCHASED: &str = "premiumPurchased";
pub const AUDIO_PREFERENCE: &str = "audioPreference";

/// Product identifier that unlocks ad-free play
pub const PREMIUM_PRODUCT_ID: &str = "premium";

/// Store identity
pub const APPLICATION_ID: &str = "uk.co.thomasroe.officequiz";
pub const PLAY_STORE_URL: &str = "https://play.google.com/store/apps/details?id=";

/// Support email
pub const SUPPORT_EMAIL: &str = "tom@scribbleapps.co.uk";
pub const SUPPORT_EMAIL_SUBJECT: &str = "The Office Trivia Quiz enquiry";

/// Sharing
pub const SHARE_MESSAGE: &str = "Play The Office Trivia Quiz on Android!\n\n";
pub const WHATSAPP_PACKAGE: &str = "com.whatsapp";
pub const WHATSAPP_SEND_URL: &str = "whatsapp://send?text=";

/// Toast texts
pub mod messages {
    pub const PREMIUM_PURCHASED: &str =
        "You have purchased premium - ads should no longer be displayed.";
    pub const PREMIUM_NOT_PURCHASED: &str =
        "It doesn't look like you've purchased premium. Ads will still show until it has been purchased.";
    pub const WHATSAPP_MISSING: &str = "Sorry, it doesn't look as if you have WhatsApp installed.";
    pub const ACTION_FAILED: &str = "Sorry, this action couldn't be performed right now.";
}

/// Purchase server URL. No server runs here yet, see `BillingApiClient`.
pub const BILLING_SERVER_URL: &str = "https://billing.scribbleapps.co.uk";

/// Environment override for the purchase server URL
pub const BILLING_URL_ENV: &str = "OFFICE_QUIZ_BILLING_URL";

/// Ed25519 public key for purchase list signatures (base64 encoded)
/// Signature checks are skipped while this is the placeholder
pub const BILLING_SERVER_PUBLIC_KEY: &str = "PLACEHOLDER_PUBLIC_KEY_BASE64";

/// Request timeout for the purchase server
pub const BILLING_TIMEOUT_SECS: u64 = 30;

/// File holding the per-install identifier
pub const INSTALL_ID_FILE: &str = ".install_id";

/// Purchase server connection settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingConfig {
    pub base_url: String,
    pub public_key: Option<String>,
}

impl BillingConfig {
    /// Defaults, with the server URL taken from the environment when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(BILLING_URL_ENV) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.base_url = url.to_string();
            }
        }
        config
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        let public_key = (BILLING_SERVER_PUBLIC_KEY != "PLACEHOLDER_PUBLIC_KEY_BASE64")
            .then(|| BILLING_SERVER_PUBLIC_KEY.to_string());

        Self {
            base_url: BILLING_SERVER_URL.to_string(),
            public_key,
        }
    }
}

/// API endpoint paths
pub mod endpoints {
    pub const OPEN_SESSION: &str = "/api/v1/billing/session";
    pub const LIST_PURCHASES: &str = "/api/v1/billing/purchases";
    pub const CLOSE_SESSION: &str = "/api/v1/billing/session/close";
}

/// Get current platform string
pub fn get_platform() -> &'static str {
    #[cfg(target_os = "android")]
    return "android";

    #[cfg(target_os = "ios")]
    return "ios";

    #[cfg(target_os = "windows")]
    return "windows";

    #[cfg(target_os = "macos")]
    return "macos";

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "ios",
        target_os = "android"
    )))]
    return "unknown";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_key_disables_signatures() {
        let config = BillingConfig::default();
        assert_eq!(config.public_key, None);
        assert_eq!(config.base_url, BILLING_SERVER_URL);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = BillingConfig {
            base_url: "http://localhost:8080".to_string(),
            public_key: None,
        };
        assert_eq!(
            config.endpoint(endpoints::LIST_PURCHASES),
            "http://localhost:8080/api/v1/billing/purchases"
        );
    }
}
