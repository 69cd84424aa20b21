use crate::menu::types::{LaunchError, Screen, Toast};
use tauri::{AppHandle, Emitter};
use tauri_plugin_shell::ShellExt;

/// Event names the webview listens for
pub const TOAST_EVENT: &str = "menu://toast";
pub const NAVIGATE_EVENT: &str = "menu://navigate";
pub const CLOSE_EVENT: &str = "menu://close";

/// Fire-and-forget user notification
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str);
}

/// Hands a URL to whichever installed app handles it
pub trait UrlLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

/// Notifier that forwards toasts to the webview
pub struct ToastEmitter {
    app: AppHandle,
}

impl ToastEmitter {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Notifier for ToastEmitter {
    fn show(&self, message: &str) {
        let toast = Toast {
            message: message.to_string(),
            long: true,
        };
        if let Err(e) = self.app.emit(TOAST_EVENT, toast) {
            log::warn!("Could not emit toast: {}", e);
        }
    }
}

/// Launcher backed by the shell plugin
pub struct ShellLauncher {
    app: AppHandle,
}

impl ShellLauncher {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl UrlLauncher for ShellLauncher {
    #[allow(deprecated)]
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        self.app
            .shell()
            .open(url, None)
            .map_err(|e| classify_launch_error(url, e.to_string()))
    }
}

/// Schemes the system always has a handler for
const SYSTEM_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// A failed launch of an app-specific scheme (`whatsapp://`) means nothing
/// is registered for it, i.e. the app is not installed
pub fn classify_launch_error(url: &str, reason: String) -> LaunchError {
    let scheme = url.split_once(':').map(|(scheme, _)| scheme.to_ascii_lowercase());

    match scheme {
        Some(scheme) if !SYSTEM_SCHEMES.contains(&scheme.as_str()) => {
            log::debug!("No handler for {}: {}", scheme, reason);
            LaunchError::NotInstalled(scheme)
        }
        _ => LaunchError::Failed(reason),
    }
}

/// Ask the webview to show another screen
pub fn navigate(app: &AppHandle, screen: Screen) -> Result<(), String> {
    log::debug!("Navigating to {:?}", screen);
    app.emit(NAVIGATE_EVENT, screen).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_scheme_failure_means_not_installed() {
        let err = classify_launch_error("whatsapp://send?text=hi", "exit status 3".to_string());
        assert!(matches!(err, LaunchError::NotInstalled(ref scheme) if scheme == "whatsapp"));
    }

    #[test]
    fn test_system_scheme_failure_stays_generic() {
        for url in ["mailto:tom@scribbleapps.co.uk", "https://wa.me/", "HTTP://example.com"] {
            let err = classify_launch_error(url, "boom".to_string());
            assert!(matches!(err, LaunchError::Failed(_)), "{}", url);
        }
    }

    #[test]
    fn test_url_without_scheme_is_generic_failure() {
        assert!(matches!(
            classify_launch_error("no scheme here", "boom".to_string()),
            LaunchError::Failed(_)
        ));
    }
}
