use crate::menu::api::{BillingApiClient, PurchaseService, UnavailableService};
use crate::menu::config::BillingConfig;
use crate::menu::device::get_install_id;
use crate::menu::platform::{Notifier, ShellLauncher, ToastEmitter, UrlLauncher};
use crate::menu::storage::{Entitlements, JsonPrefsStore, MemoryPrefsStore, PreferenceStore};
use crate::menu::verifier::PurchaseVerifier;
use std::path::Path;
use std::sync::Arc;
use tauri::Manager;

/// Everything the menu screen commands need, managed by Tauri
pub struct MenuState {
    pub entitlements: Entitlements,
    pub verifier: Arc<PurchaseVerifier>,
    pub launcher: Arc<dyn UrlLauncher>,
    pub notifier: Arc<dyn Notifier>,
}

impl MenuState {
    pub fn new(
        entitlements: Entitlements,
        service: Arc<dyn PurchaseService>,
        launcher: Arc<dyn UrlLauncher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let verifier = Arc::new(PurchaseVerifier::new(
            service,
            entitlements.clone(),
            notifier.clone(),
        ));

        Self {
            entitlements,
            verifier,
            launcher,
            notifier,
        }
    }

    /// Wire the production collaborators for a running app
    pub fn init(app: &tauri::AppHandle) -> Self {
        let data_dir = app.path().app_data_dir();
        if let Err(e) = &data_dir {
            log::error!("Failed to get app data dir: {}", e);
        }
        let data_dir = data_dir.ok();

        let store = open_store(data_dir.as_deref());
        let service = purchase_service(data_dir.as_deref());

        Self::new(
            Entitlements::new(store),
            service,
            Arc::new(ShellLauncher::new(app.clone())),
            Arc::new(ToastEmitter::new(app.clone())),
        )
    }
}

/// Preferences on disk, or in memory if the data dir is unusable
fn open_store(data_dir: Option<&Path>) -> Arc<dyn PreferenceStore> {
    match data_dir.map(JsonPrefsStore::open) {
        Some(Ok(store)) => {
            log::info!("Preferences at {}", store.path().display());
            Arc::new(store)
        }
        Some(Err(e)) => {
            log::error!("{}, preferences will not persist", e);
            Arc::new(MemoryPrefsStore::default())
        }
        None => Arc::new(MemoryPrefsStore::default()),
    }
}

fn purchase_service(data_dir: Option<&Path>) -> Arc<dyn PurchaseService> {
    let install_id = match data_dir.map(get_install_id) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            log::warn!("{}, using a temporary install id", e);
            uuid::Uuid::new_v4().to_string()
        }
        None => uuid::Uuid::new_v4().to_string(),
    };

    match BillingApiClient::new(BillingConfig::from_env(), install_id) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("{}", e);
            Arc::new(UnavailableService::new(e.to_string()))
        }
    }
}

/// Tauri commands for the menu screen
pub mod commands {
    use super::*;
    use crate::menu::platform::{navigate, CLOSE_EVENT};
    use crate::menu::share;
    use crate::menu::types::{PreferenceRecord, RestoreOutcome, Screen, VerifierPhase};
    use tauri::{Emitter, State};

    /// Current audio and premium flags
    #[tauri::command]
    pub fn get_preferences(state: State<'_, MenuState>) -> PreferenceRecord {
        state.entitlements.record()
    }

    /// Sound effects switch
    #[tauri::command]
    pub fn set_audio_enabled(state: State<'_, MenuState>, enabled: bool) -> Result<PreferenceRecord, String> {
        state
            .entitlements
            .set_audio_enabled(enabled)
            .map_err(|e| e.to_string())?;
        log::debug!("Sound effects {}", if enabled { "on" } else { "off" });
        Ok(state.entitlements.record())
    }

    /// Whether ads should be suppressed
    #[tauri::command]
    pub fn is_premium(state: State<'_, MenuState>) -> bool {
        state.entitlements.premium_purchased()
    }

    /// Restore purchase button. The outcome is also shown as a toast.
    #[tauri::command]
    pub async fn restore_purchase(state: State<'_, MenuState>) -> Result<RestoreOutcome, String> {
        let verifier = state.verifier.clone();
        Ok(verifier.restore_purchase().await)
    }

    /// Where the restore check is, for the button spinner
    #[tauri::command]
    pub fn purchase_check_phase(state: State<'_, MenuState>) -> VerifierPhase {
        state.verifier.phase()
    }

    /// How to play and credits buttons
    #[tauri::command]
    pub fn open_screen(app: tauri::AppHandle, screen: Screen) -> Result<(), String> {
        navigate(&app, screen)
    }

    /// Open a pre-filled support email
    #[tauri::command]
    pub fn email_us(state: State<'_, MenuState>) -> Result<(), String> {
        share::email_support(state.launcher.as_ref(), state.notifier.as_ref()).map_err(|e| e.to_string())
    }

    /// Share the Play Store link through WhatsApp
    #[tauri::command]
    pub fn share_on_whatsapp(state: State<'_, MenuState>) -> Result<(), String> {
        share::share_on_whatsapp(state.launcher.as_ref(), state.notifier.as_ref()).map_err(|e| e.to_string())
    }

    /// Exit cross and back button: drop any billing session, then leave
    #[tauri::command]
    pub async fn close_menu(app: tauri::AppHandle, state: State<'_, MenuState>) -> Result<(), String> {
        state.verifier.teardown().await;
        app.emit(CLOSE_EVENT, ()).map_err(|e| e.to_string())
    }
}
