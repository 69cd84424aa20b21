pub mod menu;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(log::LevelFilter::Info)
                .level_for("office_trivia_quiz_lib", log::LevelFilter::Debug)
                .build(),
        )
        .plugin(tauri_plugin_shell::init())
        .setup(|app| {
            use tauri::Manager;

            let state = menu::MenuState::init(app.handle());
            log::info!(
                "Menu ready (premium: {})",
                state.entitlements.premium_purchased()
            );
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            menu::commands::get_preferences,
            menu::commands::set_audio_enabled,
            menu::commands::is_premium,
            menu::commands::restore_purchase,
            menu::commands::purchase_check_phase,
            menu::commands::open_screen,
            menu::commands::email_us,
            menu::commands::share_on_whatsapp,
            menu::commands::close_menu,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
