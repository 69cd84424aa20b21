use crate::menu::config::INSTALL_ID_FILE;
use crate::menu::types::SettingsError;
use std::path::Path;

/// Get or create the identifier the purchase server knows this install by
pub fn get_install_id(data_dir: &Path) -> Result<String, SettingsError> {
    let id_path = data_dir.join(INSTALL_ID_FILE);

    // Try to read existing ID
    if let Ok(id) = std::fs::read_to_string(&id_path) {
        let id = id.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }

    let install_id = uuid::Uuid::new_v4().to_string();

    std::fs::create_dir_all(data_dir)
        .map_err(|e| SettingsError::Storage(format!("Failed to create app data dir: {}", e)))?;
    std::fs::write(&id_path, &install_id)
        .map_err(|e| SettingsError::Storage(format!("Failed to write install id: {}", e)))?;

    log::info!("Created install id {}", install_id);
    Ok(install_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_id_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let first = get_install_id(dir.path()).unwrap();
        let second = get_install_id(dir.path()).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_blank_id_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INSTALL_ID_FILE), "  \n").unwrap();

        let id = get_install_id(dir.path()).unwrap();
        assert!(!id.trim().is_empty());
    }
}
