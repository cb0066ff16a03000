//! Platform store backing the connection console.
//!
//! - Web: `localStorage`
//! - Desktop: one file per key in the platform-appropriate config directory:
//!   - Linux: `~/.config/socketdeck/`
//!   - macOS: `~/Library/Application Support/socketdeck/`
//!   - Windows: `%APPDATA%\socketdeck\`

use socketdeck_core::{KeyValueStore, StoreError};

// =========================================
// Web (WASM) implementation
// =========================================

#[cfg(target_arch = "wasm32")]
pub struct PlatformStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl PlatformStore {
    /// Attach to the window's `localStorage`. Without one, reads are empty and
    /// writes fail.
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            crate::log_error!("localStorage is unavailable, nothing will be persisted");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError("localStorage is unavailable".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for PlatformStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok()?
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StoreError(format!("setItem({}) failed: {:?}", key, e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StoreError(format!("removeItem({}) failed: {:?}", key, e)))
    }
}

// =========================================
// Desktop (native) implementation
// =========================================

#[cfg(not(target_arch = "wasm32"))]
pub struct PlatformStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl PlatformStore {
    /// Store under `SOCKETDECK_STORE_DIR`, or the platform config directory.
    pub fn open() -> Self {
        let dir = std::env::var_os("SOCKETDECK_STORE_DIR")
            .map(std::path::PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("socketdeck")))
            .unwrap_or_else(|| std::path::PathBuf::from(".socketdeck"));
        Self::at(dir)
    }

    pub fn at(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_path(&self, key: &str) -> std::path::PathBuf {
        // Sanitize key to be a valid filename
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(safe_key)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for PlatformStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file_path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.file_path(key);
        std::fs::write(&path, value).map_err(|e| StoreError(format!("{}: {}", path.display(), e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.file_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError(format!("{}: {}", path.display(), e))),
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlatformStore::at(dir.path());
        store.set("ws_connections", "[1,2]").unwrap();
        store.set("wslog1", "[10:00:00] hi\n").unwrap();

        let reopened = PlatformStore::at(dir.path());
        assert_eq!(reopened.get("ws_connections").as_deref(), Some("[1,2]"));
        assert_eq!(reopened.get("wslog1").as_deref(), Some("[10:00:00] hi\n"));
        assert!(reopened.get("wsurl1").is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlatformStore::at(dir.path());
        store.set("wsurl3", "ws://h/").unwrap();

        store.remove("wsurl3").unwrap();
        store.remove("wsurl3").unwrap();
        assert!(store.get("wsurl3").is_none());
    }

    #[test]
    fn directory_is_created_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("store");
        let mut store = PlatformStore::at(&nested);
        assert!(store.get("ws_auth_token").is_none());

        store.set("ws_auth_token", "t").unwrap();
        assert!(nested.join("ws_auth_token").exists());
    }

    #[test]
    fn keys_are_sanitized_for_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlatformStore::at(dir.path());
        store.set("a/b:c", "v").unwrap();
        assert!(dir.path().join("a_b_c").exists());
        assert_eq!(store.get("a/b:c").as_deref(), Some("v"));
    }
}
