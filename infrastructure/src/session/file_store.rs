//! Session cache stored as a JSON file in the user's data directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use xylos_application::{AuthError, SessionStore};
use xylos_domain::AuthSession;

pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_DATA_HOME/xylos/session.json` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("xylos").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(format!("{} {}: {}", action, path.display(), e))
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AuthSession>, AuthError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("Failed to read", &self.path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| storage_error("Failed to parse", &self.path, e))
    }

    fn save(&self, session: &AuthSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error("Failed to create", parent, e))?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| storage_error("Failed to encode", &self.path, e))?;
        fs::write(&self.path, json).map_err(|e| storage_error("Failed to write", &self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| storage_error("Failed to restrict", &self.path, e))?;
        }

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("Failed to remove", &self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylos_domain::AuthUser;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "jwt".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some(1_900_000_000),
            user: AuthUser {
                id: "user-1".into(),
                email: Some("ada@example.com".into()),
            },
        }
    }

    #[test]
    fn test_missing_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("xylos").join("session.json"));

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        let err = FileSessionStore::new(path).load().unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
    }
}
