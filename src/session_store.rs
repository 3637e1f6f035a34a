//! Session persistence on local disk.

use std::{
    fs,
    path::{Path, PathBuf},
};

use mediaid_core::{Session, SessionError, SessionStore};
use tracing::debug;

/// Stores the session as JSON at a fixed path, written via a temp file and rename.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|err| SessionError::Serde(err.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|err| SessionError::Serde(err.to_string()))
    }

    fn clear(&self) -> Result<(), SessionError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_load_clear() {
        let dir = tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().expect("load").is_none());

        let session = Session::new("tok").with_user(Some("bob".into()), None);
        store.save(&session).expect("save");
        assert_eq!(store.load().expect("load"), Some(session));

        store.clear().expect("clear");
        assert!(store.load().expect("load").is_none());
        store.clear().expect("clear twice");
    }

    #[test]
    fn corrupt_file_is_a_serde_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").expect("write");
        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(SessionError::Serde(_))));
    }
}
