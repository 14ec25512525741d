use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    catalog::{CatalogFile, Theme},
    error::StoreError,
    session::{Session, SessionRecord},
};

pub use self::preferences::Preferences;

mod preferences;

pub const SESSION_FILE: &str = "cookies.json";
pub const PREFERENCES_FILE: &str = "config.json";
pub const STREAM_CREDENTIALS_FILE: &str = "stream_code.txt";
pub const CATALOG_FILE: &str = "partition.json";

/// Flat file persistence rooted in a data directory.
///
/// Every write goes to a sibling temporary file first and is renamed into
/// place, so readers never observe a half written file.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens the store, creating the directory when needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;

        Ok(Store { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Loads the saved session. `Ok(None)` when nobody is logged in.
    pub fn load_session(&self) -> Result<Option<Session>, StoreError> {
        let path = self.path(SESSION_FILE);
        let Some(record) = read_json::<SessionRecord>(&path)? else {
            return Ok(None);
        };

        Session::try_from(record)
            .map(Some)
            .map_err(|reason| StoreError::Incomplete {
                path: path.display().to_string(),
                reason,
            })
    }

    pub fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        write_json(&self.path(SESSION_FILE), &SessionRecord::from(session))
    }

    /// Removes the saved session. Returns whether a file was removed.
    pub fn clear_session(&self) -> Result<bool, StoreError> {
        remove(&self.path(SESSION_FILE))
    }

    pub fn load_preferences(&self) -> Result<Preferences, StoreError> {
        Ok(read_json(&self.path(PREFERENCES_FILE))?.unwrap_or_default())
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), StoreError> {
        write_json(&self.path(PREFERENCES_FILE), preferences)
    }

    /// Writes the human readable stream credentials. The file is never read back.
    pub fn save_stream_credentials(
        &self,
        server_address: &str,
        stream_key: &str,
    ) -> Result<(), StoreError> {
        let content = format!("Server address: {server_address}\nStream key: {stream_key}\n");

        write_atomic(&self.path(STREAM_CREDENTIALS_FILE), content.as_bytes())
    }

    pub fn clear_stream_credentials(&self) -> Result<bool, StoreError> {
        remove(&self.path(STREAM_CREDENTIALS_FILE))
    }

    /// Loads the cached category catalog. Missing cache yields no themes.
    pub fn load_catalog(&self) -> Result<Vec<Theme>, StoreError> {
        Ok(read_json::<CatalogFile>(&self.path(CATALOG_FILE))?
            .map(|file| file.data)
            .unwrap_or_default())
    }

    pub fn save_catalog(&self, themes: &[Theme]) -> Result<(), StoreError> {
        let file = CatalogFile {
            data: themes.to_vec(),
        };

        write_json(&self.path(CATALOG_FILE), &file)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(path, err)),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let serialized = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })?;

    write_atomic(path, &serialized)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");

    fs::write(&tmp, bytes).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))?;

    debug!(path = %path.display(), "file written");
    Ok(())
}

fn remove(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_error(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Cookies;

    fn open_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("data")).unwrap();

        (dir, store)
    }

    fn sample_session() -> Session {
        let cookies: Cookies = [("DedeUserID", "42"), ("SESSDATA", "s3ss"), ("bili_jct", "tok")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Session::new(cookies, 777, "tok")
    }

    #[test]
    fn test_session_round_trip() {
        let (_dir, store) = open_store();
        let session = sample_session();

        assert_eq!(store.load_session().unwrap(), None);
        store.save_session(&session).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session));
    }

    #[test]
    fn test_session_file_layout() {
        let (_dir, store) = open_store();
        store.save_session(&sample_session()).unwrap();

        let raw = fs::read_to_string(store.dir().join(SESSION_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "room_id": 777,
                "cookies": "DedeUserID=42; SESSDATA=s3ss; bili_jct=tok",
                "csrf": "tok",
            })
        );
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let (_dir, store) = open_store();
        store.save_session(&sample_session()).unwrap();

        assert!(store.clear_session().unwrap());
        assert!(!store.clear_session().unwrap());
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn test_partial_session_file_is_an_error() {
        let (_dir, store) = open_store();
        fs::write(
            store.dir().join(SESSION_FILE),
            r#"{"room_id": 1, "cookies": "", "csrf": "x"}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load_session(),
            Err(StoreError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_stream_credentials_file() {
        let (_dir, store) = open_store();
        store
            .save_stream_credentials("rtmp://live-push.example.com/live-bvc/", "?streamname=live_1")
            .unwrap();

        let raw = fs::read_to_string(store.dir().join(STREAM_CREDENTIALS_FILE)).unwrap();
        assert_eq!(
            raw.lines().collect::<Vec<&str>>(),
            vec![
                "Server address: rtmp://live-push.example.com/live-bvc/",
                "Stream key: ?streamname=live_1"
            ]
        );

        assert!(store.clear_stream_credentials().unwrap());
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let (_dir, store) = open_store();

        assert_eq!(store.load_preferences().unwrap(), Preferences::default());
        assert!(store.load_catalog().unwrap().is_empty());
    }
}
