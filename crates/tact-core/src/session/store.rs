//! Cookie persistence backed by a single JSON file

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::session::{CookieJar, CredentialAcquirer};
use crate::{Error, Result};

/// Snapshot of the current session state
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    /// Whether any session cookies are held
    pub authenticated: bool,
    pub cookie_count: usize,
    pub cookie_file: PathBuf,
}

/// Authoritative holder of the portal session cookies.
///
/// One instance is built at startup and shared by reference with the
/// client. Every mutation is written through to `path` while the jar lock
/// is held, so writers never interleave.
pub struct SessionStore {
    path: PathBuf,
    jar: Mutex<CookieJar>,
    acquirer: Option<Arc<dyn CredentialAcquirer>>,
    login: tokio::sync::Mutex<()>,
}

impl SessionStore {
    /// Open the store, loading any cookies persisted at `path`.
    ///
    /// A missing file yields an empty jar. A corrupt or unreadable file is
    /// logged and also yields an empty jar; the caller is expected to log in
    /// again.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let jar = Self::load(&path);

        Self {
            path,
            jar: Mutex::new(jar),
            acquirer: None,
            login: tokio::sync::Mutex::new(()),
        }
    }

    /// Attach the credential acquirer used by [`SessionStore::authenticate`]
    pub fn with_acquirer(mut self, acquirer: Arc<dyn CredentialAcquirer>) -> Self {
        self.acquirer = Some(acquirer);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current cookies
    pub fn cookies(&self) -> CookieJar {
        self.jar().clone()
    }

    /// Current cookies rendered as a `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        self.jar().header_value()
    }

    pub fn status(&self) -> SessionStatus {
        let jar = self.jar();
        SessionStatus {
            authenticated: !jar.is_empty(),
            cookie_count: jar.len(),
            cookie_file: self.path.clone(),
        }
    }

    /// Persist the current jar
    pub fn save(&self) -> Result<()> {
        let jar = self.jar();
        Self::write_jar(&self.path, &jar)
    }

    /// Merge cookies observed on a live response.
    ///
    /// The jar is only written to disk when a value actually changed.
    /// Returns whether a write happened.
    pub fn update<I, K, V>(&self, cookies: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut jar = self.jar();
        let mut merged = jar.clone();
        if !merged.merge(cookies) {
            return Ok(false);
        }

        // The in-memory jar only moves once the disk has caught up
        Self::write_jar(&self.path, &merged)?;
        *jar = merged;
        debug!("Session cookies refreshed ({} total)", jar.len());
        Ok(true)
    }

    /// Replace the whole jar and persist it
    pub fn replace(&self, cookies: CookieJar) -> Result<()> {
        let mut jar = self.jar();
        Self::write_jar(&self.path, &cookies)?;
        *jar = cookies;
        Ok(())
    }

    /// Run the interactive login and adopt its cookies.
    ///
    /// This is the only path that resets session state. It is never
    /// triggered by a failed request. Concurrent calls are serialized.
    pub async fn authenticate(&self, headless: bool) -> Result<()> {
        let acquirer = self
            .acquirer
            .as_ref()
            .ok_or_else(|| Error::Auth("No credential acquirer configured".to_string()))?;

        let _guard = self.login.lock().await;

        info!("Starting portal login (headless: {})", headless);
        let jar = acquirer.acquire(headless).await?;
        let count = jar.len();

        self.replace(jar)?;
        info!("Login complete, stored {} cookies", count);
        Ok(())
    }

    fn jar(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(path: &Path) -> CookieJar {
        match Self::read_jar(path) {
            Ok(Some(jar)) => {
                info!("Loaded {} cookies from {}", jar.len(), path.display());
                jar
            }
            Ok(None) => {
                debug!("No cookie file at {}", path.display());
                CookieJar::new()
            }
            Err(e) => {
                warn!("{}; starting with an empty session", e);
                CookieJar::new()
            }
        }
    }

    fn read_jar(path: &Path) -> Result<Option<CookieJar>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::CorruptState(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            Error::CorruptState(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write-then-rename so a crash never leaves a half-written file.
    /// The temp file is created 0600 and replaces any looser existing file.
    fn write_jar(path: &Path, jar: &CookieJar) -> Result<()> {
        let persistence = |source: std::io::Error| Error::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(persistence)?;

        let bytes = serde_json::to_vec(jar)?;

        let temp = tempfile::NamedTempFile::new_in(dir).map_err(persistence)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(persistence)?;
        }

        let mut file = temp.as_file();
        file.write_all(&bytes).map_err(persistence)?;
        file.sync_all().map_err(persistence)?;

        temp.persist(path).map_err(|e| persistence(e.error))?;

        debug!("Saved {} cookies to {}", jar.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedAcquirer(CookieJar);

    #[async_trait]
    impl CredentialAcquirer for FixedAcquirer {
        async fn acquire(&self, _headless: bool) -> Result<CookieJar> {
            Ok(self.0.clone())
        }
    }

    struct TimedOutAcquirer;

    #[async_trait]
    impl CredentialAcquirer for TimedOutAcquirer {
        async fn acquire(&self, _headless: bool) -> Result<CookieJar> {
            Err(Error::AuthTimeout(Duration::from_secs(300)))
        }
    }

    fn jar(pairs: &[(&str, &str)]) -> CookieJar {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("cookies.json"));
        assert!(store.cookies().is_empty());
        assert!(!store.status().authenticated);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");

        let store = SessionStore::open(&path);
        store
            .replace(jar(&[("JSESSIONID", "abc"), ("AWSELB", "node-1")]))
            .unwrap();

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.cookies(), store.cookies());
        assert_eq!(reopened.cookies().get("AWSELB"), Some("node-1"));
    }

    #[test]
    fn test_corrupt_file_recovers_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::open(&path);
        assert!(store.cookies().is_empty());
    }

    #[test]
    fn test_wrong_shape_recovers_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"["JSESSIONID", "abc"]"#).unwrap();

        let store = SessionStore::open(&path);
        assert!(store.cookies().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");

        let store = SessionStore::open(&path);
        store.update([("JSESSIONID", "abc")]).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_tightens_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"{"JSESSIONID":"old"}"#).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = SessionStore::open(&path);
        assert_eq!(store.cookies().get("JSESSIONID"), Some("old"));
        store.save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_update_persists_only_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let store = SessionStore::open(&path);

        assert!(store.update([("AWSELB", "node-1")]).unwrap());
        assert!(path.exists());

        // An identical update must not touch the file
        std::fs::remove_file(&path).unwrap();
        assert!(!store.update([("AWSELB", "node-1")]).unwrap());
        assert!(!path.exists());

        assert!(store.update([("AWSELB", "node-2")]).unwrap());
        assert_eq!(SessionStore::open(&path).cookies().get("AWSELB"), Some("node-2"));
    }

    #[test]
    fn test_update_keeps_other_cookies() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("cookies.json"));
        store.replace(jar(&[("JSESSIONID", "abc")])).unwrap();

        store.update([("AWSELB", "node-1")]).unwrap();

        let cookies = store.cookies();
        assert_eq!(cookies.get("JSESSIONID"), Some("abc"));
        assert_eq!(cookies.get("AWSELB"), Some("node-1"));
        assert_eq!(
            store.cookie_header().as_deref(),
            Some("AWSELB=node-1; JSESSIONID=abc")
        );
    }

    #[test]
    fn test_save_failure_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let store = SessionStore::open(blocker.join("cookies.json"));
        let result = store.update([("JSESSIONID", "abc")]);
        assert!(matches!(result, Err(Error::Persistence { .. })));
    }

    #[test]
    fn test_failed_update_is_retried() {
        let dir = TempDir::new().unwrap();
        let sessions = dir.path().join("sessions");
        let path = sessions.join("cookies.json");
        std::fs::write(&sessions, "").unwrap();

        let store = SessionStore::open(&path);
        let result = store.update([("JSESSIONID", "abc")]);
        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert!(store.cookies().get("JSESSIONID").is_none());

        std::fs::remove_file(&sessions).unwrap();
        std::fs::create_dir(&sessions).unwrap();

        assert!(store.update([("JSESSIONID", "abc")]).unwrap());
        assert_eq!(SessionStore::open(&path).cookies().get("JSESSIONID"), Some("abc"));
    }

    #[test]
    fn test_failed_replace_keeps_jar() {
        let dir = TempDir::new().unwrap();
        let sessions = dir.path().join("sessions");
        let path = sessions.join("cookies.json");

        let store = SessionStore::open(&path);
        store.replace(jar(&[("JSESSIONID", "old")])).unwrap();

        std::fs::remove_dir_all(&sessions).unwrap();
        std::fs::write(&sessions, "").unwrap();

        let result = store.replace(jar(&[("JSESSIONID", "new")]));
        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert_eq!(store.cookies().get("JSESSIONID"), Some("old"));
    }

    #[tokio::test]
    async fn test_authenticate_replaces_jar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");

        let store = SessionStore::open(&path).with_acquirer(Arc::new(FixedAcquirer(jar(&[
            ("JSESSIONID", "fresh"),
        ]))));
        store.replace(jar(&[("STALE", "1")])).unwrap();

        store.authenticate(true).await.unwrap();

        let cookies = store.cookies();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies.get("JSESSIONID"), Some("fresh"));
        assert_eq!(SessionStore::open(&path).cookies(), cookies);
    }

    #[tokio::test]
    async fn test_authenticate_timeout_keeps_jar() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("cookies.json"))
            .with_acquirer(Arc::new(TimedOutAcquirer));
        store.replace(jar(&[("JSESSIONID", "abc")])).unwrap();

        let result = store.authenticate(false).await;
        assert!(matches!(result, Err(Error::AuthTimeout(_))));
        assert_eq!(store.cookies().get("JSESSIONID"), Some("abc"));
    }

    #[tokio::test]
    async fn test_authenticate_without_acquirer() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("cookies.json"));

        let result = store.authenticate(false).await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }
}
