use crate::error::CliError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
#[cfg(test)]
use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Named JSON blobs. Reads never fail: anything unreadable is reported as absent.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: &Value) -> Result<(), CliError>;
}

/// Loads `key`, substituting `default` when the blob is missing or does not fit `T`.
pub fn load_or_default<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        tracing::debug!(key, "no stored value, using default");
        return default;
    };
    match serde_json::from_value(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value has the wrong shape, using default");
            default
        }
    }
}

/// Best-effort write. Failures are logged and dropped.
pub fn save<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize,
    S: KvStore + ?Sized,
{
    let json = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to serialize value");
            return;
        }
    };
    if let Err(e) = store.set(key, &json) {
        tracing::warn!(key, error = %e, "failed to persist value");
    }
}

/// In-process store for engine tests.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), CliError> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// One `<key>.json` file per blob under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn ensure_dir(&self) -> Result<(), CliError> {
        fs::create_dir_all(&self.dir).map_err(|_| CliError::io("Store IO error"))?;

        #[cfg(unix)]
        {
            let _ = fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700));
        }

        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let txt = match fs::read_to_string(&path) {
            Ok(txt) => txt,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read store file");
                }
                return None;
            }
        };
        match serde_json::from_str(&txt) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "store file is corrupted");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), CliError> {
        self.ensure_dir()?;

        let target = self.path_for(key);
        let tmp_path = self
            .dir
            .join(format!(".{}.json.tmp.{}", key, std::process::id()));
        // serde_json's default map is ordered, so keys come out sorted.
        let data = serde_json::to_string_pretty(value).map_err(|_| CliError::io("Store IO error"))?
            + "\n";

        {
            let mut f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|_| CliError::io("Store IO error"))?;

            #[cfg(unix)]
            {
                let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
            }

            f.write_all(data.as_bytes())
                .map_err(|_| CliError::io("Store IO error"))?;
            let _ = f.flush();
        }

        fs::rename(&tmp_path, &target).map_err(|_| {
            let _ = fs::remove_file(&tmp_path);
            CliError::io("Store IO error")
        })?;

        Ok(())
    }
}
