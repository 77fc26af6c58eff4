use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::host::Clock;
use crate::models::Cookie;
use crate::storage::{CookieStore, MemoryCookieStore};

#[derive(Debug, Error)]
pub enum JarError {
    #[error("failed to read cookie jar {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cookie jar {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write cookie jar {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode cookie jar: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JarFile {
    #[serde(default)]
    cookies: Vec<Cookie>,
}

/// Cookie store persisted as JSON, so a visitor session can span several
/// simulator runs.
#[derive(Debug)]
pub struct FileCookieJar {
    path: PathBuf,
    inner: MemoryCookieStore,
}

impl FileCookieJar {
    /// Open the jar at `path`. A missing file is an empty jar.
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, JarError> {
        let path = path.into();
        let jar = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<JarFile>(&contents).map_err(|source| {
                JarError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => JarFile::default(),
            Err(source) => {
                return Err(JarError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        Ok(Self {
            inner: MemoryCookieStore::with_cookies(clock, jar.cookies),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &MemoryCookieStore {
        &self.inner
    }

    /// Write live cookies back to disk, dropping expired ones.
    pub fn save(&mut self) -> Result<(), JarError> {
        let purged = self.inner.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "dropped expired cookies from jar");
        }

        let jar = JarFile {
            cookies: self.inner.live_cookies().cloned().collect(),
        };
        let contents = serde_json::to_string_pretty(&jar)?;
        std::fs::write(&self.path, contents).map_err(|source| JarError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl CookieStore for FileCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.inner.get(name)
    }

    fn set(&mut self, cookie: Cookie) {
        self.inner.set(cookie);
    }

    fn clear(&mut self, name: &str) {
        self.inner.clear(name);
    }
}
