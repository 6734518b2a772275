//! Durable "user believes they are logged in" flag.
//!
//! Survives restarts so startup can tell "never logged in" apart from
//! "logged in, needs silent re-auth". The flag may be stale; callers treat it
//! as a hint, never as proof of a valid session.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key of the flag.
pub const LOGGED_IN_KEY: &str = "isLoggedIn";

const FLAG_FILE: &str = "session.json";

pub trait LoginFlagStore: Send + Sync {
    fn load(&self) -> anyhow::Result<bool>;
    fn store(&self, logged_in: bool) -> anyhow::Result<()>;
}

/// In-memory flag for tests/dev.
#[derive(Debug, Default)]
pub struct MemoryLoginFlag {
    value: AtomicBool,
}

impl MemoryLoginFlag {
    pub fn new(initial: bool) -> Self {
        Self {
            value: AtomicBool::new(initial),
        }
    }

    pub fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}

impl LoginFlagStore for MemoryLoginFlag {
    fn load(&self) -> anyhow::Result<bool> {
        Ok(self.get())
    }

    fn store(&self, logged_in: bool) -> anyhow::Result<()> {
        self.value.store(logged_in, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FlagDocument {
    #[serde(rename = "isLoggedIn")]
    is_logged_in: bool,
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
}

/// JSON file under the client's state directory.
#[derive(Debug, Clone)]
pub struct FileLoginFlag {
    path: PathBuf,
}

impl FileLoginFlag {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(FLAG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LoginFlagStore for FileLoginFlag {
    fn load(&self) -> anyhow::Result<bool> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read login flag at {:?}", self.path));
            }
        };

        let doc: FlagDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("corrupt login flag at {:?}", self.path))?;
        Ok(doc.is_logged_in)
    }

    fn store(&self, logged_in: bool) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create state directory at {:?}", parent))?;
        }

        let doc = FlagDocument {
            is_logged_in: logged_in,
            updated_at: Utc::now(),
        };
        let raw = serde_json::to_vec_pretty(&doc).context("failed to encode login flag")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write login flag at {:?}", self.path))
    }
}
