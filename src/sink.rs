//! Where finished workbooks go.

use chrono::Local;
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};

/// Identifier of a saved artifact: a file path or an opaque key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactId {
    File(PathBuf),
    Memory(String),
}

impl ArtifactId {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ArtifactId::File(p) => Some(p),
            ArtifactId::Memory(_) => None,
        }
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactId::File(p) => write!(f, "{}", p.display()),
            ArtifactId::Memory(key) => f.write_str(key),
        }
    }
}

/// Storage for serialized workbooks. An error means nothing was stored.
pub trait ArtifactSink {
    fn save(&self, bytes: &[u8]) -> Result<ArtifactId>;
}

/// Writes `{prefix}_{YYYYMMDD_HHMMSS}.xlsx` files into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    prefix: String,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// `config.output_dir` / `config.file_prefix`.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.output_dir.clone(), config.file_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Claims a fresh file name; `_2`, `_3`, ... are appended while taken.
    fn claim(&self) -> Result<(PathBuf, fs::File)> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut counter = 1u32;
        loop {
            let name = if counter == 1 {
                format!("{}_{}.xlsx", self.prefix, stamp)
            } else {
                format!("{}_{}_{}.xlsx", self.prefix, stamp, counter)
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
                Err(e) => return Err(ReportError::io(path, e)),
            }
        }
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, bytes: &[u8]) -> Result<ArtifactId> {
        fs::create_dir_all(&self.dir).map_err(|e| ReportError::io(&self.dir, e))?;
        let (path, mut file) = self.claim()?;
        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(ReportError::io(path, e));
        }
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Report saved");
        Ok(ArtifactId::File(path))
    }
}

/// Keeps artifacts in memory; ids are `memory://N`.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: RefCell<Vec<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.borrow().is_empty()
    }

    pub fn get(&self, id: &ArtifactId) -> Option<Vec<u8>> {
        let ArtifactId::Memory(key) = id else {
            return None;
        };
        let index: usize = key.strip_prefix("memory://")?.parse().ok()?;
        self.artifacts.borrow().get(index).cloned()
    }
}

impl ArtifactSink for MemorySink {
    fn save(&self, bytes: &[u8]) -> Result<ArtifactId> {
        let mut artifacts = self.artifacts.borrow_mut();
        artifacts.push(bytes.to_vec());
        Ok(ArtifactId::Memory(format!("memory://{}", artifacts.len() - 1)))
    }
}

impl<T: ArtifactSink + ?Sized> ArtifactSink for &T {
    fn save(&self, bytes: &[u8]) -> Result<ArtifactId> {
        (**self).save(bytes)
    }
}
