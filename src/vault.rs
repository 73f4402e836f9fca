// src/vault.rs
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Document already exists: {0}")]
    AlreadyExists(String),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Path escapes the vault: {0}")]
    OutsideVault(String),
    #[error("I/O error in vault at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The operations the tool needs from a notes vault. Paths are relative to
/// the vault root and use `/` separators.
pub trait DocumentStore {
    fn create(&self, path: &str, text: &str) -> Result<(), Error>;
    fn read(&self, path: &str) -> Result<String, Error>;
    /// Markdown documents whose path starts with `prefix`, sorted by name
    /// with numbered copies after their base name. Hidden entries are skipped.
    fn list(&self, prefix: &str) -> Result<Vec<String>, Error>;
    fn folder_exists(&self, path: &str) -> bool;
    fn create_folder(&self, path: &str) -> Result<(), Error>;
    fn append(&self, path: &str, text: &str) -> Result<(), Error>;

    fn exists(&self, path: &str) -> bool {
        self.read(path).is_ok()
    }
}

/// A vault that is a directory on the local file system.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(Error::OutsideVault(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn collect_markdown(&self, dir: &Path, out: &mut Vec<String>) -> Result<(), Error> {
        let entries = fs::read_dir(dir).map_err(|source| io_error(dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| io_error(dir, source))?;
            // .obsidian, .trash, .git
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                self.collect_markdown(&path, out)?;
            } else if path.extension().is_some_and(|ext| ext == "md") {
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    let parts: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    out.push(parts.join("/"));
                }
            }
        }
        Ok(())
    }
}

/// Orders `name (2).md` after `name.md`, and `name (10).md` after
/// `name (9).md`, so same-day notes list in the order they were written.
fn write_order_key(path: &str) -> (&str, u32) {
    let stem = path.strip_suffix(".md").unwrap_or(path);
    let numbered = stem
        .strip_suffix(')')
        .and_then(|rest| rest.rsplit_once(" ("))
        .and_then(|(base, n)| n.parse::<u32>().ok().map(|n| (base, n)));
    numbered.unwrap_or((stem, 1))
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.display().to_string(),
        source,
    }
}

impl DocumentStore for FsVault {
    fn create(&self, path: &str, text: &str) -> Result<(), Error> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::AlreadyExists(path.to_string())
                } else {
                    io_error(&full, source)
                }
            })?;
        file.write_all(text.as_bytes())
            .map_err(|source| io_error(&full, source))?;
        tracing::info!("Created {}", full.display());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<String, Error> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }
        let bytes = fs::read(&full).map_err(|source| io_error(&full, source))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let start = match prefix.rsplit_once('/') {
            Some((folder, _)) => self.resolve(folder)?,
            None => self.root.clone(),
        };
        if !start.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        self.collect_markdown(&start, &mut paths)?;
        paths.retain(|p| p.starts_with(prefix));
        paths.sort_by(|a, b| write_order_key(a).cmp(&write_order_key(b)));
        Ok(paths)
    }

    fn folder_exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|full| full.is_dir())
    }

    fn create_folder(&self, path: &str) -> Result<(), Error> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|source| io_error(&full, source))
    }

    fn append(&self, path: &str, text: &str) -> Result<(), Error> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }
        let mut file = OpenOptions::new()
            .append(true)
            .open(&full)
            .map_err(|source| io_error(&full, source))?;
        file.write_all(text.as_bytes())
            .map_err(|source| io_error(&full, source))
    }
}
