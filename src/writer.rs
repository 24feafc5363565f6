//! Artifact persistence
//!
//! Artifacts are written in canonical form: keys sorted at every depth,
//! two-space indentation, LF line endings, trailing newline. Writes go
//! through `<path>.tmp` and a rename so a reader never sees half a file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{io_err, Result, SchemaError};
use crate::schema::Document;

/// What is on disk at an artifact path
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactState {
    /// Nothing persisted yet
    NoExistingArtifact,
    /// A parseable document, with the exact text it was read from
    ArtifactExists { document: Document, text: String },
    /// Content that does not parse as a document
    MalformedExistingArtifact { error: String, text: String },
}

/// Outcome of persisting an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written
    Written { path: PathBuf },
    /// Dry run: the file would have been written
    WouldWrite { path: PathBuf },
}

/// Serialize a document canonically
pub fn to_canonical_string(document: &Document) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&sorted(document))?;
    text.push('\n');
    Ok(text)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), sorted(&map[k])))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        scalar => scalar.clone(),
    }
}

/// Reads and writes artifacts below an output root
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    dry_run: bool,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Absolute location of a relative artifact path
    pub fn target(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Inspect what is currently persisted at `relative`
    pub fn load(&self, relative: &Path) -> Result<ArtifactState> {
        let path = self.target(relative);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(ArtifactState::NoExistingArtifact)
            }
            Err(err) => return Err(io_err(&path, err)),
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text.replace("\r\n", "\n"),
            Err(e) => {
                return Ok(ArtifactState::MalformedExistingArtifact {
                    error: format!("not valid UTF-8: {}", e.utf8_error()),
                    text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                })
            }
        };

        Ok(match serde_json::from_str::<Value>(&text) {
            Ok(document) => ArtifactState::ArtifactExists { document, text },
            Err(e) => ArtifactState::MalformedExistingArtifact {
                error: e.to_string(),
                text,
            },
        })
    }

    /// Persist canonical `text` at `relative`, creating parent directories.
    /// In dry-run mode nothing touches the filesystem.
    pub fn write(&self, relative: &Path, text: &str) -> Result<WriteResult> {
        let path = self.target(relative);
        if self.dry_run {
            tracing::info!("[dry-run] would write: {}", path.display());
            return Ok(WriteResult::WouldWrite { path });
        }

        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }

        let tmp = PathBuf::from(format!("{}.tmp", path.display()));
        fs::write(&tmp, text).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }

        tracing::info!("wrote: {}", path.display());
        Ok(WriteResult::Written { path })
    }
}

/// Create `dir` and its ancestors, failing clearly when one is a file.
fn ensure_directory(dir: &Path) -> Result<()> {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        match fs::metadata(ancestor) {
            Ok(meta) if meta.is_dir() => break,
            Ok(_) => return Err(SchemaError::NotADirectory(ancestor.to_path_buf())),
            Err(err)
                if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) =>
            {
                continue
            }
            Err(err) => return Err(io_err(ancestor, err)),
        }
    }
    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}
