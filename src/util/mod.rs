//! Shared file helpers for `formsync`.
//!
//! - Reading inputs with a dedicated error for missing files
//! - Writing outputs atomically (temp file + rename)
//! - SHA256 digests of written content

use crate::error::{FormsyncError, Result, ResultExt};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const BOM: char = '\u{feff}';

/// Text of an input file with its byte order mark split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub text: String,
    pub has_bom: bool,
}

impl TextFile {
    /// Read a UTF-8 input file.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist, or an I/O error.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FormsyncError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let mut text = fs::read_to_string(path)?;
        let has_bom = text.starts_with(BOM);
        if has_bom {
            text.replace_range(..BOM.len_utf8(), "");
        }
        Ok(Self { text, has_bom })
    }

    /// `text` with the byte order mark restored if the input had one.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        if self.has_bom {
            format!("{BOM}{text}")
        } else {
            text.to_string()
        }
    }
}

/// Read a UTF-8 input file, dropping any byte order mark.
///
/// # Errors
///
/// Returns `FileNotFound` if the path does not exist, or an I/O error.
pub fn read_text(path: &Path) -> Result<String> {
    TextFile::read(path).map(|file| file.text)
}

/// Read and decode a JSON input file.
///
/// # Errors
///
/// Returns `FileNotFound`, an I/O error, or a JSON error naming the file.
pub fn load_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    debug!(path = %path.display(), bytes = text.len(), "Loaded JSON");
    Ok(value)
}

/// Write text to `path` through a sibling temp file and rename.
///
/// # Errors
///
/// Returns an I/O error if the temp file cannot be written or renamed.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<()> {
    let temp_path = temp_path_for(path);
    let file = File::create(&temp_path)?;
    let persisted = write_synced(file, text).and_then(|()| fs::rename(&temp_path, path));
    if let Err(err) = persisted {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    debug!(path = %path.display(), bytes = text.len(), "Wrote file");
    Ok(())
}

/// Serialize `value` as two-space indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns a JSON error if serialization fails or an I/O error on write.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_text_atomic(path, &text)
}

/// SHA256 of `bytes` as lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_synced(mut file: File, text: &str) -> io::Result<()> {
    file.write_all(text.as_bytes())?;
    file.sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |name| name.to_string_lossy());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_missing_file() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_json(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FormsyncError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_json_invalid() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("bad.json");
        fs::write(&path, "{not json").expect("write");
        let err = load_json(&path).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON in "));
    }

    #[test]
    fn test_load_json_strips_bom() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("bom.json");
        fs::write(&path, "\u{feff}[1]").expect("write");
        assert_eq!(load_json(&path).unwrap(), json!([1]));
    }

    #[test]
    fn test_text_file_restores_bom() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("bom.json");
        fs::write(&path, "\u{feff}{\"a\": 1}").expect("write");
        let file = TextFile::read(&path).unwrap();
        assert!(file.has_bom);
        assert_eq!(file.text, "{\"a\": 1}");
        assert_eq!(file.restore("{\"a\": 2}"), "\u{feff}{\"a\": 2}");

        let plain = temp.path().join("plain.json");
        fs::write(&plain, "[]").expect("write");
        let file = TextFile::read(&plain).unwrap();
        assert!(!file.has_bom);
        assert_eq!(file.restore("[1]"), "[1]");
    }

    #[test]
    fn test_write_text_atomic_removes_temp_on_failure() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("taken");
        fs::create_dir(&path).expect("mkdir");
        fs::write(path.join("child"), "x").expect("write");

        assert!(write_text_atomic(&path, "data").is_err());
        assert!(!temp.path().join(".taken.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_write_json_pretty_with_newline() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("out.json");
        write_json(&path, &json!({"b": 1, "a": [2]})).unwrap();
        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text, "{\n  \"b\": 1,\n  \"a\": [\n    2\n  ]\n}\n");
        assert!(!temp.path().join(".out.json.tmp").exists());
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
