//! The audit sink: a durable, append-only log of every write attempt.
//!
//! One JSON record per line. The file is the source of truth for post-mortem;
//! the in-memory audit list mirrors it for fast timeline queries.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sidecar_ledger_core::{Event, FieldError, Timestamp};

/// Environment variable naming the audit directory.
pub const LOG_ROOT_ENV: &str = "LOG_ROOT";

/// Default audit directory when `LOG_ROOT` is unset.
pub const DEFAULT_LOG_ROOT: &str = "./log";

/// Fixed audit file name inside the log root.
pub const AUDIT_FILE_NAME: &str = "sidecar-audit.jsonl";

/// Outcome class of one audited write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditType {
    Success,
    ValidationFailure,
    AppendOnlyViolation,
    BoundaryViolation,
}

impl AuditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditType::Success => "success",
            AuditType::ValidationFailure => "validation-failure",
            AuditType::AppendOnlyViolation => "append-only-violation",
            AuditType::BoundaryViolation => "boundary-violation",
        }
    }

    /// Everything except `success`.
    pub fn is_failure(&self) -> bool {
        !matches!(self, AuditType::Success)
    }
}

impl std::fmt::Display for AuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audited write attempt: outcome, the submitted event, the objections
/// (for failures), and the wall instant of the attempt.
///
/// `at` is the audit's own clock reading, independent of any `created-at`
/// inside the event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AuditEntry {
    pub audit_type: AuditType,
    pub event: Event,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub at: Timestamp,
}

/// Resolve the default audit path from the environment.
///
/// Read once at default construction; explicit constructors bypass this.
pub fn default_audit_path() -> PathBuf {
    let root = std::env::var(LOG_ROOT_ENV).unwrap_or_else(|_| DEFAULT_LOG_ROOT.to_string());
    Path::new(&root).join(AUDIT_FILE_NAME)
}

/// Appends one serialized record per line to the audit file.
///
/// The file is opened in append mode for each write, which keeps records
/// whole even when several processes share the file; readers only have to
/// tolerate a torn final line after a crash.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    /// Create a sink at the given path, creating the parent directory if
    /// missing.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. At-least-once semantics; a partial write on crash
    /// is the caller's risk and the reader's tolerance.
    pub fn append(&self, entry: &AuditEntry) -> io::Result<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// Read an audit file back into entries.
///
/// A trailing partial line (torn by a crash mid-append) is discarded; a
/// malformed line anywhere else is corruption and surfaces as an error.
pub fn read_audit_log(path: impl AsRef<Path>) -> io::Result<Vec<AuditEntry>> {
    let text = fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().collect();
    let mut entries = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) if index + 1 == lines.len() => {
                tracing::warn!(line = index + 1, error = %e, "discarding torn final audit line");
                break;
            }
            Err(e) => {
                return Err(io::Error::new(io::ErrorKind::InvalidData, e));
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sidecar_ledger_core::{EntityId, EventType};
    use tempfile::tempdir;

    fn entry(audit_type: AuditType, at: i64) -> AuditEntry {
        AuditEntry {
            audit_type,
            event: Event::new(
                EventType::ActionRecorded,
                EntityId::new(format!("evt-{at:08x}")),
                Timestamp::from_millis(at),
                json!({"id": "act-1", "type": "triage", "created-at": at}),
            ),
            errors: None,
            at: Timestamp::from_millis(at),
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let sink = FileAuditSink::new(dir.path().join("audit").join(AUDIT_FILE_NAME)).unwrap();

        sink.append(&entry(AuditType::Success, 1)).unwrap();
        sink.append(&entry(AuditType::BoundaryViolation, 2)).unwrap();

        let entries = read_audit_log(sink.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].audit_type, AuditType::Success);
        assert_eq!(entries[1].audit_type, AuditType::BoundaryViolation);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join(AUDIT_FILE_NAME);
        let sink = FileAuditSink::new(&nested).unwrap();
        sink.append(&entry(AuditType::Success, 1)).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_torn_final_line_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(AUDIT_FILE_NAME);
        let sink = FileAuditSink::new(&path).unwrap();
        sink.append(&entry(AuditType::Success, 1)).unwrap();

        // Simulate a crash mid-append.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"audit-type\":\"succ").unwrap();
        drop(file);

        let entries = read_audit_log(&path).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corruption_mid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(AUDIT_FILE_NAME);
        fs::write(&path, "not json\n").unwrap();
        let sink = FileAuditSink::new(&path).unwrap();
        sink.append(&entry(AuditType::Success, 1)).unwrap();

        assert!(read_audit_log(&path).is_err());
    }

    #[test]
    fn test_audit_type_tags() {
        assert_eq!(AuditType::AppendOnlyViolation.as_str(), "append-only-violation");
        assert!(AuditType::ValidationFailure.is_failure());
        assert!(!AuditType::Success.is_failure());
    }
}
