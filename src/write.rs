//! Persisting rendered units.
//!
//! Writes run on a dedicated rayon pool bounded by the configured
//! concurrency. A unit that fails to write is recorded and its siblings carry
//! on. Each file is written to a hidden temporary sibling and renamed into
//! place, so a reader never observes a partial file.

use crate::error::{DocError, Result, WriteFailure};
use crate::render::OutputUnit;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions<'c> {
    /// Worker threads; `0` lets rayon pick.
    pub concurrency: usize,
    /// Checked before each unit; once set, remaining units are skipped.
    pub cancel: Option<&'c AtomicBool>,
}

#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<String>,
    pub failures: Vec<WriteFailure>,
    /// Units not attempted because the run was cancelled.
    pub skipped: Vec<String>,
}

impl WriteReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

enum Outcome {
    Written,
    Failed(String),
    Skipped,
}

pub fn write_units(root: &Path, units: &[OutputUnit], options: &WriteOptions<'_>) -> Result<WriteReport> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.concurrency)
        .thread_name(|i| format!("asmdoc-write-{}", i))
        .build()
        .map_err(|e| DocError::Config {
            reason: format!("cannot start writer pool: {}", e),
        })?;

    let outcomes: Vec<Outcome> = pool.install(|| {
        units
            .par_iter()
            .map(|unit| {
                if options.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                    return Outcome::Skipped;
                }
                match write_one(root, unit) {
                    Ok(()) => {
                        debug!(path = %unit.path, "wrote unit");
                        Outcome::Written
                    }
                    Err(e) => {
                        warn!(path = %unit.path, error = %e, "write failed");
                        Outcome::Failed(e.to_string())
                    }
                }
            })
            .collect()
    });

    let mut report = WriteReport::default();
    for (unit, outcome) in units.iter().zip(outcomes) {
        match outcome {
            Outcome::Written => report.written.push(unit.path.clone()),
            Outcome::Failed(message) => report.failures.push(WriteFailure {
                path: unit.path.clone(),
                message,
            }),
            Outcome::Skipped => report.skipped.push(unit.path.clone()),
        }
    }
    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        skipped = report.skipped.len(),
        root = %root.display(),
        "write complete"
    );
    Ok(report)
}

fn write_one(root: &Path, unit: &OutputUnit) -> io::Result<()> {
    let target = root.join(&unit.path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_sibling(&target);
    if let Err(e) = fs::write(&temp, &unit.content).and_then(|()| fs::rename(&temp, &target)) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    Ok(())
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(path: &str, content: &str) -> OutputUnit {
        OutputUnit {
            path: path.to_string(),
            content: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn writes_nested_paths() {
        let dir = TempDir::new().unwrap();
        let units = vec![unit("Acme/Widgets/Gadget.md", "# Gadget\n"), unit("SUMMARY.md", "# Summary\n")];
        let report = write_units(
            dir.path(),
            &units,
            &WriteOptions {
                concurrency: 2,
                cancel: None,
            },
        )
        .unwrap();
        assert!(report.is_success());
        assert_eq!(report.written, vec!["Acme/Widgets/Gadget.md", "SUMMARY.md"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("Acme/Widgets/Gadget.md")).unwrap(),
            "# Gadget\n"
        );
        assert!(!dir.path().join("Acme/Widgets/.Gadget.md.tmp").exists());
    }

    #[test]
    fn failure_does_not_abort_siblings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blocker"), "not a directory").unwrap();
        let units = vec![
            unit("a.md", "a"),
            unit("blocker/b.md", "b"),
            unit("c.md", "c"),
        ];
        let report = write_units(dir.path(), &units, &WriteOptions::default()).unwrap();
        assert_eq!(report.written, vec!["a.md", "c.md"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "blocker/b.md");
        assert!(!report.is_success());
        assert!(dir.path().join("c.md").exists());
    }

    #[test]
    fn cancelled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let cancel = AtomicBool::new(true);
        let units = vec![unit("a.md", "a"), unit("b.md", "b")];
        let report = write_units(
            dir.path(),
            &units,
            &WriteOptions {
                concurrency: 1,
                cancel: Some(&cancel),
            },
        )
        .unwrap();
        assert!(report.written.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert!(!dir.path().join("a.md").exists());
    }
}
