// File: src/snapshot.rs
//
// Snapshot test runner for Sprig scripts.
// Every `<name>.sprig` in a directory is run in a fresh Session and its
// output is compared to `<name>.out`. The output is the results joined by
// newlines, or a single `error: <kind>: <message>` line when the script fails.

use crate::session::{Config, Session};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotFailure {
    pub script: PathBuf,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
    /// Scripts whose output matched, with their run time
    pub passed: Vec<(PathBuf, Duration)>,
    pub failed: Vec<SnapshotFailure>,
    /// Snapshots written because they were missing or `update` was set
    pub written: Vec<PathBuf>,
}

impl SnapshotReport {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs one script and renders its output the way snapshots store it
pub fn render_script(path: &Path, config: &Config) -> io::Result<String> {
    let source = fs::read(path)?;

    let mut config = config.clone();
    if let Some(dir) = path.parent() {
        config.search_paths.insert(0, dir.to_path_buf());
    }

    let mut session = Session::new(config).with_source_name(path.display().to_string());
    session.write(&source);
    Ok(match session.run() {
        Ok(results) => results.join("\n"),
        Err(error) => format!("error: {}: {}", error.kind, error.message),
    })
}

/// Sorted `*.sprig` files directly inside `dir`
fn collect_scripts(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut scripts: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == crate::module::SOURCE_EXTENSION).unwrap_or(false))
        .collect();
    scripts.sort();
    Ok(scripts)
}

/// Runs every script in `dir` against its snapshot
///
/// A missing snapshot is written from the actual output and counts as
/// passed; `update` rewrites every snapshot.
pub fn run_snapshots(dir: &Path, update: bool, config: &Config) -> io::Result<SnapshotReport> {
    let mut report = SnapshotReport::default();

    for script in collect_scripts(dir)? {
        let expected_path = script.with_extension("out");
        let start = Instant::now();
        let actual = render_script(&script, config)?.trim().to_string();
        let elapsed = start.elapsed();

        let expected = if expected_path.exists() && !update {
            fs::read_to_string(&expected_path)?.trim().to_string()
        } else {
            fs::write(&expected_path, format!("{}\n", actual))?;
            report.written.push(expected_path);
            actual.clone()
        };

        debug!("snapshot {} took {:.2?}", script.display(), elapsed);

        if actual == expected {
            report.passed.push((script, elapsed));
        } else {
            report.failed.push(SnapshotFailure { script, expected, actual });
        }
    }

    Ok(report)
}
