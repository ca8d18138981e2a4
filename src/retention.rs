//! Log folder retention

use crate::context::RunContext;
use chrono::{DateTime, Duration, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub folder: PathBuf,
    pub max_age_days: u32,
}

impl RetentionPolicy {
    pub fn new(folder: impl Into<PathBuf>, max_age_days: u32) -> Self {
        Self {
            folder: folder.into(),
            max_age_days,
        }
    }

    pub fn cutoff(&self, now: DateTime<Local>) -> DateTime<Local> {
        now - Duration::days(i64::from(self.max_age_days))
    }
}

/// Delete files in the policy folder (non-recursive) last modified strictly
/// before `now - max_age_days`, except the paths in `keep`. Failures are
/// recorded and the sweep goes on. Returns the deleted paths.
pub fn sweep(
    policy: &RetentionPolicy,
    now: DateTime<Local>,
    keep: &[PathBuf],
    ctx: &mut RunContext,
) -> Vec<PathBuf> {
    let cutoff = policy.cutoff(now);
    let mut removed = Vec::new();

    let entries = match fs::read_dir(&policy.folder) {
        Ok(entries) => entries,
        Err(e) => {
            ctx.system_error(format!(
                "Failed to read log folder '{}': {}",
                policy.folder.display(),
                e
            ));
            return removed;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || keep.iter().any(|k| k == &path) {
            continue;
        }
        match modified(&path) {
            Ok(modified) if modified < cutoff => match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed old log file");
                    removed.push(path);
                }
                Err(e) => ctx.system_error(format!(
                    "Failed to remove old log file '{}': {}",
                    path.display(),
                    e
                )),
            },
            Ok(_) => {}
            Err(e) => ctx.system_error(format!(
                "Failed to read modification time of '{}': {}",
                path.display(),
                e
            )),
        }
    }

    if !removed.is_empty() {
        info!(
            folder = %policy.folder.display(),
            removed = removed.len(),
            "retention sweep done"
        );
    }
    removed
}

fn modified(path: &Path) -> std::io::Result<DateTime<Local>> {
    Ok(DateTime::<Local>::from(fs::metadata(path)?.modified()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn touch(path: &Path, at: DateTime<Local>) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::from(at)).unwrap();
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let dir = TempDir::new().unwrap();
        // Whole seconds so coarse file system timestamps still hit the cutoff
        let now = Local::now().trunc_subsecs(0);
        let policy = RetentionPolicy::new(dir.path(), 10);
        let cutoff = policy.cutoff(now);

        let at_cutoff = dir.path().join("at-cutoff.csv");
        let older = dir.path().join("older.csv");
        let fresh = dir.path().join("fresh.csv");
        touch(&at_cutoff, cutoff);
        touch(&older, cutoff - Duration::seconds(1));
        touch(&fresh, now);

        let mut ctx = RunContext::new();
        let removed = sweep(&policy, now, &[], &mut ctx);

        assert_eq!(removed, vec![older.clone()]);
        assert!(at_cutoff.exists());
        assert!(fresh.exists());
        assert!(!older.exists());
        assert!(!ctx.has_system_errors());
    }

    #[test]
    fn test_subfolders_are_left_alone() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("keep");
        fs::create_dir(&sub).unwrap();
        touch(&sub.join("ancient.txt"), Local::now() - Duration::days(400));

        let mut ctx = RunContext::new();
        let removed = sweep(&RetentionPolicy::new(dir.path(), 1), Local::now(), &[], &mut ctx);

        assert!(removed.is_empty());
        assert!(sub.join("ancient.txt").exists());
    }

    #[test]
    fn test_missing_folder_is_system_error() {
        let dir = TempDir::new().unwrap();
        let mut ctx = RunContext::new();
        sweep(
            &RetentionPolicy::new(dir.path().join("missing"), 1),
            Local::now(),
            &[],
            &mut ctx,
        );
        assert_eq!(ctx.exit_code(), 1);
    }

    #[test]
    fn test_zero_days_spares_kept_files() {
        let dir = TempDir::new().unwrap();
        let now = Local::now().trunc_subsecs(0);
        let written = dir.path().join("written.csv");
        let stale = dir.path().join("stale.csv");
        touch(&written, now - Duration::seconds(5));
        touch(&stale, now - Duration::seconds(5));

        let mut ctx = RunContext::new();
        let removed = sweep(
            &RetentionPolicy::new(dir.path(), 0),
            now,
            &[written.clone()],
            &mut ctx,
        );

        assert_eq!(removed, vec![stale]);
        assert!(written.exists());
    }
}
