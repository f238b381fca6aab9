//! Run-rate guard over a plain-text cursor file holding the epoch seconds
//! of the last run. Every read failure fails open toward running.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};

/// Decide whether this invocation should run at all. True when the cursor
/// is absent or unreadable, when `force` is set, or when at least
/// `min_interval_secs` have elapsed since the recorded run.
pub fn should_run(cursor_path: &Path, force: bool, min_interval_secs: u64) -> bool {
    if force {
        info!("FORCE_RUN set, skipping run-interval guard");
        return true;
    }

    let Some(last) = read_cursor(cursor_path) else {
        return true;
    };

    let elapsed = Utc::now().timestamp() as f64 - last;
    if elapsed < min_interval_secs as f64 {
        info!(
            elapsed_secs = elapsed as i64,
            min_interval_secs, "Skip: last run is within the minimum interval"
        );
        return false;
    }
    true
}

/// Read the persisted cursor. Missing or corrupt files read as "never run".
fn read_cursor(path: &Path) -> Option<f64> {
    let raw = fs::read_to_string(path).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(ts) => Some(ts),
        Err(_) => {
            debug!(path = %path.display(), "Corrupt run cursor, treating as never run");
            None
        }
    }
}

/// Record `now` as the last run time. Written to a temp file in the same
/// directory and renamed into place so an interrupted process cannot leave
/// a partial cursor.
pub fn write_cursor(cursor_path: &Path) -> Result<()> {
    let dir = cursor_path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new_in("."),
    }
    .context("creating temp cursor file")?;

    write!(tmp, "{}", Utc::now().timestamp())?;
    tmp.persist(cursor_path)
        .context("replacing run cursor file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cursor_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".last_ingest_at");
        assert!(should_run(&path, false, 3600));
    }

    #[test]
    fn corrupt_cursor_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".last_ingest_at");
        fs::write(&path, "not a number").unwrap();
        assert!(should_run(&path, false, 3600));
    }

    #[test]
    fn fresh_cursor_skips_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".last_ingest_at");
        write_cursor(&path).unwrap();

        assert!(!should_run(&path, false, 3600));
        assert!(should_run(&path, true, 3600));
    }

    #[test]
    fn elapsed_interval_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".last_ingest_at");
        let old = Utc::now().timestamp() - 7200;
        fs::write(&path, old.to_string()).unwrap();

        assert!(should_run(&path, false, 3600));
        assert!(!should_run(&path, false, 86_400));
    }

    #[test]
    fn write_cursor_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".last_ingest_at");
        fs::write(&path, "0").unwrap();
        write_cursor(&path).unwrap();

        let stored: f64 = fs::read_to_string(&path).unwrap().trim().parse().unwrap();
        assert!(stored > 0.0);
    }
}
