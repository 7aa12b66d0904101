use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::error::Result;

/// Files larger than this are shown from their tail only.
const FULL_READ_LIMIT: u64 = 10_000_000;
const TAIL_READ_SIZE: u64 = 2_000_000;

/// Read the whole log, or its last couple of megabytes for very large files.
pub fn read_log(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let len = file.metadata()?.len();

    if len <= FULL_READ_LIMIT {
        let mut raw = Vec::with_capacity(len as usize);
        file.read_to_end(&mut raw)?;
        return Ok(String::from_utf8_lossy(&raw).into_owned());
    }

    let tail_size = TAIL_READ_SIZE.min(len);
    let mut buffer = vec![0u8; tail_size as usize];
    file.seek(SeekFrom::End(-(tail_size as i64)))?;
    file.read_exact(&mut buffer)?;
    let text = String::from_utf8_lossy(&buffer);

    // Drop the partial first line
    let text = match text.find('\n') {
        Some(pos) => text[pos + 1..].to_string(),
        None => text.into_owned(),
    };
    tracing::debug!(path = %path.display(), len, "large log, showing tail only");
    Ok(text)
}

/// Watches one log file and reports when it has been modified.
pub struct FileWatcher {
    watcher: Option<RecommendedWatcher>,
    receiver: Option<mpsc::Receiver<notify::Result<Event>>>,
    path: Option<PathBuf>,
}

impl FileWatcher {
    pub fn new() -> Self {
        Self {
            watcher: None,
            receiver: None,
            path: None,
        }
    }

    pub fn watch_file(&mut self, path: PathBuf) -> Result<()> {
        self.stop();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;

        // Watch the parent so editors that replace the file are still seen
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        } else {
            watcher.watch(Path::new("."), RecursiveMode::NonRecursive)?;
        }
        tracing::debug!(path = %path.display(), "watching log file");

        self.watcher = Some(watcher);
        self.receiver = Some(rx);
        self.path = Some(path);

        Ok(())
    }

    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            tracing::debug!("stopped watching log file");
        }
        self.receiver = None;
        self.path = None;
    }

    /// Drain pending events; true if the watched file changed.
    pub fn check_for_changes(&mut self) -> bool {
        let (Some(receiver), Some(path)) = (&self.receiver, &self.path) else {
            return false;
        };

        let mut changed = false;
        while let Ok(event) = receiver.try_recv() {
            match event {
                Ok(event) => {
                    if is_content_change(&event.kind) && event.paths.iter().any(|p| same_file(p, path)) {
                        changed = true;
                    }
                }
                Err(e) => tracing::warn!("file watch error: {}", e),
            }
        }
        changed
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

// Events carry absolute paths; the CLI may have given a relative one.
fn same_file(event_path: &Path, watched: &Path) -> bool {
    if event_path == watched {
        return true;
    }
    match (event_path.canonicalize(), watched.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_small_file_whole() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "line1\nline2").unwrap();
        assert_eq!(read_log(file.path()).unwrap(), "line1\nline2");
    }

    #[test]
    fn reads_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(read_log(file.path()).unwrap(), "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"ok \xff done").unwrap();
        assert_eq!(read_log(file.path()).unwrap(), "ok \u{fffd} done");
    }

    #[test]
    fn large_file_shows_tail_from_line_start() {
        let mut file = NamedTempFile::new().unwrap();
        let line = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcde\n";
        let count = (FULL_READ_LIMIT as usize / line.len()) + 1000;
        for _ in 0..count {
            file.write_all(line.as_bytes()).unwrap();
        }
        file.write_all(b"last line").unwrap();

        let text = read_log(file.path()).unwrap();
        assert!(text.len() <= TAIL_READ_SIZE as usize);
        assert!(text.starts_with("0123456789"));
        assert!(text.ends_with("last line"));
    }

    #[test]
    fn missing_file_is_error() {
        assert!(read_log(Path::new("/nonexistent/app.log")).is_err());
    }

    #[test]
    fn idle_watcher_reports_nothing() {
        let mut watcher = FileWatcher::new();
        assert!(!watcher.is_watching());
        assert!(!watcher.check_for_changes());
    }

    #[test]
    fn stop_clears_watch() {
        let file = NamedTempFile::new().unwrap();
        let mut watcher = FileWatcher::new();
        watcher.watch_file(file.path().to_path_buf()).unwrap();
        assert!(watcher.is_watching());

        watcher.stop();
        assert!(!watcher.is_watching());
        assert!(!watcher.check_for_changes());
    }
}
