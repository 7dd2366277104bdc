//! Artifact watcher
//!
//! Turns "the file may not exist yet" and "the file is being rewritten" into
//! one stream of content changes. The watcher first polls for the file,
//! then subscribes to file system notifications. The file is read once as
//! soon as the watch is attached and again on every modification. Reads
//! that fail are dropped; the next notification delivers a consistent read.
//! Content identical to the last delivered content is discarded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use uirec_common::{Error, Result};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Drops reads that carry no new content
#[derive(Debug, Default)]
pub struct ChangeFilter {
    last: Option<String>,
}

impl ChangeFilter {
    /// Returns the content if it should reach the pipeline.
    ///
    /// Empty reads are what a truncate-then-write looks like mid-write and
    /// are treated as missed reads.
    pub fn accept(&mut self, content: String) -> Option<String> {
        if content.trim().is_empty() || self.last.as_deref() == Some(content.as_str()) {
            return None;
        }
        self.last = Some(content.clone());
        Some(content)
    }
}

/// Background watcher for the codegen artifact
pub struct ArtifactWatcher {
    task: JoinHandle<()>,
}

impl ArtifactWatcher {
    /// Start watching `path`; changed content arrives on the returned receiver
    pub fn spawn(path: PathBuf, poll_interval: Duration) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);
        let task = tokio::spawn(watch_artifact(path, poll_interval, tx));
        (Self { task }, rx)
    }

    /// Stop watching. No change is sent after this returns.
    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for ArtifactWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn watch_artifact(path: PathBuf, poll_interval: Duration, tx: mpsc::Sender<String>) {
    while !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tokio::time::sleep(poll_interval).await;
    }
    info!("Artifact found at {}", path.display());

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(CHANGE_CHANNEL_CAPACITY);
    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = event_tx.blocking_send(res);
        },
        Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(e) => {
            warn!("Failed to create artifact watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        warn!("Failed to watch {}: {}", path.display(), e);
        return;
    }

    // Content written before the watch attached produces no event
    let mut filter = ChangeFilter::default();
    if !deliver(&path, &mut filter, &tx).await {
        return;
    }

    while let Some(res) = event_rx.recv().await {
        match res {
            Ok(event) if is_modification(&event.kind) => {}
            Ok(_) => continue,
            Err(e) => {
                debug!("Watch error: {}", e);
                continue;
            }
        }

        if !deliver(&path, &mut filter, &tx).await {
            break;
        }
    }
}

/// Read the artifact and forward it if it is new. Returns `false` once the
/// receiver is gone.
async fn deliver(path: &Path, filter: &mut ChangeFilter, tx: &mpsc::Sender<String>) -> bool {
    let content = match read_artifact(path).await {
        Ok(content) => content,
        Err(e) => {
            debug!("{}", e);
            return true;
        }
    };

    match filter.accept(content) {
        Some(content) => tx.send(content).await.is_ok(),
        None => true,
    }
}

fn is_modification(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_))
}

async fn read_artifact(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::TransientRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    #[test]
    fn test_filter_drops_identical_content() {
        let mut filter = ChangeFilter::default();

        assert_eq!(filter.accept("a".to_string()), Some("a".to_string()));
        assert_eq!(filter.accept("a".to_string()), None);
        assert_eq!(filter.accept("a".to_string()), None);
        assert_eq!(filter.accept("b".to_string()), Some("b".to_string()));
        assert_eq!(filter.accept("a".to_string()), Some("a".to_string()));
    }

    #[test]
    fn test_filter_treats_empty_as_missed() {
        let mut filter = ChangeFilter::default();

        assert_eq!(filter.accept(String::new()), None);
        assert_eq!(filter.accept("a".to_string()), Some("a".to_string()));
        assert_eq!(filter.accept("  \n".to_string()), None);
        assert_eq!(filter.accept("a".to_string()), None);
    }

    #[test]
    fn test_only_modifications_count() {
        assert!(is_modification(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(!is_modification(&EventKind::Create(CreateKind::File)));
    }

    #[tokio::test]
    async fn test_read_failure_is_transient() {
        let tmp = TempDir::new().unwrap();
        let err = read_artifact(&tmp.path().join("absent.js")).await.unwrap_err();
        assert!(matches!(err, Error::TransientRead { .. }));
    }

    #[tokio::test]
    async fn test_watcher_waits_for_file_then_delivers_changes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("artifact.js");

        let (watcher, mut rx) = ArtifactWatcher::spawn(path.clone(), Duration::from_millis(50));

        sleep(Duration::from_millis(120)).await;
        std::fs::write(&path, "").unwrap();
        // Let the poll find the file and the watch attach
        sleep(Duration::from_millis(400)).await;

        std::fs::write(&path, "await page.click('#a');\n").unwrap();
        let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(first.as_deref(), Some("await page.click('#a');\n"));

        std::fs::write(&path, "await page.click('#a');\n").unwrap();
        sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "await page.click('#b');\n").unwrap();
        let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(second.as_deref(), Some("await page.click('#b');\n"));

        watcher.close();
    }

    #[tokio::test]
    async fn test_content_written_before_watch_is_delivered() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("artifact.js");

        let (watcher, mut rx) = ArtifactWatcher::spawn(path.clone(), Duration::from_millis(500));

        // Created with content in one write, inside the poll gap
        sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, "await page.click('#a');\n").unwrap();

        let first = timeout(Duration::from_secs(3), rx.recv()).await.unwrap();
        assert_eq!(first.as_deref(), Some("await page.click('#a');\n"));

        // Notifications for the same write must not repeat it
        sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());

        watcher.close();
    }

    #[tokio::test]
    async fn test_unreadable_content_is_skipped_and_watch_continues() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("artifact.js");
        std::fs::write(&path, "").unwrap();

        let (watcher, mut rx) = ArtifactWatcher::spawn(path.clone(), Duration::from_millis(50));
        sleep(Duration::from_millis(300)).await;

        // Not UTF-8, so the read fails
        std::fs::write(&path, [0xffu8, 0xfe, 0xfd]).unwrap();
        sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "await page.click('#b');\n").unwrap();
        let next = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(next.as_deref(), Some("await page.click('#b');\n"));

        watcher.close();
    }
}
