//! Order file cleanup worker
//!
//! Completed orders have their uploaded files removed from disk and their
//! attachment records cleared. Jobs arrive on a bounded channel the dispatcher
//! sends to with back-pressure (blocking send), so a completion is never
//! acknowledged without its cleanup job being queued.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::DataStore;

/// One queued cleanup unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupJob {
    pub order_id: i64,
}

pub const CLEANUP_QUEUE_CAPACITY: usize = 256;

/// Spawn the background worker that drains the cleanup queue
///
/// The worker owns the receiving end; it exits when every sender is dropped
/// (server shutdown).
pub fn spawn_worker(
    store: Arc<dyn DataStore>,
    upload_dir: PathBuf,
    mut rx: mpsc::Receiver<CleanupJob>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match store.take_order_files(job.order_id).await {
                Ok(files) => {
                    let mut removed = 0u32;
                    for file in &files {
                        let path = upload_dir.join(&file.filename);
                        match tokio::fs::remove_file(&path).await {
                            Ok(()) => removed += 1,
                            // Already gone is fine, the record is what mattered
                            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                            Err(e) => {
                                tracing::warn!(
                                    order_id = job.order_id,
                                    file = %file.filename,
                                    "Failed to remove order file: {e}"
                                );
                            }
                        }
                    }
                    if !files.is_empty() {
                        tracing::info!(
                            order_id = job.order_id,
                            total = files.len(),
                            removed,
                            "Order files cleaned up after completion"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(
                        order_id = job.order_id,
                        error = ?e,
                        "Failed to collect order files for cleanup"
                    );
                }
            }
        }
        tracing::info!("Cleanup worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::NewMessage;
    use shared::models::{FileRef, UserRole};

    async fn seed_message_with_file(store: &MemoryStore, order_id: i64, filename: &str) {
        store
            .insert_message(NewMessage {
                order_id,
                sender_id: 1,
                sender_role: UserRole::Customer,
                content: "files attached".into(),
                files: vec![FileRef {
                    filename: filename.into(),
                    original_name: "cards.pdf".into(),
                    mimetype: "application/pdf".into(),
                    size: 3,
                }],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn worker_removes_files_and_clears_records() {
        let dir = std::env::temp_dir().join(format!("pe-cleanup-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("job-42.pdf");
        tokio::fs::write(&path, b"pdf").await.unwrap();

        let store = Arc::new(MemoryStore::new());
        seed_message_with_file(&store, 42, "job-42.pdf").await;

        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_worker(store.clone(), dir.clone(), rx);
        tx.send(CleanupJob { order_id: 42 }).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert!(!path.exists());
        assert!(store.take_order_files(42).await.unwrap().is_empty());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_files_are_not_fatal() {
        let store = Arc::new(MemoryStore::new());
        // File record exists but nothing on disk
        seed_message_with_file(&store, 7, "never-written.pdf").await;

        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_worker(store.clone(), std::env::temp_dir(), rx);
        tx.send(CleanupJob { order_id: 7 }).await.unwrap();
        tx.send(CleanupJob { order_id: 8 }).await.unwrap(); // no files at all
        drop(tx);
        handle.await.unwrap();

        assert!(store.take_order_files(7).await.unwrap().is_empty());
    }
}
