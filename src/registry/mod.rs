use std::sync::Mutex;

use crate::models::upload::UploadRecord;

/// Process-wide record of accepted uploads, shared across all requests
/// through `web::Data`. Lost on restart; the filesystem is the only
/// durable store.
#[derive(Default)]
pub struct UploadRegistry {
    records: Mutex<Vec<UploadRecord>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a whole batch under a single lock acquisition, so a
    /// concurrent listing never observes part of a batch.
    pub fn append_batch(&self, batch: Vec<UploadRecord>) {
        let mut records = self.records.lock().expect("upload registry lock poisoned");
        records.extend(batch);
    }

    pub fn snapshot(&self) -> Vec<UploadRecord> {
        self.records.lock().expect("upload registry lock poisoned").clone()
    }

    /// Records sorted most recent first, truncated to `limit` when given.
    /// Sorts a snapshot; the shared order is never mutated on a read.
    pub fn recent(&self, limit: Option<usize>) -> Vec<UploadRecord> {
        let mut records = self.snapshot();
        records.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        records
    }
}
