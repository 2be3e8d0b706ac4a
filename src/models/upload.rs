use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub filename: String,
    pub upload_time: i64,
}

impl UploadRecord {
    pub fn new(filename: String) -> Self {
        Self {
            filename,
            upload_time: Utc::now().timestamp_millis(),
        }
    }
}
