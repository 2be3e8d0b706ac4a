use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const STAGING_DIR: &str = ".staging";

/// Disk layout for stored PDFs: accepted files live directly under the
/// storage root, incoming parts are written to `ROOT/.staging` until the
/// whole batch validates.
pub struct Storage {
    root: PathBuf,
    staging: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let staging = root.join(STAGING_DIR);
        std::fs::create_dir_all(&staging)?;
        Ok(Self { root, staging })
    }

    /// Fresh path in the staging area for an incoming file part.
    pub fn staging_path(&self) -> PathBuf {
        self.staging.join(Uuid::new_v4().to_string())
    }

    /// Moves a staged file into permanent storage under a server-assigned
    /// name and returns that name. Client filenames are never reused.
    pub async fn commit(&self, staged: &Path) -> io::Result<String> {
        let filename = format!("{}.pdf", Uuid::new_v4());
        tokio::fs::rename(staged, self.root.join(&filename)).await?;
        Ok(filename)
    }

    /// Resolves a client-supplied filename inside the storage root.
    /// Rejects anything that could escape it: empty names, path
    /// separators, and leading dots (which also hides the staging area).
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.starts_with('.')
            || filename.contains('/')
            || filename.contains('\\')
        {
            return None;
        }
        Some(self.root.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> Storage {
        let root = std::env::temp_dir().join(format!("pdfstore-test-{}", Uuid::new_v4()));
        Storage::new(root).expect("create temp storage")
    }

    #[test]
    fn resolve_accepts_plain_filenames() {
        let storage = temp_storage();
        let path = storage.resolve("abc123.pdf").expect("plain name resolves");
        assert!(path.ends_with("abc123.pdf"));
        assert!(path.starts_with(&storage.root));
    }

    #[test]
    fn resolve_rejects_traversal_and_hidden_names() {
        let storage = temp_storage();
        assert!(storage.resolve("").is_none());
        assert!(storage.resolve("..").is_none());
        assert!(storage.resolve("../etc/passwd").is_none());
        assert!(storage.resolve("a/b.pdf").is_none());
        assert!(storage.resolve("a\\b.pdf").is_none());
        assert!(storage.resolve(".staging").is_none());
    }

    #[actix_web::test]
    async fn commit_moves_staged_file_under_assigned_name() {
        let storage = temp_storage();
        let staged = storage.staging_path();
        tokio::fs::write(&staged, b"%PDF-1.4 content").await.unwrap();

        let filename = storage.commit(&staged).await.unwrap();
        assert!(filename.ends_with(".pdf"));
        assert!(!staged.exists());

        let stored = storage.resolve(&filename).unwrap();
        let bytes = tokio::fs::read(stored).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4 content");
    }
}
