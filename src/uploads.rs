use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::io::AsyncWriteExt;

/// Public prefix under which stored files are referenced.
pub const URL_PREFIX: &str = "/uploads/";

/// Local directory holding product images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        UploadStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<id hex>_<YYYYmmddHHMMSS><.ext>`, keeping the original extension.
    pub fn file_name(id: &ObjectId, original: &str, now: DateTime<Utc>) -> String {
        let ext = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        format!("{}_{}{}", id.to_hex(), now.format("%Y%m%d%H%M%S"), ext)
    }

    /// Writes the raw bytes and returns the relative URL of the stored file.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut file = tokio::fs::File::create(self.dir.join(file_name)).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        Ok(format!("{URL_PREFIX}{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn file_name_keeps_extension() {
        let id = ObjectId::parse_str("65f0c0ffee0000000000abcd").unwrap();
        assert_eq!(
            UploadStore::file_name(&id, "foto.final.png", at()),
            "65f0c0ffee0000000000abcd_20240309140507.png"
        );
    }

    #[test]
    fn file_name_without_extension() {
        let id = ObjectId::parse_str("65f0c0ffee0000000000abcd").unwrap();
        assert_eq!(
            UploadStore::file_name(&id, "foto", at()),
            "65f0c0ffee0000000000abcd_20240309140507"
        );
    }

    #[tokio::test]
    async fn save_creates_directory_and_returns_url() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().join("uploads"));

        let url = store.save("x_1.jpg", b"jpeg-bytes").await.unwrap();
        assert_eq!(url, "/uploads/x_1.jpg");

        let written = std::fs::read(store.dir().join("x_1.jpg")).unwrap();
        assert_eq!(written, b"jpeg-bytes");
    }
}
