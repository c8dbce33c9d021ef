use crate::core::Storage;
use crate::utils::error::{FillError, Result};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use zip::write::{SimpleFileOptions, ZipWriter};

/// 寫到本地目錄樹：`{base}/{group}/{file}.pdf`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn prepare_dir(&self, dir: &str) -> Result<()> {
        let full_path = self.base_path.join(dir);
        tokio::fs::create_dir_all(&full_path).await?;
        Ok(())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// 所有產生的 PDF 打包成單一壓縮檔（對應瀏覽器版「一次下載」的輸出方式）
pub struct ZipStorage {
    state: Mutex<ZipState>,
}

struct ZipState {
    writer: Option<ZipWriter<Cursor<Vec<u8>>>>,
    dirs: HashSet<String>,
}

impl ZipState {
    fn writer(&mut self) -> Result<&mut ZipWriter<Cursor<Vec<u8>>>> {
        self.writer
            .as_mut()
            .ok_or_else(|| FillError::processing("Zip archive already finished"))
    }
}

impl ZipStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ZipState {
                writer: Some(ZipWriter::new(Cursor::new(Vec::new()))),
                dirs: HashSet::new(),
            }),
        }
    }

    /// 結束壓縮檔並取回內容；之後的寫入都會失敗
    pub async fn finish(&self) -> Result<Vec<u8>> {
        let mut state = self.state.lock().await;
        let writer = state
            .writer
            .take()
            .ok_or_else(|| FillError::processing("Zip archive already finished"))?;
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    /// 完成壓縮檔並寫到本地檔案
    pub async fn finish_to_file(&self, path: &Path) -> Result<usize> {
        let data = self.finish().await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &data).await?;
        Ok(data.len())
    }
}

impl Default for ZipStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for ZipStorage {
    /// 同一資料夾可能被兩個群組共用（例如 `José` 與 `Jose`），只加一次
    async fn prepare_dir(&self, dir: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let entry = format!("{}/", dir);
        if state.dirs.contains(&entry) {
            return Ok(());
        }
        state
            .writer()?
            .add_directory(entry.as_str(), SimpleFileOptions::default())?;
        state.dirs.insert(entry);
        Ok(())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().await;
        let writer = state.writer()?;
        writer.start_file(path, SimpleFileOptions::default())?;
        writer.write_all(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.prepare_dir("Escuela_Norte").await.unwrap();
        assert!(temp_dir.path().join("Escuela_Norte").is_dir());

        storage
            .write_file("Escuela_Sur/001_Ana.pdf", b"%PDF-1.5")
            .await
            .unwrap();
        let written = std::fs::read(temp_dir.path().join("Escuela_Sur/001_Ana.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.5");
    }

    #[tokio::test]
    async fn test_local_storage_prepare_dir_fails_on_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("blocked"), b"").unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        assert!(storage.prepare_dir("blocked").await.is_err());
    }

    #[tokio::test]
    async fn test_zip_storage_collects_files() {
        let storage = ZipStorage::new();
        storage.prepare_dir("Norte").await.unwrap();
        storage.write_file("Norte/001_Ana.pdf", b"one").await.unwrap();
        storage.write_file("Norte/002_Beto.pdf", b"two").await.unwrap();

        let data = storage.finish().await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();

        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Norte/", "Norte/001_Ana.pdf", "Norte/002_Beto.pdf"]);

        let mut content = String::new();
        archive
            .by_name("Norte/002_Beto.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "two");

        assert!(storage.write_file("late.pdf", b"x").await.is_err());
        assert!(storage.finish().await.is_err());
    }

    #[tokio::test]
    async fn test_zip_storage_shared_directory() {
        let storage = ZipStorage::new();
        storage.prepare_dir("Jose").await.unwrap();
        storage.write_file("Jose/001_Ana.pdf", b"one").await.unwrap();
        storage.prepare_dir("Jose").await.unwrap();
        storage.write_file("Jose/001_Ana_2.pdf", b"two").await.unwrap();

        let data = storage.finish().await.unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["Jose/", "Jose/001_Ana.pdf", "Jose/001_Ana_2.pdf"]);
    }
}
