use crate::domain::ports::Storage;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

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

    /// 建立根目錄（已存在則略過）
    pub fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path);
        if full_path.is_dir() {
            fs::remove_dir_all(full_path)?;
        } else if full_path.exists() {
            fs::remove_file(full_path)?;
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.resolve(from), self.resolve(to))?;
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let target = self.resolve(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(self.resolve(from), target)?;
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_read_and_rename() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .write_file("trader/keys.json", b"[]")
            .await
            .unwrap();
        assert!(storage.exists("trader/keys.json").await);

        storage
            .rename("trader/keys.json", "trader/operator_keys.json")
            .await
            .unwrap();
        assert!(!storage.exists("trader/keys.json").await);
        assert_eq!(
            storage.read_file("trader/operator_keys.json").await.unwrap(),
            b"[]".to_vec()
        );
    }

    #[tokio::test]
    async fn test_remove_handles_files_dirs_and_missing_paths() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("pkey.txt", b"0xabc").await.unwrap();
        storage
            .write_file("trader_service/abci_build/docker-compose.yaml", b"")
            .await
            .unwrap();

        storage.remove("pkey.txt").await.unwrap();
        storage.remove("trader_service/abci_build").await.unwrap();
        storage.remove("never-existed.txt").await.unwrap();

        assert!(!storage.exists("pkey.txt").await);
        assert!(!storage.exists("trader_service/abci_build").await);
        assert!(storage.exists("trader_service").await);
    }

    #[test]
    fn test_ensure_base_dir() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("work").join("nested"));
        storage.ensure_base_dir().unwrap();
        storage.ensure_base_dir().unwrap();
        assert!(storage.base_path().is_dir());
    }

    #[test]
    fn test_ensure_base_dir_failure_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let err = LocalStorage::new(blocker.join("work"))
            .ensure_base_dir()
            .unwrap_err();

        assert!(matches!(err, crate::utils::error::RunnerError::IoError(_)));
        assert_eq!(err.severity().exit_code(), 3);
    }

    #[tokio::test]
    async fn test_copy_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("keys.json", b"[1]").await.unwrap();
        storage
            .copy("keys.json", "trader_service/keys.json")
            .await
            .unwrap();

        assert_eq!(
            storage.read_file("trader_service/keys.json").await.unwrap(),
            b"[1]".to_vec()
        );
    }
}
