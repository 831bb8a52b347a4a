//! # Disk Cache

use crate::errors::ZooError;
use burn::config::Config;
use burn::data::network::downloader;
use std::any::Any;
use std::fs::{File, remove_file, rename};
use std::io::Write;
use std::path::PathBuf;

/// Disk cache policy.
#[derive(Config, Debug)]
pub struct DiskCacheConfig {
    /// Key for the root cache directory, under ``~/.cache``.
    #[config(default = "\"bmzoo\".to_string()")]
    pub root_cache_key: String,

    /// Explicit root directory; overrides ``~/.cache/{root_cache_key}``.
    #[config(default = "None")]
    pub root_dir: Option<String>,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskCacheConfig {
    /// Fetch the base cache directory.
    ///
    /// If the cache directory does not exist, does not create it.
    pub fn base_cache_dir(&self) -> crate::Result<PathBuf> {
        if let Some(root) = &self.root_dir {
            return Ok(PathBuf::from(root));
        }
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no home directory for the weight cache",
            )
        })?;
        Ok(home.join(".cache").join(&self.root_cache_key))
    }

    /// Map a resource key to a cache path.
    ///
    /// Does not ensure that the path (or any of the parents) exist.
    pub fn resource_to_path(
        &self,
        resource_key: &[String],
    ) -> crate::Result<PathBuf> {
        let path = self.base_cache_dir()?;
        Ok(resource_key.iter().fold(path, |acc, s| acc.join(s)))
    }

    /// Map a resource key to a cache path and ensure the parent directory exists.
    pub fn ensure_resource_parent_dir(
        &self,
        resource_key: &[String],
    ) -> crate::Result<PathBuf> {
        let path = self.resource_to_path(resource_key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Fetch a resource to the cache.
    pub fn fetch_resource(
        &self,
        url: &str,
        resource: &[String],
    ) -> crate::Result<PathBuf> {
        let cache_file_path = self.ensure_resource_parent_dir(resource)?;
        try_cache_download_to_path(url, cache_file_path)
    }
}

/// Download a URL resource to a given path.
///
/// If the path already exists, does nothing.
///
/// # Returns
///
/// The cache path.
pub fn try_cache_download_to_path(
    url: &str,
    cache_file_path: PathBuf,
) -> crate::Result<PathBuf> {
    if cache_file_path.exists() {
        log::debug!("weight cache hit: {}", cache_file_path.display());
        return Ok(cache_file_path);
    }

    let file_name = cache_file_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| url.to_string());

    log::info!("downloading {url} -> {}", cache_file_path.display());
    let bytes = download_bytes(url, &file_name)?;

    // Partial downloads never land on the cache path.
    let part_path = cache_file_path.with_extension("part");
    let mut output_file = File::create(&part_path)?;
    if let Err(err) = output_file.write_all(&bytes) {
        remove_file(&part_path)?;
        return Err(err.into());
    }
    rename(&part_path, &cache_file_path)?;

    Ok(cache_file_path)
}

/// The burn downloader panics on network failure; surface that as [`ZooError::Fetch`].
///
/// The panic is caught with [`std::panic::catch_unwind`], so:
/// * builds with ``panic = "abort"`` abort the process instead of returning `Fetch`;
/// * the installed panic hook still runs, and the default hook prints the
///   downloader's message to stderr before the error is returned.
fn download_bytes(
    url: &str,
    message: &str,
) -> crate::Result<Vec<u8>> {
    std::panic::catch_unwind(|| downloader::download_file_as_bytes(url, message)).map_err(
        |payload| ZooError::Fetch {
            url: url.to_string(),
            message: panic_message(payload),
        },
    )
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "download panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(dir: &tempfile::TempDir) -> DiskCacheConfig {
        DiskCacheConfig::new().with_root_dir(Some(dir.path().to_string_lossy().to_string()))
    }

    #[test]
    fn test_default_root() {
        let config = DiskCacheConfig::default();
        assert_eq!(config.root_cache_key, "bmzoo");
        assert!(config.root_dir.is_none());
    }

    #[test]
    fn test_resource_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);

        let key = vec!["weights".to_string(), "a.pth".to_string()];
        let path = cache.resource_to_path(&key).unwrap();
        assert_eq!(path, dir.path().join("weights").join("a.pth"));
        assert!(!path.parent().unwrap().exists());

        let path = cache.ensure_resource_parent_dir(&key).unwrap();
        assert!(path.parent().unwrap().exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_cached_resource_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);

        let key = vec!["weights".to_string(), "cached.pth".to_string()];
        let path = cache.ensure_resource_parent_dir(&key).unwrap();
        std::fs::write(&path, b"weights").unwrap();

        // An unroutable URL; a hit must never touch the network.
        let fetched = cache
            .fetch_resource("http://invalid.invalid/cached.pth", &key)
            .unwrap();
        assert_eq!(fetched, path);
        assert_eq!(std::fs::read(&fetched).unwrap(), b"weights");
    }

    #[test]
    fn test_failed_download_is_retryable_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = temp_cache(&dir);

        let key = vec!["weights".to_string(), "x.pth".to_string()];
        let url = "http://invalid.invalid/x.pth";
        let err = cache.fetch_resource(url, &key).unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(
            err,
            ZooError::Fetch { url: ref failed, .. } if failed == url
        ));

        let path = cache.resource_to_path(&key).unwrap();
        assert!(!path.exists());
        assert!(!path.with_extension("part").exists());
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(7_u8)), "download panicked");
    }
}
