use std::io;
use std::path::{Path, PathBuf};

use actix_web::web;

/// Uploaded product images on local disk, published under
/// `{public_url}/images/`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    url_prefix: String,
}

impl AssetStore {
    pub fn new(root: PathBuf, public_url: &str) -> Self {
        AssetStore {
            root,
            url_prefix: format!("{}/images/", public_url.trim_end_matches('/')),
        }
    }

    /// Local file behind an image URL. Only the final path component is
    /// used, so a crafted URL cannot point outside the upload directory.
    pub fn resolve(&self, image_url: &str) -> Option<PathBuf> {
        let relative = image_url.strip_prefix(&self.url_prefix)?;
        let file_name = Path::new(relative).file_name()?;
        Some(self.root.join(file_name))
    }

    /// Returns `Ok(false)` when there was nothing to delete.
    pub fn remove(&self, image_url: &str) -> io::Result<bool> {
        let Some(path) = self.resolve(image_url) else {
            return Ok(false);
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Deletes the image in the background. The outcome is only logged.
    pub fn schedule_removal(&self, image_url: String) {
        let assets = self.clone();
        actix_web::rt::spawn(async move {
            let url = image_url.clone();
            match web::block(move || assets.remove(&url)).await {
                Ok(Ok(true)) => log::info!("Image {} deleted successfully", image_url),
                Ok(Ok(false)) => log::warn!("Image {} not found", image_url),
                Ok(Err(e)) => log::warn!("Failed to delete image {}: {}", image_url, e),
                Err(e) => log::warn!("Image cleanup for {} did not run: {}", image_url, e),
            }
        });
    }
}
