//! Directory scanning for building a catalog from files on disk.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::types::{Asset, AssetKind};

/// File extensions classified as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif", "avif", "heic",
];

/// Check if a path has an image extension (case-insensitive).
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|known| *known == ext_lower)
        })
        .unwrap_or(false)
}

/// Builds catalog entries from a directory tree.
pub struct CatalogScanner {
    base_url: Option<String>,
    fields: Vec<String>,
}

impl CatalogScanner {
    /// Create a scanner. With a `base_url`, each asset also gets a public URL
    /// formed from the base and its path relative to the scanned root.
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            fields: Vec::new(),
        }
    }

    /// Declare a custom field handle on every scanned asset, empty.
    pub fn with_field(mut self, handle: impl Into<String>) -> Self {
        self.fields.push(handle.into());
        self
    }

    /// Scan `root` recursively. Hidden files and directories are skipped.
    ///
    /// Files are sorted by path for deterministic ordering and numbered from 1.
    pub fn scan(&self, root: &Path) -> Vec<Asset> {
        let mut paths: Vec<PathBuf> = if root.is_file() {
            vec![root.to_path_buf()]
        } else {
            WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect()
        };
        paths.sort();

        paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| self.to_asset(i as u64 + 1, root, path))
            .collect()
    }

    fn to_asset(&self, id: u64, root: &Path, path: PathBuf) -> Asset {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let url = self.base_url.as_ref().map(|base| {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if segments.is_empty() {
                format!("{base}/{filename}")
            } else {
                format!("{base}/{}", segments.join("/"))
            }
        });

        let kind = if is_image_path(&path) {
            AssetKind::Image
        } else {
            AssetKind::Other
        };

        let mut asset = Asset::image(id, filename);
        asset.kind = kind;
        asset.url = url;
        asset.local_path = Some(std::fs::canonicalize(&path).unwrap_or(path));
        for handle in &self.fields {
            asset.fields.insert(handle.clone(), String::new());
        }
        asset
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
