//! Avatar image lookup.

use std::collections::HashMap;
use std::path::Path;

use walkdir::WalkDir;

/// Recognized avatar extensions, most preferred first.
pub const AVATAR_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "svg"];

/// Index of avatar images keyed by lower-case file stem.
#[derive(Debug, Clone, Default)]
pub struct AvatarIndex {
    url_base: String,
    files: HashMap<String, (usize, String)>,
}

impl AvatarIndex {
    /// Index the images directly inside `dir`.
    ///
    /// A missing directory yields an empty index.
    pub fn scan(dir: &Path, url_base: &str) -> Self {
        let mut index = Self {
            url_base: url_base.trim_end_matches('/').to_string(),
            files: HashMap::new(),
        };

        if !dir.is_dir() {
            tracing::debug!("Avatar directory {} not found", dir.display());
            return index;
        }

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            let Some(rank) = AVATAR_EXTENSIONS.iter().position(|e| *e == ext) else {
                continue;
            };

            let key = stem.to_lowercase();
            let better = index
                .files
                .get(&key)
                .map_or(true, |(existing, _)| rank < *existing);
            if better {
                index.files.insert(key, (rank, file_name.to_string()));
            }
        }

        tracing::debug!("Indexed {} avatars in {}", index.len(), dir.display());
        index
    }

    /// Site-relative URL of the avatar for `slug`.
    pub fn lookup(&self, slug: &str) -> Option<String> {
        let (_, file) = self.files.get(&slug.to_lowercase())?;

        Some(if self.url_base.is_empty() {
            file.clone()
        } else {
            format!("{}/{}", self.url_base, file)
        })
    }

    /// Number of indexed avatars.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no avatars were found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
