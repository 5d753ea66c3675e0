use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::{
    error::{BrowseError, Result},
    types::{DirectoryListing, FileEntry},
};

/// Enumerates the immediate children of directories under a root
///
/// Nothing is cached: sizes and kinds are read from the filesystem on every call.
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    root: PathBuf,
}

impl DirectoryLister {
    /// `root` must be canonical so relative paths can be derived by prefix stripping
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List `dir`, hiding dot-entries, directories first then files
    pub async fn list(&self, dir: &Path) -> Result<DirectoryListing> {
        let metadata = fs::metadata(dir).await.map_err(|e| self.map_io(dir, e))?;
        if !metadata.is_dir() {
            return Err(BrowseError::NotADirectory {
                path: self.display_path(dir),
            });
        }

        let base = self.relative(dir);
        let mut read_dir = fs::read_dir(dir).await.map_err(|e| self.map_io(dir, e))?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping non-UTF-8 entry {:?} in {}", raw, dir.display());
                    continue;
                }
            };

            if name.starts_with('.') {
                continue;
            }

            let entry_path = entry.path();
            if !self.stays_inside(&entry_path).await {
                continue;
            }

            // Follows symlinks; entries that vanished or dangle are dropped
            let metadata = match fs::metadata(&entry_path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Skipping {}: {}", entry_path.display(), e);
                    continue;
                }
            };
            if !metadata.is_dir() && !metadata.is_file() {
                debug!("Skipping special file {}", entry_path.display());
                continue;
            }

            let relative_path = if base.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", base, name)
            };

            entries.push(if metadata.is_dir() {
                FileEntry::dir(name, relative_path)
            } else {
                FileEntry::file(name, relative_path, metadata.len())
            });
        }

        sort_entries(&mut entries);

        Ok(DirectoryListing {
            path: base,
            entries,
        })
    }

    /// Describe a single regular file the same way a listing would
    pub async fn describe_file(&self, file: &Path) -> Result<FileEntry> {
        let metadata = fs::metadata(file).await.map_err(|e| self.map_io(file, e))?;
        if !metadata.is_file() {
            return Err(BrowseError::NotFound {
                path: self.display_path(file),
            });
        }

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(FileEntry::file(name, self.relative(file), metadata.len()))
    }

    /// A symlinked child is only listed when its target lies under the root
    async fn stays_inside(&self, path: &Path) -> bool {
        let is_symlink = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata.file_type().is_symlink(),
            Err(_) => return false,
        };
        if !is_symlink {
            return true;
        }

        match fs::canonicalize(path).await {
            Ok(target) if target.starts_with(&self.root) => true,
            Ok(target) => {
                debug!(
                    "Skipping {}: links outside the root to {}",
                    path.display(),
                    target.display()
                );
                false
            }
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                false
            }
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }

    fn display_path(&self, path: &Path) -> String {
        let relative = self.relative(path);
        if relative.is_empty() {
            "/".to_string()
        } else {
            relative
        }
    }

    fn map_io(&self, path: &Path, e: std::io::Error) -> BrowseError {
        if e.kind() == ErrorKind::NotFound {
            BrowseError::NotFound {
                path: self.display_path(path),
            }
        } else {
            BrowseError::Io(e)
        }
    }
}

/// Directories before files, each group ascending by name (byte order, case-sensitive)
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        a.entry_type
            .cmp(&b.entry_type)
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryType;
    use tempfile::TempDir;

    /// Whether `entries` satisfies the listing order
    fn is_listing_ordered(entries: &[FileEntry]) -> bool {
        entries.windows(2).all(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            match (a.entry_type, b.entry_type) {
                (EntryType::File, EntryType::Dir) => false,
                (x, y) if x == y => a.name <= b.name,
                _ => true,
            }
        })
    }

    fn fixture() -> (TempDir, DirectoryLister) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, DirectoryLister::new(root))
    }

    #[tokio::test]
    async fn test_list_root_scenario() {
        let (_dir, lister) = fixture();
        std::fs::create_dir(lister.root.join("movies")).unwrap();
        std::fs::write(lister.root.join("readme.txt"), b"0123456789").unwrap();

        let listing = lister.list(&lister.root).await.unwrap();
        assert_eq!(listing.path, "");
        assert_eq!(
            listing.entries,
            vec![
                FileEntry::dir("movies", "movies"),
                FileEntry::file("readme.txt", "readme.txt", 10),
            ]
        );
        assert_eq!(listing.entries[1].size.as_deref(), Some("10.00 B"));
    }

    #[tokio::test]
    async fn test_list_orders_groups_case_sensitively() {
        let (_dir, lister) = fixture();
        for name in ["zeta", "Alpha", "beta"] {
            std::fs::create_dir(lister.root.join(name)).unwrap();
        }
        for name in ["b.txt", "A.txt", "a.txt"] {
            std::fs::write(lister.root.join(name), b"x").unwrap();
        }

        let listing = lister.list(&lister.root).await.unwrap();
        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta", "zeta", "A.txt", "a.txt", "b.txt"]);
        assert!(is_listing_ordered(&listing.entries));
    }

    #[tokio::test]
    async fn test_list_hides_dot_entries() {
        let (_dir, lister) = fixture();
        std::fs::write(lister.root.join(".hidden"), b"x").unwrap();
        std::fs::create_dir(lister.root.join(".git")).unwrap();
        std::fs::write(lister.root.join("visible"), b"x").unwrap();

        let listing = lister.list(&lister.root).await.unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "visible");
    }

    #[tokio::test]
    async fn test_list_is_not_recursive_and_tracks_relative_paths() {
        let (_dir, lister) = fixture();
        let movies = lister.root.join("movies");
        std::fs::create_dir_all(movies.join("2024")).unwrap();
        std::fs::write(movies.join("2024").join("deep.mp4"), b"x").unwrap();
        std::fs::write(movies.join("a.mp4"), b"xx").unwrap();

        let listing = lister.list(&movies).await.unwrap();
        assert_eq!(listing.path, "movies");
        assert_eq!(
            listing.entries,
            vec![
                FileEntry::dir("2024", "movies/2024"),
                FileEntry::file("a.mp4", "movies/a.mp4", 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_is_repeatable() {
        let (_dir, lister) = fixture();
        for i in 0..20 {
            std::fs::write(lister.root.join(format!("f{i}.bin")), vec![0u8; i * 100]).unwrap();
        }

        let first = lister.list(&lister.root).await.unwrap();
        let second = lister.list(&lister.root).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_missing_is_not_found() {
        let (_dir, lister) = fixture();
        let result = lister.list(&lister.root.join("gone")).await;
        assert!(matches!(result, Err(BrowseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_file_is_not_a_directory() {
        let (_dir, lister) = fixture();
        let file = lister.root.join("readme.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(matches!(
            lister.list(&file).await,
            Err(BrowseError::NotADirectory { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_dangling_symlinks() {
        let (_dir, lister) = fixture();
        std::os::unix::fs::symlink(lister.root.join("nowhere"), lister.root.join("broken")).unwrap();
        std::fs::write(lister.root.join("real.txt"), b"x").unwrap();

        let listing = lister.list(&lister.root).await.unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "real.txt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_symlink_escape() {
        let (_dir, lister) = fixture();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("big.bin"), vec![0u8; 4096]).unwrap();
        std::fs::create_dir(outside.path().join("elsewhere")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("big.bin"), lister.root.join("leak.bin"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path().join("elsewhere"), lister.root.join("leakdir"))
            .unwrap();

        std::fs::write(lister.root.join("real.txt"), b"abc").unwrap();
        std::os::unix::fs::symlink(lister.root.join("real.txt"), lister.root.join("alias.txt"))
            .unwrap();

        let listing = lister.list(&lister.root).await.unwrap();
        assert_eq!(
            listing.entries,
            vec![
                FileEntry::file("alias.txt", "alias.txt", 3),
                FileEntry::file("real.txt", "real.txt", 3),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_special_files() {
        let (_dir, lister) = fixture();
        let _socket = std::os::unix::net::UnixListener::bind(lister.root.join("app.sock")).unwrap();
        std::fs::write(lister.root.join("real.txt"), b"x").unwrap();

        let listing = lister.list(&lister.root).await.unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "real.txt");

        assert!(matches!(
            lister.describe_file(&lister.root.join("app.sock")).await,
            Err(BrowseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_describe_file() {
        let (_dir, lister) = fixture();
        std::fs::create_dir(lister.root.join("movies")).unwrap();
        let file = lister.root.join("movies").join("a.mp4");
        std::fs::write(&file, vec![0u8; 2048]).unwrap();

        let entry = lister.describe_file(&file).await.unwrap();
        assert_eq!(entry, FileEntry::file("a.mp4", "movies/a.mp4", 2048));
        assert_eq!(entry.size.as_deref(), Some("2.00 KB"));
    }

    #[test]
    fn test_is_sorted_detects_file_before_dir() {
        let entries = vec![FileEntry::file("a", "a", 1), FileEntry::dir("b", "b")];
        assert!(!is_listing_ordered(&entries));
    }
}
