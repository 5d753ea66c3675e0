use serde::{Deserialize, Serialize};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Type of directory entry
///
/// Variant order is listing order: directories sort before files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[serde(rename = "directory")]
    Dir,
    File,
}

/// Represents an entry in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Name of the file or folder
    pub name: String,
    /// Type of entry
    pub entry_type: EntryType,
    /// Size in bytes, files only
    pub size_bytes: Option<u64>,
    /// Human-scaled size, files only
    pub size: Option<String>,
    /// `/`-separated path relative to the root directory
    pub relative_path: String,
}

impl FileEntry {
    pub fn dir(name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Dir,
            size_bytes: None,
            size: None,
            relative_path: relative_path.into(),
        }
    }

    pub fn file(name: impl Into<String>, relative_path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::File,
            size_bytes: Some(size_bytes),
            size: Some(format_size(size_bytes)),
            relative_path: relative_path.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }
}

/// Result of listing a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// The browse path that was listed, relative to the root (empty for the root)
    pub path: String,
    /// Directories first, then files, each group ascending by name
    pub entries: Vec<FileEntry>,
}

/// Direct and shortened links for a batch of entries
///
/// `direct[i]` and `short[i]` always refer to the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    pub direct: Vec<String>,
    pub short: Vec<String>,
}

impl LinkSet {
    pub fn len(&self) -> usize {
        self.direct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }
}

/// Render a byte count as a human-scaled value with two decimals
///
/// Divides by 1024 until the value drops below 1024 or the last unit (TB) is reached.
pub fn format_size(size_bytes: u64) -> String {
    let mut value = size_bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, SIZE_UNITS[unit])
}
