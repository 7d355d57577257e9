use std::path::PathBuf;

/// A configured archive found on disk, hashed at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Configured file name, relative to the pack directory.
    pub name: String,
    pub source_path: PathBuf,
    pub size_bytes: u64,
    /// SHA-1 over the file bytes as they were when the library was built.
    pub content_hash: [u8; 20],
    /// `base_url + name`.
    pub download_url: String,
}

impl Asset {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.content_hash)
    }
}

/// Ordered set of loaded assets. Built whole by `store::rebuild`, never edited
/// in place; a reload publishes a new library instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetLibrary {
    pub items: Vec<Asset>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The asset offered to clients: position 0.
    pub fn primary(&self) -> Option<&Asset> {
        self.items.first()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An archive sitting in the pack directory, whether or not it is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskPack {
    pub name: String,
    pub size_bytes: u64,
}
