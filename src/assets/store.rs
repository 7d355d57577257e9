use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

use crate::assets::library::{Asset, AssetLibrary, DiskPack};
use crate::assets::is_archive_name;

/// SHA-1 over the full contents of `path`.
pub fn hash_file(path: &Path) -> std::io::Result<[u8; 20]> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

pub fn hash_bytes(bytes: &[u8]) -> [u8; 20] {
    Sha1::digest(bytes).into()
}

/// Build a fresh library from the configured names.
///
/// Empty names are skipped. A name with no file behind it is skipped with a
/// warning; the rest of the rebuild continues. Order follows `names` and
/// duplicates are kept.
pub fn rebuild(names: &[String], root: &Path, base_url: &str) -> AssetLibrary {
    let start = Instant::now();
    let mut library = AssetLibrary::new();

    for (index, name) in names.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        let path = root.join(name);
        if !path.is_file() {
            tracing::warn!("resource pack {} not found: {}", index + 1, path.display());
            continue;
        }
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("Failed to read resource pack {}: {}", path.display(), e);
                continue;
            }
        };
        let asset = Asset {
            name: name.clone(),
            size_bytes: bytes.len() as u64,
            content_hash: hash_bytes(&bytes),
            download_url: format!("{}{}", base_url, name),
            source_path: path,
        };
        tracing::info!(
            "Loaded resource pack {}: {} ({} bytes, sha1 {})",
            index + 1,
            asset.name,
            asset.size_bytes,
            asset.hash_hex()
        );
        library.items.push(asset);
    }

    tracing::info!(
        "Total resource packs loaded: {} in {:.1}s",
        library.len(),
        start.elapsed().as_secs_f64()
    );
    library
}

/// Archives directly inside `root`, sorted by name. Used for presentation only,
/// independent of which names are configured.
pub fn list_directory(root: &Path) -> Vec<DiskPack> {
    if !root.is_dir() {
        return Vec::new();
    }
    let mut packs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Cannot access entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_archive_name(name) {
            continue;
        }
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        packs.push(DiskPack {
            name: name.to_string(),
            size_bytes,
        });
    }
    packs
}

/// Create the pack directory if it is missing.
pub fn ensure_pack_dir(root: &Path) -> std::io::Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        tracing::info!("Created pack folder: {}", root.display());
    }
    Ok(())
}

/// Human-readable size with integer units: "512 B", "3 KB", "12 MB".
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{} MB", bytes / MIB)
    }
}
