pub mod library;
pub mod store;

/// Extension every servable archive carries.
pub const ASSET_EXTENSION: &str = ".zip";

/// Whether `name` looks like a servable archive. The extension is matched
/// without regard to case, for both listing and download.
pub fn is_archive_name(name: &str) -> bool {
    name.len() > ASSET_EXTENSION.len() && name.to_ascii_lowercase().ends_with(ASSET_EXTENSION)
}
