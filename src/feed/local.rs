//! Local media discovery
//!
//! Walks directories under the site's public root and turns image files into
//! [`ImageRecord`]s whose URLs are relative to that root.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, trace};
use walkdir::WalkDir;

use super::ImageRecord;

/// Extensions served by the carousel feed and story listings
pub const FEED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Extensions served by the flat gallery listing
pub const GALLERY_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Check a file name against an extension set, ignoring case
pub fn has_extension(name: &str, extensions: &[&str]) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

/// Build the public URL for a file below `public_root`
///
/// Path components are joined with `/` regardless of platform.
pub fn public_url(public_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(public_root).ok()?;
    let mut url = String::new();
    for component in relative.components() {
        url.push('/');
        url.push_str(&component.as_os_str().to_string_lossy());
    }
    Some(url)
}

/// Recursively collect image files under `public_root/media_dir`
///
/// Entries are visited in file-name order and directories are descended
/// where they are met, so the returned order is the discovery order used for
/// pairing. Any unreadable entry fails the whole walk.
pub fn discover(public_root: &Path, media_dir: &str) -> io::Result<Vec<ImageRecord>> {
    let root = public_root.join(media_dir);
    debug!("Scanning {} for images", root.display());

    let mut records = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !has_extension(&name, FEED_EXTENSIONS) {
            trace!("Skipping non-image {}", entry.path().display());
            continue;
        }

        let size = entry.metadata().map_err(io::Error::from)?.len();
        let url = public_url(public_root, entry.path()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is outside the public root", entry.path().display()),
            )
        })?;

        records.push(ImageRecord {
            url,
            size_bytes: Some(size),
        });
    }

    debug!("Found {} local images under {}", records.len(), root.display());
    Ok(records)
}

/// List file names directly inside `dir`, filtered by extension and sorted
pub fn list_flat(dir: &Path, extensions: &[&str]) -> io::Result<Vec<String>> {
    Ok(list_files(dir)?
        .into_iter()
        .filter(|name| has_extension(name, extensions))
        .collect())
}

/// List every regular file name directly inside `dir`, sorted
pub fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
