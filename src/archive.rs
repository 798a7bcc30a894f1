//! On-disk archival: opening/appending the per-publisher sink, walking the
//! archive folder for the catalog listing, and the archive browser's
//! serve/rename/remove endpoints with path-traversal protection.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{AppError, AppResult};

/// One entry in the archive listing, sorted newest-first for the catalog.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ArchivedFile {
    pub short_name: String,
    pub full_path: String,
    pub created_time: DateTime<Utc>,
}

/// Open (creating parent directories as needed) the archive file for
/// `path` under `<archive_root>/<YYYYMMDDHHmm>/<last-segment>`.
pub async fn open_archive_file(archive_root: &Path, path: &str) -> AppResult<Arc<AsyncMutex<File>>> {
    let stamp = Local::now().format("%Y%m%d%H%M").to_string();
    let dir = archive_root.join(stamp);
    tokio::fs::create_dir_all(&dir).await?;

    let name = path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("upload");
    let file_path = dir.join(name);
    debug!(path, file = %file_path.display(), "opening archive file");

    let file = File::create(&file_path).await?;
    Ok(Arc::new(AsyncMutex::new(file)))
}

/// Append `data` to the open archive handle, serializing concurrent writers
/// on the same handle.
pub async fn append(handle: &Arc<AsyncMutex<File>>, data: &[u8]) -> AppResult<()> {
    let mut file = handle.lock().await;
    file.write_all(data).await?;
    Ok(())
}

/// Walk `archive_root` for archived files, newest `created_time` first.
pub fn list_archived(archive_root: &Path) -> Vec<ArchivedFile> {
    let mut entries: Vec<ArchivedFile> = WalkDir::new(archive_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let created = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let full_path = entry.path().to_string_lossy().to_string();
            let short_name = entry
                .path()
                .strip_prefix(archive_root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();
            Some(ArchivedFile {
                short_name,
                full_path,
                created_time: created.into(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.created_time.cmp(&a.created_time));
    entries
}

/// Resolve a user-supplied, URL-decoded filename to an absolute path that is
/// guaranteed to be a descendant of `archive_root`, even for adversarial
/// input like `../../etc/passwd`.
pub fn resolve_under_root(archive_root: &Path, requested: &str) -> AppResult<PathBuf> {
    let cleaned = normalize(requested);
    let resolved = archive_root.join(&cleaned);

    if !resolved.starts_with(archive_root) {
        warn!(requested, "rejected archive path escaping root");
        return Err(AppError::PathTraversal);
    }
    Ok(resolved)
}

/// Collapse `.`/`..` components against a rooted path without touching the
/// filesystem, discarding any leading `..` that would escape the root.
fn normalize(requested: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Delete the archived file at `requested`, best-effort.
pub async fn remove_file(archive_root: &Path, requested: &str) -> AppResult<()> {
    let target = resolve_under_root(archive_root, requested)?;
    tokio::fs::remove_file(&target).await?;
    Ok(())
}

/// Rename the archived file at `requested` to `new_name`, both resolved
/// under the archive root.
pub async fn rename_file(archive_root: &Path, requested: &str, new_name: &str) -> AppResult<()> {
    let from = resolve_under_root(archive_root, requested)?;
    let to = resolve_under_root(archive_root, new_name)?;
    tokio::fs::rename(&from, &to).await?;
    Ok(())
}
