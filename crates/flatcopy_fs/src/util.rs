use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_times};

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| absolutize_path(path))
}

/// Resolve `path` even when its tail does not exist yet, by canonicalizing
/// the deepest existing ancestor and re-appending the rest.
fn normalize_path_lenient(path: &Path) -> PathBuf {
    let path_abs = absolutize_path(path);
    let mut path_head = path_abs.as_path();
    let mut l_tail = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_head) {
            return l_tail
                .iter()
                .rev()
                .fold(resolved, |acc: PathBuf, part| acc.join(part));
        }
        match (path_head.parent(), path_head.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_head = parent;
            }
            _ => return path_abs,
        }
    }
}

/// True when `dst` is `src` or lies inside it.
///
/// A destination above the source is fine: flat names land directly in
/// `dst`, never under `src`.
pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = normalize_path(src);
    let dst_resolved = normalize_path_lenient(dst);
    dst_resolved.starts_with(&src_resolved)
}

/// Reject a destination file path that would write outside `path_dir_dst_root`.
///
/// Flat names never contain separators, so only the item itself can be a
/// hazard: an existing symlink there would redirect the write.
pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), String> {
    let path_dst_item_abs = absolutize_path(path_dst_item);
    if path_dst_item_abs.parent() != Some(absolutize_path(path_dir_dst_root).as_path()) {
        return Err(format!(
            "Unsafe destination path escapes destination root: {} (root={})",
            path_dst_item.display(),
            path_dir_dst_root.display()
        ));
    }

    match fs::symlink_metadata(&path_dst_item_abs) {
        Ok(meta_dst_item) if meta_dst_item.file_type().is_symlink() => Err(format!(
            "Unsafe destination path is an existing symlink: {}",
            path_dst_item.display()
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!(
            "Failed to inspect destination path {} ({e})",
            path_dst_item.display()
        )),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyWithMetadata

/// Copy bytes, permission bits and timestamps (plus xattrs on Linux).
///
/// `fs::copy` follows symlinks, so a link source yields the target's content.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

// Best effort: filesystems without xattr support are common (tmpfs, NFS).
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                path = %path_file_dst.display(),
                "xattr {} not copied ({e})",
                name.to_string_lossy()
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
