//! Filesystem tree traversal and flat copy orchestration.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::flatten::derive_flat_name;
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::select::{FileSelector, SelectorExtensions};
use crate::spec::{CopyTreeError, EnumCopyFileConflictStrategy, SpecCopyOptions};
use crate::util::{copy_file_with_metadata, is_overlap, validate_destination_path_safety};

#[derive(Debug)]
struct SpecDirEntry {
    path_dir_src_sub: PathBuf,
    name_dir: OsString,
}

#[derive(Debug)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    name_file: OsString,
    if_is_broken_symlink: bool,
}

struct SpecCopyContext<'a> {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    selector: &'a dyn FileSelector,
    spec_cp_options: SpecCopyOptions,
    builder_cp_report: ReportCopyBuilder,
}

impl SpecCopyContext<'_> {
    fn should_stop(&mut self) -> bool {
        if self.spec_cp_options.token_cancel.is_cancelled() {
            self.builder_cp_report.mark_interrupted();
            return true;
        }
        false
    }
}

/// Copy `.md`/`.rst` files under `dir_source` flat into `dir_destination`.
pub fn copy_tree_default<P, Q>(
    dir_source: P,
    dir_destination: Q,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    copy_tree(
        dir_source,
        dir_destination,
        &SelectorExtensions::default(),
        SpecCopyOptions::default(),
    )
}

/// Copy every file under `dir_source` accepted by `selector` into the single
/// directory `dir_destination`, naming each copy after its relative path
/// (`a/b/note.md` becomes `a_b_note.md`).
///
/// This function performs:
/// 1. Source validation (must exist and be listable) and destination creation
///    (missing parents included).
/// 2. A depth-first walk in name order; directories are only recursed into.
/// 3. Per selected file: flat naming, conflict policy, copy of bytes,
///    permission bits and timestamps.
///
/// Per-file failures are stored in the report and the walk goes on. When
/// `spec_cp_options.token_cancel` fires, the run stops before the next file
/// and returns the partial report with `if_interrupted` set.
///
/// Returns [`CopyTreeError`] only for setup failures, before anything is copied.
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    selector: &dyn FileSelector,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    if std::path::is_separator(spec_cp_options.separator) {
        return Err(CopyTreeError::InvalidSeparator(spec_cp_options.separator));
    }

    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    match fs::metadata(&path_dir_src) {
        Ok(meta_dir_src) if meta_dir_src.is_dir() => {}
        Ok(_) => return Err(CopyTreeError::SourceNotDirectory(path_dir_src)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CopyTreeError::SourceNotFound(path_dir_src));
        }
        Err(e) => {
            return Err(CopyTreeError::SourceUnreadable {
                path: path_dir_src,
                source: e,
            });
        }
    }
    // A root that stats but cannot be listed is a setup failure, not a warning.
    if let Err(e) = fs::read_dir(&path_dir_src) {
        return Err(CopyTreeError::SourceUnreadable {
            path: path_dir_src,
            source: e,
        });
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            source_dir: path_dir_src,
            destination: path_dir_dst,
        });
    }

    init_destination(&path_dir_dst)?;

    tracing::info!(
        "Starting file copy, source directory: {}, target directory: {}",
        path_dir_src.display(),
        path_dir_dst.display()
    );

    let mut spec_cp_ctx = SpecCopyContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        selector,
        spec_cp_options,
        builder_cp_report: ReportCopyBuilder::default(),
    };

    if walk_directory(&path_dir_src, &mut spec_cp_ctx).is_break() {
        tracing::warn!(
            "Operation interrupted by user, {} files copied",
            spec_cp_ctx.builder_cp_report.cnt_copied()
        );
    }

    let report = spec_cp_ctx.builder_cp_report.build();
    tracing::info!("File copy completed, {} files copied", report.cnt_copied);
    Ok(report)
}

fn init_destination(path_dir_dst: &Path) -> Result<(), CopyTreeError> {
    if !path_dir_dst.exists() {
        tracing::info!("Creating target directory: {}", path_dir_dst.display());
    }
    fs::create_dir_all(path_dir_dst).map_err(|e| {
        if e.kind() == io::ErrorKind::PermissionDenied {
            CopyTreeError::DestinationPermissionDenied {
                path: path_dir_dst.to_path_buf(),
                source: e,
            }
        } else {
            CopyTreeError::DestinationInitFailed {
                path: path_dir_dst.to_path_buf(),
                message: e.to_string(),
            }
        }
    })?;

    let meta_dir_dst =
        fs::symlink_metadata(path_dir_dst).map_err(|e| CopyTreeError::DestinationInitFailed {
            path: path_dir_dst.to_path_buf(),
            message: e.to_string(),
        })?;
    if meta_dir_dst.file_type().is_symlink() {
        return Err(CopyTreeError::DestinationInitFailed {
            path: path_dir_dst.to_path_buf(),
            message: "Destination root path must not be a symbolic link.".to_string(),
        });
    }
    Ok(())
}

fn walk_directory(path_root: &Path, spec_cp_ctx: &mut SpecCopyContext<'_>) -> ControlFlow<()> {
    if spec_cp_ctx.should_stop() {
        return ControlFlow::Break(());
    }

    let iter_entries = match fs::read_dir(path_root) {
        Ok(iter) => iter,
        Err(e) => {
            spec_cp_ctx.builder_cp_report.add_warning(format!(
                "Failed to read directory {} ({e})",
                path_root.display()
            ));
            return ControlFlow::Continue(());
        }
    };

    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    for entry_res in iter_entries {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                spec_cp_ctx.builder_cp_report.add_warning(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_root.display()
                ));
                continue;
            }
        };

        let path_entry = entry.path();
        let name_entry = entry.file_name();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_cp_ctx
                    .builder_cp_report
                    .add_warning(format!("Failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };

        if cfg_file_type.is_dir() {
            l_dirs.push(SpecDirEntry {
                path_dir_src_sub: path_entry,
                name_dir: name_entry,
            });
        } else if cfg_file_type.is_file() {
            l_files.push(SpecFileEntry {
                path_file_src: path_entry,
                name_file: name_entry,
                if_is_broken_symlink: false,
            });
        } else if cfg_file_type.is_symlink() {
            // Links to files are dereferenced; links to directories are not followed.
            match fs::metadata(&path_entry) {
                Ok(meta_target) if meta_target.is_dir() => {
                    tracing::debug!("Directory symlink not followed: {}", path_entry.display());
                }
                Ok(meta_target) if !meta_target.is_file() => {
                    spec_cp_ctx.builder_cp_report.add_warning(format!(
                        "Special file target skipped: {}",
                        path_entry.display()
                    ));
                }
                res_target => l_files.push(SpecFileEntry {
                    path_file_src: path_entry,
                    name_file: name_entry,
                    if_is_broken_symlink: res_target.is_err(),
                }),
            }
        } else {
            spec_cp_ctx
                .builder_cp_report
                .add_warning(format!("Special file skipped: {}", path_entry.display()));
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    for dir_entry in l_dirs {
        walk_directory(&dir_entry.path_dir_src_sub, spec_cp_ctx)?;
    }

    for file_entry in l_files {
        handle_file_entry(file_entry, spec_cp_ctx)?;
    }
    ControlFlow::Continue(())
}

fn handle_file_entry(
    spec_file_entry: SpecFileEntry,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> ControlFlow<()> {
    spec_cp_ctx.builder_cp_report.add_scanned();

    let name_file = spec_file_entry.name_file.to_string_lossy();
    if !spec_cp_ctx.selector.is_selected(&name_file) {
        return ControlFlow::Continue(());
    }
    spec_cp_ctx.builder_cp_report.add_matched();

    if spec_cp_ctx.should_stop() {
        return ControlFlow::Break(());
    }

    let path_file_src = spec_file_entry.path_file_src;
    if spec_file_entry.if_is_broken_symlink {
        spec_cp_ctx.builder_cp_report.add_error(
            path_file_src.clone(),
            format!("Broken symlink: {}", path_file_src.display()),
        );
        return ControlFlow::Continue(());
    }

    let path_file_rel = path_file_src
        .strip_prefix(&spec_cp_ctx.path_dir_src)
        .unwrap_or(Path::new(&spec_file_entry.name_file));
    let name_flat = derive_flat_name(path_file_rel, spec_cp_ctx.spec_cp_options.separator);
    let path_file_dst = spec_cp_ctx.path_dir_dst.join(name_flat);

    // Always the destination root after flattening.
    if let Some(path_parent_dst) = path_file_dst.parent()
        && let Err(e) = fs::create_dir_all(path_parent_dst)
    {
        spec_cp_ctx
            .builder_cp_report
            .add_error(path_file_dst, e.to_string());
        return ControlFlow::Continue(());
    }

    if let Err(message) =
        validate_destination_path_safety(&path_file_dst, &spec_cp_ctx.path_dir_dst)
    {
        spec_cp_ctx
            .builder_cp_report
            .add_error(path_file_dst, message);
        return ControlFlow::Continue(());
    }

    let Some(b_if_overwrite) = resolve_file_conflict(&path_file_dst, spec_cp_ctx) else {
        return ControlFlow::Continue(());
    };

    if spec_cp_ctx.spec_cp_options.if_dry_run {
        tracing::info!(
            "Would copy file: {} -> {}",
            path_file_src.display(),
            path_file_dst.display()
        );
        spec_cp_ctx.builder_cp_report.add_skipped();
        return ControlFlow::Continue(());
    }

    tracing::debug!(
        "Copying file: {} -> {}",
        path_file_src.display(),
        path_file_dst.display()
    );
    match copy_file_with_metadata(&path_file_src, &path_file_dst) {
        Ok(()) => {
            spec_cp_ctx.builder_cp_report.add_copied();
            if b_if_overwrite {
                tracing::warn!(
                    "Overwrote existing file: {} (from {})",
                    path_file_dst.display(),
                    path_file_src.display()
                );
                spec_cp_ctx.builder_cp_report.add_overwritten();
            }
        }
        Err(e) => spec_cp_ctx
            .builder_cp_report
            .add_error(path_file_src, e.to_string()),
    }
    ControlFlow::Continue(())
}

/// `None` when the file must not be written; otherwise whether it replaces
/// an existing destination file.
fn resolve_file_conflict(
    path_file_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext<'_>,
) -> Option<bool> {
    if !path_file_dst.exists() {
        return Some(false);
    }
    if path_file_dst.is_dir() {
        spec_cp_ctx.builder_cp_report.add_error(
            path_file_dst.to_path_buf(),
            format!("Destination is a directory: {}", path_file_dst.display()),
        );
        return None;
    }

    match spec_cp_ctx.spec_cp_options.rule_conflict_file {
        EnumCopyFileConflictStrategy::Overwrite => Some(true),
        EnumCopyFileConflictStrategy::Skip => {
            tracing::debug!("Destination exists, skipped: {}", path_file_dst.display());
            spec_cp_ctx.builder_cp_report.add_skipped();
            None
        }
        EnumCopyFileConflictStrategy::Error => {
            spec_cp_ctx.builder_cp_report.add_error(
                path_file_dst.to_path_buf(),
                format!("Destination exists: {}", path_file_dst.display()),
            );
            None
        }
    }
}
