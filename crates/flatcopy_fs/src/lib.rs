//! `flatcopy_fs`:
//! copy files selected by name from a directory tree into one flat
//! directory, encoding each file's relative path into its new name.
//!
//! Modules:
//! - `copy`    : traversal and copy orchestration
//! - `select`  : file selectors (extension set, include/exclude patterns)
//! - `flatten` : relative path -> flat file name
//! - `cancel`  : cooperative stop flag
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : shared path and metadata helpers

pub mod cancel;
pub mod copy;
pub mod flatten;
pub mod report;
pub mod select;
pub mod spec;
mod util;

pub use cancel::CancelToken;
pub use copy::{copy_tree, copy_tree_default};
pub use flatten::derive_flat_name;
pub use report::{ReportCopy, ReportCopyBuilder};
pub use select::{DEFAULT_EXTENSIONS, FileSelector, SelectorExtensions, SelectorPatterns};
pub use spec::{
    CopyTreeError, EnumCopyFileConflictStrategy, EnumCopyPatternMode, SpecCopyError,
    SpecCopyOptions,
};
