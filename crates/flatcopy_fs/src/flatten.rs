//! Flat destination naming.

use std::ffi::OsString;
use std::path::{Component, Path};

/// Join the components of `path_rel` with `separator` into one file name.
///
/// `a/b/note.md` becomes `a_b_note.md` with `_`; a bare `note.md` is
/// returned unchanged. Only normal components take part, so `./a/x.md`
/// and `a/x.md` flatten alike. Names already containing `separator` can
/// collide with other paths; that is left to the conflict policy.
pub fn derive_flat_name(path_rel: &Path, separator: char) -> OsString {
    let mut buf_sep = [0_u8; 4];
    let c_sep: &str = separator.encode_utf8(&mut buf_sep);

    let mut name_flat = OsString::new();
    for part in path_rel.components() {
        let Component::Normal(part) = part else {
            continue;
        };
        if !name_flat.is_empty() {
            name_flat.push(c_sep);
        }
        name_flat.push(part);
    }
    name_flat
}
