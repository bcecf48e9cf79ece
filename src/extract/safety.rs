//! Zip-slip protection.
//!
//! Member names come straight out of the archive's central directory and
//! are attacker-controlled. Everything here is lexical: no filesystem
//! access, so the answer for a given `(member, root)` pair never changes.

use std::path::{Component, Path, PathBuf};

/// Returns `true` when extracting `member` below `dest_root` cannot write
/// outside `dest_root`.
pub fn is_safe_member(member: &str, dest_root: &Path) -> bool {
    resolve_member(member, dest_root).is_some()
}

/// Resolve an archive member name to its destination below `dest_root`.
///
/// Returns `None` for names that must not be extracted:
///
/// * empty, or made only of separators (`/`, `\`)
/// * containing NUL
/// * absolute: a leading separator or a drive specifier such as `C:`
/// * containing any `..` component, whether or not it would escape
/// * resolving to `dest_root` itself (`.`, `./`)
///
/// Both `/` and `\` count as separators, since archives made on Windows
/// use the latter. `.` and empty components are dropped.
pub fn resolve_member(member: &str, dest_root: &Path) -> Option<PathBuf> {
    if member.contains('\0') {
        return None;
    }
    if member.starts_with(['/', '\\']) || has_drive_prefix(member) {
        return None;
    }

    let mut parts = Vec::new();
    for part in member.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ => parts.push(part),
        }
    }
    if parts.is_empty() {
        return None;
    }

    let mut resolved = dest_root.to_path_buf();
    for part in parts {
        // A part that still parses as anything but a plain name (a Windows
        // prefix like `C:` mid-path) is refused rather than joined.
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => resolved.push(part),
            _ => return None,
        }
    }

    is_within(dest_root, &resolved).then_some(resolved)
}

/// Directory-boundary-aware containment: `candidate` is `root` or lies
/// below it, compared by path components after lexical normalisation.
///
/// `/tmp/out-evil/file` is not within `/tmp/out`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    match (normalize(root), normalize(candidate)) {
        (Some(root), Some(candidate)) => candidate.starts_with(root),
        _ => false,
    }
}

/// Lexically fold `.` and `..`; `None` if `..` climbs above the start.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
        }
    }
    Some(out)
}

fn has_drive_prefix(member: &str) -> bool {
    let bytes = member.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/tmp/out")
    }

    #[test]
    fn plain_members_resolve_under_root() {
        assert_eq!(
            resolve_member("Real_acct_owner/real_acct.txt", &root()),
            Some(PathBuf::from("/tmp/out/Real_acct_owner/real_acct.txt"))
        );
        assert_eq!(
            resolve_member("./a//b/./c.txt", &root()),
            Some(PathBuf::from("/tmp/out/a/b/c.txt"))
        );
        assert_eq!(
            resolve_member("dir\\file.txt", &root()),
            Some(PathBuf::from("/tmp/out/dir/file.txt"))
        );
        assert!(is_safe_member("data/", &root()));
        assert!(is_safe_member("..hidden/..txt", &root()));
    }

    #[test]
    fn traversal_is_rejected() {
        for member in [
            "../escape.txt",
            "../../etc/passwd_test",
            "a/../../b",
            "a/../b",
            "a/b/..",
            "..",
            "..\\..\\windows\\system32",
            "safe/..\\..\\x",
        ] {
            assert!(!is_safe_member(member, &root()), "{member}");
        }
    }

    #[test]
    fn absolute_names_are_rejected() {
        for member in [
            "/etc/passwd",
            "\\windows\\win.ini",
            "C:\\boot.ini",
            "c:/boot.ini",
            "C:relative",
            "//server/share/x",
        ] {
            assert!(!is_safe_member(member, &root()), "{member}");
        }
    }

    #[test]
    fn empty_and_separator_only_are_rejected() {
        for member in ["", "/", "//", "\\", "./", ".", "././/"] {
            assert!(!is_safe_member(member, &root()), "{member:?}");
        }
        assert!(!is_safe_member("a\0b", &root()));
    }

    #[test]
    fn sibling_prefix_is_not_inside() {
        assert!(!is_within(Path::new("/tmp/out"), Path::new("/tmp/out-evil/file")));
        assert!(!is_within(Path::new("/tmp/out"), Path::new("/tmp/outer")));
        assert!(is_within(Path::new("/tmp/out"), Path::new("/tmp/out/file")));
        assert!(is_within(Path::new("/tmp/out"), Path::new("/tmp/out")));
        assert!(!is_within(Path::new("/tmp/out"), Path::new("/tmp/out/../out-evil/file")));
        assert!(is_within(Path::new("/tmp/out/"), Path::new("/tmp/./out/a")));
    }

    #[test]
    fn relative_roots_work_too() {
        assert_eq!(
            resolve_member("x/y.txt", Path::new("extracted/pdata")),
            Some(PathBuf::from("extracted/pdata/x/y.txt"))
        );
        assert!(!is_within(Path::new("extracted/pdata"), Path::new("extracted/pdata-2/x")));
    }
}
