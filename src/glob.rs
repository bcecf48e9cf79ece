//! Minimal glob matching for archive selection patterns.

/// Check if a pattern contains glob wildcard characters.
pub fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters, including `/`
/// - `?` matches exactly one character
///
/// Matching is case-sensitive, like `fnmatch` on POSIX.
///
/// # Examples
///
/// ```
/// use hcad_extract::glob::glob_match;
///
/// assert!(glob_match("*owner*.zip", "Real_acct_owner.zip"));
/// assert!(glob_match("Hearing_files?.zip", "Hearing_files2.zip"));
/// assert!(!glob_match("*.zip", "readme.md"));
/// ```
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // Greedy match with a single backtrack point: the most recent `*`
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                // Let the last star swallow one more character and retry
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
