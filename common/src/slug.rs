/// Derives a filesystem-safe folder id from an admin-entered id or name.
///
/// Lowercases the input, collapses every run of characters outside `[a-z0-9]`
/// into a single `-` and strips hyphens from both ends. The result may be
/// empty (for example for `"!!!"`); callers must reject that before using it
/// as a folder name.
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Checks an id taken from a URL segment before it is joined onto a content path.
pub fn is_safe_folder_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains("..")
        && !id.contains('/')
        && !id.contains('\\')
        && !id.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_symbols_and_spaces() {
        assert_eq!(slug("Accounts Desktop!"), "accounts-desktop");
        assert_eq!(slug("  VAT -- returns  "), "vat-returns");
        assert_eq!(slug("Payroll_2024/UK"), "payroll-2024-uk");
    }

    #[test]
    fn all_symbols_yield_empty() {
        assert_eq!(slug("!!!"), "");
        assert_eq!(slug(""), "");
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(slug("Café Über"), "caf-ber");
    }

    #[test]
    fn is_idempotent() {
        for input in ["Accounts Desktop!", "--a--b--", "Foo Bar", "x", "ÄÖÜ 12", ""] {
            let once = slug(input);
            assert_eq!(slug(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn rejects_traversal_ids() {
        assert!(is_safe_folder_id("foo-bar"));
        assert!(!is_safe_folder_id(""));
        assert!(!is_safe_folder_id(".."));
        assert!(!is_safe_folder_id("a/b"));
        assert!(!is_safe_folder_id(".hidden"));
    }
}
