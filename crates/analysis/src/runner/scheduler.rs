//! File priority scheduling.
//!
//! The ordering decides which files get skipped first once the budget runs
//! out, so it is a fixed ranking, not a tunable heuristic: auth-adjacent
//! paths first, test files last, ties kept in input order by a stable sort.

use crate::core::ChangedFile;
use crate::source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilePriority {
    /// Auth-related path segment: analyzed first.
    Security,
    Source,
    /// Test files: analyzed last, skipped first.
    Test,
}

const SECURITY_SEGMENTS: &[&str] = &[
    "auth", "login", "session", "token", "password", "crypto", "security", "permission",
];

pub fn classify(path: &str) -> FilePriority {
    let lowered = path.to_ascii_lowercase();
    if is_test_path(&lowered) {
        return FilePriority::Test;
    }
    let security = lowered
        .split(['/', '.', '_', '-'])
        .any(|segment| SECURITY_SEGMENTS.contains(&segment));
    if security {
        FilePriority::Security
    } else {
        FilePriority::Source
    }
}

fn is_test_path(lowered: &str) -> bool {
    lowered.contains("__tests__")
        || lowered.contains(".test.")
        || lowered.contains(".spec.")
        || lowered.contains("/test/")
        || lowered.contains("/tests/")
        || lowered.starts_with("test/")
        || lowered.starts_with("tests/")
}

/// Whether the scheduler admits this file at all.
pub fn should_analyze_file(path: &str) -> bool {
    source::supports_path(path)
}

/// Stable sort by priority; input order breaks ties. This ordering is part
/// of the determinism contract, not an optimization.
pub fn sort_files_by_priority(files: &mut [ChangedFile]) {
    files.sort_by_key(|file| classify(&file.path));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChangedFile;

    fn file(path: &str) -> ChangedFile {
        ChangedFile::with_content(path, "")
    }

    #[test]
    fn auth_first_tests_last() {
        let mut files = vec![
            file("src/auth/login.ts"),
            file("src/utils/format.ts"),
            file("src/__tests__/app.test.ts"),
        ];
        sort_files_by_priority(&mut files);
        assert_eq!(files[0].path, "src/auth/login.ts");
        assert_eq!(files[2].path, "src/__tests__/app.test.ts");
    }

    #[test]
    fn ties_keep_input_order() {
        let mut files = vec![
            file("src/b.ts"),
            file("src/a.ts"),
            file("src/c.ts"),
        ];
        sort_files_by_priority(&mut files);
        let order: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(order, vec!["src/b.ts", "src/a.ts", "src/c.ts"]);
    }

    #[test]
    fn classification() {
        assert_eq!(classify("src/auth/login.ts"), FilePriority::Security);
        assert_eq!(classify("lib/session-store.ts"), FilePriority::Security);
        assert_eq!(classify("src/utils/format.ts"), FilePriority::Source);
        assert_eq!(classify("src/__tests__/app.test.ts"), FilePriority::Test);
        // A test file about auth is still a test file.
        assert_eq!(classify("src/auth/__tests__/login.test.ts"), FilePriority::Test);
    }

    #[test]
    fn admits_only_supported_extensions() {
        assert!(should_analyze_file("src/app.tsx"));
        assert!(!should_analyze_file("src/app.css"));
        assert!(!should_analyze_file("Cargo.toml"));
    }

    #[test]
    fn sorting_a_hundred_files_is_fast() {
        let mut files: Vec<ChangedFile> = (0..100)
            .map(|i| file(&format!("src/module{i}/index.ts")))
            .collect();
        let started = std::time::Instant::now();
        sort_files_by_priority(&mut files);
        assert!(started.elapsed().as_millis() < 10);
    }
}
