//! Discovery of `require` targets in Lua source text
//!
//! Discovery is purely textual: any `require` call with a literal string
//! argument counts, whether it is reachable at runtime or not. Calls with a
//! computed argument (`require(name)`) cannot be bundled and are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `require("x")`, `require 'x'`, `require [[x]]` and the
/// parenthesized forms of each.
static REQUIRE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\brequire\s*\(?\s*(?:"([^"\r\n]+)"|'([^'\r\n]+)'|\[\[([^\]\r\n]+)\]\])"#,
    )
    .expect("require pattern is a valid regex")
});

/// Return every module name passed to `require` in `source`
///
/// Names come back in order of occurrence. Repeated requires of the same
/// module are kept, the traversal deduplicates them.
pub fn discover_imports(source: &str) -> Vec<String> {
    REQUIRE_PATTERN
        .captures_iter(source)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim().to_owned())
        })
        .filter(|name| !name.is_empty())
        .collect()
}
