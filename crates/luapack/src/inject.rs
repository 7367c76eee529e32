//! Entry-only text injection
//!
//! Required modules are wrapped verbatim; only the entry script can receive
//! extra text before bundling. The prelude is part of the entry text, so any
//! `require` it contains is bundled like one written in the script itself.

use crate::module_wrapper::escape_lua_string;

/// Placeholder in the prelude replaced by the entry name, escaped for use
/// inside a quoted Lua string
const SCRIPT_PLACEHOLDER: &str = "{script}";

#[derive(Debug, Clone, Default)]
pub struct EntryInjector {
    prelude: Option<String>,
}

impl EntryInjector {
    /// An injector that leaves the entry untouched
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_prelude(prelude: impl Into<String>) -> Self {
        let prelude = prelude.into();
        Self {
            prelude: (!prelude.trim().is_empty()).then_some(prelude),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.prelude.is_none()
    }

    /// Apply the injection to the entry script `entry_name`
    pub fn apply(&self, entry_name: &str, contents: &str) -> String {
        let Some(prelude) = &self.prelude else {
            return contents.to_owned();
        };

        let prelude = prelude.replace(SCRIPT_PLACEHOLDER, &escape_lua_string(entry_name));
        let mut injected = String::with_capacity(prelude.len() + contents.len() + 1);
        injected.push_str(prelude.trim_end_matches('\n'));
        injected.push('\n');
        injected.push_str(contents);
        injected
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_identity_by_default() {
        let injector = EntryInjector::none();
        assert!(injector.is_identity());
        assert_eq!(injector.apply("a.lua", "return {}"), "return {}");
    }

    #[test]
    fn test_blank_prelude_is_identity() {
        assert!(EntryInjector::with_prelude("  \n").is_identity());
    }

    #[test]
    fn test_prelude_placed_above_entry() {
        let injector = EntryInjector::with_prelude("local __script = '{script}'\n");
        assert_eq!(
            injector.apply("tools/a.lua", "return {}"),
            "local __script = 'tools/a.lua'\nreturn {}"
        );
    }

    #[test]
    fn test_entry_name_escaped_inside_string() {
        let injector = EntryInjector::with_prelude("local __script = \"{script}\"");
        assert_eq!(
            injector.apply(r#"odd"na\me.lua"#, "return {}"),
            "local __script = \"odd\\\"na\\\\me.lua\"\nreturn {}"
        );
    }
}
