//! Splitting a bundle into the regions that get post-processed differently
//!
//! Plugin scripts describe themselves in a top-level `function plugindef()`
//! whose body is read by the host application. Its text (notes, multi-line
//! descriptions) stays exactly as written, so it is carved out of the rest
//! of the bundle before comment stripping.

const PLUGINDEF_START: &str = "function plugindef";
const PLUGINDEF_END: &str = "end";

/// A bundle cut into the text before, inside and after `plugindef`
///
/// Concatenating the three parts always gives back the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileParts<'a> {
    pub prolog: &'a str,
    pub plugindef: &'a str,
    pub epilog: &'a str,
}

/// Locate the `plugindef` function in `source`
///
/// The region starts at the line declaring `function plugindef`, where the
/// name must be followed by `(` or whitespace so helpers such as
/// `plugindef_helper` do not count. It runs through the first later line
/// consisting of just `end`, including its line break. Without such a
/// function, or when it is never closed, the whole text is prolog.
pub fn split_regions(source: &str) -> FileParts<'_> {
    let mut offset = 0;
    let mut start = None;
    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some(start) = start {
            if content.trim_end() == PLUGINDEF_END {
                return FileParts {
                    prolog: &source[..start],
                    plugindef: &source[start..offset],
                    epilog: &source[offset..],
                };
            }
        } else if declares_plugindef(content) {
            start = Some(line_start);
        }
    }

    FileParts {
        prolog: source,
        plugindef: "",
        epilog: "",
    }
}

fn declares_plugindef(line: &str) -> bool {
    line.strip_prefix(PLUGINDEF_START)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|next| next == '(' || next.is_whitespace())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_plugindef() {
        let source = "local a = 1\nfunction plugindef()\n    return \"Name\"\nend\nprint(a)\n";
        let parts = split_regions(source);

        assert_eq!(
            parts,
            FileParts {
                prolog: "local a = 1\n",
                plugindef: "function plugindef()\n    return \"Name\"\nend\n",
                epilog: "print(a)\n",
            }
        );
    }

    #[test]
    fn test_indented_end_does_not_close() {
        let source = "function plugindef()\n    if x then\n    end\nend";
        let parts = split_regions(source);

        assert_eq!(parts.prolog, "");
        assert_eq!(parts.plugindef, source);
        assert_eq!(parts.epilog, "");
    }

    #[test]
    fn test_without_plugindef_everything_is_prolog() {
        let source = "return {}";
        assert_eq!(
            split_regions(source),
            FileParts {
                prolog: source,
                plugindef: "",
                epilog: "",
            }
        );
    }

    #[test]
    fn test_unclosed_plugindef_is_prolog() {
        let source = "function plugindef()\n    return 1\n";
        assert_eq!(split_regions(source).prolog, source);
    }

    #[test]
    fn test_crlf_line_endings() {
        let source = "function plugindef()\r\nend\r\nx()";
        let parts = split_regions(source);
        assert_eq!(parts.plugindef, "function plugindef()\r\nend\r\n");
        assert_eq!(parts.epilog, "x()");
    }

    #[test]
    fn test_helper_with_plugindef_prefix_is_not_the_region() {
        let source = "function plugindef_helper()\n    return 1\nend\n\nfunction plugindef()\n    -- \
                      note\n\n    return \"x\"\nend\nfunction plugindefaults() end\n";
        let parts = split_regions(source);

        assert_eq!(
            parts,
            FileParts {
                prolog: "function plugindef_helper()\n    return 1\nend\n\n",
                plugindef: "function plugindef()\n    -- note\n\n    return \"x\"\nend\n",
                epilog: "function plugindefaults() end\n",
            }
        );
    }

    #[test]
    fn test_space_before_parameter_list() {
        let source = "function plugindef ()\nend\n";
        assert_eq!(split_regions(source).plugindef, source);
    }
}
