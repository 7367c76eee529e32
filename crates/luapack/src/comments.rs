//! Lua comment removal
//!
//! A small scanner rather than a regex: comment markers inside quoted strings
//! and long-bracket strings (`[[ ... ]]`, `[==[ ... ]==]`) must survive.
//! All delimiters are ASCII, so the scanner works on bytes and only ever
//! splits the source at ASCII positions.

/// Remove every comment from `source`
///
/// With `trim_whitespace`, trailing whitespace is stripped from each line and
/// lines that end up blank are dropped. Lines inside a long string are never
/// altered, whatever the mode.
pub fn strip_comments(source: &str, trim_whitespace: bool) -> String {
    let mut stripper = Stripper::new(source, trim_whitespace);
    stripper.run();
    stripper.finish()
}

struct Stripper<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    trim_whitespace: bool,
    output: String,
    /// Current logical line; can span several physical lines when a long
    /// string is open across them
    line: String,
}

impl<'a> Stripper<'a> {
    fn new(source: &'a str, trim_whitespace: bool) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            trim_whitespace,
            output: String::with_capacity(source.len()),
            line: String::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'-' if self.peek(1) == Some(b'-') => self.skip_comment(),
                quote @ (b'"' | b'\'') => self.copy_quoted(quote),
                b'[' => match long_bracket_level(self.bytes, self.pos) {
                    Some(level) => self.copy_long_string(level),
                    None => self.copy_until(self.pos + 1),
                },
                b'\n' => {
                    self.pos += 1;
                    self.flush_line(true);
                }
                _ => self.copy_plain(),
            }
        }
    }

    fn finish(mut self) -> String {
        self.flush_line(false);
        self.output
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Copy a run of bytes that cannot start a comment, string or newline
    fn copy_plain(&mut self) {
        let end = self.bytes[self.pos..]
            .iter()
            .position(|b| matches!(b, b'-' | b'"' | b'\'' | b'[' | b'\n'))
            .map_or(self.bytes.len(), |offset| self.pos + offset);
        // A lone `-` is an operator, not a comment start
        let end = if end == self.pos { end + 1 } else { end };
        self.copy_until(end);
    }

    fn copy_until(&mut self, end: usize) {
        self.line.push_str(&self.source[self.pos..end]);
        self.pos = end;
    }

    fn copy_quoted(&mut self, quote: u8) {
        let mut end = self.pos + 1;
        while end < self.bytes.len() {
            match self.bytes[end] {
                b'\\' => end += 2,
                b'\n' => break,
                b if b == quote => {
                    end += 1;
                    break;
                }
                _ => end += 1,
            }
        }
        self.copy_until(end.min(self.bytes.len()));
    }

    fn copy_long_string(&mut self, level: usize) {
        let open_len = level + 2;
        let end = find_long_bracket_close(self.bytes, self.pos + open_len, level)
            .unwrap_or(self.bytes.len());
        self.copy_until(end);
    }

    fn skip_comment(&mut self) {
        let body = self.pos + 2;
        self.pos = match long_bracket_level(self.bytes, body) {
            Some(level) => find_long_bracket_close(self.bytes, body + level + 2, level)
                .unwrap_or(self.bytes.len()),
            None => self.bytes[body..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(self.bytes.len(), |offset| body + offset),
        };
    }

    fn flush_line(&mut self, newline: bool) {
        let line = std::mem::take(&mut self.line);
        if self.trim_whitespace {
            let trimmed = line.trim_end();
            if trimmed.trim_start().is_empty() {
                return;
            }
            self.output.push_str(trimmed);
        } else {
            self.output.push_str(&line);
        }
        if newline {
            self.output.push('\n');
        }
    }
}

/// Level of the long bracket opening at `start` (`[[` is 0, `[==[` is 2)
fn long_bracket_level(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start) != Some(&b'[') {
        return None;
    }
    let level = bytes[start + 1..].iter().take_while(|&&b| b == b'=').count();
    (bytes.get(start + 1 + level) == Some(&b'[')).then_some(level)
}

/// Position just past the `]=*]` closing a long bracket of `level`
fn find_long_bracket_close(bytes: &[u8], from: usize, level: usize) -> Option<usize> {
    let mut close = Vec::with_capacity(level + 2);
    close.push(b']');
    close.resize(level + 1, b'=');
    close.push(b']');

    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(close.len())
        .position(|window| window == close.as_slice())
        .map(|offset| from + offset + close.len())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_line_comments_removed() {
        let source = "local a = 1 -- one\n-- whole line\nlocal b = 2";
        assert_eq!(
            strip_comments(source, false),
            "local a = 1 \n\nlocal b = 2"
        );
        assert_eq!(strip_comments(source, true), "local a = 1\nlocal b = 2");
    }

    #[test]
    fn test_block_comments_removed() {
        let source = "--[[\nheader\n]]\nlocal a = 1 --[==[ inline ]] still ]==] + 1";
        assert_eq!(strip_comments(source, true), "local a = 1  + 1");
    }

    #[test]
    fn test_strings_are_kept() {
        let source = "local s = \"-- not a comment\" .. '--[[ nor this ]]'";
        assert_eq!(strip_comments(source, true), source);
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let source = "local s = \"say \\\"--hi\\\"\" -- comment";
        assert_eq!(
            strip_comments(source, true),
            "local s = \"say \\\"--hi\\\"\""
        );
    }

    #[test]
    fn test_long_strings_keep_layout() {
        let source = "local notes = [[\n  -- keep\n\n  text   \n]] -- drop";
        assert_eq!(
            strip_comments(source, true),
            "local notes = [[\n  -- keep\n\n  text   \n]]"
        );
    }

    #[test]
    fn test_leveled_long_string() {
        let source = "local s = [==[ ]] -- kept ]==] -- dropped";
        assert_eq!(strip_comments(source, true), "local s = [==[ ]] -- kept ]==]");
    }

    #[test]
    fn test_index_bracket_is_plain_code() {
        let source = "t[1] = t[ 2 ] - 1 -- x";
        assert_eq!(strip_comments(source, true), "t[1] = t[ 2 ] - 1");
    }

    #[test]
    fn test_trailing_newline_preserved() {
        assert_eq!(strip_comments("return {} -- done\n", true), "return {}\n");
        assert_eq!(strip_comments("return {}\n-- done\n", true), "return {}\n");
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(strip_comments("local a = 1\n--[[ open", true), "local a = 1\n");
    }

    #[test]
    fn test_non_ascii_text() {
        let source = "local s = 'é' -- ü\nlocal t = 1 - 2";
        assert_eq!(strip_comments(source, true), "local s = 'é'\nlocal t = 1 - 2");
    }
}
