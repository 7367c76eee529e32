/// Indentation applied to every non-empty line of a wrapped module body
const BODY_INDENT: &str = "    ";

/// Wrap a module body into a lazy `package.preload` registration
///
/// The generated loader only runs the first time the module is required, and
/// the `or` guard keeps an earlier registration of the same name in place, so
/// including the block twice is harmless.
///
/// ```text
/// package.preload["name"] = package.preload["name"] or function()
///     <body>
/// end
/// ```
pub fn wrap_module(module_name: &str, source: &str) -> String {
    let key = preload_key(module_name);
    let mut wrapped = format!("package.preload[{key}] = package.preload[{key}] or function()\n");

    for line in source.lines() {
        if !line.is_empty() {
            wrapped.push_str(BODY_INDENT);
            wrapped.push_str(line);
        }
        wrapped.push('\n');
    }

    wrapped.push_str("end");
    wrapped
}

/// Render a module name as a double-quoted Lua string literal
fn preload_key(module_name: &str) -> String {
    format!("\"{}\"", escape_lua_string(module_name))
}

/// Escape `text` for use inside a single- or double-quoted Lua string
pub(crate) fn escape_lua_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
