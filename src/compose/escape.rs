//! Escaping of values substituted into message templates.

use std::borrow::Cow;

use crate::model::profile::DispatchMode;

/// Escape a free text value (subject, body) for the given dispatch mode.
pub fn escape_text(value: &str, mode: DispatchMode) -> Cow<'_, str> {
    match mode {
        DispatchMode::UriHandler => urlencoding::encode(value),
        DispatchMode::Subprocess => shell_double_quoted(value),
    }
}

/// Escape a file path for the given dispatch mode.
///
/// In URIs the `/` separators are kept so that `file://` links stay
/// readable; every path segment is percent-encoded on its own.
pub fn escape_path(path: &str, mode: DispatchMode) -> Cow<'_, str> {
    match mode {
        DispatchMode::UriHandler => Cow::Owned(
            path.split('/')
                .map(urlencoding::encode)
                .collect::<Vec<_>>()
                .join("/"),
        ),
        DispatchMode::Subprocess => shell_double_quoted(path),
    }
}

/// Escape a value placed between double quotes in a POSIX shell command.
///
/// Inside double quotes only `\`, `"`, `$` and backtick keep a special
/// meaning.
pub fn shell_double_quoted(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"', '$', '`']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}
