//! Reader for the `.properties` text format.
//!
//! Supports `key=value`, `key:value` and `key value` separators, `#` and `!`
//! comments, trailing-backslash continuation lines, and the `\t`, `\n`, `\r`,
//! `\f` and `\uXXXX` escapes. Any other escaped character stands for itself.

use thiserror::Error;

/// Malformed `.properties` content.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct PropertiesSyntaxError {
    line: usize,
    message: String,
}

impl PropertiesSyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// One-based line number where the logical line started.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }
}

/// Parse `input` into key/value pairs in file order.
///
/// Duplicate keys are returned as they appear; callers decide which wins.
///
/// # Errors
///
/// Returns [`PropertiesSyntaxError`] when a `\u` escape is truncated or does
/// not name a valid character.
///
/// # Examples
///
/// ```
/// use env_config::source::parse_properties;
///
/// let entries = parse_properties("# comment\nproperty.one = one\nlist: a,\\\n  b\n")?;
/// assert_eq!(
///     entries,
///     [
///         (String::from("property.one"), String::from("one")),
///         (String::from("list"), String::from("a,b")),
///     ]
/// );
/// # Ok::<_, env_config::source::PropertiesSyntaxError>(())
/// ```
pub fn parse_properties(input: &str) -> Result<Vec<(String, String)>, PropertiesSyntaxError> {
    let mut entries = Vec::new();
    let mut lines = input.lines().enumerate();
    while let Some((index, physical)) = lines.next() {
        let line = physical.trim_start();
        if line.is_empty() || line.starts_with(['#', '!']) {
            continue;
        }
        let mut logical = String::from(line);
        while ends_with_continuation(&logical) {
            logical.pop();
            let Some((_, next)) = lines.next() else {
                break;
            };
            logical.push_str(next.trim_start());
        }
        entries.push(split_entry(&logical, index + 1)?);
    }
    Ok(entries)
}

fn ends_with_continuation(line: &str) -> bool {
    let backslashes = line.chars().rev().take_while(|c| *c == '\\').count();
    !backslashes.is_multiple_of(2)
}

fn split_entry(line: &str, number: usize) -> Result<(String, String), PropertiesSyntaxError> {
    let mut key_end = line.len();
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == '=' || ch == ':' || ch.is_whitespace() {
            key_end = index;
            break;
        }
    }
    let (raw_key, remainder) = line.split_at(key_end);
    let after_space = remainder.trim_start();
    let raw_value = after_space
        .strip_prefix(['=', ':'])
        .unwrap_or(after_space)
        .trim_start();
    Ok((unescape(raw_key, number)?, unescape(raw_value, number)?))
}

fn unescape(raw: &str, number: usize) -> Result<String, PropertiesSyntaxError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => out.push(unicode_escape(&mut chars, number)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn unicode_escape(
    chars: &mut impl Iterator<Item = char>,
    number: usize,
) -> Result<char, PropertiesSyntaxError> {
    let digits: String = chars.take(4).collect();
    if digits.chars().count() != 4 {
        return Err(PropertiesSyntaxError::new(
            number,
            format!("truncated unicode escape '\\u{digits}'"),
        ));
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            PropertiesSyntaxError::new(number, format!("invalid unicode escape '\\u{digits}'"))
        })
}
