//! Rendering text as single-quoted `put` statements.
//!
//! Each line becomes `  put '<line> ';`: trailing whitespace is trimmed, every
//! single quote is doubled, and a space always precedes the closing quote.

const PREFIX: &str = "  put '";
const SUFFIX: &str = " ';";

/// Double every single quote so the text can sit inside a quoted literal.
pub fn escape_quotes(text: &str) -> String {
    text.replace('\'', "''")
}

/// Render one source line as an escaped `put` statement.
pub fn put_statement(line: &str) -> String {
    format!("{PREFIX}{}{SUFFIX}", escape_quotes(line.trim_end()))
}

/// Render each line as a `put` statement.
pub fn put_statements<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().map(put_statement).collect()
}

/// Recover the original (trimmed) line from a statement built by [`put_statement`].
///
/// Returns `None` when the statement does not have the expected shape or contains
/// an undoubled quote.
pub fn parse_put_statement(statement: &str) -> Option<String> {
    let literal = statement.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let mut line = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(ch) = chars.next() {
        if ch == '\'' && chars.next() != Some('\'') {
            return None;
        }
        line.push(ch);
    }
    Some(line)
}
