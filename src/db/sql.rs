//! SQL text builders for procedure calls and bulk inserts.

use crate::error::{FbError, FbResult};

/// Build `{call name(?,...,?)}` for the given parameter count.
///
/// With no parameters the argument list is omitted: `{call name}`.
pub fn procedure_call(name: &str, param_count: usize) -> FbResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FbError::invalid_argument("Invalid stored procedure name"));
    }
    if param_count == 0 {
        return Ok(format!("{{call {name}}}"));
    }
    Ok(format!("{{call {name}({})}}", placeholders(param_count)))
}

/// Build `INSERT INTO "table" (f1,...,fn) VALUES (?,...,?)`.
pub fn bulk_insert(table: &str, fields: &[String]) -> FbResult<String> {
    if table.trim().is_empty() {
        return Err(FbError::invalid_argument("Invalid table name"));
    }
    if fields.is_empty() || fields.iter().any(|f| f.trim().is_empty()) {
        return Err(FbError::invalid_argument("Invalid field list"));
    }
    Ok(format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        table.replace('"', "\"\""),
        fields.join(","),
        placeholders(fields.len())
    ))
}

/// Lexical region the placeholder scanner is currently in.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Region {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Count `?` placeholders outside string literals, quoted identifiers and
/// comments (`-- ...` to end of line, `/* ... */`).
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut region = Region::Code;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        region = match (region, c) {
            (Region::Code, '\'' | '"') => Region::Quoted(c),
            (Region::Code, '-') if chars.peek() == Some(&'-') => {
                chars.next();
                Region::LineComment
            }
            (Region::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                Region::BlockComment
            }
            (Region::Code, '?') => {
                count += 1;
                Region::Code
            }
            (Region::Quoted(q), c) if c == q => Region::Code,
            (Region::LineComment, '\n') => Region::Code,
            (Region::BlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                Region::Code
            }
            (region, _) => region,
        };
    }
    count
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}
