//! Brace expansion for URL patterns.
//!
//! Supports comma lists (`{a,b,c}`), numeric sequences with optional step
//! and zero padding (`{1..9}`, `{01..10}`, `{0..100..25}`, descending
//! `{5..1}`), single-character sequences (`{a..e}`), nesting
//! (`{a,b{1..3}}`) and several groups in one pattern, which expand as a
//! cartesian product in order.
//!
//! A brace pair with neither a top-level comma nor a sequence, like `{x}`
//! or `{}`, stays literal. Unbalanced braces, a zero step and sequences
//! mixing numbers and letters are `InvalidPattern`.

use crate::error::{Result, WorkloadError};

/// Upper bound on the number of strings one pattern may expand to.
pub const MAX_EXPANSIONS: usize = 100_000;

#[derive(Debug, Clone)]
enum Node {
    Literal(String),
    Choice(Vec<Vec<Node>>),
}

/// Expand `pattern` into its full ordered list of literal strings.
pub fn expand(pattern: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = pattern.chars().collect();
    let nodes = parse(&chars, 0)?;
    expand_nodes(&nodes)
}

fn invalid(message: String) -> WorkloadError {
    WorkloadError::InvalidPattern(message)
}

/// Parse a balanced region. `offset` is only used for error positions.
fn parse(chars: &[char], offset: usize) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' => {
                let close = matching_close(chars, i)
                    .ok_or_else(|| invalid(format!("unclosed '{{' at position {}", offset + i)))?;
                if !literal.is_empty() {
                    nodes.push(Node::Literal(std::mem::take(&mut literal)));
                }
                nodes.extend(parse_group(&chars[i + 1..close], offset + i + 1)?);
                i = close + 1;
            }
            '}' => return Err(invalid(format!("unmatched '}}' at position {}", offset + i))),
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        nodes.push(Node::Literal(literal));
    }
    Ok(nodes)
}

fn matching_close(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the inside of one brace pair.
fn parse_group(body: &[char], offset: usize) -> Result<Vec<Node>> {
    let parts = split_top_level(body);
    if parts.len() > 1 {
        let mut alternatives = Vec::with_capacity(parts.len());
        let mut start = 0;
        for part in parts {
            alternatives.push(parse(part, offset + start)?);
            start += part.len() + 1;
        }
        return Ok(vec![Node::Choice(alternatives)]);
    }

    let text: String = body.iter().collect();
    if let Some(items) = parse_sequence(&text)? {
        let alternatives = items.into_iter().map(|s| vec![Node::Literal(s)]).collect();
        return Ok(vec![Node::Choice(alternatives)]);
    }

    // Not an expansion: keep the braces, still expand anything inside
    let mut nodes = vec![Node::Literal("{".to_string())];
    nodes.extend(parse(body, offset)?);
    nodes.push(Node::Literal("}".to_string()));
    Ok(nodes)
}

fn split_top_level(body: &[char]) -> Vec<&[char]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

enum Bound {
    Number(i64),
    Char(char),
}

fn parse_bound(s: &str) -> Option<Bound> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Bound::Number(n));
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(Bound::Char(c)),
        _ => None,
    }
}

fn is_padded(s: &str) -> bool {
    let digits = s.trim_start_matches('-');
    digits.len() > 1 && digits.starts_with('0')
}

/// `Ok(None)` when `text` is not sequence syntax at all.
fn parse_sequence(text: &str) -> Result<Option<Vec<String>>> {
    let parts: Vec<&str> = text.split("..").collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Ok(None);
    }

    let (Some(start), Some(end)) = (parse_bound(parts[0]), parse_bound(parts[1])) else {
        return Ok(None);
    };

    let step = match parts.get(2) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| invalid(format!("invalid step '{}' in '{{{}}}'", raw, text)))?,
        None => 1,
    };
    if step == 0 {
        return Err(invalid(format!("zero step in '{{{}}}'", text)));
    }
    let step = step.unsigned_abs();

    match (start, end) {
        (Bound::Number(a), Bound::Number(b)) => {
            let count = (a.abs_diff(b) / step)
                .checked_add(1)
                .filter(|count| *count <= MAX_EXPANSIONS as u64)
                .ok_or_else(|| invalid(format!("'{{{}}}' expands to more than {} values", text, MAX_EXPANSIONS)))?
                as usize;
            let width = if is_padded(parts[0]) || is_padded(parts[1]) {
                parts[0].len().max(parts[1].len())
            } else {
                0
            };
            let mut values = Vec::with_capacity(count);
            let mut current = a as i128;
            let step = if a <= b { step as i128 } else { -(step as i128) };
            for _ in 0..count {
                values.push(format!("{:0width$}", current, width = width));
                current += step;
            }
            Ok(Some(values))
        }
        (Bound::Char(a), Bound::Char(b)) => {
            let (a, b) = (a as u32, b as u32);
            let count = (a.abs_diff(b) as u64 / step) as usize + 1;
            let values = (0..count)
                .filter_map(|i| {
                    let delta = (i as u64 * step) as u32;
                    let code = if a <= b { a + delta } else { a - delta };
                    char::from_u32(code).map(String::from)
                })
                .collect();
            Ok(Some(values))
        }
        _ => Err(invalid(format!("sequence '{{{}}}' mixes numbers and letters", text))),
    }
}

fn expand_nodes(nodes: &[Node]) -> Result<Vec<String>> {
    let mut results = vec![String::new()];

    for node in nodes {
        match node {
            Node::Literal(text) => {
                for result in &mut results {
                    result.push_str(text);
                }
            }
            Node::Choice(alternatives) => {
                let mut expanded = Vec::new();
                for alternative in alternatives {
                    expanded.extend(expand_nodes(alternative)?);
                    if results.len().saturating_mul(expanded.len()) > MAX_EXPANSIONS {
                        return Err(invalid(format!("pattern expands to more than {} values", MAX_EXPANSIONS)));
                    }
                }
                results = results
                    .iter()
                    .flat_map(|prefix| expanded.iter().map(move |suffix| format!("{}{}", prefix, suffix)))
                    .collect();
            }
        }
    }

    Ok(results)
}
