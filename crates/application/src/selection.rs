//! Numbered-choice parsing shared by result pages and the genre menu.

use std::collections::BTreeSet;

use thiserror::Error;

/// Token that skips a selection prompt without picking anything.
pub const SKIP_TOKEN: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no selection entered")]
    Empty,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("invalid selection(s): {}; valid range is {first} to {last}", .rejected.join(", "))]
    OutOfRange {
        rejected: Vec<String>,
        first: usize,
        last: usize,
    },
    #[error("no page is waiting for a selection")]
    NotAwaiting,
}

/// Visible 1-based number of the record at `position` on a page starting at `offset`.
pub fn display_index(offset: usize, position: usize) -> usize {
    offset + position + 1
}

/// Parses whitespace-separated display numbers into ascending, duplicate-free
/// page-local indices.
///
/// Valid numbers lie in `offset + 1 ..= offset + count`. A lone `0` skips and
/// yields no indices. Input with any bad token is rejected as a whole.
pub fn parse_selection(
    input: &str,
    offset: usize,
    count: usize,
) -> Result<Vec<usize>, SelectionError> {
    let input = input.trim();
    if input == SKIP_TOKEN {
        return Ok(Vec::new());
    }

    let mut numbers = Vec::new();
    for token in input.split_whitespace() {
        let value = match token.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) if is_integer(token) => None,
            Err(_) => return Err(SelectionError::NotANumber(token.to_string())),
        };
        numbers.push((token, value));
    }
    if numbers.is_empty() {
        return Err(SelectionError::Empty);
    }

    let first = offset + 1;
    let last = offset + count;
    let mut rejected: Vec<String> = Vec::new();
    let mut picked = BTreeSet::new();
    for (token, value) in numbers {
        match value.map(usize::try_from) {
            Some(Ok(k)) if k >= first && k <= last => {
                picked.insert(k - first);
            }
            _ => {
                let shown = value.map_or_else(|| token.to_string(), |v| v.to_string());
                if !rejected.contains(&shown) {
                    rejected.push(shown);
                }
            }
        }
    }

    if !rejected.is_empty() {
        return Err(SelectionError::OutOfRange {
            rejected,
            first,
            last,
        });
    }
    Ok(picked.into_iter().collect())
}

/// Digits with an optional sign; too large for `i64` still counts.
fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(&['-', '+'][..]).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
