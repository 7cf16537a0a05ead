use std::fmt;

use thiserror::Error;

use crate::span::Loc;

/// One diagnostic site: a location and the labels expected there.
///
/// Renders as `at <pos>: expected <a> or <b>`, or `at <pos>: unexpected
/// input` when nothing in particular was expected (a plain skip repair).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorItem {
    /// Where the problem was found.
    pub loc: Loc,
    /// Labels that would have been accepted at `loc`, in grammar order.
    pub expected: Vec<String>,
}

impl fmt::Display for ErrorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected.is_empty() {
            write!(f, "at {}: unexpected input", self.loc.pos)
        } else {
            write!(f, "at {}: expected {}", self.loc.pos, self.expected.join(" or "))
        }
    }
}

/// A parse failure, or the diagnostic trail of a recovered parse.
///
/// A plain failure holds a single item; a recovered parse holds one item
/// per repair that was applied, in the order the repairs appear in the
/// input. Items join with `", "` when displayed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", render(.items))]
pub struct ParseError {
    items: Vec<ErrorItem>,
}

impl ParseError {
    pub(crate) fn new(items: Vec<ErrorItem>) -> ParseError {
        ParseError { items }
    }

    /// The individual diagnostic sites, in input order.
    pub fn items(&self) -> &[ErrorItem] {
        &self.items
    }
}

fn render(items: &[ErrorItem]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_labels() {
        let item = ErrorItem {
            loc: Loc {
                pos: 1,
                line: 1,
                col: 2,
            },
            expected: vec!["string".to_string(), "'}'".to_string()],
        };
        assert_eq!(item.to_string(), "at 1: expected string or '}'");
    }

    #[test]
    fn renders_unexpected_input_without_labels() {
        let item = ErrorItem {
            loc: Loc {
                pos: 2,
                line: 1,
                col: 3,
            },
            expected: vec![],
        };
        assert_eq!(item.to_string(), "at 2: unexpected input");
    }

    #[test]
    fn joins_repair_sites_with_commas() {
        let err = ParseError::new(vec![
            ErrorItem {
                loc: Loc {
                    pos: 3,
                    line: 1,
                    col: 4,
                },
                expected: vec!["integer '1'".to_string()],
            },
            ErrorItem {
                loc: Loc {
                    pos: 3,
                    line: 1,
                    col: 4,
                },
                expected: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "at 3: expected integer '1', at 3: unexpected input"
        );
    }
}
