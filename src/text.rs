//! Parsers over character streams: literal prefixes, regular expressions
//! and a few common character classes.

use std::rc::Rc;

use crate::chain::Chain;
use crate::combinator::Label;
use crate::primitive::{filter, Filter};
use crate::result::{Recovered, RepairOp, Reply, Selected};
use crate::span::{Ctx, RecoveryMode};
use crate::stream::TextStream;
use crate::Parser;

/// See [`literal`].
#[derive(Clone)]
pub struct Literal {
    text: String,
    label: Rc<str>,
}

/// A parser that matches the given string at the current position.
///
/// Under recovery, failure scans forward for the next occurrence of the
/// string and proposes skipping to it.
///
/// # Examples
///
/// ```
/// use mend::prelude::*;
/// use mend::text::literal;
///
/// let arrow = literal("->");
/// assert_eq!(arrow.parse("->"), Ok("->".to_string()));
/// assert!(arrow.parse("=>").is_err());
/// ```
pub fn literal(text: impl Into<String>) -> Literal {
    let text = text.into();
    let label = Rc::from(format!("{:?}", text).as_str());
    Literal { text, label }
}

impl<S: TextStream + ?Sized> Parser<S, String> for Literal {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<String> {
        let text = stream.as_str();
        if text[pos..].starts_with(&self.text) {
            return if self.text.is_empty() {
                Reply::ok(self.text.clone(), pos, ctx)
            } else {
                Reply::ok_consumed(self.text.clone(), pos + self.text.len(), ctx)
            };
        }
        let loc = ctx.loc_at(stream, pos);
        let expected = Chain::single(self.label.clone());
        if mode.is_armed() && !self.text.is_empty() {
            if let Some((_, scan_from)) = stream.next(pos) {
                if let Some(found) = text[scan_from..].find(&self.text) {
                    let cur = scan_from + found;
                    let count = cur - pos;
                    let end = cur + self.text.len();
                    let selected = Selected {
                        selected_at: pos,
                        prefix_cost: count,
                        pos: end,
                        count,
                        value: self.text.clone(),
                        ctx: ctx.update_loc(stream, end),
                        op: RepairOp::Skip { count, loc },
                        expected: Chain::new(),
                        consumed: true,
                        ops: Chain::new(),
                    };
                    return Reply::Recovered(Recovered {
                        selected: Some(selected),
                        pending: None,
                        pos,
                        loc,
                        expected,
                        consumed: false,
                    });
                }
            }
        }
        Reply::err(pos, loc, expected)
    }
}

/// Which capture of a [`regex`] pattern becomes the parsed value.
#[derive(Clone, Debug)]
pub enum Group {
    /// A capture group by index; `0` is the whole match.
    Index(usize),
    /// A named capture group.
    Name(String),
}

impl From<usize> for Group {
    fn from(index: usize) -> Group {
        Group::Index(index)
    }
}

impl From<i32> for Group {
    fn from(index: i32) -> Group {
        Group::Index(index as usize)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Group {
        Group::Name(name.to_string())
    }
}

/// See [`regex`].
#[derive(Clone)]
pub struct Matcher {
    re: regex::Regex,
    group: Group,
}

/// A parser that matches a regular expression at the current position and
/// yields the whole match.
///
/// The pattern is compiled anchored: it must match starting exactly at the
/// parser's position. An invalid pattern is a programmer error and panics
/// at construction. Under recovery, failure scans forward for the next
/// position where the pattern matches and proposes skipping to it.
///
/// # Examples
///
/// ```
/// use mend::prelude::*;
/// use mend::text::regex;
///
/// let ident = regex("[a-z_][a-z0-9_]*");
/// assert_eq!(ident.parse("snake_case"), Ok("snake_case".to_string()));
/// ```
pub fn regex(pattern: &str) -> Matcher {
    regex_group(pattern, 0)
}

/// [`regex`], yielding the given capture group instead of the whole match.
pub fn regex_group(pattern: &str, group: impl Into<Group>) -> Matcher {
    let re = regex::Regex::new(&format!(r"\A(?:{pattern})"))
        .expect("invalid regular expression");
    Matcher {
        re,
        group: group.into(),
    }
}

impl Matcher {
    /// Match at `at`, returning the captured value and the end of the whole
    /// match.
    fn match_at(&self, text: &str, at: usize) -> Option<(String, usize)> {
        let caps = self.re.captures(&text[at..])?;
        let end = at + caps.get(0).map_or(0, |m| m.end());
        let captured = match &self.group {
            Group::Index(i) => caps.get(*i),
            Group::Name(name) => caps.name(name),
        }?;
        Some((captured.as_str().to_owned(), end))
    }
}

impl<S: TextStream + ?Sized> Parser<S, String> for Matcher {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<String> {
        let text = stream.as_str();
        if let Some((value, end)) = self.match_at(text, pos) {
            return if end > pos {
                Reply::ok_consumed(value, end, ctx)
            } else {
                Reply::ok(value, pos, ctx)
            };
        }
        let loc = ctx.loc_at(stream, pos);
        if mode.is_armed() {
            if let Some((_, mut cur)) = stream.next(pos) {
                while cur < text.len() {
                    if let Some((value, end)) = self.match_at(text, cur) {
                        let count = cur - pos;
                        let selected = Selected {
                            selected_at: pos,
                            prefix_cost: count,
                            pos: end,
                            count,
                            value,
                            ctx: ctx.update_loc(stream, end),
                            op: RepairOp::Skip { count, loc },
                            expected: Chain::new(),
                            consumed: true,
                            ops: Chain::new(),
                        };
                        return Reply::Recovered(Recovered {
                            selected: Some(selected),
                            pending: None,
                            pos,
                            loc,
                            expected: Chain::new(),
                            consumed: false,
                        });
                    }
                    match stream.next(cur) {
                        Some((_, next)) => cur = next,
                        None => break,
                    }
                }
            }
        }
        Reply::err(pos, loc, Chain::new())
    }
}

/// A single alphabetic character, labelled `letter`.
pub fn letter() -> Label<Filter<fn(&char) -> bool>> {
    fn is_letter(c: &char) -> bool {
        c.is_alphabetic()
    }
    Label(
        filter::<str, _>(is_letter as fn(&char) -> bool),
        Rc::from("letter"),
    )
}

/// A single ASCII digit, labelled `digit`.
pub fn digit() -> Label<Filter<fn(&char) -> bool>> {
    fn is_digit(c: &char) -> bool {
        c.is_ascii_digit()
    }
    Label(
        filter::<str, _>(is_digit as fn(&char) -> bool),
        Rc::from("digit"),
    )
}

/// Zero or more blanks, tabs and newlines.
pub fn whitespace() -> Matcher {
    regex(r"[ \t\r\n]*")
}
