use std::fmt::Debug;
use std::rc::Rc;

use crate::chain::Chain;
use crate::result::{Pending, Recovered, RepairOp, Reply, Selected};
use crate::span::{Ctx, Loc, RecoveryMode};
use crate::stream::Stream;
use crate::Parser;

/// See [`end`].
#[derive(Copy, Clone)]
pub struct End;

/// A parser that accepts only the end of the input.
///
/// Under recovery, the remaining input is skipped in a single repair.
///
/// # Examples
///
/// ```
/// use mend::prelude::*;
///
/// let done = end();
/// assert_eq!(done.parse(""), Ok(()));
/// assert!(done.parse("more").is_err());
/// ```
pub fn end() -> End {
    End
}

impl<S: Stream + ?Sized> Parser<S, ()> for End {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<()> {
        if pos == stream.len() {
            return Reply::ok((), pos, ctx);
        }
        let loc = ctx.loc_at(stream, pos);
        let expected: Chain<Rc<str>> = Chain::single(Rc::from("end of file"));
        if mode.is_armed() {
            let count = stream.len() - pos;
            let selected = Selected {
                selected_at: pos,
                prefix_cost: count,
                pos: stream.len(),
                count,
                value: (),
                ctx: ctx.update_loc(stream, stream.len()),
                op: RepairOp::Skip { count, loc },
                expected: expected.clone(),
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
        Reply::err(pos, loc, expected)
    }
}

/// See [`filter`].
#[derive(Copy, Clone)]
pub struct Filter<F>(F);

/// A parser that accepts a single element satisfying the predicate.
///
/// Under recovery, failure scans forward for the next element the predicate
/// accepts and proposes skipping to it; if no such element exists the parser
/// fails outright, even at the end of the input.
///
/// # Examples
///
/// ```
/// use mend::prelude::*;
///
/// let digit = filter(|c: &char| c.is_ascii_digit());
/// assert_eq!(digit.parse("7"), Ok('7'));
/// assert!(digit.parse("x").is_err());
/// ```
pub fn filter<S, F>(pred: F) -> Filter<F>
where
    S: Stream + ?Sized,
    F: Fn(&S::Item) -> bool,
{
    Filter(pred)
}

impl<S, F> Parser<S, S::Item> for Filter<F>
where
    S: Stream + ?Sized,
    F: Fn(&S::Item) -> bool,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<S::Item> {
        if let Some((item, next)) = stream.next(pos) {
            if (self.0)(&item) {
                return Reply::ok_consumed(item, next, ctx);
            }
        }
        let loc = ctx.loc_at(stream, pos);
        if mode.is_armed() {
            if let Some(selected) = scan_skip(stream, pos, loc, ctx, &self.0) {
                return Reply::Recovered(Recovered {
                    selected: Some(selected),
                    pending: None,
                    pos,
                    loc,
                    expected: Chain::new(),
                    consumed: false,
                });
            }
        }
        Reply::err(pos, loc, Chain::new())
    }
}

/// Scan forward from just past `pos` for an element accepted by `pred`,
/// building the skip repair that resumes after it.
fn scan_skip<S>(
    stream: &S,
    pos: usize,
    loc: Loc,
    ctx: Ctx,
    pred: impl Fn(&S::Item) -> bool,
) -> Option<Selected<S::Item>>
where
    S: Stream + ?Sized,
{
    let (_, mut cur) = stream.next(pos)?;
    while let Some((item, next)) = stream.next(cur) {
        if pred(&item) {
            let count = cur - pos;
            return Some(Selected {
                selected_at: pos,
                prefix_cost: count,
                pos: next,
                count,
                value: item,
                ctx: ctx.update_loc(stream, next),
                op: RepairOp::Skip { count, loc },
                expected: Chain::new(),
                consumed: true,
                ops: Chain::new(),
            });
        }
        cur = next;
    }
    None
}

/// See [`any`].
#[derive(Copy, Clone)]
pub struct Any;

/// A parser that accepts any single element, failing only at the end of the
/// input.
pub fn any() -> Any {
    Any
}

impl<S: Stream + ?Sized> Parser<S, S::Item> for Any {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, _mode: RecoveryMode) -> Reply<S::Item> {
        match stream.next(pos) {
            Some((item, next)) => Reply::ok_consumed(item, next, ctx),
            // No later element can match either, so recovery has nothing
            // to offer here.
            None => Reply::err(pos, ctx.loc_at(stream, pos), Chain::new()),
        }
    }
}

/// See [`just`].
#[derive(Clone)]
pub struct Just<T> {
    token: T,
    label: Rc<str>,
}

/// A parser that accepts exactly the given element.
///
/// Under recovery this is the richest primitive: it always proposes
/// inserting a synthesized copy of the element at the failure site (cost 1),
/// and additionally proposes skipping to the next occurrence when one
/// exists further on.
///
/// # Examples
///
/// ```
/// use mend::prelude::*;
///
/// let comma = just(',');
/// assert_eq!(comma.parse(","), Ok(','));
///
/// let (value, err) = comma.parse_recovery("");
/// assert_eq!(value, Some(','));
/// assert_eq!(err.unwrap().to_string(), "at 0: expected ','");
/// ```
pub fn just<T: PartialEq + Clone + Debug>(token: T) -> Just<T> {
    let label = Rc::from(format!("{:?}", token).as_str());
    Just { token, label }
}

impl<S> Parser<S, S::Item> for Just<S::Item>
where
    S: Stream + ?Sized,
    S::Item: PartialEq,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<S::Item> {
        if let Some((item, next)) = stream.next(pos) {
            if item == self.token {
                return Reply::ok_consumed(item, next, ctx);
            }
        }
        let loc = ctx.loc_at(stream, pos);
        let expected: Chain<Rc<str>> = Chain::single(self.label.clone());
        if mode.is_armed() {
            let pending = Pending {
                count: 1,
                value: self.token.clone(),
                ctx,
                op: RepairOp::Insert {
                    label: self.label.clone(),
                    loc,
                },
                expected: expected.clone(),
                consumed: false,
                ops: Chain::new(),
            };
            let selected = scan_skip(stream, pos, loc, ctx, |item| *item == self.token);
            return Reply::Recovered(Recovered {
                selected,
                pending: Some(pending),
                pos,
                loc,
                expected,
                consumed: false,
            });
        }
        Reply::err(pos, loc, expected)
    }
}

/// See [`one_of`].
#[derive(Clone)]
pub struct OneOf<T>(Vec<T>);

/// A parser that accepts any element in the given set.
pub fn one_of<T: PartialEq + Clone>(items: Vec<T>) -> OneOf<T> {
    OneOf(items)
}

impl<S> Parser<S, S::Item> for OneOf<S::Item>
where
    S: Stream + ?Sized,
    S::Item: PartialEq,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<S::Item> {
        Filter(|item: &S::Item| self.0.contains(item)).parse_at(stream, pos, ctx, mode)
    }
}

/// See [`none_of`].
#[derive(Clone)]
pub struct NoneOf<T>(Vec<T>);

/// A parser that accepts any element not in the given set.
pub fn none_of<T: PartialEq + Clone>(items: Vec<T>) -> NoneOf<T> {
    NoneOf(items)
}

impl<S> Parser<S, S::Item> for NoneOf<S::Item>
where
    S: Stream + ?Sized,
    S::Item: PartialEq,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<S::Item> {
        Filter(|item: &S::Item| !self.0.contains(item)).parse_at(stream, pos, ctx, mode)
    }
}

/// See [`pure`].
#[derive(Copy, Clone)]
pub struct Pure<V>(V);

/// A parser that consumes nothing and succeeds with a clone of the value.
///
/// A zero-width success reports `consumed = false`, so enclosing choices
/// may still try their other alternatives.
pub fn pure<V: Clone>(value: V) -> Pure<V> {
    Pure(value)
}

impl<S: Stream + ?Sized, V: Clone> Parser<S, V> for Pure<V> {
    fn parse_at(&self, _stream: &S, pos: usize, ctx: Ctx, _mode: RecoveryMode) -> Reply<V> {
        Reply::ok(self.0.clone(), pos, ctx)
    }
}

/// See [`pure_with`].
#[derive(Copy, Clone)]
pub struct PureWith<F>(F);

/// A parser that consumes nothing and succeeds with `f()`, evaluated once
/// per invocation.
pub fn pure_with<V, F: Fn() -> V>(f: F) -> PureWith<F> {
    PureWith(f)
}

impl<S: Stream + ?Sized, V, F: Fn() -> V> Parser<S, V> for PureWith<F> {
    fn parse_at(&self, _stream: &S, pos: usize, ctx: Ctx, _mode: RecoveryMode) -> Reply<V> {
        Reply::ok((self.0)(), pos, ctx)
    }
}

/// See [`insert`].
#[derive(Clone)]
pub struct Insert<V> {
    value: V,
    label: Rc<str>,
}

/// A parser that never matches input: under recovery it supplies `value`
/// through a cost-1 insert repair, and otherwise it fails without consuming.
///
/// Placed as a trailing choice alternative, this provides a default value
/// at an error site while recording the synthesized element in the
/// diagnostics.
pub fn insert<V: Clone + Debug>(value: V) -> Insert<V> {
    let label = Rc::from(format!("{:?}", value).as_str());
    Insert { value, label }
}

/// [`insert`] with an explicit diagnostic label instead of the value's
/// `Debug` rendering.
pub fn insert_labelled<V: Clone>(value: V, label: &str) -> Insert<V> {
    Insert {
        value,
        label: Rc::from(label),
    }
}

impl<S: Stream + ?Sized, V: Clone> Parser<S, V> for Insert<V> {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        let loc = ctx.loc_at(stream, pos);
        if mode.is_armed() {
            let pending = Pending {
                count: 1,
                value: self.value.clone(),
                ctx,
                op: RepairOp::Insert {
                    label: self.label.clone(),
                    loc,
                },
                expected: Chain::single(self.label.clone()),
                consumed: false,
                ops: Chain::new(),
            };
            return Reply::Recovered(Recovered {
                selected: None,
                pending: Some(pending),
                pos,
                loc,
                expected: Chain::new(),
                consumed: false,
            });
        }
        Reply::err(pos, loc, Chain::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_succeeds_on_empty_input() {
        assert_eq!(end().parse(""), Ok(()));
        let toks: &[u8] = &[];
        assert_eq!(end().parse(toks), Ok(()));
    }

    #[test]
    fn filter_fails_at_end_of_stream_even_when_armed() {
        let digit = filter::<str, _>(|c: &char| c.is_ascii_digit());
        let (value, err) = digit.parse_recovery("");
        assert_eq!(value, None);
        assert!(err.is_some());
    }

    #[test]
    fn filter_skips_to_the_next_match_when_armed() {
        let digit = filter::<str, _>(|c: &char| c.is_ascii_digit());
        let (value, err) = digit.parse_recovery("xy7");
        assert_eq!(value, Some('7'));
        assert_eq!(err.unwrap().to_string(), "at 0: unexpected input");
    }

    #[test]
    fn just_inserts_when_no_later_match_exists() {
        let (value, err) = just('a').parse_recovery("zzz");
        assert_eq!(value, Some('a'));
        assert_eq!(err.unwrap().to_string(), "at 0: expected 'a'");
    }

    #[test]
    fn just_prefers_the_skip_when_the_token_appears_later() {
        let pair = Parser::<str, char>::then(just('a'), end());
        let (value, err) = pair.parse_recovery("za");
        assert_eq!(value.map(|(c, _)| c), Some('a'));
        assert_eq!(err.unwrap().to_string(), "at 0: unexpected input");
    }

    #[test]
    fn one_of_and_none_of_filter_by_membership() {
        let op = one_of(vec!['+', '-']);
        assert_eq!(op.parse("+"), Ok('+'));
        assert!(op.parse("*").is_err());
        let unquoted = none_of(vec!['"']);
        assert_eq!(unquoted.parse("x"), Ok('x'));
        assert!(unquoted.parse("\"").is_err());
    }

    #[test]
    fn any_accepts_whatever_comes_next() {
        assert_eq!(any().parse("z"), Ok('z'));
        let empty: &[i32] = &[];
        assert!(any().parse(empty).is_err());
    }

    #[test]
    fn pure_with_invokes_the_function_each_time() {
        let p = pure_with(Vec::<char>::new);
        assert_eq!(p.parse(""), Ok(vec![]));
        assert_eq!(p.parse("unread"), Ok(vec![]));
    }

    #[test]
    fn insert_is_an_error_without_recovery() {
        let p: Insert<char> = insert('x');
        assert!(p.parse("").is_err());
    }

    #[test]
    fn insert_supplies_its_value_under_recovery() {
        let p: Insert<i32> = insert_labelled(42, "integer '42'");
        let (value, err) = Parser::<str, i32>::then_ignore(p, end()).parse_recovery("");
        assert_eq!(value, Some(42));
        assert_eq!(err.unwrap().to_string(), "at 0: expected integer '42'");
    }
}
