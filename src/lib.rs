#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

/// Persistent chains used for expected labels and repair histories.
pub mod chain;
/// Combinators that allow combining and extending existing parsers.
pub mod combinator;
/// User-visible error types and their rendering.
pub mod error;
/// Indentation-sensitive combinators.
pub mod layout;
/// Parser primitives that accept specific input patterns.
pub mod primitive;
/// The engine that continues and merges recovered parses.
pub mod recovery;
/// Recursive parsers (parsers that include themselves within their patterns).
pub mod recursive;
/// The result algebra shared by all parsers.
pub mod result;
/// Locations, contexts and the recovery permission state.
pub mod span;
/// Input streams and the two built-in adapters.
pub mod stream;
/// Text-specific parsers and utilities.
pub mod text;

pub use crate::error::{ErrorItem, ParseError};
pub use crate::result::{Failure, Reply};
pub use crate::span::{Ctx, Loc, RecoveryMode};
pub use crate::stream::{Stream, TextStream};

use std::marker::PhantomData;
use std::rc::Rc;

use tracing::trace;

use crate::combinator::*;

/// Commonly used functions, traits and types.
pub mod prelude {
    pub use super::error::{ErrorItem, ParseError};
    pub use super::layout::{aligned, block, indented};
    pub use super::primitive::{
        any, end, filter, insert, insert_labelled, just, none_of, one_of, pure, pure_with,
    };
    pub use super::recursive::{recursive, Recursive};
    pub use super::span::Loc;
    pub use super::text;
    pub use super::{BoxedParser, Parser};
}

/// A trait implemented by parsers.
///
/// Parsers consume a [`Stream`] of input (tokens or characters) and
/// attempt to produce a value of type `V` from it. A parser built from the
/// combinators in this crate can be run in two ways: [`parse`](Parser::parse)
/// demands that the input match the grammar, while
/// [`parse_recovery`](Parser::parse_recovery) additionally explores
/// *repairs* on failure, skipping unexpected input or inserting a missing
/// element, and returns the best recovered value alongside a diagnostic
/// describing each repair in input order.
///
/// Choice follows the commit-on-consume rule: `a.or(b)` tries `b` only when
/// `a` failed *without consuming input*. A failure after consumption is
/// committed and surfaces immediately; [`attempt`](Parser::attempt) converts
/// it back into an uncommitted one when backtracking is wanted.
///
/// Grammars are plain values: build a parser once and run it as often as
/// needed. Parsers hold no per-run state, so a grammar can be shared freely
/// between parse invocations.
pub trait Parser<S: Stream + ?Sized, V> {
    /// Run this parser at `pos`. This is the whole parser contract; every
    /// combinator is implemented in terms of it. Prefer the combinators and
    /// the entry points below unless you are implementing your own parser.
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V>;

    /// Parse the input, requiring an exact match.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend::prelude::*;
    ///
    /// let ab = just('a').then(just('b'));
    /// assert_eq!(ab.parse("ab"), Ok(('a', 'b')));
    /// assert!(ab.parse("ax").is_err());
    /// ```
    fn parse(&self, stream: &S) -> Result<V, ParseError>
    where
        Self: Sized,
    {
        trace!(len = stream.len(), "parse");
        let ctx = Ctx::new(RecoveryMode::Disabled);
        match self.parse_at(stream, 0, ctx, RecoveryMode::Disabled) {
            Reply::Ok { value, .. } => Ok(value),
            Reply::Err(f) => Err(f.into_error()),
            Reply::Recovered(_) => {
                unreachable!("a parser recovered even though recovery was disabled")
            }
        }
    }

    /// Parse the input, repairing it where it fails to match.
    ///
    /// Matching input parses to `(Some(value), None)`, exactly as
    /// [`parse`](Parser::parse) would. Otherwise the recovery engine
    /// explores skipping unexpected input and inserting missing elements;
    /// if some repair lets the parse complete, the result is the repaired
    /// value plus an error listing every repair site. Input that cannot be
    /// repaired yields `(None, Some(error))`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend::prelude::*;
    ///
    /// let p = just('a').then_ignore(end());
    ///
    /// let (value, err) = p.parse_recovery("za");
    /// assert_eq!(value, Some('a'));
    /// assert_eq!(err.unwrap().to_string(), "at 0: unexpected input");
    /// ```
    fn parse_recovery(&self, stream: &S) -> (Option<V>, Option<ParseError>)
    where
        Self: Sized,
    {
        trace!(len = stream.len(), "parse with recovery");
        let ctx = Ctx::new(RecoveryMode::Armed);
        match self.parse_at(stream, 0, ctx, RecoveryMode::Armed) {
            Reply::Ok { value, .. } => (Some(value), None),
            Reply::Err(f) => (None, Some(f.into_error())),
            Reply::Recovered(r) => {
                let (value, error) = r.into_best();
                (Some(value), Some(error))
            }
        }
    }

    /// Map the output of this parser to another value.
    ///
    /// On a recovered parse, the mapping applies to every repair's value,
    /// leaving positions and repairs unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend::prelude::*;
    ///
    /// let digit = filter(|c: &char| c.is_ascii_digit())
    ///     .map(|c: char| c.to_digit(10).unwrap());
    /// assert_eq!(digit.parse("7"), Ok(7));
    /// ```
    fn map<U, F: Fn(V) -> U>(self, f: F) -> Map<Self, F, V>
    where
        Self: Sized,
    {
        Map(self, f, PhantomData)
    }

    /// Transform all outputs of this parser to a predetermined value.
    fn to<U: Clone>(self, value: U) -> To<Self, V, U>
    where
        Self: Sized,
    {
        To(self, value, PhantomData)
    }

    /// Ignore the output of this parser, yielding `()` instead.
    fn ignored(self) -> Ignored<Self, V>
    where
        Self: Sized,
    {
        To(self, (), PhantomData)
    }

    /// Parse one thing and then another, yielding both outputs as a tuple.
    ///
    /// Sequencing is strictly left to right, and it is where recovery
    /// composes: when the first parser recovers, the second runs from each
    /// surviving repair and the results are merged back into one reply.
    fn then<U, P: Parser<S, U>>(self, other: P) -> Then<Self, P>
    where
        Self: Sized,
    {
        Then(self, other)
    }

    /// Parse one thing and then another, yielding only the first output.
    fn then_ignore<U, P: Parser<S, U>>(self, other: P) -> ThenIgnore<Self, P, V, U>
    where
        Self: Sized,
    {
        Map(Then(self, other), |(v, _)| v, PhantomData)
    }

    /// Parse one thing and then another, yielding only the second output.
    fn ignore_then<U, P: Parser<S, U>>(self, other: P) -> IgnoreThen<Self, P, V, U>
    where
        Self: Sized,
    {
        Map(Then(self, other), |(_, u)| u, PhantomData)
    }

    /// Invoke a parser built from this parser's output, running it over the
    /// rest of the input.
    fn then_with<U, P, F>(self, f: F) -> ThenWith<Self, F, V>
    where
        Self: Sized,
        F: Fn(V) -> P,
        P: Parser<S, U>,
    {
        ThenWith(self, f, PhantomData)
    }

    /// Parse one thing or, on an uncommitted failure, another.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend::prelude::*;
    ///
    /// let sign = just('+').to(1).or(just('-').to(-1));
    /// assert_eq!(sign.parse("+"), Ok(1));
    /// assert_eq!(sign.parse("-"), Ok(-1));
    /// assert!(sign.parse("*").is_err());
    /// ```
    fn or<P: Parser<S, V>>(self, other: P) -> Or<Self, P>
    where
        Self: Sized,
    {
        Or(self, other)
    }

    /// Attempt to parse something, succeeding with `None` if it is absent.
    fn or_not(self) -> OrNot<Self>
    where
        Self: Sized,
    {
        OrNot(self)
    }

    /// Parse this pattern any number of times, including zero.
    ///
    /// A zero-width success ends the repetition immediately rather than
    /// looping forever.
    fn repeated(self) -> Repeated<Self>
    where
        Self: Sized,
    {
        Repeated(self, 0)
    }

    /// Parse this pattern at least `min` times.
    fn repeated_at_least(self, min: usize) -> Repeated<Self>
    where
        Self: Sized,
    {
        Repeated(self, min)
    }

    /// Parse this pattern separated by another, yielding the pattern's
    /// outputs. The list may be empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend::prelude::*;
    ///
    /// let list = just('x').separated_by(just(','));
    /// assert_eq!(list.parse("x,x,x"), Ok(vec!['x', 'x', 'x']));
    /// ```
    fn separated_by<U, P: Parser<S, U>>(self, sep: P) -> SeparatedBy<Self, P, V, U>
    where
        Self: Sized + Clone,
    {
        fn flatten<T>(list: Option<(T, Vec<T>)>) -> Vec<T> {
            match list {
                None => Vec::new(),
                Some((head, tail)) => {
                    let mut items = Vec::with_capacity(tail.len() + 1);
                    items.push(head);
                    items.extend(tail);
                    items
                }
            }
        }
        Map(
            OrNot(Then(
                self.clone(),
                Repeated(Map(Then(sep, self), |(_, v)| v, PhantomData), 0),
            )),
            flatten,
            PhantomData,
        )
    }

    /// Parse this pattern surrounded by two others, discarding their
    /// outputs.
    fn delimited_by<L, R, VL, VR>(self, open: L, close: R) -> DelimitedBy<Self, L, R, VL, V, VR>
    where
        Self: Sized,
        L: Parser<S, VL>,
        R: Parser<S, VR>,
    {
        Map(
            Then(open, Map(Then(self, close), |(v, _)| v, PhantomData)),
            |(_, v)| v,
            PhantomData,
        )
    }

    /// Label the pattern parsed by this parser for more useful error
    /// messages.
    ///
    /// The label replaces the expected set of a failure that did not
    /// consume input; committed failures keep the description of the point
    /// where they actually failed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mend::prelude::*;
    ///
    /// let zero = just('0').labelled("zero");
    /// assert_eq!(
    ///     zero.parse("x").unwrap_err().to_string(),
    ///     "at 0: expected zero",
    /// );
    /// ```
    fn labelled(self, label: impl Into<Rc<str>>) -> Label<Self>
    where
        Self: Sized,
    {
        Label(self, label.into())
    }

    /// Run this parser with recovery suspended and report any failure as
    /// uncommitted, so an enclosing choice can backtrack past it.
    fn attempt(self) -> Attempt<Self>
    where
        Self: Sized,
    {
        Attempt(self)
    }

    /// Box the parser, erasing its type.
    ///
    /// Useful for naming parser types, breaking up compile-time type
    /// growth, and storing parsers in data structures.
    fn boxed<'a>(self) -> BoxedParser<'a, S, V>
    where
        Self: Sized + 'a,
    {
        BoxedParser(Rc::new(self))
    }
}

impl<'a, S: Stream + ?Sized, V, T: Parser<S, V>> Parser<S, V> for &'a T {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        T::parse_at(*self, stream, pos, ctx, mode)
    }
}

/// See [`Parser::boxed`].
///
/// The inner value is reference-counted, so cloning a boxed parser is
/// cheap and shares the underlying parser.
pub struct BoxedParser<'a, S: Stream + ?Sized, V>(Rc<dyn Parser<S, V> + 'a>);

impl<'a, S: Stream + ?Sized, V> Clone for BoxedParser<'a, S, V> {
    fn clone(&self) -> Self {
        BoxedParser(self.0.clone())
    }
}

impl<'a, S: Stream + ?Sized, V> Parser<S, V> for BoxedParser<'a, S, V> {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        self.0.parse_at(stream, pos, ctx, mode)
    }
}
