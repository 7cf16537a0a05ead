use std::cell::RefCell;
use std::rc::Rc;

use crate::result::Reply;
use crate::span::{Ctx, RecoveryMode};
use crate::stream::Stream;
use crate::Parser;

/// A forward-declared parser, for grammars that refer to themselves.
///
/// A `Recursive` is a handle to a shared cell holding the eventual parser
/// body. Cloning the handle shares the cell, so a grammar can mention the
/// parser before [`define`](Recursive::define) installs its body. Using a
/// handle whose body was never installed is a programmer error and panics.
///
/// # Examples
///
/// ```
/// use mend::prelude::*;
///
/// // Nested parentheses: the grammar refers to itself.
/// let nested = recursive(|nested| {
///     nested.delimited_by(just('('), just(')')).or_not().map(
///         |inner: Option<usize>| inner.map_or(0, |depth| depth + 1),
///     )
/// });
///
/// assert_eq!(nested.parse("((()))"), Ok(3));
/// ```
pub struct Recursive<'a, S: Stream + ?Sized, V> {
    cell: Rc<RefCell<Option<Rc<dyn Parser<S, V> + 'a>>>>,
}

impl<'a, S: Stream + ?Sized, V> Clone for Recursive<'a, S, V> {
    fn clone(&self) -> Self {
        Recursive {
            cell: self.cell.clone(),
        }
    }
}

impl<'a, S: Stream + ?Sized, V> Recursive<'a, S, V> {
    /// Declare a parser whose body will be installed later.
    pub fn declare() -> Self {
        Recursive {
            cell: Rc::new(RefCell::new(None)),
        }
    }

    /// Install the body. May be called once; calling it again panics.
    pub fn define<P: Parser<S, V> + 'a>(&self, parser: P) {
        let mut slot = self.cell.borrow_mut();
        assert!(
            slot.is_none(),
            "recursive parser defined more than once"
        );
        *slot = Some(Rc::new(parser));
    }
}

impl<'a, S: Stream + ?Sized, V> Parser<S, V> for Recursive<'a, S, V> {
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        let body = self
            .cell
            .borrow()
            .as_ref()
            .expect("recursive parser used before being defined")
            .clone();
        body.parse_at(stream, pos, ctx, mode)
    }
}

/// Build a recursive parser by handing the grammar a handle to itself.
pub fn recursive<'a, S, V, P>(f: impl FnOnce(Recursive<'a, S, V>) -> P) -> Recursive<'a, S, V>
where
    S: Stream + ?Sized,
    P: Parser<S, V> + 'a,
{
    let handle = Recursive::declare();
    handle.define(f(handle.clone()));
    handle
}
