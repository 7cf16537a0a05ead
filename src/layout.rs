//! Indentation-sensitive combinators.
//!
//! These compare the current column against the anchor column recorded in
//! the context. A failed indentation check is an ordinary error, never a
//! recovery: there is no local way to synthesize whitespace that stays
//! consistent with the surrounding structure.

use std::rc::Rc;

use crate::chain::Chain;
use crate::result::Reply;
use crate::span::{Ctx, RecoveryMode};
use crate::stream::Stream;
use crate::Parser;

fn indentation_expected() -> Chain<Rc<str>> {
    Chain::single(Rc::from("indentation"))
}

/// See [`block`].
#[derive(Copy, Clone)]
pub struct Block<A>(A);

/// Run `parser` with the anchor set to the current column, restoring the
/// outer anchor afterwards whether the parser succeeds, fails or recovers.
pub fn block<A>(parser: A) -> Block<A> {
    Block(parser)
}

impl<S, A, V> Parser<S, V> for Block<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        let ctx = ctx.update_loc(stream, pos);
        self.0
            .parse_at(stream, pos, ctx.with_anchor(ctx.loc.col), mode)
            .with_ctx(ctx)
    }
}

/// See [`aligned`].
#[derive(Copy, Clone)]
pub struct Aligned<A>(A);

/// Run `parser` only if the current column equals the anchor; otherwise
/// fail without consuming input.
pub fn aligned<A>(parser: A) -> Aligned<A> {
    Aligned(parser)
}

impl<S, A, V> Parser<S, V> for Aligned<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        let ctx = ctx.update_loc(stream, pos);
        if ctx.anchor == ctx.loc.col {
            self.0.parse_at(stream, pos, ctx, mode)
        } else {
            Reply::err(pos, ctx.loc, indentation_expected())
        }
    }
}

/// See [`indented`].
#[derive(Copy, Clone)]
pub struct Indented<A> {
    parser: A,
    delta: usize,
}

/// Run `parser` only if the current column is exactly `delta` columns past
/// the anchor; the anchor moves to the new column for the inner parser and
/// is restored on exit.
pub fn indented<A>(delta: usize, parser: A) -> Indented<A> {
    Indented { parser, delta }
}

impl<S, A, V> Parser<S, V> for Indented<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        let ctx = ctx.update_loc(stream, pos);
        let level = ctx.loc.col;
        if ctx.anchor + self.delta == level {
            self.parser
                .parse_at(stream, pos, ctx.with_anchor(level), mode)
                .with_ctx(ctx)
        } else {
            Reply::err(pos, ctx.loc, indentation_expected())
        }
    }
}
