use std::marker::PhantomData;
use std::rc::Rc;

use crate::chain::Chain;
use crate::recovery::{continue_parse, join_repairs};
use crate::result::{Failure, Reply};
use crate::span::{Ctx, RecoveryMode};
use crate::stream::Stream;
use crate::Parser;

/// See [`Parser::map`].
#[derive(Copy, Clone)]
pub struct Map<A, F, O>(pub(crate) A, pub(crate) F, pub(crate) PhantomData<O>);

impl<S, A, O, U, F> Parser<S, U> for Map<A, F, O>
where
    S: Stream + ?Sized,
    A: Parser<S, O>,
    F: Fn(O) -> U,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<U> {
        self.0.parse_at(stream, pos, ctx, mode).map(|v| (self.1)(v))
    }
}

/// See [`Parser::to`].
#[derive(Copy, Clone)]
pub struct To<A, O, U>(pub(crate) A, pub(crate) U, pub(crate) PhantomData<O>);

impl<S, A, O, U> Parser<S, U> for To<A, O, U>
where
    S: Stream + ?Sized,
    A: Parser<S, O>,
    U: Clone,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<U> {
        self.0
            .parse_at(stream, pos, ctx, mode)
            .map(|_| self.1.clone())
    }
}

/// See [`Parser::then`].
#[derive(Copy, Clone)]
pub struct Then<A, B>(pub(crate) A, pub(crate) B);

impl<S, A, B, VA, VB> Parser<S, (VA, VB)> for Then<A, B>
where
    S: Stream + ?Sized,
    A: Parser<S, VA>,
    B: Parser<S, VB>,
    VA: Clone,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<(VA, VB)> {
        match self.0.parse_at(stream, pos, ctx, mode) {
            Reply::Err(f) => Reply::Err(f),
            Reply::Recovered(ra) => continue_parse(
                ra,
                |_, p, c| self.1.parse_at(stream, p, c, RecoveryMode::Armed),
                |va, vb| (va.clone(), vb),
            ),
            Reply::Ok {
                value,
                pos: end,
                ctx: after,
                expected,
                consumed,
            } => {
                let mode = ctx.maybe_allow(mode, consumed);
                self.1
                    .parse_at(stream, end, after, mode)
                    .map(|vb| (value.clone(), vb))
                    .merge_expected(expected, consumed)
            }
        }
    }
}

/// See [`Parser::or`].
#[derive(Copy, Clone)]
pub struct Or<A, B>(pub(crate) A, pub(crate) B);

impl<S, A, B, V> Parser<S, V> for Or<A, B>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
    B: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        // Both alternatives run with recovery suspended, so an uncommitted
        // failure falls through instead of synthesizing repairs that the
        // other alternative might parse past for free.
        let suspended = mode.disallow();
        let fa = match self.0.parse_at(stream, pos, ctx, suspended) {
            reply @ (Reply::Ok { .. } | Reply::Recovered(_)) => return reply,
            Reply::Err(f) if f.consumed => return Reply::Err(f),
            Reply::Err(f) => f,
        };
        let fb = match self.1.parse_at(stream, pos, ctx, suspended) {
            reply @ Reply::Ok { consumed: true, .. } => return reply,
            reply @ Reply::Ok { .. } => return reply.merge_expected(fa.expected, false),
            reply @ Reply::Recovered(_) => return reply,
            Reply::Err(f) if f.consumed => return Reply::Err(f),
            Reply::Err(f) => f,
        };
        let expected = Chain::append(fa.expected, fb.expected);
        if mode.is_armed() {
            let ra = self.0.parse_at(stream, pos, ctx, RecoveryMode::Armed);
            let rb = self.1.parse_at(stream, pos, ctx, RecoveryMode::Armed);
            match (ra, rb) {
                (Reply::Recovered(x), Reply::Recovered(y)) => {
                    return Reply::Recovered(join_repairs(x, y));
                }
                (Reply::Recovered(x), _) => {
                    return Reply::Recovered(x).with_expected(expected);
                }
                (_, Reply::Recovered(y)) => {
                    return Reply::Recovered(y).with_expected(expected);
                }
                _ => {}
            }
        }
        Reply::err(pos, ctx.loc_at(stream, pos), expected)
    }
}

/// See [`Parser::or_not`].
#[derive(Copy, Clone)]
pub struct OrNot<A>(pub(crate) A);

impl<S, A, V> Parser<S, Option<V>> for OrNot<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<Option<V>> {
        match self.0.parse_at(stream, pos, ctx, mode.disallow()) {
            reply @ (Reply::Ok { .. } | Reply::Recovered(_)) => reply.map(Some),
            Reply::Err(f) if f.consumed => Reply::Err(f),
            Reply::Err(f) => Reply::Ok {
                value: None,
                pos,
                ctx,
                expected: f.expected,
                consumed: false,
            },
        }
    }
}

/// See [`Parser::repeated`].
#[derive(Copy, Clone)]
pub struct Repeated<A>(pub(crate) A, pub(crate) usize);

impl<A> Repeated<A> {
    fn run<S, V>(
        &self,
        stream: &S,
        start: usize,
        start_ctx: Ctx,
        mode: RecoveryMode,
        at_least: usize,
    ) -> Reply<Vec<V>>
    where
        S: Stream + ?Sized,
        A: Parser<S, V>,
        V: Clone,
    {
        let suspended = mode.disallow();
        let mut items: Vec<V> = Vec::new();
        let mut pos = start;
        let mut ctx = start_ctx;
        let mut consumed = false;
        loop {
            match self.0.parse_at(stream, pos, ctx, suspended) {
                Reply::Ok {
                    consumed: false,
                    expected,
                    ..
                } => {
                    // A zero-width success would repeat forever; stop here
                    // without taking the value.
                    return Reply::Ok {
                        value: items,
                        pos,
                        ctx,
                        expected,
                        consumed,
                    };
                }
                Reply::Ok {
                    value,
                    pos: end,
                    ctx: after,
                    ..
                } => {
                    items.push(value);
                    pos = end;
                    ctx = after;
                    consumed = true;
                }
                Reply::Recovered(ra) => {
                    let prefix = items;
                    return continue_parse(
                        ra,
                        |_, p, c| self.run(stream, p, c, RecoveryMode::Armed, 0),
                        |item: &V, rest: Vec<V>| {
                            let mut out = prefix.clone();
                            out.push(item.clone());
                            out.extend(rest);
                            out
                        },
                    )
                    .merge_expected(Chain::new(), consumed);
                }
                Reply::Err(f) => {
                    if f.consumed || items.len() < at_least {
                        return Reply::Err(f);
                    }
                    return Reply::Ok {
                        value: items,
                        pos,
                        ctx,
                        expected: f.expected,
                        consumed,
                    };
                }
            }
        }
    }
}

impl<S, A, V> Parser<S, Vec<V>> for Repeated<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
    V: Clone,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<Vec<V>> {
        self.run(stream, pos, ctx, mode, self.1)
    }
}

/// See [`Parser::labelled`].
#[derive(Clone)]
pub struct Label<A>(pub(crate) A, pub(crate) Rc<str>);

impl<S, A, V> Parser<S, V> for Label<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        self.0
            .parse_at(stream, pos, ctx, mode)
            .set_expected(Chain::single(self.1.clone()))
    }
}

/// See [`Parser::attempt`].
#[derive(Copy, Clone)]
pub struct Attempt<A>(pub(crate) A);

impl<S, A, V> Parser<S, V> for Attempt<A>
where
    S: Stream + ?Sized,
    A: Parser<S, V>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<V> {
        match self.0.parse_at(stream, pos, ctx, mode.disallow()) {
            Reply::Err(f) => Reply::Err(Failure {
                consumed: false,
                ..f
            }),
            reply => reply,
        }
    }
}

/// See [`Parser::then_with`].
#[derive(Copy, Clone)]
pub struct ThenWith<A, F, O>(pub(crate) A, pub(crate) F, pub(crate) PhantomData<O>);

impl<S, A, F, P, VA, U> Parser<S, U> for ThenWith<A, F, VA>
where
    S: Stream + ?Sized,
    A: Parser<S, VA>,
    VA: Clone,
    F: Fn(VA) -> P,
    P: Parser<S, U>,
{
    fn parse_at(&self, stream: &S, pos: usize, ctx: Ctx, mode: RecoveryMode) -> Reply<U> {
        match self.0.parse_at(stream, pos, ctx, mode) {
            Reply::Err(f) => Reply::Err(f),
            Reply::Recovered(ra) => continue_parse(
                ra,
                |va, p, c| (self.1)(va.clone()).parse_at(stream, p, c, RecoveryMode::Armed),
                |_, u| u,
            ),
            Reply::Ok {
                value,
                pos: end,
                ctx: after,
                expected,
                consumed,
            } => {
                let mode = ctx.maybe_allow(mode, consumed);
                (self.1)(value)
                    .parse_at(stream, end, after, mode)
                    .merge_expected(expected, consumed)
            }
        }
    }
}

/// See [`Parser::ignored`].
pub type Ignored<A, O> = To<A, O, ()>;

/// See [`Parser::then_ignore`].
pub type ThenIgnore<A, B, VA, VB> = Map<Then<A, B>, fn((VA, VB)) -> VA, (VA, VB)>;

/// See [`Parser::ignore_then`].
pub type IgnoreThen<A, B, VA, VB> = Map<Then<A, B>, fn((VA, VB)) -> VB, (VA, VB)>;

/// See [`Parser::separated_by`].
pub type SeparatedBy<A, B, V, U> = Map<
    OrNot<Then<A, Repeated<IgnoreThen<B, A, U, V>>>>,
    fn(Option<(V, Vec<V>)>) -> Vec<V>,
    Option<(V, Vec<V>)>,
>;

/// See [`Parser::delimited_by`].
pub type DelimitedBy<A, L, R, VL, V, VR> = IgnoreThen<L, ThenIgnore<A, R, V, VR>, VL, V>;
