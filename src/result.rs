use std::rc::Rc;

use crate::chain::Chain;
use crate::error::{ErrorItem, ParseError};
use crate::span::{Ctx, Loc};

/// The set of labels a parser would have accepted at a position.
pub type Expected = Chain<Rc<str>>;

/// A repair history: the operations applied before the current one.
pub type OpList = Chain<OpItem>;

/// A single input transformation applied during recovery.
#[derive(Clone, Debug)]
pub enum RepairOp {
    /// Skip `count` stream units starting at `loc`.
    Skip {
        /// How many stream units were discarded.
        count: usize,
        /// Where the discarded input began.
        loc: Loc,
    },
    /// Insert a synthesized element at `loc`.
    Insert {
        /// Rendering of the synthesized element for diagnostics.
        label: Rc<str>,
        /// Where the element was inserted.
        loc: Loc,
    },
}

impl RepairOp {
    pub(crate) fn loc(&self) -> Loc {
        match self {
            RepairOp::Skip { loc, .. } => *loc,
            RepairOp::Insert { loc, .. } => *loc,
        }
    }
}

/// A repair operation together with the labels expected at its site.
#[derive(Clone, Debug)]
pub struct OpItem {
    pub(crate) op: RepairOp,
    pub(crate) expected: Expected,
}

/// A repair whose continuation has consumed input.
///
/// `op` and `expected` describe the most recent operation, not yet folded
/// into `ops`; the full history is `ops` followed by `op`.
#[derive(Clone, Debug)]
pub struct Selected<V> {
    pub(crate) selected_at: usize,
    pub(crate) prefix_cost: usize,
    pub(crate) pos: usize,
    pub(crate) count: usize,
    pub(crate) value: V,
    pub(crate) ctx: Ctx,
    pub(crate) op: RepairOp,
    pub(crate) expected: Expected,
    pub(crate) consumed: bool,
    pub(crate) ops: OpList,
}

/// A repair whose continuation has not yet consumed input, still subject to
/// merging and pruning.
#[derive(Clone, Debug)]
pub struct Pending<V> {
    pub(crate) count: usize,
    pub(crate) value: V,
    pub(crate) ctx: Ctx,
    pub(crate) op: RepairOp,
    pub(crate) expected: Expected,
    pub(crate) consumed: bool,
    pub(crate) ops: OpList,
}

/// A failed parse that recovery turned into a usable result.
///
/// At least one of `selected`/`pending` is always present. `pos`, `loc` and
/// `expected` describe the original failure site.
#[derive(Clone, Debug)]
pub struct Recovered<V> {
    pub(crate) selected: Option<Selected<V>>,
    pub(crate) pending: Option<Pending<V>>,
    pub(crate) pos: usize,
    pub(crate) loc: Loc,
    pub(crate) expected: Expected,
    pub(crate) consumed: bool,
}

/// A failed parse.
#[derive(Clone, Debug)]
pub struct Failure {
    /// Position of the failure.
    pub pos: usize,
    /// Location of the failure.
    pub loc: Loc,
    /// Labels that would have been accepted at `pos`.
    pub expected: Expected,
    /// Whether input was consumed before failing. A consumed failure is
    /// committed: an enclosing choice will not try further alternatives.
    pub consumed: bool,
}

impl Failure {
    pub(crate) fn into_error(self) -> ParseError {
        ParseError::new(vec![ErrorItem {
            loc: self.loc,
            expected: self.expected.iter().map(|s| s.to_string()).collect(),
        }])
    }
}

/// The outcome of running a parser at a position.
pub enum Reply<V> {
    /// The parser matched.
    Ok {
        /// The parsed value.
        value: V,
        /// Position just past the match.
        pos: usize,
        /// Context to continue from.
        ctx: Ctx,
        /// Labels that could have extended the match at `pos`.
        expected: Expected,
        /// Whether the match consumed input.
        consumed: bool,
    },
    /// The parser failed.
    Err(Failure),
    /// The parser failed but produced one or more repairs.
    Recovered(Recovered<V>),
}

impl<V> Reply<V> {
    pub(crate) fn ok(value: V, pos: usize, ctx: Ctx) -> Reply<V> {
        Reply::Ok {
            value,
            pos,
            ctx,
            expected: Chain::new(),
            consumed: false,
        }
    }

    pub(crate) fn ok_consumed(value: V, pos: usize, ctx: Ctx) -> Reply<V> {
        Reply::Ok {
            value,
            pos,
            ctx,
            expected: Chain::new(),
            consumed: true,
        }
    }

    pub(crate) fn err(pos: usize, loc: Loc, expected: Expected) -> Reply<V> {
        Reply::Err(Failure {
            pos,
            loc,
            expected,
            consumed: false,
        })
    }

    /// Whether this reply consumed input.
    pub fn consumed(&self) -> bool {
        match self {
            Reply::Ok { consumed, .. } => *consumed,
            Reply::Err(f) => f.consumed,
            Reply::Recovered(r) => r.consumed,
        }
    }

    /// Transform the value of the reply, leaving positions and repairs
    /// unchanged. Applies to the success value and to every repair's value.
    pub(crate) fn map<U>(self, f: impl Fn(V) -> U) -> Reply<U> {
        match self {
            Reply::Ok {
                value,
                pos,
                ctx,
                expected,
                consumed,
            } => Reply::Ok {
                value: f(value),
                pos,
                ctx,
                expected,
                consumed,
            },
            Reply::Err(e) => Reply::Err(e),
            Reply::Recovered(r) => Reply::Recovered(Recovered {
                selected: r.selected.map(|s| Selected {
                    selected_at: s.selected_at,
                    prefix_cost: s.prefix_cost,
                    pos: s.pos,
                    count: s.count,
                    value: f(s.value),
                    ctx: s.ctx,
                    op: s.op,
                    expected: s.expected,
                    consumed: s.consumed,
                    ops: s.ops,
                }),
                pending: r.pending.map(|p| Pending {
                    count: p.count,
                    value: f(p.value),
                    ctx: p.ctx,
                    op: p.op,
                    expected: p.expected,
                    consumed: p.consumed,
                    ops: p.ops,
                }),
                pos: r.pos,
                loc: r.loc,
                expected: r.expected,
                consumed: r.consumed,
            }),
        }
    }

    /// Fold a preceding step's trailing expectations into this reply.
    ///
    /// When this reply did not move past the preceding step's end position,
    /// failures there could equally have been continuations of the prefix,
    /// so both label sets apply. Once both sides consumed input the prefix
    /// labels are stale and the reply is returned untouched.
    pub(crate) fn merge_expected(self, expected: Expected, consumed: bool) -> Reply<V> {
        match self {
            Reply::Ok {
                value,
                pos,
                ctx,
                expected: own,
                consumed: own_consumed,
            } => {
                if consumed && own_consumed {
                    Reply::Ok {
                        value,
                        pos,
                        ctx,
                        expected: own,
                        consumed: own_consumed,
                    }
                } else {
                    Reply::Ok {
                        value,
                        pos,
                        ctx,
                        expected: Chain::append(expected, own),
                        consumed: consumed || own_consumed,
                    }
                }
            }
            Reply::Err(f) => {
                if consumed && f.consumed {
                    Reply::Err(f)
                } else {
                    Reply::Err(Failure {
                        expected: Chain::append(expected, f.expected),
                        consumed: consumed || f.consumed,
                        ..f
                    })
                }
            }
            Reply::Recovered(r) => {
                if consumed && r.consumed {
                    Reply::Recovered(r)
                } else {
                    Reply::Recovered(Recovered {
                        expected: Chain::append(expected, r.expected),
                        consumed: consumed || r.consumed,
                        ..r
                    })
                }
            }
        }
    }

    /// Replace the expectations of an unconsumed reply with a label.
    ///
    /// Within a recovered reply, a pending repair that resumes at the
    /// failure site and has no label of its own picks up the new one; all
    /// other repairs keep their original descriptions.
    pub(crate) fn set_expected(self, expected: Expected) -> Reply<V> {
        match self {
            Reply::Ok {
                value,
                pos,
                ctx,
                expected: own,
                consumed,
            } => {
                if consumed {
                    Reply::Ok {
                        value,
                        pos,
                        ctx,
                        expected: own,
                        consumed,
                    }
                } else {
                    Reply::Ok {
                        value,
                        pos,
                        ctx,
                        expected,
                        consumed,
                    }
                }
            }
            Reply::Err(f) => {
                if f.consumed {
                    Reply::Err(f)
                } else {
                    Reply::Err(Failure { expected, ..f })
                }
            }
            Reply::Recovered(mut r) => {
                if r.consumed {
                    return Reply::Recovered(r);
                }
                if let Some(p) = &mut r.pending {
                    if p.expected.is_empty() && p.op.loc().pos == r.pos {
                        p.expected = expected.clone();
                    }
                }
                r.expected = expected;
                Reply::Recovered(r)
            }
        }
    }

    /// Replace only the top-level expectations of an unconsumed reply,
    /// leaving repair descriptions alone. Used when a choice merges the
    /// label sets of its alternatives.
    pub(crate) fn with_expected(self, expected: Expected) -> Reply<V> {
        match self {
            Reply::Recovered(r) => {
                if r.consumed {
                    Reply::Recovered(r)
                } else {
                    Reply::Recovered(Recovered { expected, ..r })
                }
            }
            other => other.set_expected(expected),
        }
    }

    /// Restore a saved context on every branch of the reply. Layout
    /// combinators use this to unwind the anchor on exit.
    pub(crate) fn with_ctx(self, ctx: Ctx) -> Reply<V> {
        match self {
            Reply::Ok {
                value,
                pos,
                expected,
                consumed,
                ..
            } => Reply::Ok {
                value,
                pos,
                ctx,
                expected,
                consumed,
            },
            Reply::Err(f) => Reply::Err(f),
            Reply::Recovered(mut r) => {
                if let Some(s) = &mut r.selected {
                    s.ctx = ctx;
                }
                if let Some(p) = &mut r.pending {
                    p.ctx = ctx;
                }
                Reply::Recovered(r)
            }
        }
    }
}

impl<V> Recovered<V> {
    /// The best surviving repair: a selected repair proved itself by
    /// consuming input and always wins over a pending one.
    pub(crate) fn into_best(self) -> (V, ParseError) {
        if let Some(sel) = self.selected {
            let items = collect_items(&sel.ops, &sel.op, &sel.expected);
            (sel.value, ParseError::new(items))
        } else {
            let pen = self
                .pending
                .expect("recovered result with neither selected nor pending repair");
            let items = collect_items(&pen.ops, &pen.op, &pen.expected);
            (pen.value, ParseError::new(items))
        }
    }
}

fn collect_items(ops: &OpList, op: &RepairOp, expected: &Expected) -> Vec<ErrorItem> {
    let mut items: Vec<ErrorItem> = ops
        .iter()
        .map(|item| ErrorItem {
            loc: item.op.loc(),
            expected: item.expected.iter().map(|s| s.to_string()).collect(),
        })
        .collect();
    items.push(ErrorItem {
        loc: op.loc(),
        expected: expected.iter().map(|s| s.to_string()).collect(),
    });
    items
}
