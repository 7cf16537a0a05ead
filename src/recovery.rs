//! The recovery engine.
//!
//! Two operations drive every recovered parse: [`continue_parse`] re-enters
//! the parser that follows a recovered prefix from each surviving repair,
//! and [`join_repairs`] merges the recoveries of two choice alternatives.
//! Both keep at most one selected and one pending repair per subtree, which
//! is what bounds the whole search.

use tracing::trace;

use crate::chain::Chain;
use crate::result::{Failure, OpItem, Pending, Recovered, Reply, Selected};
use crate::span::Ctx;

/// Whether `cand` should replace `cur` as the surviving selected repair.
///
/// Repairs compare by `(selected_at, prefix_cost, count)`, all ascending: a
/// repair that re-anchored at an earlier failure site beats one that only
/// proved itself later, then cheaper prefixes and cheaper repair chains win.
/// Ties keep the first repair encountered.
fn prefers<V>(cand: &Selected<V>, cur: &Selected<V>) -> bool {
    (cand.selected_at, cand.prefix_cost, cand.count)
        < (cur.selected_at, cur.prefix_cost, cur.count)
}

/// Run the continuation `parse` from every surviving repair of `ra` and
/// merge the outcomes into a single reply for the whole sequence.
///
/// The continuation is invoked at most twice: once from the selected
/// repair's resume point and once from the pending repair's (the original
/// failure position). `merge` combines the repair's value with the
/// continuation's; it may run once per branch. When no repair survives the
/// continuation, the failure is committed: the prefix it replayed has
/// consumed input.
pub(crate) fn continue_parse<V, U, X>(
    ra: Recovered<V>,
    parse: impl Fn(&V, usize, Ctx) -> Reply<U>,
    merge: impl Fn(&V, U) -> X,
) -> Reply<X> {
    let Recovered {
        selected,
        pending,
        pos,
        loc,
        expected,
        consumed,
    } = ra;

    let mut best = match selected {
        Some(sa) => {
            let rb = parse(&sa.value, sa.pos, sa.ctx);
            append_selected(sa, rb, &merge)
        }
        None => None,
    };

    let pending = match pending {
        Some(pa) => {
            let rb = parse(&pa.value, pos, pa.ctx);
            let (promoted, still_pending) = append_pending(&pa, pos, rb, &merge);
            if let Some(cand) = promoted {
                best = match best {
                    Some(cur) if !prefers(&cand, &cur) => Some(cur),
                    _ => {
                        trace!(
                            at = cand.selected_at,
                            count = cand.count,
                            "pending repair promoted"
                        );
                        Some(cand)
                    }
                };
            }
            still_pending
        }
        None => None,
    };

    if best.is_some() || pending.is_some() {
        Reply::Recovered(Recovered {
            selected: best,
            pending,
            pos,
            loc,
            expected,
            consumed,
        })
    } else {
        Reply::Err(Failure {
            pos,
            loc,
            expected,
            consumed: true,
        })
    }
}

/// Extend a selected repair with the outcome of its continuation.
fn append_selected<V, U, X>(
    rep: Selected<V>,
    rb: Reply<U>,
    merge: &impl Fn(&V, U) -> X,
) -> Option<Selected<X>> {
    match rb {
        Reply::Ok {
            value,
            pos,
            ctx,
            consumed,
            ..
        } => Some(Selected {
            selected_at: rep.selected_at,
            prefix_cost: rep.prefix_cost,
            pos,
            count: rep.count,
            value: merge(&rep.value, value),
            ctx,
            op: rep.op,
            expected: rep.expected,
            consumed: rep.consumed || consumed,
            ops: rep.ops,
        }),
        Reply::Recovered(r) => match (r.selected, r.pending) {
            // A cheaper pending continuation beats a selected one here:
            // neither has consumed beyond this repair yet.
            (sb, Some(pb)) if sb.as_ref().map_or(true, |sb| sb.count > pb.count) => {
                Some(Selected {
                    selected_at: rep.selected_at,
                    prefix_cost: rep.prefix_cost,
                    pos: rep.pos,
                    count: rep.count + pb.count,
                    value: merge(&rep.value, pb.value),
                    ctx: pb.ctx,
                    op: pb.op,
                    expected: pb.expected,
                    consumed: pb.consumed,
                    ops: Chain::append(
                        rep.ops,
                        Chain::cons(
                            OpItem {
                                op: rep.op,
                                expected: rep.expected,
                            },
                            pb.ops,
                        ),
                    ),
                })
            }
            (Some(sb), _) => Some(Selected {
                selected_at: rep.selected_at,
                prefix_cost: rep.prefix_cost,
                pos: sb.pos,
                count: rep.count + sb.count,
                value: merge(&rep.value, sb.value),
                ctx: sb.ctx,
                op: sb.op,
                expected: sb.expected,
                consumed: sb.consumed,
                ops: Chain::append(
                    rep.ops,
                    Chain::cons(
                        OpItem {
                            op: rep.op,
                            expected: rep.expected,
                        },
                        sb.ops,
                    ),
                ),
            }),
            (None, None) => None,
            // Unreachable: when `sb` is `None`, the first arm's guard
            // (`sb.as_ref().map_or(true, ...)`) always evaluates to `true`,
            // so this combination is already handled above.
            (None, Some(_)) => unreachable!(),
        },
        Reply::Err(_) => None,
    }
}

/// Extend a pending repair with the outcome of its continuation. A
/// continuation that consumed input promotes the repair to selected,
/// anchored at the failure position `pos`.
fn append_pending<V, U, X>(
    rep: &Pending<V>,
    pos: usize,
    rb: Reply<U>,
    merge: &impl Fn(&V, U) -> X,
) -> (Option<Selected<X>>, Option<Pending<X>>) {
    match rb {
        Reply::Ok {
            value,
            pos: end,
            ctx,
            consumed,
            ..
        } => {
            if consumed {
                (
                    Some(Selected {
                        selected_at: pos,
                        prefix_cost: rep.count,
                        pos: end,
                        count: rep.count,
                        value: merge(&rep.value, value),
                        ctx,
                        op: rep.op.clone(),
                        expected: rep.expected.clone(),
                        consumed: true,
                        ops: rep.ops.clone(),
                    }),
                    None,
                )
            } else {
                (
                    None,
                    Some(Pending {
                        count: rep.count,
                        value: merge(&rep.value, value),
                        ctx,
                        op: rep.op.clone(),
                        expected: rep.expected.clone(),
                        consumed: rep.consumed,
                        ops: rep.ops.clone(),
                    }),
                )
            }
        }
        Reply::Recovered(r) => {
            let selected = r.selected.map(|sb| Selected {
                selected_at: sb.selected_at,
                prefix_cost: rep.count + sb.prefix_cost,
                pos: sb.pos,
                count: sb.count,
                value: merge(&rep.value, sb.value),
                ctx: sb.ctx,
                op: sb.op,
                expected: sb.expected,
                consumed: sb.consumed,
                ops: Chain::append(
                    rep.ops.clone(),
                    Chain::cons(
                        OpItem {
                            op: rep.op.clone(),
                            expected: rep.expected.clone(),
                        },
                        sb.ops,
                    ),
                ),
            });
            let pending = r.pending.map(|pb| Pending {
                count: rep.count + pb.count,
                value: merge(&rep.value, pb.value),
                ctx: pb.ctx,
                op: pb.op,
                expected: pb.expected,
                consumed: pb.consumed,
                ops: Chain::append(
                    rep.ops.clone(),
                    Chain::cons(
                        OpItem {
                            op: rep.op.clone(),
                            expected: rep.expected.clone(),
                        },
                        pb.ops,
                    ),
                ),
            });
            (selected, pending)
        }
        Reply::Err(_) => (None, None),
    }
}

/// Merge the recoveries of two choice alternatives.
///
/// Selected repairs keep the better of the two under the usual ordering;
/// pending repairs keep the cheaper. The failure site of a consumed side
/// wins outright; two unconsumed sides pool their expectations.
pub(crate) fn join_repairs<V>(ra: Recovered<V>, rb: Recovered<V>) -> Recovered<V> {
    trace!(left = ra.pos, right = rb.pos, "joining recovery alternatives");
    let selected = match (ra.selected, rb.selected) {
        (Some(sa), Some(sb)) => Some(if prefers(&sb, &sa) { sb } else { sa }),
        (sa, sb) => sa.or(sb),
    };
    let pending = match (ra.pending, rb.pending) {
        (Some(pa), Some(pb)) => Some(if pb.count < pa.count { pb } else { pa }),
        (pa, pb) => pa.or(pb),
    };
    if ra.consumed {
        Recovered {
            selected,
            pending,
            pos: ra.pos,
            loc: ra.loc,
            expected: ra.expected,
            consumed: true,
        }
    } else if rb.consumed {
        Recovered {
            selected,
            pending,
            pos: rb.pos,
            loc: rb.loc,
            expected: rb.expected,
            consumed: true,
        }
    } else {
        Recovered {
            selected,
            pending,
            pos: ra.pos,
            loc: ra.loc,
            expected: Chain::append(ra.expected, rb.expected),
            consumed: false,
        }
    }
}
