//! The algebraic laws the combinators are expected to satisfy, checked over
//! generated inputs.

use std::cell::Cell;

use mend::chain::Chain;
use mend::prelude::*;
use mend::{Ctx, RecoveryMode, Reply, Stream};
use proptest::prelude::*;

/// `just`, pinned to a `str` input so call chains don't leave the stream
/// type ambiguous between `str` and `[char]` (both have `Item = char`).
fn just_char(c: char) -> impl Parser<str, char> + Clone {
    just(c)
}

/// `pure`, pinned to a `str` input for the same reason as [`just_char`].
fn pure_char(c: char) -> impl Parser<str, char> + Clone {
    pure(c)
}

/// Render a parse outcome in a comparable form.
fn outcome<V: std::fmt::Debug>(
    parser: &impl Parser<str, V>,
    input: &str,
) -> (Option<String>, Option<String>) {
    match parser.parse(input) {
        Ok(value) => (Some(format!("{value:?}")), None),
        Err(err) => (None, Some(err.to_string())),
    }
}

/// Render a recovering parse outcome in a comparable form.
fn recovery_outcome<V: std::fmt::Debug>(
    parser: &impl Parser<str, V>,
    input: &str,
) -> (Option<String>, Option<String>) {
    let (value, err) = parser.parse_recovery(input);
    (
        value.map(|v| format!("{v:?}")),
        err.map(|e| e.to_string()),
    )
}

/// Like [`recovery_outcome`], but blind to the diagnostic text. The
/// associativity laws fix the recovered value and whether repairs were
/// needed; the repair trail itself depends on how the grammar is grouped.
fn recovery_value<V: std::fmt::Debug>(
    parser: &impl Parser<str, V>,
    input: &str,
) -> (Option<String>, bool) {
    let (value, err) = parser.parse_recovery(input);
    (value.map(|v| format!("{v:?}")), err.is_some())
}

proptest! {
    // pure(x) · p behaves exactly like p, paired with x.
    #[test]
    fn pure_is_a_left_identity_for_sequencing(input in "[abx]{0,6}") {
        let plain = just_char('a').then(just_char('b'));
        let padded = pure(()).ignore_then(just_char('a').then(just_char('b')));
        prop_assert_eq!(outcome(&plain, &input), outcome(&padded, &input));
        prop_assert_eq!(
            recovery_outcome(&plain, &input),
            recovery_outcome(&padded, &input),
        );
    }

    // (a · b) · c and a · (b · c) agree on value, position and consumption.
    #[test]
    fn sequencing_is_associative(input in "[abcx]{0,8}") {
        let left = just_char('a')
            .then(just_char('b'))
            .then(just_char('c'))
            .map(|((a, b), c): ((char, char), char)| (a, b, c));
        let right = just_char('a')
            .then(just_char('b').then(just_char('c')))
            .map(|(a, (b, c)): (char, (char, char))| (a, b, c));
        prop_assert_eq!(outcome(&left, &input), outcome(&right, &input));
        prop_assert_eq!(
            recovery_value(&left, &input),
            recovery_value(&right, &input),
        );
    }

    // a | (b | c) and (a | b) | c agree.
    #[test]
    fn choice_is_associative(input in "[abcx]{0,4}") {
        let left = just_char('a').to(1).or(just_char('b').to(2).or(just_char('c').to(3)));
        let right = just_char('a').to(1).or(just_char('b').to(2)).or(just_char('c').to(3));
        prop_assert_eq!(outcome(&left, &input), outcome(&right, &input));
        prop_assert_eq!(
            recovery_value(&left, &input),
            recovery_value(&right, &input),
        );
    }

    // Mapping with the identity changes nothing; maps compose.
    #[test]
    fn map_respects_identity_and_composition(input in "[ax]{0,3}") {
        let plain = just_char('a');
        let mapped = just_char('a').map(|c: char| c);
        prop_assert_eq!(outcome(&plain, &input), outcome(&mapped, &input));

        let twice = just_char('a').map(|c: char| c as u32).map(|n: u32| n + 1);
        let once = just_char('a').map(|c: char| c as u32 + 1);
        prop_assert_eq!(outcome(&twice, &input), outcome(&once, &input));
        prop_assert_eq!(
            recovery_outcome(&twice, &input),
            recovery_outcome(&once, &input),
        );
    }

    // With recovery disabled, no reply is ever recovered.
    #[test]
    fn disabled_recovery_never_recovers(input in "[a,()x ]{0,8}") {
        let list = just_char('a')
            .separated_by(just_char(','))
            .delimited_by(just_char('('), just_char(')'))
            .then_ignore(end());
        let reply = list.parse_at(
            input.as_str(),
            0,
            Ctx::new(RecoveryMode::Disabled),
            RecoveryMode::Disabled,
        );
        prop_assert!(!matches!(reply, Reply::Recovered(_)));
    }

    // With recovery enabled, input that matches the grammar parses
    // cleanly, with no repairs.
    #[test]
    fn matching_input_never_needs_repairs(n in 0usize..5) {
        let list = just_char('a')
            .separated_by(just_char(','))
            .delimited_by(just_char('('), just_char(')'))
            .then_ignore(end());
        let input = format!("({})", vec!["a"; n].join(","));
        let (value, err) = list.parse_recovery(input.as_str());
        prop_assert_eq!(err, None);
        prop_assert_eq!(value, Some(vec!['a'; n]));
    }
}

/// A probe that records whether it was ever invoked.
struct Probe<'a>(&'a Cell<bool>);

impl<'a, S: Stream + ?Sized> Parser<S, char> for Probe<'a> {
    fn parse_at(&self, _stream: &S, pos: usize, ctx: Ctx, _mode: RecoveryMode) -> Reply<char> {
        self.0.set(true);
        Reply::Ok {
            value: 'q',
            pos,
            ctx,
            expected: Chain::new(),
            consumed: false,
        }
    }
}

#[test]
fn a_zero_width_success_commits_the_choice() {
    // p | q returns p's zero-width success without invoking q.
    let invoked = Cell::new(false);
    let p = pure_char('v').or(Probe(&invoked));
    assert_eq!(p.parse(""), Ok('v'));
    assert!(!invoked.get());
}

#[test]
fn uncommitted_failures_reach_the_next_alternative() {
    let invoked = Cell::new(false);
    let p = just_char('z').or(Probe(&invoked));
    assert_eq!(p.parse(""), Ok('q'));
    assert!(invoked.get());
}
