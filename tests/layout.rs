//! Indentation-sensitive parsing with the layout combinators.

use mend::prelude::*;
use mend::text;
use pretty_assertions::assert_eq;

fn ws() -> impl Parser<str, String> + Clone {
    text::regex(r"[ \n]*")
}

fn letter() -> impl Parser<str, char> + Clone {
    text::letter()
}

#[test]
fn aligned_items_parse_at_the_anchor_column() {
    let item = aligned(letter()).then_ignore(ws());
    let doc = ws()
        .ignore_then(block(item.repeated()))
        .then_ignore(end());
    assert_eq!(doc.parse("a\nb\nc\n"), Ok(vec!['a', 'b', 'c']));
}

#[test]
fn misaligned_items_end_the_block() {
    let item = aligned(letter()).then_ignore(ws());
    let doc = ws()
        .ignore_then(block(item.repeated()))
        .then_ignore(end());
    // The indented 'b' is not at the anchor column, so the block ends and
    // the leftover input trips the end-of-file check.
    assert_eq!(
        doc.parse("a\n  b\n").unwrap_err().to_string(),
        "at 4: expected indentation or end of file",
    );
}

#[test]
fn indented_children_attach_to_their_header() {
    let child = aligned(letter()).then_ignore(ws());
    let stmt = aligned(letter())
        .then_ignore(text::literal(":"))
        .then_ignore(ws())
        .then(indented(2, child.repeated()));
    let doc = ws()
        .ignore_then(block(stmt.repeated()))
        .then_ignore(end());

    // The anchor returns to the outer column after each indented body, so
    // 'y' starts a new statement.
    assert_eq!(
        doc.parse("x:\n  a\n  b\ny:\n  c\n"),
        Ok(vec![('x', vec!['a', 'b']), ('y', vec!['c'])]),
    );
}

#[test]
fn a_wrong_indent_level_is_an_error_not_a_recovery() {
    let child = aligned(letter()).then_ignore(ws());
    let stmt = aligned(letter())
        .then_ignore(text::literal(":"))
        .then_ignore(ws())
        .then(indented(2, child.repeated()));
    let doc = ws()
        .ignore_then(block(stmt.repeated()))
        .then_ignore(end());

    assert_eq!(
        doc.parse("x:\n a\n").unwrap_err().to_string(),
        "at 4: expected indentation",
    );
    // Recovery does not synthesize indentation either.
    let (value, err) = doc.parse_recovery("x:\n a\n");
    assert_eq!(value, None);
    assert!(err.is_some());
}
