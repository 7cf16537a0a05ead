//! JSON parsing directly over character streams, without a separate lexer.

use mend::prelude::*;
use mend::text;
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq)]
enum Json {
    Null,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    List(Vec<Json>),
    Obj(Vec<(String, Json)>),
}

fn ows() -> impl Parser<str, String> + Clone {
    text::regex(r"[ \t\r\n]*")
}

/// A lexeme preceded by optional whitespace.
fn token(pat: &str) -> impl Parser<str, String> + Clone {
    text::regex_group(&format!(r"[ \t\r\n]*({pat})"), 1)
}

fn punct(p: &'static str) -> impl Parser<str, String> + Clone {
    ows().ignore_then(text::literal(p)).attempt()
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16).unwrap();
                out.push(char::from_u32(code).unwrap());
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn string_token() -> impl Parser<str, String> + Clone {
    token(r#""(?:[^"\\]|\\.)*""#)
        .map(|quoted: String| unescape(&quoted[1..quoted.len() - 1]))
        .labelled("string")
}

fn json() -> BoxedParser<'static, str, Json> {
    let value: Recursive<'static, str, Json> = Recursive::declare();

    let key = string_token().or(insert_labelled("a".to_string(), "string 'a'"));
    let member = key.then_ignore(punct(":")).then(value.clone());
    let object = member
        .separated_by(punct(","))
        .delimited_by(punct("{"), punct("}"))
        .map(Json::Obj)
        .labelled("object");
    let array = value
        .clone()
        .separated_by(punct(","))
        .delimited_by(punct("["), punct("]"))
        .map(Json::List)
        .labelled("list");

    let number = token(r"-?(?:0|[1-9][0-9]*)(?:\.[0-9]+(?:[eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)")
        .map(|t: String| Json::Num(t.parse().unwrap()))
        .labelled("number");
    let integer = token(r"-?(?:0|[1-9][0-9]*)")
        .map(|t: String| Json::Int(t.parse().unwrap()))
        .labelled("integer");
    let boolean = token(r"true|false")
        .map(|t: String| Json::Bool(t == "true"))
        .labelled("bool");
    let null = token(r"null").to(Json::Null).labelled("null");

    value.define(
        number
            .or(integer)
            .or(boolean)
            .or(null)
            .or(string_token().map(Json::Str))
            .or(insert_labelled(Json::Int(1), "integer '1'"))
            .or(object)
            .or(array)
            .labelled("value"),
    );

    value
        .then_ignore(ows())
        .then_ignore(end())
        .boxed()
}

fn obj(members: &[(&str, Json)]) -> Json {
    Json::Obj(
        members
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

#[test]
fn parses_well_formed_documents() {
    let parser = json();
    let cases: Vec<(&str, Json)> = vec![
        ("1", Json::Int(1)),
        (" -12 ", Json::Int(-12)),
        ("1.5e3", Json::Num(1500.0)),
        ("true", Json::Bool(true)),
        ("null", Json::Null),
        (r#""aAb""#, Json::Str("aAb".to_string())),
        (
            r#"{"bool": true, "list": [1, 2]}"#,
            obj(&[
                ("bool", Json::Bool(true)),
                ("list", Json::List(vec![Json::Int(1), Json::Int(2)])),
            ]),
        ),
        (
            "[1, [2, 3]]",
            Json::List(vec![
                Json::Int(1),
                Json::List(vec![Json::Int(2), Json::Int(3)]),
            ]),
        ),
    ];
    for (src, expected) in cases {
        assert_eq!(parser.parse(src), Ok(expected), "input: {src}");
    }
}

#[test]
fn reports_byte_positions_in_errors() {
    let parser = json();
    assert_eq!(
        parser.parse("").unwrap_err().to_string(),
        "at 0: expected value",
    );
    assert_eq!(
        parser.parse("1 1").unwrap_err().to_string(),
        "at 2: expected end of file",
    );
    assert_eq!(
        parser.parse("[0").unwrap_err().to_string(),
        "at 2: expected \",\" or \"]\"",
    );
}

#[test]
fn locations_track_lines_and_columns() {
    let parser = json();
    let err = parser.parse("[1\n!]").unwrap_err();
    assert_eq!(err.to_string(), "at 3: expected \",\" or \"]\"");
    let item = &err.items()[0];
    // The '!' sits at byte 3, at the start of line 2.
    assert_eq!(item.loc.pos, 3);
    assert_eq!(item.loc.line, 2);
    assert_eq!(item.loc.col, 1);
}

#[test]
fn recovers_by_skipping_stray_input() {
    let parser = json();
    let (value, err) = parser.parse_recovery("[1 2]");
    assert_eq!(value, Some(Json::List(vec![Json::Int(1)])));
    assert_eq!(err.unwrap().to_string(), "at 3: unexpected input");
}

#[test]
fn recovery_leaves_well_formed_input_alone() {
    let parser = json();
    let (value, err) = parser.parse_recovery(r#"{"k": [1, 2]}"#);
    assert_eq!(err, None);
    assert_eq!(
        value,
        Some(obj(&[(
            "k",
            Json::List(vec![Json::Int(1), Json::Int(2)]),
        )])),
    );
}
