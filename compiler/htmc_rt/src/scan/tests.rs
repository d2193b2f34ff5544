use pretty_assertions::assert_eq;

use super::{scan, Scanned};

#[test]
fn finds_parameter_after_mismatch() {
    assert_eq!(scan(b"a=1&x=5", b"x=%d"), Some(vec![Scanned::Int(5)]));
}

#[test]
fn restart_retests_failing_byte() {
    // `xx=` : the second `x` fails against `=` and must be re-tested as `x`.
    assert_eq!(scan(b"xx=9", b"x=%d"), Some(vec![Scanned::Int(9)]));
}

#[test]
fn no_match_dispatches_nothing() {
    assert_eq!(scan(b"a=1&b=2", b"x=%d"), None);
}

#[test]
fn unparsable_value_dispatches_nothing() {
    assert_eq!(scan(b"x=abc", b"x=%d"), None);
}

#[test]
fn signed_integers() {
    assert_eq!(scan(b"n=-12&m=+3", b"n=%d&m=%i"), Some(vec![Scanned::Int(-12), Scanned::Int(3)]));
}

#[test]
fn integer_overflow_fails() {
    assert_eq!(scan(b"n=99999999999", b"n=%d"), None);
}

#[test]
fn floats_with_fraction_and_exponent() {
    assert_eq!(scan(b"f=2.5e2", b"f=%f"), Some(vec![Scanned::Float(250.0)]));
    assert_eq!(scan(b"f=.5", b"f=%f"), Some(vec![Scanned::Float(0.5)]));
    assert_eq!(scan(b"f=3.&g", b"f=%f"), Some(vec![Scanned::Float(3.0)]));
}

#[test]
fn lone_dot_is_not_a_float() {
    assert_eq!(scan(b"f=.", b"f=%f"), None);
}

#[test]
fn strings_stop_at_ampersand_or_space() {
    assert_eq!(
        scan(b"name=bob&age=3", b"name=%s"),
        Some(vec![Scanned::Str(b"bob".to_vec())])
    );
    assert_eq!(
        scan(b"q=a b", b"q=%s"),
        Some(vec![Scanned::Str(b"a".to_vec())])
    );
}

#[test]
fn empty_string_value_fails() {
    assert_eq!(scan(b"name=&x=1", b"name=%s"), None);
}

#[test]
fn single_char() {
    assert_eq!(scan(b"c=zq", b"c=%c"), Some(vec![Scanned::Char(b'z')]));
}

#[test]
fn later_conversions_restart_at_their_segment() {
    assert_eq!(
        scan(b"a=1&c=0&b=2", b"a=%d&b=%d"),
        Some(vec![Scanned::Int(1), Scanned::Int(2)])
    );
}

#[test]
fn partial_match_keeps_dispatched_values() {
    assert_eq!(scan(b"a=1&b=x", b"a=%d&b=%d"), Some(vec![Scanned::Int(1)]));
}

#[test]
fn percent_literal_matches_percent() {
    assert_eq!(scan(b"p=5%&x=1", b"%%&x=%d"), Some(vec![Scanned::Int(1)]));
}

#[test]
fn unknown_conversion_stops() {
    assert_eq!(scan(b"x=1", b"x=%q"), None);
}

#[test]
fn empty_inputs() {
    assert_eq!(scan(b"", b"x=%d"), None);
    assert_eq!(scan(b"x=1", b""), None);
}
