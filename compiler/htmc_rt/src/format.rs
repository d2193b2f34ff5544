//! Output conversion engine shared by all backends.
//!
//! Supports the conversions generated code may use:
//!
//! | conversion | argument | output |
//! |---|---|---|
//! | `%d`, `%i` | [`Arg::Int`] | decimal |
//! | `%f` | [`Arg::Float`] | six fractional digits |
//! | `%c` | [`Arg::Char`] | one byte |
//! | `%s` | [`Arg::Str`] | the bytes |
//! | `%%` | none | `%` |
//!
//! Anything else is echoed: an unknown `%X`, a trailing lone `%`, and a
//! conversion whose argument is missing or of the wrong kind all appear in
//! the output as written. Unknown conversions consume no argument; a
//! mismatched argument is consumed.

use std::io::Write;

/// One argument to a formatted write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Arg<'a> {
    Int(i64),
    Float(f64),
    Char(u8),
    /// Text without its terminating NUL.
    Str(&'a [u8]),
}

/// Render `fmt` with `args` into a new buffer.
pub fn render(fmt: &[u8], args: &[Arg<'_>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fmt.len());
    let mut args = args.iter();
    let mut bytes = fmt.iter().copied();

    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }

        let Some(conv) = bytes.next() else {
            out.push(b'%');
            break;
        };

        let rendered = match conv {
            b'%' => {
                out.push(b'%');
                continue;
            }
            b'd' | b'i' | b'f' | b'c' | b's' => args.next().is_some_and(|arg| push_arg(&mut out, conv, arg)),
            _ => false,
        };
        if !rendered {
            out.extend_from_slice(&[b'%', conv]);
        }
    }

    out
}

/// Append `arg` under conversion `conv`. Returns `false` on a kind mismatch.
fn push_arg(out: &mut Vec<u8>, conv: u8, arg: &Arg<'_>) -> bool {
    match (conv, arg) {
        (b'd' | b'i', Arg::Int(v)) => {
            // Writes to a Vec cannot fail.
            let _ = write!(out, "{v}");
        }
        (b'f', Arg::Float(v)) => push_float(out, *v),
        (b'c', Arg::Char(c)) => out.push(*c),
        (b's', Arg::Str(s)) => out.extend_from_slice(s),
        _ => return false,
    }
    true
}

/// `%f` with C's spelling of the non-finite values.
fn push_float(out: &mut Vec<u8>, v: f64) {
    if v.is_nan() {
        out.extend_from_slice(if v.is_sign_negative() { b"-nan" } else { b"nan" });
    } else if v.is_infinite() {
        out.extend_from_slice(if v < 0.0 { b"-inf" } else { b"inf" });
    } else {
        let _ = write!(out, "{v:.6}");
    }
}
