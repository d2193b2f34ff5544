//! Input matching engine for query and form scans.
//!
//! Matches a `scanf`-style format against parameter text such as
//! `x=5&name=bob`. Literal format bytes must match the text. On a mismatch
//! the match restarts at the current segment of the format (its beginning,
//! or just past the last conversion that was dispatched) and the text byte
//! that failed is tested again, so `x=%d` finds `x=5` anywhere in the text.
//!
//! Conversions parse at the current text position:
//!
//! - `%d`, `%i`: optional sign and decimal digits, as a C `int`
//! - `%f`: decimal float with optional fraction and exponent, as a C `float`
//! - `%c`: one byte
//! - `%s`: one or more bytes up to `&` or whitespace
//!
//! Scanning stops at the end of either input, at a conversion that fails to
//! parse, or at an unknown conversion.

/// A value produced by one dispatched conversion.
#[derive(Clone, Debug, PartialEq)]
pub enum Scanned {
    Int(i32),
    Float(f32),
    Char(u8),
    Str(Vec<u8>),
}

/// Match `fmt` against `text`.
///
/// Returns the dispatched values in format order, or `None` when no
/// conversion was dispatched.
pub fn scan(text: &[u8], fmt: &[u8]) -> Option<Vec<Scanned>> {
    let mut values = Vec::new();
    let mut segment = 0;
    let mut fi = 0;
    let mut ti = 0;

    while fi < fmt.len() && ti < text.len() {
        let f = fmt[fi];
        if f == b'%' && fmt.get(fi + 1) != Some(&b'%') {
            let Some((value, len)) = fmt.get(fi + 1).and_then(|&conv| convert(conv, &text[ti..]))
            else {
                break;
            };
            values.push(value);
            ti += len;
            fi += 2;
            segment = fi;
            continue;
        }

        if text[ti] == f {
            // `%%` matches a single `%`.
            fi += if f == b'%' { 2 } else { 1 };
            ti += 1;
        } else if fi > segment {
            fi = segment;
        } else {
            ti += 1;
        }
    }

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Run conversion `conv` at the start of `text`, returning the value and the
/// number of bytes consumed.
fn convert(conv: u8, text: &[u8]) -> Option<(Scanned, usize)> {
    match conv {
        b'd' | b'i' => {
            let len = sign_len(text) + digits_len(&text[sign_len(text)..]);
            let value = parse_run::<i32>(&text[..len])?;
            Some((Scanned::Int(value), len))
        }
        b'f' => {
            let len = float_len(text);
            let value = parse_run::<f32>(&text[..len])?;
            Some((Scanned::Float(value), len))
        }
        b'c' => text.first().map(|&c| (Scanned::Char(c), 1)),
        b's' => {
            let len = text
                .iter()
                .position(|&b| b == b'&' || b.is_ascii_whitespace())
                .unwrap_or(text.len());
            (len > 0).then(|| (Scanned::Str(text[..len].to_vec()), len))
        }
        _ => None,
    }
}

fn parse_run<T: std::str::FromStr>(run: &[u8]) -> Option<T> {
    std::str::from_utf8(run).ok()?.parse().ok()
}

fn sign_len(text: &[u8]) -> usize {
    usize::from(matches!(text.first(), Some(b'+' | b'-')))
}

fn digits_len(text: &[u8]) -> usize {
    text.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Length of the longest float prefix: `[+-]digits[.digits][(e|E)[+-]digits]`.
fn float_len(text: &[u8]) -> usize {
    let mut len = sign_len(text);
    let int_digits = digits_len(&text[len..]);
    len += int_digits;

    let mut frac_digits = 0;
    if text.get(len) == Some(&b'.') {
        frac_digits = digits_len(&text[len + 1..]);
        if int_digits + frac_digits > 0 {
            len += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(text.get(len), Some(b'e' | b'E')) {
        let exp_sign = sign_len(&text[len + 1..]);
        let exp_digits = digits_len(&text[len + 1 + exp_sign..]);
        if exp_digits > 0 {
            len += 1 + exp_sign + exp_digits;
        }
    }
    len
}

#[cfg(test)]
mod tests;
