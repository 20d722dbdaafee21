//! Scalar text rendering shared by the header template and the fixed-width sink.
//!
//! Floats use the shortest round-trip digits, a trailing `.0` on integral values, and scientific
//! notation (`1e+20`, `1.5e-05`) once the decimal exponent leaves `[-4, 16)`.

use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;

const POSITIONAL_EXPONENTS: std::ops::Range<i32> = -4..16;

#[must_use]
pub fn format_f64(value: f64) -> String {
    if let Some(text) = non_finite(value) {
        return text.to_owned();
    }
    let mut buffer = RyuBuffer::new();
    layout(buffer.format_finite(value))
}

#[must_use]
pub fn format_f32(value: f32) -> String {
    if let Some(text) = non_finite(f64::from(value)) {
        return text.to_owned();
    }
    let mut buffer = RyuBuffer::new();
    layout(buffer.format_finite(value))
}

#[must_use]
pub fn format_i64(value: i64) -> String {
    let mut buffer = ItoaBuffer::new();
    buffer.format(value).to_owned()
}

#[must_use]
pub const fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("nan")
    } else if value.is_infinite() {
        Some(if value.is_sign_negative() { "-inf" } else { "inf" })
    } else {
        None
    }
}

fn layout(shortest: &str) -> String {
    let (negative, unsigned) = shortest
        .strip_prefix('-')
        .map_or((false, shortest), |rest| (true, rest));
    let (digits, exponent) = decompose(unsigned);

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }
    if digits.is_empty() {
        out.push_str("0.0");
        return out;
    }

    if POSITIONAL_EXPONENTS.contains(&exponent) {
        if exponent >= 0 {
            let point = usize::try_from(exponent + 1).unwrap_or(1);
            if digits.len() <= point {
                out.push_str(&digits);
                out.extend(std::iter::repeat_n('0', point - digits.len()));
                out.push_str(".0");
            } else {
                out.push_str(&digits[..point]);
                out.push('.');
                out.push_str(&digits[point..]);
            }
        } else {
            let zeros = usize::try_from(-exponent - 1).unwrap_or(0);
            out.push_str("0.");
            out.extend(std::iter::repeat_n('0', zeros));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.unsigned_abs()));
    }
    out
}

/// Splits a `ryu` rendering into significant digits and the decimal exponent
/// of the first digit.
fn decompose(text: &str) -> (String, i32) {
    let (mantissa, exp) = match text.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (text, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let mut digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let mut exponent = exp + i32::try_from(int_part.len()).unwrap_or(0) - 1;

    let leading = digits.bytes().take_while(|b| *b == b'0').count();
    digits.drain(..leading);
    exponent -= i32::try_from(leading).unwrap_or(0);

    let significant = digits.trim_end_matches('0').len();
    digits.truncate(significant);
    (digits, exponent)
}
