// Numeric conversion and formatting helpers shared by the evaluator and
// the Number built-ins

use crate::unicode::{utf16_to_utf8, utf16_trim};

const TWO_32: f64 = 2_i64.pow(32) as f64; // 2^32
const TWO_16: f64 = 65536.0;

/// ToInteger: NaN becomes +0, infinities and zeros pass through.
pub(crate) fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n.is_infinite() || n == 0.0 {
        n
    } else {
        n.trunc()
    }
}

/// ToInt32 semantics for Number inputs
pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc();
    let int32bit = ((int % TWO_32) + TWO_32) % TWO_32;
    if int32bit >= TWO_32 / 2.0 {
        (int32bit - TWO_32) as i32
    } else {
        int32bit as i32
    }
}

/// ToUint32 semantics for Number inputs
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0_u32;
    }
    let int = n.trunc();
    let u = ((int % TWO_32) + TWO_32) % TWO_32;
    u as u32
}

pub(crate) fn to_uint16(n: f64) -> u16 {
    if !n.is_finite() {
        return 0;
    }
    let int = n.trunc();
    (((int % TWO_16) + TWO_16) % TWO_16) as u16
}

/// Shortest round-tripping decimal digits of a finite positive number and
/// the exponent `n` such that the value is `0.digits * 10^n`.
pub(crate) fn shortest_digits(v: f64) -> (String, i32) {
    let s = format!("{v:e}");
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    let exp: i32 = exp.parse().unwrap_or(0);
    (digits.to_string(), exp + 1)
}

/// Number to String conversion following ES5 9.8.1.
pub fn number_to_string(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }
    if v < 0.0 {
        return format!("-{}", number_to_string(-v));
    }
    if v.is_infinite() {
        return "Infinity".to_string();
    }
    let (digits, n) = shortest_digits(v);
    let k = digits.len() as i32;
    if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let e = n - 1;
        let sign = if e < 0 { '-' } else { '+' };
        if k == 1 {
            format!("{digits}e{sign}{}", e.abs())
        } else {
            format!("{}.{}e{sign}{}", &digits[..1], &digits[1..], e.abs())
        }
    }
}

/// Number to String in the given radix (2 to 36).
pub fn number_to_string_radix(v: f64, radix: u32) -> String {
    if radix == 10 || !v.is_finite() {
        return number_to_string(v);
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let negative = v < 0.0;
    let v = v.abs();
    let mut int = v.trunc();
    let mut frac = v - int;
    let r = radix as f64;

    let mut int_digits = Vec::new();
    if int == 0.0 {
        int_digits.push('0');
    }
    while int >= 1.0 {
        let d = (int % r) as u32;
        int_digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        int = ((int - d as f64) / r).trunc();
    }
    int_digits.reverse();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits);
    if frac > 0.0 {
        out.push('.');
        let mut count = 0;
        while frac > 0.0 && count < 52 {
            frac *= r;
            let d = frac.trunc();
            frac -= d;
            out.push(std::char::from_digit(d as u32, radix).unwrap_or('0'));
            count += 1;
        }
        while out.ends_with('0') {
            out.pop();
        }
    }
    out
}

fn is_str_decimal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let (int, frac) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let all_digits = |t: &str| t.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int) || !all_digits(frac) || (int.is_empty() && frac.is_empty()) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && all_digits(e)
        }
    }
}

/// ToNumber applied to a String (ES5 9.3.1). Outside strict code an
/// unsigned legacy octal form such as `"010"` reads as octal.
pub fn string_to_number(units: &[u16], allow_octal: bool) -> f64 {
    let s = utf16_to_utf8(utf16_trim(units));
    if s.is_empty() {
        return 0.0;
    }
    match s.as_str() {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return f64::NAN;
        }
        return hex
            .chars()
            .try_fold(0.0f64, |acc, c| c.to_digit(16).map(|d| acc * 16.0 + d as f64))
            .unwrap_or(f64::NAN);
    }
    if allow_octal && s.len() > 1 && s.starts_with('0') && s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return s.bytes().fold(0.0, |acc, b| acc * 8.0 + f64::from(b - b'0'));
    }
    if !is_str_decimal(&s) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode::utf8_to_utf16;

    #[test]
    fn integer_conversions() {
        assert_eq!(to_int32(4294967296.0 + 5.0), 5);
        assert_eq!(to_int32(2147483648.0), -2147483648);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_uint32(-1.0), 4294967295);
        assert_eq!(to_uint16(65537.0), 1);
        assert_eq!(to_integer(f64::NAN), 0.0);
        assert_eq!(to_integer(-3.7), -3.0);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(123.456), "123.456");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn radix_formatting() {
        assert_eq!(number_to_string_radix(255.0, 16), "ff");
        assert_eq!(number_to_string_radix(-8.0, 2), "-1000");
        assert_eq!(number_to_string_radix(0.5, 2), "0.1");
    }

    #[test]
    fn string_conversion() {
        let n = |s: &str| string_to_number(&utf8_to_utf16(s), false);
        assert_eq!(n("  42\n"), 42.0);
        assert_eq!(n(""), 0.0);
        assert_eq!(n("0x1A"), 26.0);
        assert_eq!(n("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(n("1e3"), 1000.0);
        assert_eq!(n(".5"), 0.5);
        assert!(n("12px").is_nan());
        assert!(n("inf").is_nan());
        assert!(n("-0x10").is_nan());
        assert_eq!(n("010"), 10.0);
    }

    #[test]
    fn legacy_octal_strings_outside_strict_code() {
        let sloppy = |s: &str| string_to_number(&utf8_to_utf16(s), true);
        assert_eq!(sloppy("010"), 8.0);
        assert_eq!(sloppy(" 0777 "), 511.0);
        assert_eq!(sloppy("019"), 19.0);
        assert_eq!(sloppy("-010"), -10.0);
        assert_eq!(sloppy("0"), 0.0);
    }
}
