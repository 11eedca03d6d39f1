use crate::core::{EvalResult, MutationContext, Realm, Runtime, Value, arg, define_native_methods};
use crate::error::JSError;
use crate::raise_uri_error;
use crate::unicode::{is_trimmable_unit, utf16_to_utf8};

const URI_RESERVED: &[u8] = b";/?:@&=+$,";
const URI_MARK: &[u8] = b"-_.!~*'()";

pub fn initialize_global<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    {
        let mut global = realm.global.borrow_mut(mc);
        global.insert("NaN", Value::Number(f64::NAN), false, false, false);
        global.insert("Infinity", Value::Number(f64::INFINITY), false, false, false);
        global.insert("undefined", Value::Undefined, false, false, false);
        global.insert_builtin("eval", Value::Object(realm.eval_function));
    }
    define_native_methods(
        mc,
        realm,
        realm.global,
        "global",
        &[
            ("parseInt", 2),
            ("parseFloat", 1),
            ("isNaN", 1),
            ("isFinite", 1),
            ("decodeURI", 1),
            ("decodeURIComponent", 1),
            ("encodeURI", 1),
            ("encodeURIComponent", 1),
        ],
    );
    Ok(())
}

fn skip_white_space(s: &[u16]) -> &[u16] {
    let start = s.iter().position(|&u| !is_trimmable_unit(u)).unwrap_or(s.len());
    &s[start..]
}

fn parse_int(input: &[u16], radix: i32) -> f64 {
    let mut s = skip_white_space(input);
    let mut sign = 1.0;
    if let Some(&first) = s.first()
        && (first == u16::from(b'-') || first == u16::from(b'+'))
    {
        if first == u16::from(b'-') {
            sign = -1.0;
        }
        s = &s[1..];
    }
    let mut radix = radix;
    let mut strip_prefix = true;
    if radix != 0 {
        if !(2..=36).contains(&radix) {
            return f64::NAN;
        }
        strip_prefix = radix == 16;
    } else {
        radix = 10;
    }
    if strip_prefix && s.len() >= 2 && s[0] == u16::from(b'0') && (s[1] == u16::from(b'x') || s[1] == u16::from(b'X')) {
        s = &s[2..];
        radix = 16;
    }
    let digits: Vec<u32> = s
        .iter()
        .map_while(|&u| char::from_u32(u32::from(u)).and_then(|c| c.to_digit(radix as u32)))
        .collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let magnitude = if radix == 10 {
        let text: String = digits.iter().filter_map(|d| char::from_digit(*d, 10)).collect();
        text.parse().unwrap_or(f64::NAN)
    } else {
        digits.iter().fold(0.0, |acc, &d| acc * f64::from(radix) + f64::from(d))
    };
    sign * magnitude
}

/// Length of the longest prefix of `s` that is a StrDecimalLiteral.
fn decimal_prefix_len(s: &[u8]) -> usize {
    let mut i = 0;
    if matches!(s.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    if s[i..].starts_with(b"Infinity") {
        return i + "Infinity".len();
    }
    let count_digits = |from: usize| s[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let int_digits = count_digits(i);
    i += int_digits;
    let mut frac_digits = 0;
    if s.get(i) == Some(&b'.') {
        frac_digits = count_digits(i + 1);
        if int_digits > 0 || frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }
    if matches!(s.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(s.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = count_digits(j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}

fn parse_float(input: &[u16]) -> f64 {
    let trimmed = skip_white_space(input);
    let ascii: Vec<u8> = trimmed.iter().map_while(|&u| u8::try_from(u).ok().filter(u8::is_ascii)).collect();
    let len = decimal_prefix_len(&ascii);
    if len == 0 {
        return f64::NAN;
    }
    let text = std::str::from_utf8(&ascii[..len]).unwrap_or("");
    match text {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => text.parse().unwrap_or(f64::NAN),
    }
}

fn uri_malformed<'gc>() -> crate::core::EvalError<'gc> {
    raise_uri_error!("URI malformed")
}

/// Percent-encode every code point outside `unescaped` as UTF-8 octets.
fn encode<'gc>(input: &[u16], unescaped: &dyn Fn(u8) -> bool) -> EvalResult<'gc, Vec<u16>> {
    let mut out = Vec::with_capacity(input.len());
    let mut buf = [0u8; 4];
    for c in char::decode_utf16(input.iter().copied()) {
        let c = c.map_err(|_| uri_malformed())?;
        if c.is_ascii() && unescaped(c as u8) {
            out.push(c as u16);
            continue;
        }
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.extend(format!("%{byte:02X}").encode_utf16());
        }
    }
    Ok(out)
}

fn hex_octet(input: &[u16], at: usize) -> Option<u8> {
    if input.get(at) != Some(&u16::from(b'%')) {
        return None;
    }
    let hi = char::from_u32(u32::from(*input.get(at + 1)?))?.to_digit(16)?;
    let lo = char::from_u32(u32::from(*input.get(at + 2)?))?.to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

/// Decode percent escapes, leaving escapes of ASCII characters in `reserved` untouched.
fn decode<'gc>(input: &[u16], reserved: &[u8]) -> EvalResult<'gc, Vec<u16>> {
    let mut out = Vec::with_capacity(input.len());
    let mut k = 0;
    while k < input.len() {
        if input[k] != u16::from(b'%') {
            out.push(input[k]);
            k += 1;
            continue;
        }
        let lead = hex_octet(input, k).ok_or_else(uri_malformed)?;
        if lead < 0x80 {
            if reserved.contains(&lead) {
                out.extend_from_slice(&input[k..k + 3]);
            } else {
                out.push(u16::from(lead));
            }
            k += 3;
            continue;
        }
        let n = lead.leading_ones() as usize;
        if !(2..=4).contains(&n) {
            return Err(uri_malformed());
        }
        let mut octets = vec![lead];
        for j in 1..n {
            let octet = hex_octet(input, k + 3 * j).ok_or_else(uri_malformed)?;
            octets.push(octet);
        }
        // from_utf8 rejects overlong forms, surrogates and code points past U+10FFFF.
        let decoded = std::str::from_utf8(&octets).map_err(|_| uri_malformed())?;
        out.extend(decoded.encode_utf16());
        k += 3 * n;
    }
    Ok(out)
}

fn is_uri_unescaped(b: u8) -> bool {
    b.is_ascii_alphanumeric() || URI_MARK.contains(&b)
}

pub fn handle_global_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    _this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    let value = arg(args, 0);
    match name {
        "global.eval" => rt.perform_eval(&value, false),
        "global.parseInt" => {
            let input = rt.to_string(&value)?;
            let radix = rt.to_int32(&arg(args, 1))?;
            Ok(Value::Number(parse_int(&input, radix)))
        }
        "global.parseFloat" => {
            let input = rt.to_string(&value)?;
            Ok(Value::Number(parse_float(&input)))
        }
        "global.isNaN" => Ok(Value::Boolean(rt.to_number(&value)?.is_nan())),
        "global.isFinite" => Ok(Value::Boolean(rt.to_number(&value)?.is_finite())),
        "global.encodeURI" | "global.encodeURIComponent" => {
            let input = rt.to_string(&value)?;
            let component = name.ends_with("Component");
            let unescaped = |b: u8| is_uri_unescaped(b) || (!component && (URI_RESERVED.contains(&b) || b == b'#'));
            Ok(Value::String(encode(&input, &unescaped)?))
        }
        "global.decodeURI" | "global.decodeURIComponent" => {
            let input = rt.to_string(&value)?;
            let decoded = if name.ends_with("Component") {
                decode(&input, &[])?
            } else {
                let reserved: Vec<u8> = URI_RESERVED.iter().copied().chain(std::iter::once(b'#')).collect();
                decode(&input, &reserved)?
            };
            log::trace!("{name} produced {:?}", utf16_to_utf8(&decoded));
            Ok(Value::String(decoded))
        }
        _ => Err(crate::eval_error_here!(format!("unknown global built-in {name}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode::utf8_to_utf16;

    #[test]
    fn number_parsing() {
        assert_eq!(parse_int(&utf8_to_utf16("  0x1F"), 0), 31.0);
        assert_eq!(parse_int(&utf8_to_utf16("-12px"), 10), -12.0);
        assert_eq!(parse_int(&utf8_to_utf16("11"), 2), 3.0);
        assert!(parse_int(&utf8_to_utf16("z"), 10).is_nan());
        assert!(parse_int(&utf8_to_utf16("1"), 37).is_nan());
        assert_eq!(parse_float(&utf8_to_utf16("3.14abc")), 3.14);
        assert_eq!(parse_float(&utf8_to_utf16("\n-.5e1x")), -5.0);
        assert_eq!(parse_float(&utf8_to_utf16("1e")), 1.0);
        assert_eq!(parse_float(&utf8_to_utf16("-Infinityx")), f64::NEG_INFINITY);
        assert!(parse_float(&utf8_to_utf16(".")).is_nan());
    }

    #[test]
    fn uri_coding() {
        let encoded = encode(&utf8_to_utf16("a b/é"), &is_uri_unescaped).unwrap_or_default();
        assert_eq!(utf16_to_utf8(&encoded), "a%20b%2F%C3%A9");
        let decoded = decode(&utf8_to_utf16("%41%2f%C3%A9"), b"/").unwrap_or_default();
        assert_eq!(utf16_to_utf8(&decoded), "A%2fé");
        assert!(decode(&utf8_to_utf16("%E0%A4%A"), &[]).is_err());
        assert!(decode(&utf8_to_utf16("%C0%80"), &[]).is_err());
        assert!(encode(&[0xD800], &is_uri_unescaped).is_err());
    }
}
