use crate::core::number::{number_to_string, number_to_string_radix, shortest_digits};
use crate::core::{
    EvalResult, MutationContext, ObjectKind, Realm, Runtime, Value, arg, define_constructor, define_native_methods, new_js_object,
};
use crate::error::JSError;
use crate::{raise_range_error, raise_type_error};
use num_traits::ToPrimitive;

pub fn initialize_number<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let number_ctor = define_constructor(mc, realm, "Number", 1, realm.number_prototype);
    {
        let mut ctor = number_ctor.borrow_mut(mc);
        for (name, value) in [
            ("MAX_VALUE", f64::MAX),
            ("MIN_VALUE", 5e-324),
            ("NaN", f64::NAN),
            ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
            ("POSITIVE_INFINITY", f64::INFINITY),
        ] {
            ctor.insert(name, Value::Number(value), false, false, false);
        }
    }
    define_native_methods(
        mc,
        realm,
        realm.number_prototype,
        "Number.prototype",
        &[
            ("toString", 1),
            ("toLocaleString", 0),
            ("valueOf", 0),
            ("toFixed", 1),
            ("toExponential", 1),
            ("toPrecision", 1),
        ],
    );
    Ok(())
}

fn this_number_value<'gc>(this: &Value<'gc>, method: &str) -> EvalResult<'gc, f64> {
    match this {
        Value::Number(n) => Ok(*n),
        Value::Object(o) => match o.borrow().kind {
            ObjectKind::Number(n) => Ok(n),
            _ => Err(raise_type_error!("Number.prototype.{method} requires that 'this' be a Number")),
        },
        _ => Err(raise_type_error!("Number.prototype.{method} requires that 'this' be a Number")),
    }
}

/// Round a decimal digit string to its first `keep` digits, ties away
/// from zero. Returns the digits and whether rounding carried into a new
/// leading digit.
fn round_digits(digits: &[u8], keep: usize) -> (Vec<u8>, bool) {
    let mut out: Vec<u8> = digits.iter().take(keep).copied().collect();
    out.resize(keep, b'0');
    if digits.get(keep).is_some_and(|d| *d >= b'5') {
        for d in out.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                return (out, false);
            }
        }
        out.insert(0, b'1');
        return (out, true);
    }
    (out, false)
}

/// `p` significant digits of `x > 0` and the exponent of the first one.
fn significant_digits(x: f64, p: usize) -> (String, i32) {
    let text = format!("{:.prec$e}", x, prec = p + 24);
    let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let mut exp: i32 = exp.parse().unwrap_or(0);
    let all: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();
    let (mut digits, carried) = round_digits(&all, p);
    if carried {
        digits.truncate(p);
        exp += 1;
    }
    (String::from_utf8_lossy(&digits).into_owned(), exp)
}

fn exponential_form(digits: &str, exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    if digits.len() == 1 {
        format!("{digits}e{sign}{}", exp.abs())
    } else {
        format!("{}.{}e{sign}{}", &digits[..1], &digits[1..], exp.abs())
    }
}

fn to_fixed(x: f64, f: usize) -> String {
    if x.abs() >= 1e21 {
        return number_to_string(x);
    }
    let sign = if x < 0.0 { "-" } else { "" };
    let text = format!("{:.prec$}", x.abs(), prec = f + 24);
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let all: Vec<u8> = int.bytes().chain(frac.bytes()).collect();
    let (digits, _) = round_digits(&all, int.len() + f);
    let digits = String::from_utf8_lossy(&digits).into_owned();
    if f == 0 {
        return format!("{sign}{digits}");
    }
    let (int, frac) = digits.split_at(digits.len() - f);
    format!("{sign}{int}.{frac}")
}

fn to_exponential(x: f64, fraction_digits: Option<usize>) -> String {
    let sign = if x < 0.0 { "-" } else { "" };
    let x = x.abs();
    let (digits, exp) = match fraction_digits {
        _ if x == 0.0 => ("0".repeat(fraction_digits.unwrap_or(0) + 1), 0),
        None => {
            let (digits, n) = shortest_digits(x);
            (digits, n - 1)
        }
        Some(f) => significant_digits(x, f + 1),
    };
    format!("{sign}{}", exponential_form(&digits, exp))
}

fn to_precision(x: f64, p: usize) -> String {
    let sign = if x < 0.0 { "-" } else { "" };
    let x = x.abs();
    let (digits, e) = if x == 0.0 { ("0".repeat(p), 0) } else { significant_digits(x, p) };
    let body = if e < -6 || e >= p as i32 {
        exponential_form(&digits, e)
    } else if e == p as i32 - 1 {
        digits
    } else if e >= 0 {
        let (int, frac) = digits.split_at(e as usize + 1);
        format!("{int}.{frac}")
    } else {
        format!("0.{}{digits}", "0".repeat((-(e + 1)) as usize))
    };
    format!("{sign}{body}")
}

/// ToInteger of a digits argument, checked against `range`.
fn digits_arg<'gc>(rt: &mut Runtime<'gc>, value: &Value<'gc>, range: std::ops::RangeInclusive<f64>, method: &str) -> EvalResult<'gc, usize> {
    let n = rt.to_integer(value)?;
    if !range.contains(&n) {
        return Err(raise_range_error!(
            "{method}() argument must be between {} and {}",
            range.start(),
            range.end()
        ));
    }
    Ok(n.to_usize().unwrap_or(0))
}

pub fn handle_number_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    if name == "Number" {
        let n = if args.is_empty() { 0.0 } else { rt.to_number(&args[0])? };
        if construct {
            let object = new_js_object(rt.mc, "Number", ObjectKind::Number(n), Some(rt.realm.number_prototype));
            return Ok(Value::Object(object));
        }
        return Ok(Value::Number(n));
    }
    let method = name.rsplit('.').next().unwrap_or(name);
    let x = this_number_value(&this, method)?;
    let text = match method {
        "valueOf" => return Ok(Value::Number(x)),
        "toString" => {
            let radix = match arg(args, 0) {
                Value::Undefined => 10.0,
                v => rt.to_integer(&v)?,
            };
            if !(2.0..=36.0).contains(&radix) {
                return Err(raise_range_error!("toString() radix must be between 2 and 36"));
            }
            number_to_string_radix(x, radix.to_u32().unwrap_or(10))
        }
        "toLocaleString" => number_to_string(x),
        "toFixed" => {
            let f = digits_arg(rt, &arg(args, 0), 0.0..=20.0, "toFixed")?;
            if x.is_nan() {
                return Ok(rt.new_string_value("NaN"));
            }
            to_fixed(x, f)
        }
        "toExponential" => {
            let fraction_digits = arg(args, 0);
            let f = rt.to_integer(&fraction_digits)?;
            if !x.is_finite() {
                return Ok(rt.new_string_value(&number_to_string(x)));
            }
            if !(0.0..=20.0).contains(&f) {
                return Err(raise_range_error!("toExponential() argument must be between 0 and 20"));
            }
            let f = (!fraction_digits.is_undefined()).then(|| f.to_usize().unwrap_or(0));
            to_exponential(x, f)
        }
        "toPrecision" => {
            let precision = arg(args, 0);
            if precision.is_undefined() {
                return Ok(rt.new_string_value(&number_to_string(x)));
            }
            let p = rt.to_integer(&precision)?;
            if !x.is_finite() {
                return Ok(rt.new_string_value(&number_to_string(x)));
            }
            if !(1.0..=21.0).contains(&p) {
                return Err(raise_range_error!("toPrecision() argument must be between 1 and 21"));
            }
            to_precision(x, p.to_usize().unwrap_or(1))
        }
        _ => return Err(crate::eval_error_here!(format!("unknown Number built-in {name}")).into()),
    };
    Ok(rt.new_string_value(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rounds_half_away_from_zero() {
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(1.45, 1), "1.4");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_fixed(99.99, 1), "100.0");
        assert_eq!(to_fixed(0.000001, 2), "0.00");
        assert_eq!(to_fixed(1e21, 2), "1e+21");
    }

    #[test]
    fn exponential_and_precision() {
        assert_eq!(to_exponential(123456.0, Some(2)), "1.23e+5");
        assert_eq!(to_exponential(0.00015, None), "1.5e-4");
        assert_eq!(to_exponential(0.0, Some(1)), "0.0e+0");
        assert_eq!(to_precision(123.456, 4), "123.5");
        assert_eq!(to_precision(0.000123, 2), "0.00012");
        assert_eq!(to_precision(123456.0, 2), "1.2e+5");
        assert_eq!(to_precision(1e-7, 1), "1e-7");
        assert_eq!(to_precision(9.99, 2), "10");
    }
}
