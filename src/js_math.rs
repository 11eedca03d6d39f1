use crate::core::{EvalResult, MutationContext, ObjectKind, Realm, Runtime, Value, arg, define_native_methods, new_js_object};
use crate::error::JSError;
use std::cell::Cell;

pub fn initialize_math<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let math = new_js_object(mc, "Math", ObjectKind::Ordinary, Some(realm.object_prototype));
    {
        let mut m = math.borrow_mut(mc);
        for (name, value) in [
            ("E", std::f64::consts::E),
            ("LN10", std::f64::consts::LN_10),
            ("LN2", std::f64::consts::LN_2),
            ("LOG2E", std::f64::consts::LOG2_E),
            ("LOG10E", std::f64::consts::LOG10_E),
            ("PI", std::f64::consts::PI),
            ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
            ("SQRT2", std::f64::consts::SQRT_2),
        ] {
            m.insert(name, Value::Number(value), false, false, false);
        }
    }
    define_native_methods(
        mc,
        realm,
        math,
        "Math",
        &[
            ("abs", 1),
            ("acos", 1),
            ("asin", 1),
            ("atan", 1),
            ("atan2", 2),
            ("ceil", 1),
            ("cos", 1),
            ("exp", 1),
            ("floor", 1),
            ("log", 1),
            ("max", 2),
            ("min", 2),
            ("pow", 2),
            ("random", 0),
            ("round", 1),
            ("sin", 1),
            ("sqrt", 1),
            ("tan", 1),
        ],
    );
    realm.global.borrow_mut(mc).insert_builtin("Math", Value::Object(math));
    Ok(())
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = const { Cell::new(0) };
}

/// xorshift64* seeded from the clock on first use.
fn next_random() -> f64 {
    RANDOM_STATE.with(|state| {
        let mut x = state.get();
        if x == 0 {
            x = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x9E37_79B9_7F4A_7C15)
                | 1;
        }
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        state.set(x);
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    })
}

/// Math.round: halves round towards +Infinity, and -0.5 <= x < 0 gives -0.
fn round(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    if (-0.5..0.0).contains(&x) {
        return -0.0;
    }
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// ES5 `pow` differs from IEEE for `1 ** ±Infinity` and `(-1) ** ±Infinity`.
fn pow(x: f64, y: f64) -> f64 {
    if y.is_nan() {
        return f64::NAN;
    }
    if y.is_infinite() && x.abs() == 1.0 {
        return f64::NAN;
    }
    x.powf(y)
}

/// max/min: any NaN wins, and +0 is larger than -0.
fn extremum(values: &[f64], max: bool) -> f64 {
    let mut best = if max { f64::NEG_INFINITY } else { f64::INFINITY };
    for &v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        let better = if max {
            v > best || (v == 0.0 && best == 0.0 && best.is_sign_negative() && v.is_sign_positive())
        } else {
            v < best || (v == 0.0 && best == 0.0 && best.is_sign_positive() && v.is_sign_negative())
        };
        if better {
            best = v;
        }
    }
    best
}

pub fn handle_math_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    _this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    let method = &name["Math.".len()..];
    match method {
        "max" | "min" => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push(rt.to_number(a)?);
            }
            return Ok(Value::Number(extremum(&values, method == "max")));
        }
        "random" => return Ok(Value::Number(next_random())),
        "atan2" | "pow" => {
            let y = rt.to_number(&arg(args, 0))?;
            let x = rt.to_number(&arg(args, 1))?;
            return Ok(Value::Number(if method == "pow" { pow(y, x) } else { y.atan2(x) }));
        }
        _ => {}
    }
    let x = rt.to_number(&arg(args, 0))?;
    let result = match method {
        "abs" => x.abs(),
        "acos" => x.acos(),
        "asin" => x.asin(),
        "atan" => x.atan(),
        "ceil" => x.ceil(),
        "cos" => x.cos(),
        "exp" => x.exp(),
        "floor" => x.floor(),
        "log" => x.ln(),
        "round" => round(x),
        "sin" => x.sin(),
        "sqrt" => x.sqrt(),
        "tan" => x.tan(),
        _ => return Err(crate::eval_error_here!(format!("unknown Math built-in {name}")).into()),
    };
    Ok(Value::Number(result))
}
