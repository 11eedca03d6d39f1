use crate::core::{
    EvalResult, JSObjectDataPtr, MutationContext, ObjectKind, PreferredType, Realm, Runtime, Value, arg, define_constructor,
    define_native_methods, new_js_object,
};
use crate::error::JSError;
use crate::unicode::utf16_to_utf8;
use crate::{raise_range_error, raise_type_error};

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const MAX_TIME: f64 = 8.64e15;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTH_NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

pub fn initialize_date<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let date_ctor = define_constructor(mc, realm, "Date", 7, realm.date_prototype);
    define_native_methods(mc, realm, date_ctor, "Date", &[("parse", 1), ("UTC", 7), ("now", 0)]);
    define_native_methods(
        mc,
        realm,
        realm.date_prototype,
        "Date.prototype",
        &[
            ("toString", 0),
            ("toDateString", 0),
            ("toTimeString", 0),
            ("toLocaleString", 0),
            ("toLocaleDateString", 0),
            ("toLocaleTimeString", 0),
            ("toUTCString", 0),
            ("toISOString", 0),
            ("toJSON", 1),
            ("valueOf", 0),
            ("getTime", 0),
            ("getFullYear", 0),
            ("getUTCFullYear", 0),
            ("getMonth", 0),
            ("getUTCMonth", 0),
            ("getDate", 0),
            ("getUTCDate", 0),
            ("getDay", 0),
            ("getUTCDay", 0),
            ("getHours", 0),
            ("getUTCHours", 0),
            ("getMinutes", 0),
            ("getUTCMinutes", 0),
            ("getSeconds", 0),
            ("getUTCSeconds", 0),
            ("getMilliseconds", 0),
            ("getUTCMilliseconds", 0),
            ("getTimezoneOffset", 0),
            ("setTime", 1),
            ("setMilliseconds", 1),
            ("setUTCMilliseconds", 1),
            ("setSeconds", 2),
            ("setUTCSeconds", 2),
            ("setMinutes", 3),
            ("setUTCMinutes", 3),
            ("setHours", 4),
            ("setUTCHours", 4),
            ("setDate", 1),
            ("setUTCDate", 1),
            ("setMonth", 2),
            ("setUTCMonth", 2),
            ("setFullYear", 3),
            ("setUTCFullYear", 3),
        ],
    );
    Ok(())
}

fn day(t: f64) -> f64 {
    (t / MS_PER_DAY).floor()
}

fn time_within_day(t: f64) -> f64 {
    t.rem_euclid(MS_PER_DAY)
}

fn day_from_year(y: f64) -> f64 {
    365.0 * (y - 1970.0) + ((y - 1969.0) / 4.0).floor() - ((y - 1901.0) / 100.0).floor() + ((y - 1601.0) / 400.0).floor()
}

fn time_from_year(y: f64) -> f64 {
    MS_PER_DAY * day_from_year(y)
}

fn is_leap_year(y: f64) -> bool {
    (y % 4.0 == 0.0 && y % 100.0 != 0.0) || y % 400.0 == 0.0
}

fn year_from_time(t: f64) -> f64 {
    let mut y = (t / (MS_PER_DAY * 365.2425)).floor() + 1970.0;
    while time_from_year(y) > t {
        y -= 1.0;
    }
    while time_from_year(y + 1.0) <= t {
        y += 1.0;
    }
    y
}

/// Day of the year on which each month starts.
fn month_starts(leap: bool) -> [f64; 13] {
    let l = if leap { 1.0 } else { 0.0 };
    [
        0.0,
        31.0,
        59.0 + l,
        90.0 + l,
        120.0 + l,
        151.0 + l,
        181.0 + l,
        212.0 + l,
        243.0 + l,
        273.0 + l,
        304.0 + l,
        334.0 + l,
        365.0 + l,
    ]
}

fn month_and_date(t: f64) -> (f64, f64) {
    let year = year_from_time(t);
    let day_in_year = day(t) - day_from_year(year);
    let starts = month_starts(is_leap_year(year));
    let month = (0..12).find(|&m| day_in_year < starts[m + 1]).unwrap_or(11);
    (month as f64, day_in_year - starts[month] + 1.0)
}

fn week_day(t: f64) -> f64 {
    (day(t) + 4.0).rem_euclid(7.0)
}

fn hour_from_time(t: f64) -> f64 {
    (t / MS_PER_HOUR).floor().rem_euclid(24.0)
}

fn min_from_time(t: f64) -> f64 {
    (t / MS_PER_MINUTE).floor().rem_euclid(60.0)
}

fn sec_from_time(t: f64) -> f64 {
    (t / MS_PER_SECOND).floor().rem_euclid(60.0)
}

fn ms_from_time(t: f64) -> f64 {
    t.rem_euclid(MS_PER_SECOND)
}

fn make_time(hour: f64, min: f64, sec: f64, ms: f64) -> f64 {
    if ![hour, min, sec, ms].iter().all(|v| v.is_finite()) {
        return f64::NAN;
    }
    hour.trunc() * MS_PER_HOUR + min.trunc() * MS_PER_MINUTE + sec.trunc() * MS_PER_SECOND + ms.trunc()
}

fn make_day(year: f64, month: f64, date: f64) -> f64 {
    if ![year, month, date].iter().all(|v| v.is_finite()) {
        return f64::NAN;
    }
    let (y, m, dt) = (year.trunc(), month.trunc(), date.trunc());
    let ym = y + (m / 12.0).floor();
    if ym.abs() > 400_000.0 {
        return f64::NAN;
    }
    let mn = m.rem_euclid(12.0) as usize;
    day_from_year(ym) + month_starts(is_leap_year(ym))[mn] + dt - 1.0
}

fn make_date(day: f64, time: f64) -> f64 {
    if !day.is_finite() || !time.is_finite() {
        return f64::NAN;
    }
    day * MS_PER_DAY + time
}

fn time_clip(t: f64) -> f64 {
    if !t.is_finite() || t.abs() > MAX_TIME {
        return f64::NAN;
    }
    t.trunc() + 0.0
}

/// Offset of local time from UTC in milliseconds, without daylight saving adjustment.
fn local_tza() -> f64 {
    chrono::Local::now().offset().local_minus_utc() as f64 * MS_PER_SECOND
}

fn local_time(t: f64) -> f64 {
    t + local_tza()
}

fn utc(t: f64) -> f64 {
    t - local_tza()
}

fn now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

fn two_digits(n: usize, chars: &[char]) -> Option<f64> {
    let slice = chars.get(n..n + 2)?;
    if slice.iter().all(char::is_ascii_digit) {
        Some(slice.iter().collect::<String>().parse().ok()?)
    } else {
        None
    }
}

/// The Date Time String Format of ES5 15.9.1.15:
/// `YYYY[-MM[-DD]][THH:mm[:ss[.sss]]][Z|(+|-)HH:mm]`, with optional
/// six digit signed years. An absent offset means UTC.
fn parse_iso_date(s: &str) -> Option<f64> {
    let chars: Vec<char> = s.chars().collect();
    let (year, mut i) = match chars.first()? {
        '+' | '-' => {
            let digits: String = chars.get(1..7)?.iter().collect();
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let y: f64 = digits.parse().ok()?;
            (if chars[0] == '-' { -y } else { y }, 7)
        }
        _ => {
            let digits: String = chars.get(0..4)?.iter().collect();
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            (digits.parse().ok()?, 4)
        }
    };
    let (mut month, mut date) = (1.0, 1.0);
    if chars.get(i) == Some(&'-') {
        month = two_digits(i + 1, &chars)?;
        i += 3;
        if chars.get(i) == Some(&'-') {
            date = two_digits(i + 1, &chars)?;
            i += 3;
        }
    }
    let (mut hour, mut minute, mut second, mut ms) = (0.0, 0.0, 0.0, 0.0);
    let mut offset = 0.0;
    if chars.get(i) == Some(&'T') {
        hour = two_digits(i + 1, &chars)?;
        if chars.get(i + 3) != Some(&':') {
            return None;
        }
        minute = two_digits(i + 4, &chars)?;
        i += 6;
        if chars.get(i) == Some(&':') {
            second = two_digits(i + 1, &chars)?;
            i += 3;
            if chars.get(i) == Some(&'.') {
                let digits: String = chars[i + 1..].iter().take_while(|c| c.is_ascii_digit()).collect();
                if digits.is_empty() {
                    return None;
                }
                i += 1 + digits.len();
                let frac: f64 = format!("0.{digits}").parse().ok()?;
                ms = (frac * 1000.0).floor();
            }
        }
        match chars.get(i) {
            Some('Z') => i += 1,
            Some(&sign) if sign == '+' || sign == '-' => {
                let oh = two_digits(i + 1, &chars)?;
                if chars.get(i + 3) != Some(&':') {
                    return None;
                }
                let om = two_digits(i + 4, &chars)?;
                if oh > 23.0 || om > 59.0 {
                    return None;
                }
                let magnitude = oh * MS_PER_HOUR + om * MS_PER_MINUTE;
                offset = if sign == '+' { magnitude } else { -magnitude };
                i += 6;
            }
            _ => {}
        }
    }
    if i != chars.len() {
        return None;
    }
    if !(1.0..=12.0).contains(&month) {
        return None;
    }
    let starts = month_starts(is_leap_year(year));
    let max_date = starts[month as usize] - starts[month as usize - 1];
    let time_ok = (hour < 24.0 && minute < 60.0 && second < 60.0) || (hour == 24.0 && minute == 0.0 && second == 0.0 && ms == 0.0);
    if !(1.0..=max_date).contains(&date) || !time_ok {
        return None;
    }
    let t = make_date(make_day(year, month - 1.0, date), make_time(hour, minute, second, ms));
    Some(t - offset)
}

/// Parse the formats produced by `toString`, `toUTCString` and the ISO subset.
fn parse_date(s: &str) -> f64 {
    let s = s.trim();
    if let Some(t) = parse_iso_date(s) {
        return time_clip(t);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%a %b %d %Y %H:%M:%S GMT%z") {
        return time_clip(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT") {
        return time_clip(dt.and_utc().timestamp_millis() as f64);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%a %b %d %Y %H:%M:%S") {
        return time_clip(utc(dt.and_utc().timestamp_millis() as f64));
    }
    log::debug!("unrecognised date string {s:?}");
    f64::NAN
}

fn date_part(t: f64) -> String {
    let (month, date) = month_and_date(t);
    format!(
        "{} {} {:02} {}",
        WEEKDAY_NAMES[week_day(t) as usize],
        MONTH_NAMES[month as usize],
        date,
        year_from_time(t)
    )
}

fn time_part(t: f64) -> String {
    format!("{:02}:{:02}:{:02}", hour_from_time(t), min_from_time(t), sec_from_time(t))
}

fn zone_part() -> String {
    let minutes = (local_tza() / MS_PER_MINUTE) as i64;
    let sign = if minutes < 0 { '-' } else { '+' };
    format!("GMT{sign}{:02}{:02}", minutes.abs() / 60, minutes.abs() % 60)
}

fn iso_string(t: f64) -> String {
    let year = year_from_time(t);
    let (month, date) = month_and_date(t);
    let year = if (0.0..=9999.0).contains(&year) {
        format!("{year:04}")
    } else {
        format!("{}{:06}", if year < 0.0 { '-' } else { '+' }, year.abs())
    };
    format!(
        "{year}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        month + 1.0,
        date,
        hour_from_time(t),
        min_from_time(t),
        sec_from_time(t),
        ms_from_time(t)
    )
}

fn utc_string(t: f64) -> String {
    let (month, date) = month_and_date(t);
    format!(
        "{}, {:02} {} {} {} GMT",
        WEEKDAY_NAMES[week_day(t) as usize],
        date,
        MONTH_NAMES[month as usize],
        year_from_time(t),
        time_part(t)
    )
}

/// Time value of a component list `[year, month, date, hours, minutes, seconds, ms]`,
/// with years 0 to 99 meaning 1900 to 1999.
fn time_from_components<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, f64> {
    let defaults = [f64::NAN, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let mut c = defaults;
    for (i, slot) in c.iter_mut().enumerate() {
        if let Some(v) = args.get(i) {
            *slot = rt.to_number(v)?;
        }
    }
    let year_int = crate::core::number::to_integer(c[0]);
    if !c[0].is_nan() && (0.0..=99.0).contains(&year_int) {
        c[0] = 1900.0 + year_int;
    }
    Ok(make_date(make_day(c[0], c[1], c[2]), make_time(c[3], c[4], c[5], c[6])))
}

fn new_date_object<'gc>(rt: &Runtime<'gc>, t: f64) -> JSObjectDataPtr<'gc> {
    new_js_object(rt.mc, "Date", ObjectKind::Date(t), Some(rt.realm.date_prototype))
}

fn this_time_value<'gc>(this: &Value<'gc>, method: &str) -> EvalResult<'gc, (JSObjectDataPtr<'gc>, f64)> {
    if let Value::Object(o) = this
        && let ObjectKind::Date(t) = o.borrow().kind
    {
        return Ok((*o, t));
    }
    Err(raise_type_error!("Date.prototype.{method} called on incompatible receiver"))
}

fn set_time_value<'gc>(rt: &Runtime<'gc>, object: JSObjectDataPtr<'gc>, t: f64) -> Value<'gc> {
    if let ObjectKind::Date(v) = &mut object.borrow_mut(rt.mc).kind {
        *v = t;
    }
    Value::Number(t)
}

/// `setHours`, `setUTCMonth` and the rest: replace the components named by
/// the method, starting at the first one it takes.
fn set_components<'gc>(rt: &mut Runtime<'gc>, method: &str, object: JSObjectDataPtr<'gc>, t: f64, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    let local = !method.starts_with("setUTC");
    let field = method.trim_start_matches("setUTC").trim_start_matches("set");
    let (first, count) = match field {
        "FullYear" => (0, 3),
        "Month" => (1, 2),
        "Date" => (2, 1),
        "Hours" => (3, 4),
        "Minutes" => (4, 3),
        "Seconds" => (5, 2),
        "Milliseconds" => (6, 1),
        _ => return Err(crate::eval_error_here!(format!("unknown Date setter {method}")).into()),
    };
    let mut values = Vec::with_capacity(count);
    values.push(rt.to_number(&arg(args, 0))?);
    for a in args.iter().take(count).skip(1) {
        values.push(rt.to_number(a)?);
    }
    let base = if t.is_nan() && field == "FullYear" { 0.0 } else { t };
    let base = if local { local_time(base) } else { base };
    let (month, date) = month_and_date(base);
    let mut c = [
        year_from_time(base),
        month,
        date,
        hour_from_time(base),
        min_from_time(base),
        sec_from_time(base),
        ms_from_time(base),
    ];
    for (i, v) in values.into_iter().enumerate() {
        c[first + i] = v;
    }
    let mut new_time = make_date(make_day(c[0], c[1], c[2]), make_time(c[3], c[4], c[5], c[6]));
    if local {
        new_time = utc(new_time);
    }
    Ok(set_time_value(rt, object, time_clip(new_time)))
}

fn date_constructor<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>], construct: bool) -> EvalResult<'gc, Value<'gc>> {
    if !construct {
        let t = local_time(now());
        return Ok(rt.new_string_value(&format!("{} {} {}", date_part(t), time_part(t), zone_part())));
    }
    let t = match args {
        [] => now(),
        [value] => match rt.to_primitive(value, None)? {
            Value::String(s) => parse_date(&utf16_to_utf8(&s)),
            v => time_clip(rt.to_number(&v)?),
        },
        _ => time_clip(utc(time_from_components(rt, args)?)),
    };
    Ok(Value::Object(new_date_object(rt, t)))
}

pub fn handle_date_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    match name {
        "Date" => return date_constructor(rt, args, construct),
        "Date.parse" => {
            let s = rt.to_rust_string(&arg(args, 0))?;
            return Ok(Value::Number(parse_date(&s)));
        }
        "Date.UTC" => return Ok(Value::Number(time_clip(time_from_components(rt, args)?))),
        "Date.now" => return Ok(Value::Number(now())),
        "Date.prototype.toJSON" => {
            let o = rt.to_object(&this)?;
            let tv = rt.to_primitive(&Value::Object(o), Some(PreferredType::Number))?;
            if let Value::Number(n) = tv
                && !n.is_finite()
            {
                return Ok(Value::Null);
            }
            let to_iso = rt.get(o, "toISOString")?;
            if to_iso.as_callable().is_none() {
                return Err(raise_type_error!("toISOString is not a function"));
            }
            return rt.call_value(&to_iso, Value::Object(o), &[]);
        }
        _ => {}
    }
    let method = &name["Date.prototype.".len()..];
    let (object, t) = this_time_value(&this, method)?;
    if method.starts_with("set") {
        if method == "setTime" {
            let v = rt.to_number(&arg(args, 0))?;
            return Ok(set_time_value(rt, object, time_clip(v)));
        }
        return set_components(rt, method, object, t, args);
    }
    if t.is_nan() {
        return match method {
            "toISOString" => Err(raise_range_error!("Invalid time value")),
            m if m.starts_with("to") => Ok(rt.new_string_value("Invalid Date")),
            _ => Ok(Value::Number(f64::NAN)),
        };
    }
    let local = local_time(t);
    let text = match method {
        "toString" => format!("{} {} {}", date_part(local), time_part(local), zone_part()),
        "toDateString" | "toLocaleDateString" => date_part(local),
        "toTimeString" => format!("{} {}", time_part(local), zone_part()),
        "toLocaleString" => format!("{} {}", date_part(local), time_part(local)),
        "toLocaleTimeString" => time_part(local),
        "toUTCString" => utc_string(t),
        "toISOString" => iso_string(t),
        getter => {
            let (tv, field) = match getter.strip_prefix("getUTC") {
                Some(field) => (t, field),
                None => (local, getter.trim_start_matches("get")),
            };
            let n = match field {
                "Time" | "valueOf" => t,
                "FullYear" => year_from_time(tv),
                "Month" => month_and_date(tv).0,
                "Date" => month_and_date(tv).1,
                "Day" => week_day(tv),
                "Hours" => hour_from_time(tv),
                "Minutes" => min_from_time(tv),
                "Seconds" => sec_from_time(tv),
                "Milliseconds" => ms_from_time(tv),
                "TimezoneOffset" => (t - local) / MS_PER_MINUTE,
                _ => return Err(crate::eval_error_here!(format!("unknown Date built-in {name}")).into()),
            };
            return Ok(Value::Number(n));
        }
    };
    Ok(rt.new_string_value(&text))
}
