//! Conversion of raw token lexemes into values: identifiers with unicode
//! escapes, numeric literals, string literals and regular expression bodies.

use crate::core::{is_reserved_name, keyword_kind};
use crate::unicode::{is_identifier_part, is_identifier_start, is_line_terminator};

fn hex_value(digits: &[char]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}

fn take_hex(chars: &[char], at: usize, count: usize) -> Option<u32> {
    if at + count > chars.len() {
        return None;
    }
    hex_value(&chars[at..at + count])
}

/// Decode `\uXXXX` escapes in an identifier lexeme and validate every character.
pub fn parse_identifier(lexeme: &str) -> Result<String, String> {
    let chars: Vec<char> = lexeme.chars().collect();
    let mut out = String::with_capacity(lexeme.len());
    let mut i = 0;
    let mut escaped = false;
    while i < chars.len() {
        let c = if chars[i] == '\\' {
            if chars.get(i + 1) != Some(&'u') {
                return Err(format!("Invalid escape in identifier '{lexeme}'"));
            }
            let code = take_hex(&chars, i + 2, 4).ok_or_else(|| format!("Invalid unicode escape in identifier '{lexeme}'"))?;
            i += 6;
            escaped = true;
            char::from_u32(code).ok_or_else(|| format!("Invalid identifier character in '{lexeme}'"))?
        } else {
            i += 1;
            chars[i - 1]
        };
        let valid = if out.is_empty() { is_identifier_start(c) } else { is_identifier_part(c) };
        if !valid {
            return Err(format!("Invalid identifier character in '{lexeme}'"));
        }
        out.push(c);
    }
    if out.is_empty() {
        return Err("Empty identifier".to_string());
    }
    if escaped && (keyword_kind(&out).is_some() || is_reserved_name(&out)) {
        return Err(format!("Keyword '{out}' must not contain escaped characters"));
    }
    Ok(out)
}

/// Value of a numeric literal lexeme.
pub fn parse_number(lexeme: &str, allow_octal: bool) -> Result<f64, String> {
    if let Some(hex) = lexeme.strip_prefix("0x").or_else(|| lexeme.strip_prefix("0X")) {
        if hex.is_empty() {
            return Err(format!("Invalid hexadecimal literal '{lexeme}'"));
        }
        return hex.chars().try_fold(0.0f64, |acc, c| {
            c.to_digit(16)
                .map(|d| acc * 16.0 + d as f64)
                .ok_or_else(|| format!("Invalid hexadecimal literal '{lexeme}'"))
        });
    }
    if lexeme.len() > 1 && lexeme.starts_with('0') && lexeme.chars().all(|c| c.is_ascii_digit()) {
        if !allow_octal {
            return Err("Octal literals are not allowed in strict mode".to_string());
        }
        // legacy octal, unless a non octal digit turns it back into decimal
        if lexeme.chars().all(|c| c <= '7') {
            return Ok(lexeme.chars().fold(0.0, |acc, c| acc * 8.0 + (c as u32 - '0' as u32) as f64));
        }
    }
    if lexeme.is_empty() || !lexeme.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return Err(format!("Invalid numeric literal '{lexeme}'"));
    }
    lexeme.parse::<f64>().map_err(|_| format!("Invalid numeric literal '{lexeme}'"))
}

fn push_char(out: &mut Vec<u16>, c: char) {
    let mut buf = [0u16; 2];
    out.extend_from_slice(c.encode_utf16(&mut buf));
}

/// Decode a quoted string literal lexeme into UTF-16 code units.
pub fn parse_string(lexeme: &str, allow_octal: bool) -> Result<Vec<u16>, String> {
    let chars: Vec<char> = lexeme.chars().collect();
    let quote = match chars.first() {
        Some(&q) if q == '"' || q == '\'' => q,
        _ => return Err(format!("Invalid string literal {lexeme}")),
    };
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 1;
    loop {
        let Some(&c) = chars.get(i) else {
            return Err("Unterminated string literal".to_string());
        };
        i += 1;
        if c == quote {
            break;
        }
        if is_line_terminator(c) {
            return Err("Unterminated string literal".to_string());
        }
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        let Some(&e) = chars.get(i) else {
            return Err("Unterminated string literal".to_string());
        };
        i += 1;
        match e {
            'b' => out.push(0x08),
            't' => out.push(0x09),
            'n' => out.push(0x0A),
            'v' => out.push(0x0B),
            'f' => out.push(0x0C),
            'r' => out.push(0x0D),
            '0' if !chars.get(i).is_some_and(|d| d.is_ascii_digit()) => out.push(0),
            '0'..='7' => {
                if !allow_octal {
                    return Err("Octal escape sequences are not allowed in strict mode".to_string());
                }
                let max_len = if e <= '3' { 3 } else { 2 };
                let mut value = e as u32 - '0' as u32;
                let mut len = 1;
                while len < max_len {
                    match chars.get(i) {
                        Some(&d) if ('0'..='7').contains(&d) => {
                            value = value * 8 + (d as u32 - '0' as u32);
                            i += 1;
                            len += 1;
                        }
                        _ => break,
                    }
                }
                out.push(value as u16);
            }
            'x' => {
                let v = take_hex(&chars, i, 2).ok_or_else(|| "Invalid hexadecimal escape sequence".to_string())?;
                i += 2;
                out.push(v as u16);
            }
            'u' => {
                let v = take_hex(&chars, i, 4).ok_or_else(|| "Invalid Unicode escape sequence".to_string())?;
                i += 4;
                out.push(v as u16);
            }
            '\r' => {
                if chars.get(i) == Some(&'\n') {
                    i += 1;
                }
            }
            c if is_line_terminator(c) => {}
            other => push_char(&mut out, other),
        }
    }
    if i != chars.len() {
        return Err(format!("Unexpected text after string literal {lexeme}"));
    }
    Ok(out)
}

const REGEXP_SYNTAX: &[char] = &['^', '$', '\\', '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '/'];

fn push_regexp_literal(out: &mut String, c: char, in_class: bool) {
    if REGEXP_SYNTAX.contains(&c) || (in_class && c == '-') {
        out.push('\\');
    }
    out.push(c);
}

/// Rewrite character escapes (`\0`, `\xHH`, `\uHHHH`, `\cX`) into the
/// characters they stand for so the pattern can be handed to `regress`.
/// Other escapes are passed through untouched.
pub fn translate_regexp(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' if !in_class => {
                in_class = true;
                out.push(c);
                i += 1;
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
                i += 1;
            }
            '\\' => {
                let Some(&e) = chars.get(i + 1) else {
                    return Err("\\ at end of pattern".to_string());
                };
                let decoded = match e {
                    '0' if !chars.get(i + 2).is_some_and(|d| d.is_ascii_digit()) => Some((0u32, 2)),
                    'x' => take_hex(&chars, i + 2, 2).map(|v| (v, 4)),
                    'u' => take_hex(&chars, i + 2, 4).map(|v| (v, 6)),
                    'c' => match chars.get(i + 2) {
                        Some(&l) if l.is_ascii_alphabetic() => Some((l as u32 % 32, 3)),
                        _ => None,
                    },
                    _ => None,
                };
                match decoded.and_then(|(code, len)| char::from_u32(code).map(|ch| (ch, len))) {
                    Some((ch, len)) => {
                        push_regexp_literal(&mut out, ch, in_class);
                        i += len;
                    }
                    None => {
                        // lone surrogates and everything else stay escaped
                        out.push('\\');
                        out.push(e);
                        i += 2;
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode::utf8_to_utf16;

    #[test]
    fn identifiers() {
        assert_eq!(parse_identifier("a\\u0062c").unwrap(), "abc");
        assert_eq!(parse_identifier("\\u0024x").unwrap(), "$x");
        assert!(parse_identifier("\\u0031a").is_err());
        assert!(parse_identifier("\\u0076ar").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("0x1F", false).unwrap(), 31.0);
        assert_eq!(parse_number("010", true).unwrap(), 8.0);
        assert_eq!(parse_number("019", true).unwrap(), 19.0);
        assert!(parse_number("010", false).is_err());
        assert_eq!(parse_number("1.5e3", false).unwrap(), 1500.0);
        assert_eq!(parse_number(".25", false).unwrap(), 0.25);
        assert_eq!(parse_number("0", false).unwrap(), 0.0);
    }

    #[test]
    fn strings() {
        assert_eq!(parse_string("'a\\tb'", false).unwrap(), utf8_to_utf16("a\tb"));
        assert_eq!(parse_string("\"\\x41\\u0042\"", false).unwrap(), utf8_to_utf16("AB"));
        assert_eq!(parse_string("'\\101'", true).unwrap(), utf8_to_utf16("A"));
        assert_eq!(parse_string("'\\477'", true).unwrap(), utf8_to_utf16("'7"));
        assert_eq!(parse_string("'\\0'", false).unwrap(), vec![0]);
        assert!(parse_string("'\\01'", false).is_err());
        assert_eq!(parse_string("'a\\\r\nb'", false).unwrap(), utf8_to_utf16("ab"));
        assert_eq!(parse_string("'\\q'", false).unwrap(), utf8_to_utf16("q"));
        assert!(parse_string("'ab", false).is_err());
        assert!(parse_string("'a'b", false).is_err());
    }

    #[test]
    fn regexp_escapes() {
        assert_eq!(translate_regexp("\\x41\\u0042").unwrap(), "AB");
        assert_eq!(translate_regexp("\\x2e").unwrap(), "\\.");
        assert_eq!(translate_regexp("[\\x2d]").unwrap(), "[\\-]");
        assert_eq!(translate_regexp("\\cJ").unwrap(), "\n");
        assert_eq!(translate_regexp("\\d+\\1").unwrap(), "\\d+\\1");
    }
}
