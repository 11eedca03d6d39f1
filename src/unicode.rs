// Helper functions for UTF-16 string operations and source character classes
pub fn utf8_to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub fn utf16_to_utf8(v: &[u16]) -> String {
    String::from_utf16_lossy(v)
}

pub fn utf16_slice(v: &[u16], start: usize, end: usize) -> Vec<u16> {
    if start >= v.len() || start >= end {
        Vec::new()
    } else {
        let end = end.min(v.len());
        v[start..end].to_vec()
    }
}

pub fn utf16_to_uppercase(v: &[u16]) -> Vec<u16> {
    let s = utf16_to_utf8(v);
    utf8_to_utf16(&s.to_uppercase())
}

pub fn utf16_to_lowercase(v: &[u16]) -> Vec<u16> {
    let s = utf16_to_utf8(v);
    utf8_to_utf16(&s.to_lowercase())
}

/// First index at or after `from` where `pattern` occurs.
pub fn utf16_find_from(v: &[u16], pattern: &[u16], from: usize) -> Option<usize> {
    if from > v.len() {
        return None;
    }
    if pattern.is_empty() {
        return Some(from);
    }
    if pattern.len() > v.len() {
        return None;
    }
    (from..=v.len() - pattern.len()).find(|&i| v[i..i + pattern.len()] == *pattern)
}

/// Last index at or before `from` where `pattern` occurs.
pub fn utf16_rfind_from(v: &[u16], pattern: &[u16], from: usize) -> Option<usize> {
    if pattern.len() > v.len() {
        return None;
    }
    let last = (v.len() - pattern.len()).min(from);
    (0..=last).rev().find(|&i| v[i..i + pattern.len()] == *pattern)
}

const CONNECTOR_PUNCTUATION: &[char] = &[
    '_', '\u{203F}', '\u{2040}', '\u{2054}', '\u{FE33}', '\u{FE34}', '\u{FE4D}', '\u{FE4E}', '\u{FE4F}', '\u{FF3F}',
];

/// UnicodeLetter, `$` or `_`.
pub fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// IdentifierStart plus combining marks, digits, connector punctuation, ZWNJ and ZWJ.
pub fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c)
        || c.is_numeric()
        || unicode_normalization::char::is_combining_mark(c)
        || CONNECTOR_PUNCTUATION.contains(&c)
        || c == '\u{200C}'
        || c == '\u{200D}'
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// WhiteSpace production: TAB, VT, FF, SP, NBSP, BOM and category Zs.
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{000B}'
            | '\u{000C}'
            | ' '
            | '\u{00A0}'
            | '\u{FEFF}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Whitespace or line terminator, as stripped by `trim` and string to number conversion.
pub fn is_trimmable_unit(u: u16) -> bool {
    match char::from_u32(u as u32) {
        Some(c) => is_whitespace(c) || is_line_terminator(c),
        None => false,
    }
}

pub fn utf16_trim(v: &[u16]) -> &[u16] {
    let start = v.iter().position(|&u| !is_trimmable_unit(u)).unwrap_or(v.len());
    let end = v.iter().rposition(|&u| !is_trimmable_unit(u)).map(|i| i + 1).unwrap_or(start);
    &v[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_classes() {
        assert!(is_identifier_start('$'));
        assert!(is_identifier_start('é'));
        assert!(!is_identifier_start('1'));
        assert!(is_identifier_part('1'));
        assert!(is_identifier_part('\u{0301}'));
        assert!(is_whitespace('\u{00A0}'));
        assert!(!is_whitespace('\n'));
        assert!(is_line_terminator('\u{2028}'));
    }

    #[test]
    fn trim_and_search() {
        let s = utf8_to_utf16(" \n\u{a0}abc\t");
        assert_eq!(utf16_to_utf8(utf16_trim(&s)), "abc");
        let hay = utf8_to_utf16("abcabc");
        let pat = utf8_to_utf16("bc");
        assert_eq!(utf16_find_from(&hay, &pat, 2), Some(4));
        assert_eq!(utf16_rfind_from(&hay, &pat, 3), Some(1));
        assert_eq!(utf16_rfind_from(&hay, &pat, 100), Some(4));
    }
}
