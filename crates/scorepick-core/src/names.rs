// Name and jersey-number normalization for matching free-text identifiers.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a display name to a comparison key: accents stripped, lowercase,
/// punctuation dropped, hyphens treated as word breaks, whitespace collapsed.
///
/// `"Montréal Canadiens"` and `"Montreal  Canadiens"` fold to the same key,
/// as do `"J.T. Miller"` and `"JT Miller"`.
pub fn normalize_name(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    for c in raw.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ø' | 'Ø' => folded.push('o'),
            'ł' | 'Ł' => folded.push('l'),
            'đ' | 'Đ' => folded.push('d'),
            'ß' => folded.push_str("ss"),
            'æ' | 'Æ' => folded.push_str("ae"),
            '-' | '_' | '/' => folded.push(' '),
            c if c.is_alphanumeric() || c.is_whitespace() => {
                folded.extend(c.to_lowercase());
            }
            _ => {}
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Last whitespace-separated token of the normalized name.
pub fn normalized_last_name(raw: &str) -> String {
    normalize_name(raw)
        .rsplit(' ')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Join first and last names the way the league displays them.
pub fn full_name(first: &str, last: &str) -> String {
    let first = first.trim();
    let last = last.trim();
    match (first.is_empty(), last.is_empty()) {
        (true, _) => last.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first} {last}"),
    }
}

/// Parse a jersey number that may arrive as `"14"`, `"#14"`, `" 14 "` or `"14.0"`.
pub fn parse_jersey(raw: &str) -> Option<u32> {
    let trimmed = raw.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<u32>() {
        return Some(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Some(f as u32),
        _ => None,
    }
}

/// Parse a jersey number from an arbitrary JSON value (string or number).
pub fn jersey_from_json(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| n.as_f64().and_then(|f| parse_jersey(&f.to_string()))),
        serde_json::Value::String(s) => parse_jersey(s),
        _ => None,
    }
}
