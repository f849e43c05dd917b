// src/title.rs
//! Article title canonicalization.
//!
//! Titles reach the engine from two directions: the announcement feed (the
//! eligible `articleTitles` set) and the article the reader is looking at.
//! Both go through [`normalize_title`] so they compare equal.
//!
//! - percent escapes are decoded (`Caf%C3%A9` → `Café`)
//! - underscores become spaces (`New_York` → `New York`)
//! - Unicode is composed to NFC (`Cafe\u{301}` → `Café`)
//! - whitespace runs collapse to one space, ends are trimmed
//! - titles with characters MediaWiki forbids (`#<>[]|{}`, control chars) are rejected
//!
//! Normalization is idempotent. The price is that a decode which still
//! leaves a `%` behind is discarded: `%2541` stays `%2541`, and likewise
//! `100%25` stays `100%25`, so it will not match a feed listing of `100%`.
//! Titles containing a literal `%` have to arrive undecoded to match.
//!
//! The `+` form used by survey forms is produced separately by
//! [`form_encode_title`] and never stored.

use once_cell::sync::OnceCell;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters that can never appear in a page title.
const ILLEGAL_TITLE_CHARS: [char; 8] = ['#', '<', '>', '[', ']', '|', '{', '}'];

/// Canonicalize an article title. Returns `None` when nothing usable is left.
pub fn normalize_title(raw: &str) -> Option<String> {
    // 1) Percent-decode, but only keep the decoded form when it is fully
    //    decoded. "%2541" would otherwise decode to "%41" and then to "A" on a
    //    second pass.
    let decoded = match urlencoding::decode(raw) {
        Ok(d) if !d.contains('%') => d.into_owned(),
        _ => raw.to_string(),
    };

    // 2) Underscores are the URL form of spaces; compose to NFC.
    let spaced: String = decoded.replace('_', " ").nfc().collect();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    let out = re_ws.replace_all(&spaced, " ").trim().to_string();

    // 4) Reject empty / illegal titles
    if out.is_empty() {
        return None;
    }
    if out
        .chars()
        .any(|c| c.is_control() || ILLEGAL_TITLE_CHARS.contains(&c))
    {
        return None;
    }

    Some(out)
}

/// Query-form encoding expected by the survey form: spaces become `+`.
pub fn form_encode_title(normalized: &str) -> String {
    normalized.replace(' ', "+")
}
