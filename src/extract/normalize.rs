//! Text normalization shared by every extractor
//!
//! Rendered text carries entity escapes, zero-width characters and layout
//! whitespace. `normalize` removes all three and is idempotent: a second pass
//! never changes its output.

use phf::phf_map;
use regex::{Captures, Regex};
use scraper::ElementRef;
use std::sync::LazyLock;

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,7});").expect("valid entity regex"));

static NAMED_ENTITIES: phf::Map<&'static str, char> = phf_map! {
    "amp" => '&',
    "lt" => '<',
    "gt" => '>',
    "quot" => '"',
    "apos" => '\'',
    "nbsp" => '\u{a0}',
    "ndash" => '\u{2013}',
    "mdash" => '\u{2014}',
    "middot" => '\u{b7}',
    "bull" => '\u{2022}',
    "hellip" => '\u{2026}',
    "lsquo" => '\u{2018}',
    "rsquo" => '\u{2019}',
    "ldquo" => '\u{201c}',
    "rdquo" => '\u{201d}',
    "copy" => '\u{a9}',
    "reg" => '\u{ae}',
    "trade" => '\u{2122}',
    "eacute" => '\u{e9}',
    "egrave" => '\u{e8}',
    "aacute" => '\u{e1}',
    "ouml" => '\u{f6}',
    "uuml" => '\u{fc}',
    "auml" => '\u{e4}',
    "szlig" => '\u{df}',
    "shy" => '\u{ad}',
    "zwj" => '\u{200d}',
    "zwnj" => '\u{200c}',
};

/// Characters the renderer injects that have no visible width
pub fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00ad}'
            | '\u{034f}'
            | '\u{061c}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
    ) || (c.is_control() && !c.is_whitespace())
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    NAMED_ENTITIES.get(entity).copied()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| match decode_entity(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn single_pass(text: &str) -> String {
    let decoded = decode_entities(text);
    let visible: String = decoded.chars().filter(|c| !is_invisible(*c)).collect();
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode entities, drop invisible characters, trim, and collapse runs of
/// whitespace to one space.
///
/// Every pass that changes the text makes it strictly shorter, so iterating
/// to a fixed point terminates.
pub fn normalize(text: &str) -> String {
    let mut current = single_pass(text);
    loop {
        let next = single_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Normalized text of an element, `None` when nothing visible remains
pub fn element_text(element: &ElementRef<'_>) -> Option<String> {
    let raw = element.text().collect::<Vec<_>>().join(" ");
    non_empty(normalize(&raw))
}

pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
