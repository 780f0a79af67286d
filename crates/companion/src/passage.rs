//! Verse batching and passage text.

use crate::{CompanionError, Verse};

/// Verses per range offered for a chapter.
pub const VERSE_BATCH: usize = 15;

/// Longest content chunk in bytes. Keeps a viewer chunk record within the
/// 128 byte dictionary limit.
pub const CHUNK_LEN: usize = 80;

/// Split a chapter of `verse_count` verses into labels such as `"1-15"`,
/// `"16-30"`, `"31-34"`.
pub fn verse_ranges(verse_count: usize) -> Vec<String> {
    (0..verse_count.div_ceil(VERSE_BATCH))
        .map(|batch| {
            let first = batch * VERSE_BATCH + 1;
            let last = ((batch + 1) * VERSE_BATCH).min(verse_count);
            format!("{first}-{last}")
        })
        .collect()
}

/// Parse a `"first-last"` label. A single number selects one verse.
pub fn parse_range(range: &str) -> Result<(u16, u16), CompanionError> {
    let invalid = || CompanionError::InvalidRange(range.to_owned());
    let (first, last) = match range.split_once('-') {
        Some((first, last)) => (first, last),
        None => (range, range),
    };
    let first = first.trim().parse().map_err(|_| invalid())?;
    let last = last.trim().parse().map_err(|_| invalid())?;
    if first > last {
        return Err(invalid());
    }
    Ok((first, last))
}

/// Render the verses within `range` as `"{n}) {text} "`, cleaned.
pub fn render(verses: &[Verse], range: &str) -> Result<String, CompanionError> {
    let (first, last) = parse_range(range)?;
    let text: String = verses
        .iter()
        .filter(|verse| (first..=last).contains(&verse.number))
        .map(|verse| format!("{}) {} ", verse.number, verse.text))
        .collect();
    Ok(clean(&text))
}

/// Strip bold markup and normalize dashes and curly quotes.
pub fn clean(text: &str) -> String {
    text.replace("<b>", "")
        .replace("</b>", "")
        .replace("&#8211;", "-")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

/// Split `text` into chunks of at most `max` bytes without splitting a
/// character.
pub fn chunk(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if !current.is_empty() && current.len() + ch.len_utf8() > max {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
