/*!
 * Realignment of numbered batch responses.
 *
 * Models do not always answer in the exact shape they were asked for. The
 * parser tries three increasingly permissive readings of a response and keeps
 * the first one that yields the expected number of items:
 *
 * 1. lines that start with a `[n]` marker;
 * 2. any `[ n ]` marker in the text, tolerating odd spacing and multi-line
 *    items, ordered by marker number;
 * 3. plain non-empty lines, minus the usual "Here are the translations"
 *    boilerplate.
 *
 * Marker readings place each item by its `[n]` index, so an empty or skipped
 * marker leaves a hole instead of shifting later items up. When no reading
 * fills every slot, the best candidate is returned and the caller falls back
 * to the source text for the holes.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

// @const: Marker with optional inner whitespace
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*(\d+)\s*\]").unwrap());

// @const: Line that starts with a marker
static LINE_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\s*(\d+)\s*\](.*)$").unwrap());

// @const: Leading marker on a line
static LEADING_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]\s*").unwrap());

/// Line prefixes that introduce commentary rather than a translation
const BOILERPLATE_PREFIXES: &[&str] = &["Translation", "Translated", "Here", "Sure", "Note:"];

/// One slot per item of the batch; `None` where no translation was found
pub type Slots = Vec<Option<String>>;

/// Parse a numbered response into exactly `expected` slots
pub fn parse_numbered_response(response: &str, expected: usize) -> Slots {
    let mut slots = place_by_index(parse_marker_lines(response), expected);
    debug!("Marker lines: found {} of {} translations", filled(&slots), expected);

    if filled(&slots) != expected {
        let scanned = place_by_index(scan_markers(response), expected);
        debug!("Marker scan: found {} of {} translations", filled(&scanned), expected);

        if filled(&scanned) > filled(&slots) {
            slots = scanned;
        }
    }

    if filled(&slots) != expected {
        let lines = parse_plain_lines(response);
        debug!("Plain lines: found {} of {} translations", lines.len(), expected);

        if lines.len() == expected {
            slots = lines.into_iter().map(Some).collect();
        }
    }

    if filled(&slots) != expected {
        let preview: Vec<&str> = response.lines().take(5).collect();
        warn!(
            "Response count mismatch: expected {}, got {}. First lines: {}",
            expected,
            filled(&slots),
            preview.join(" | ")
        );
    }

    slots
}

fn filled(slots: &[Option<String>]) -> usize {
    slots.iter().filter(|slot| slot.is_some()).count()
}

/// Put indexed items into their slots
///
/// Out-of-range indices are dropped and the first item wins on duplicates.
/// A response numbered `[1]..=[expected]` is read as one-based.
fn place_by_index(items: Vec<(usize, String)>, expected: usize) -> Slots {
    let one_based = expected > 0
        && items.iter().all(|(index, _)| *index >= 1)
        && items.iter().any(|(index, _)| *index == expected);
    let shift = usize::from(one_based);

    let mut slots: Slots = vec![None; expected];
    for (index, text) in items {
        if let Some(slot) = slots.get_mut(index - shift) {
            if slot.is_none() && !text.is_empty() {
                *slot = Some(text);
            }
        }
    }
    slots
}

/// Lines that start with a `[n]` marker, with the text after it
fn parse_marker_lines(response: &str) -> Vec<(usize, String)> {
    response
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let caps = LINE_MARKER_REGEX.captures(line)?;
            let index = caps[1].parse().ok()?;
            Some((index, caps[2].trim().to_string()))
        })
        .collect()
}

/// Text between consecutive markers anywhere in the response
fn scan_markers(response: &str) -> Vec<(usize, String)> {
    let markers: Vec<(usize, usize, usize)> = MARKER_REGEX
        .captures_iter(response)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let index = caps[1].parse().ok()?;
            Some((index, whole.start(), whole.end()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(index, _, text_start))| {
            let text_end = markers.get(i + 1).map_or(response.len(), |next| next.1);
            (index, response[text_start..text_end].trim().to_string())
        })
        .collect()
}

/// Non-empty lines that are not boilerplate, leading markers removed
fn parse_plain_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !BOILERPLATE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .map(|line| LEADING_MARKER_REGEX.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
