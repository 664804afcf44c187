//! Chat export line parsing.
//!
//! Two header shapes are recognized:
//!
//! - bracketed: `[31/12/2023, 22:15:04] Name: text`
//! - dashed: `31/12/2023, 22:15 - Name: text`
//!
//! Both accept `/`, `.` or `-` date separators, two or four digit years,
//! optional seconds and a 12 hour clock with AM/PM. Lines that do not start
//! a message continue the previous one.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// How many leading non-empty lines [`is_export_format`] inspects.
const SNIFF_LINES: usize = 10;
/// How many of those must be message headers.
const SNIFF_MIN_MATCHES: usize = 3;

static HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\[(?P<a>\d{1,2})[/.\-](?P<b>\d{1,2})[/.\-](?P<y>\d{2,4}),?\s+(?P<h>\d{1,2})[:.](?P<m>\d{2})(?:[:.](?P<s>\d{2}))?\s*(?P<ampm>[AaPp]\.?\s?[Mm]\.?)?\]\s*(?P<sender>[^:]+?):\s?(?P<text>.*)$",
        r"^(?P<a>\d{1,2})[/.\-](?P<b>\d{1,2})[/.\-](?P<y>\d{2,4}),?\s+(?P<h>\d{1,2})[:.](?P<m>\d{2})(?:[:.](?P<s>\d{2}))?\s*(?P<ampm>[AaPp]\.?\s?[Mm]\.?)?\s+-\s+(?P<sender>[^:]+?):\s?(?P<text>.*)$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// A dated line without a sender: group events, encryption notices.
static SYSTEM_LINE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^\[?\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4},?\s+\d{1,2}[:.]\d{2}").ok()
});

static MEDIA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^<media omitted>$",
        r"(?i)\b(image|video|audio|sticker|gif|document|contact card) omitted$",
        r"(?i)^<attached: [^>]*>$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// One message parsed from an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub content: String,
    pub is_media_placeholder: bool,
}

impl TranscriptEntry {
    /// `[YYYY-MM-DD HH:MM:SS] sender: content`
    pub fn render(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.sender,
            self.content
        )
    }
}

/// Strip the direction marks exports sprinkle around and turn narrow and
/// non-breaking spaces into plain ones.
fn normalize_line(line: &str) -> String {
    line.chars()
        .filter(|c| !matches!(c, '\u{200E}' | '\u{200F}' | '\u{FEFF}'))
        .map(|c| match c {
            '\u{202F}' | '\u{00A0}' => ' ',
            c => c,
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Whether `blob` looks like a chat export: at least 3 of its first 10
/// non-empty lines are message headers.
pub fn is_export_format(blob: &str) -> bool {
    blob.lines()
        .map(normalize_line)
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .filter(|l| HEADER_PATTERNS.iter().any(|p| p.is_match(l)))
        .count()
        >= SNIFF_MIN_MATCHES
}

/// Parse every message in `blob`, in file order.
pub fn parse(blob: &str) -> Vec<TranscriptEntry> {
    let mut entries: Vec<TranscriptEntry> = Vec::new();

    for raw in blob.lines() {
        let line = normalize_line(raw);
        if let Some(entry) = parse_header(&line) {
            entries.push(entry);
            continue;
        }
        if is_system_line(&line) {
            continue;
        }
        if let Some(last) = entries.last_mut() {
            last.content.push('\n');
            last.content.push_str(&line);
        }
    }

    for entry in &mut entries {
        let trimmed = entry.content.trim_end().len();
        entry.content.truncate(trimmed);
        entry.is_media_placeholder = is_media_placeholder(&entry.content);
    }
    entries
}

pub fn is_media_placeholder(content: &str) -> bool {
    let content = content.trim();
    MEDIA_PATTERNS.iter().any(|p| p.is_match(content))
}

fn is_system_line(line: &str) -> bool {
    SYSTEM_LINE
        .as_ref()
        .map(|re| re.is_match(line))
        .unwrap_or(false)
}

fn parse_header(line: &str) -> Option<TranscriptEntry> {
    let caps = HEADER_PATTERNS.iter().find_map(|p| p.captures(line))?;
    let timestamp = parse_timestamp(&caps)?;
    let sender = caps.name("sender")?.as_str().trim().to_string();
    if sender.is_empty() {
        return None;
    }
    Some(TranscriptEntry {
        timestamp,
        sender,
        content: caps
            .name("text")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        is_media_placeholder: false,
    })
}

fn number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

/// A first date field above 12 can only be a day; otherwise the date is read
/// month-first.
fn parse_timestamp(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let a = number(caps, "a")?;
    let b = number(caps, "b")?;
    let (day, month) = if a > 12 { (a, b) } else { (b, a) };

    let mut year = number(caps, "y")? as i32;
    if year < 100 {
        year += 2000;
    }

    let mut hour = number(caps, "h")?;
    let minute = number(caps, "m")?;
    let second = number(caps, "s").unwrap_or(0);

    if let Some(ampm) = caps.name("ampm") {
        let pm = ampm.as_str().to_ascii_lowercase().starts_with('p');
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_bracketed_day_first() {
        let entries = parse("[31/12/2023, 22:15:04] Ana: happy new year");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, at(2023, 12, 31, 22, 15, 4));
        assert_eq!(entries[0].sender, "Ana");
        assert_eq!(entries[0].content, "happy new year");
    }

    #[test]
    fn test_dashed_month_first_with_ampm() {
        let entries = parse("3/4/24, 9:05 PM - Ben Smith: see you");
        assert_eq!(entries[0].timestamp, at(2024, 3, 4, 21, 5, 0));
        assert_eq!(entries[0].sender, "Ben Smith");
    }

    #[test]
    fn test_ambiguous_date_is_month_first() {
        let entries = parse("[05.06.2023, 10:00] Ana: hi");
        assert_eq!(entries[0].timestamp, at(2023, 5, 6, 10, 0, 0));
    }

    #[test]
    fn test_midnight_and_narrow_spaces() {
        let entries = parse("\u{200E}[1/2/2024, 12:30:00\u{202F}AM] Ana: late");
        assert_eq!(entries[0].timestamp, at(2024, 1, 2, 0, 30, 0));
    }

    #[test]
    fn test_continuation_lines() {
        let blob = "[31/12/2023, 22:15:04] Ana: first line\nsecond line\n\n[31/12/2023, 22:16:00] Ben: reply";
        let entries = parse(blob);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "first line\nsecond line");
        assert_eq!(entries[1].content, "reply");
    }

    #[test]
    fn test_system_lines_skipped() {
        let blob = "31/12/2023, 22:00 - Messages and calls are end-to-end encrypted.\n\
                    31/12/2023, 22:01 - Ana: hello";
        let entries = parse(blob);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "hello");
    }

    #[test]
    fn test_media_placeholders() {
        let blob = "[31/12/2023, 22:15:04] Ana: <Media omitted>\n\
                    [31/12/2023, 22:15:05] Ana: \u{200E}image omitted\n\
                    [31/12/2023, 22:15:06] Ana: <attached: 00000012-PHOTO.jpg>\n\
                    [31/12/2023, 22:15:07] Ana: I omitted nothing";
        let flags: Vec<bool> = parse(blob).iter().map(|e| e.is_media_placeholder).collect();
        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn test_is_export_format() {
        let export = "[1/1/2024, 10:00:00] Ana: a\n[1/1/2024, 10:01:00] Ben: b\n[1/1/2024, 10:02:00] Ana: c";
        assert!(is_export_format(export));
        assert!(!is_export_format("just some notes\nabout nothing\n[1/1/2024, 10:00:00] Ana: a"));
        assert!(!is_export_format(""));
    }

    #[test]
    fn test_invalid_date_is_not_a_header() {
        assert!(parse("[31/31/2023, 10:00] Ana: bad").is_empty());
    }

    #[test]
    fn test_render() {
        let entries = parse("[31/12/2023, 22:15:04] Ana: hi");
        assert_eq!(entries[0].render(), "[2023-12-31 22:15:04] Ana: hi");
    }
}
