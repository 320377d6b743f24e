use chrono::{DateTime, FixedOffset};
use chrono_tz::America::Bogota;
use pulldown_cmark::{html, Event, Parser};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strips diacritics via NFD decomposition so "Conversación" and
/// "Conversacion" compare equal.
pub fn remove_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Case and accent insensitive substring match used by the listing filter.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    remove_accents(haystack)
        .to_lowercase()
        .contains(&remove_accents(needle).to_lowercase())
}

/// Renders the light markdown of a message to HTML for mail and PDF bodies.
pub fn markdown_to_html(text: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(text));
    out
}

/// Flattens markdown to plain text lines for PDF layout.
pub fn markdown_to_plain(text: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(text) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(_) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
    out.trim_end().to_string()
}

/// Converts a stored UTC instant into the fixed display zone.
pub fn to_display_zone(date: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    date.with_timezone(&Bogota).fixed_offset()
}

/// Localized date string used by the registry listing and the mail subject.
pub fn format_display_date(date: DateTime<FixedOffset>) -> String {
    to_display_zone(date).format("%d/%m/%Y %I:%M %p").to_string()
}
