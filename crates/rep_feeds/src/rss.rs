//! RSS 2.0 and Atom feed parsing.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rep_core::{Error, Result};

/// One `<item>` (RSS) or `<entry>` (Atom) of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub summary: String,
}

impl FeedEntry {
    /// Best-effort parse of the publication date (RFC 2822 for RSS, RFC 3339 for Atom).
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.published.as_deref()?.trim();
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase()
}

fn href(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == b"href")
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn assign(entry: &mut FeedEntry, tag: &str, text: &str) {
    match tag {
        "title" => entry.title.push_str(text),
        "link" => entry.link.push_str(text.trim()),
        "pubdate" | "published" | "updated" | "date" => {
            let published = entry.published.get_or_insert_with(String::new);
            published.push_str(text);
        }
        "description" | "summary" | "content" => entry.summary.push_str(text),
        _ => {}
    }
}

/// Parse a feed body into entries, in document order.
///
/// Entries without a link are skipped since there is nothing to download.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                match name.as_str() {
                    "item" | "entry" => {
                        current = Some(FeedEntry::default());
                        current_tag.clear();
                    }
                    "link" => {
                        if let (Some(entry), Some(href)) = (current.as_mut(), href(&e)) {
                            if entry.link.is_empty() {
                                entry.link = href;
                            }
                        }
                        current_tag = name;
                    }
                    _ => current_tag = name,
                }
            }
            Ok(Event::Empty(e)) => {
                // Atom links are self-closing: <link href="..."/>
                if local_name(&e) == "link" {
                    if let (Some(entry), Some(href)) = (current.as_mut(), href(&e)) {
                        if entry.link.is_empty() {
                            entry.link = href;
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if name == "item" || name == "entry" {
                    if let Some(entry) = current.take() {
                        if !entry.link.is_empty() {
                            entries.push(entry);
                        }
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(entry) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::Feed(format!("Bad text in feed: {}", err)))?;
                    assign(entry, &current_tag, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(entry) = current.as_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    assign(entry, &current_tag, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Feed(format!(
                    "Malformed feed at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(entries)
}
