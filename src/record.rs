//! Catalog record model
//!
//! The source catalog is a hand-curated JSON array. Its entries are decoded
//! into a permissive [`RawRecord`] first (every field optional, unknown
//! fields ignored so the dataset can grow without breaking old readers),
//! then checked into a [`CartoonRecord`] by the loader. Only `id` and
//! `publication_date` are load-bearing for downstream grouping; everything
//! else is defaulted when absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Unique identifier of a catalogued charge
pub type RecordId = u64;

/// Topical tag attached to a charge
///
/// Zero or more per record. Drawn from a controlled but unenforced
/// vocabulary, so the loader normalizes rather than validates: surrounding
/// whitespace is trimmed, entries left empty are dropped, and duplicates
/// within one record are collapsed while preserving first-occurrence order
/// (the curators' ordering may carry light authorial intent).
pub type Theme = Box<str>;

/// Year of Gregorian Calendar
pub type Year = i32;

/// One catalogued charge, checked and normalized
///
/// Immutable after load. Built from a [`RawRecord`] by the catalog loader,
/// which is the only place allowed to construct the collection.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CartoonRecord {
    /// Unique identifier across the collection
    pub id: RecordId,

    /// Title as printed, may be empty
    pub title: Box<str>,

    /// Printed caption, may be empty
    pub caption: Box<str>,

    /// Free-text description, may contain markup
    pub content: Box<str>,

    /// Single-valued classification, distinct from themes
    pub category: Box<str>,

    /// Publication date of the issue carrying this charge
    pub publication_date: NaiveDate,

    /// Credited author, may be empty
    pub author_name: Box<str>,

    /// Credited engraver, may be empty
    pub engraver_name: Box<str>,

    /// Path or URI of the digitized image
    pub image_url: Box<str>,

    /// Normalized themes: trimmed, non-empty, deduplicated, source order
    pub themes: Box<[Theme]>,

    /// Single-valued topic classification
    pub topic: Box<str>,

    /// Publication year, authoritative for grouping
    ///
    /// Redundant with `publication_date`; when the source carries both and
    /// they disagree, this field wins and the mismatch is logged.
    pub year: Year,

    /// Truth that the charge bears the author's signature
    pub has_author_signature: bool,

    /// Truth that the charge bears the engraver's signature
    pub has_engraver_signature: bool,
}

/// Catalog entry as it appears in the source JSON
///
/// Deliberately permissive: the dataset allows empty `caption`,
/// `author_name`, etc., so absence is defaulted rather than fatal, and
/// unknown fields are ignored. Validation into [`CartoonRecord`] happens in
/// the loader, where missing/duplicated `id` and unparseable
/// `publication_date` are the only fatal conditions.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub engraver_name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub year: Option<Year>,
    #[serde(default)]
    pub has_author_signature: bool,
    #[serde(default)]
    pub has_engraver_signature: bool,
}

/// Normalize a record's theme list
///
/// Trims every entry, drops entries that are empty after trimming, and
/// collapses duplicates while keeping the first occurrence's position. This
/// is the single normalization point: downstream views never see a
/// whitespace-only or repeated theme.
pub fn normalize_themes(themes: Vec<String>) -> Box<[Theme]> {
    let mut normalized = Vec::<Theme>::with_capacity(themes.len());
    for theme in themes {
        let theme = theme.trim();
        if theme.is_empty() {
            log::trace!("Dropping whitespace-only theme entry");
            continue;
        }
        if normalized.iter().any(|seen| &**seen == theme) {
            log::trace!("Dropping duplicate theme {theme:?} within one record");
            continue;
        }
        normalized.push(theme.into());
    }
    normalized.into()
}

/// Parse an ISO 8601 publication date
///
/// The curated dataset mixes full RFC 3339 timestamps with bare dates, so
/// accept both, plus the zone-less date-time shape in between.
pub(crate) fn parse_publication_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_are_trimmed_deduplicated_and_kept_in_order() {
        let themes = vec![
            "  War ".to_owned(),
            "Politics".to_owned(),
            "War".to_owned(),
            "   ".to_owned(),
            "".to_owned(),
            "Empire".to_owned(),
        ];
        let normalized = normalize_themes(themes);
        let as_strs = normalized.iter().map(|t| &**t).collect::<Vec<_>>();
        assert_eq!(as_strs, ["War", "Politics", "Empire"]);
    }

    #[test]
    fn empty_theme_list_stays_empty() {
        assert!(normalize_themes(Vec::new()).is_empty());
        assert!(normalize_themes(vec!["  ".to_owned()]).is_empty());
    }

    #[test]
    fn publication_date_accepts_common_iso_shapes() {
        let expected = NaiveDate::from_ymd_opt(1860, 12, 26).expect("valid date");
        for raw in [
            "1860-12-26",
            "1860-12-26T00:00:00",
            "1860-12-26T12:34:56.789",
            "1860-12-26T00:00:00Z",
            "1860-12-26T00:00:00+02:00",
            " 1860-12-26 ",
        ] {
            assert_eq!(parse_publication_date(raw), Some(expected), "input {raw:?}");
        }
    }

    #[test]
    fn publication_date_rejects_garbage() {
        for raw in ["", "sometime in 1860", "1860-13-01", "1860/12/26"] {
            assert_eq!(parse_publication_date(raw), None, "input {raw:?}");
        }
    }

    #[test]
    fn unknown_fields_are_ignored_and_absent_fields_defaulted() {
        let raw: RawRecord = serde_json::from_str(
            r#"{
                "id": 7,
                "publication_date": "1860-12-26",
                "themes": ["War"],
                "newly_added_field": {"nested": true}
            }"#,
        )
        .expect("raw records tolerate unknown and missing fields");
        assert_eq!(raw.id, Some(7));
        assert_eq!(raw.title, "");
        assert_eq!(raw.year, None);
        assert!(!raw.has_author_signature);
    }
}
