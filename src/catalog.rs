//! Catalog loading
//!
//! Turns the source JSON array into an immutable, input-order-preserving
//! [`Catalog`] with lookup by record id. Loading is all-or-nothing: a single
//! malformed record fails the whole load, so the analytical views are never
//! computed over a partially-invalid collection. The error names the
//! offending record (index, plus id when one was present), which is what the
//! curators need to fix the dataset.

use crate::record::{
    normalize_themes, parse_publication_date, CartoonRecord, RawRecord, RecordId,
};
use chrono::Datelike;
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};
use thiserror::Error;

/// Immutable in-memory table of catalogued charges
///
/// Preserves the input order of the source file and owns no mutation API:
/// once loaded, the collection is read-only for the rest of the session.
/// Both analytical views ([`crate::CooccurrenceGraph`], [`crate::Timeline`])
/// are pure functions of this table.
#[derive(Clone, Debug)]
pub struct Catalog {
    /// Records in source order
    records: Box<[CartoonRecord]>,

    /// Position of each record in `records`, keyed by record id
    by_id: HashMap<RecordId, usize>,
}
//
impl Catalog {
    /// Load the catalog from a JSON file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Load the catalog from a JSON reader
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, CatalogError> {
        Self::from_raw_records(serde_json::from_reader::<_, Vec<RawRecord>>(reader)?)
    }

    /// Load the catalog from in-memory JSON text
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::from_raw_records(serde_json::from_str::<Vec<RawRecord>>(json)?)
    }

    /// Check and normalize decoded records into a catalog
    ///
    /// This is the validation core behind every constructor. Records are
    /// checked in source order and the first malformed one aborts the load.
    pub fn from_raw_records(
        raw_records: impl IntoIterator<Item = RawRecord>,
    ) -> Result<Self, CatalogError> {
        let raw_records = raw_records.into_iter();
        let mut records = Vec::with_capacity(raw_records.size_hint().0);
        let mut by_id = HashMap::new();
        for (index, raw) in raw_records.enumerate() {
            let record =
                check_record(raw).map_err(|reason| CatalogError::MalformedRecord {
                    index,
                    reason,
                })?;
            if by_id.insert(record.id, index).is_some() {
                return Err(CatalogError::MalformedRecord {
                    index,
                    reason: MalformedReason::DuplicateId(record.id),
                });
            }
            records.push(record);
        }
        log::info!("Loaded catalog of {} records", records.len());
        Ok(Self {
            records: records.into(),
            by_id,
        })
    }

    /// Records in source order
    pub fn records(&self) -> &[CartoonRecord] {
        &self.records
    }

    /// Look up a record by its id
    pub fn by_id(&self, id: RecordId) -> Option<&CartoonRecord> {
        self.by_id.get(&id).map(|&index| &self.records[index])
    }

    /// Number of records in the catalog
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Truth that the catalog holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Failure mode of a catalog load
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Could not read the catalog source
    #[error("failed to read catalog source")]
    Io(#[from] std::io::Error),

    /// Catalog source is not a JSON array of records
    #[error("catalog source is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// One record failed validation, aborting the whole load
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord {
        /// Zero-based position of the record in the source array
        index: usize,

        /// What exactly was wrong with it
        reason: MalformedReason,
    },
}

/// Reason why a record was rejected
///
/// Only `id` and `publication_date` are load-bearing for downstream
/// grouping, so these are the only fatal conditions. Everything else is
/// defaulted or normalized instead.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MalformedReason {
    /// Record carries no id
    #[error("missing \"id\" field")]
    MissingId,

    /// Record reuses the id of an earlier record
    #[error("duplicate id {0}")]
    DuplicateId(RecordId),

    /// Record's publication date does not parse as an ISO 8601 date
    #[error("record {id} has invalid publication date {raw:?}")]
    InvalidPublicationDate {
        /// Id of the offending record
        id: RecordId,

        /// Raw field content, for the error report
        raw: Box<str>,
    },
}

/// Check one decoded record and normalize it
///
/// `year` is redundant with `publication_date` but authoritative for
/// grouping, so when the source provides both and they disagree we keep the
/// explicit `year` and log the mismatch rather than reject the record.
fn check_record(raw: RawRecord) -> Result<CartoonRecord, MalformedReason> {
    let id = raw.id.ok_or(MalformedReason::MissingId)?;
    let publication_date = parse_publication_date(&raw.publication_date).ok_or_else(|| {
        MalformedReason::InvalidPublicationDate {
            id,
            raw: raw.publication_date.clone().into(),
        }
    })?;
    let date_year = publication_date.year();
    let year = raw.year.unwrap_or(date_year);
    if year != date_year {
        log::warn!(
            "Record {id} declares year {year} but its publication date is in {date_year}, \
             keeping the declared year for grouping"
        );
    }
    Ok(CartoonRecord {
        id,
        title: raw.title.into(),
        caption: raw.caption.into(),
        content: raw.content.into(),
        category: raw.category.trim().into(),
        publication_date,
        author_name: raw.author_name.into(),
        engraver_name: raw.engraver_name.into(),
        image_url: raw.image_url.into(),
        themes: normalize_themes(raw.themes),
        topic: raw.topic.trim().into(),
        year,
        has_author_signature: raw.has_author_signature,
        has_engraver_signature: raw.has_engraver_signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: RecordId, date: &str) -> RawRecord {
        RawRecord {
            id: Some(id),
            publication_date: date.to_owned(),
            ..RawRecord::default()
        }
    }

    #[test]
    fn load_preserves_order_and_indexes_by_id() {
        let catalog = Catalog::from_raw_records([
            raw(3, "1856-01-05"),
            raw(1, "1856-02-12"),
            raw(2, "1857-03-19"),
        ])
        .expect("valid records should load");
        assert_eq!(catalog.len(), 3);
        let ids = catalog.records().iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, [3, 1, 2]);
        assert_eq!(catalog.by_id(1).expect("id 1 was loaded").id, 1);
        assert!(catalog.by_id(42).is_none());
    }

    #[test]
    fn missing_id_fails_the_whole_load() {
        let mut anonymous = raw(0, "1856-01-05");
        anonymous.id = None;
        let error = Catalog::from_raw_records([raw(1, "1856-01-05"), anonymous])
            .expect_err("missing id should be fatal");
        match error {
            CatalogError::MalformedRecord { index, reason } => {
                assert_eq!(index, 1);
                assert_eq!(reason, MalformedReason::MissingId);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_id_fails_the_whole_load() {
        let error = Catalog::from_raw_records([raw(1, "1856-01-05"), raw(1, "1857-01-05")])
            .expect_err("duplicate id should be fatal");
        match error {
            CatalogError::MalformedRecord { index, reason } => {
                assert_eq!(index, 1);
                assert_eq!(reason, MalformedReason::DuplicateId(1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn invalid_publication_date_fails_the_whole_load() {
        let error = Catalog::from_raw_records([raw(1, "eighteen fifty-six")])
            .expect_err("unparseable date should be fatal");
        match error {
            CatalogError::MalformedRecord { index, reason } => {
                assert_eq!(index, 0);
                assert_eq!(
                    reason,
                    MalformedReason::InvalidPublicationDate {
                        id: 1,
                        raw: "eighteen fifty-six".into(),
                    }
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn year_defaults_to_publication_year_but_explicit_year_wins() {
        let mut derived = raw(1, "1856-06-15");
        derived.year = None;
        let mut explicit = raw(2, "1856-12-31");
        explicit.year = Some(1857);
        let catalog = Catalog::from_raw_records([derived, explicit]).expect("valid records");
        assert_eq!(catalog.by_id(1).expect("loaded").year, 1856);
        assert_eq!(catalog.by_id(2).expect("loaded").year, 1857);
    }

    #[test]
    fn json_array_loads_with_defaults_and_unknown_fields() {
        let catalog = Catalog::from_json_str(
            r#"[
                {
                    "id": 1,
                    "title": "A Merry Christmas",
                    "publication_date": "1860-12-26T00:00:00Z",
                    "themes": [" Festivities ", "Festivities", "Politics"],
                    "category": " Costumes ",
                    "yet_unknown_field": 12
                }
            ]"#,
        )
        .expect("permissive decoding should succeed");
        let record = catalog.by_id(1).expect("loaded");
        assert_eq!(record.year, 1860);
        assert_eq!(record.category, "Costumes".into());
        let themes = record.themes.iter().map(|t| &**t).collect::<Vec<_>>();
        assert_eq!(themes, ["Festivities", "Politics"]);
        assert_eq!(record.caption, "".into());
    }

    #[test]
    fn malformed_json_is_reported_before_any_record_check() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Json(_))
        ));
    }
}
