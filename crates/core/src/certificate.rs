//! Certificate documents and hour aggregation.
//!
//! Issuing a certificate converts a scanner's pending ledger hours into a
//! rendered artifact and zeroes the ledger entries it covered. This module
//! holds the pure half of that: deciding whether anything can be certified,
//! summing the hours, computing the period covered, and describing what the
//! renderer should put on the page. The transactional claim-and-zero lives in
//! the database crate.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Date format printed on certificates and in notification messages.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

// ---------------------------------------------------------------------------
// Artifact format
// ---------------------------------------------------------------------------

/// Output format of a rendered certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Pdf,
    Txt,
}

impl ArtifactFormat {
    /// Parse a `?format=` query value. Unknown values fall back to PDF.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("txt") | Some("text") => Self::Txt,
            _ => Self::Pdf,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }
}

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// One line of an itemized aggregate certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateItem {
    pub event_name: String,
    pub event_date: NaiveDate,
    pub hours: f64,
}

/// What the certificate is for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CertificateScope {
    /// A single event participation.
    Event {
        event_name: String,
        event_date: NaiveDate,
        leader_name: Option<String>,
    },
    /// Every pending participation of one scanner.
    Period {
        first_date: NaiveDate,
        last_date: NaiveDate,
        items: Vec<CertificateItem>,
    },
}

/// Everything a renderer needs to produce a certificate artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateDocument {
    /// Upper-cased "FIRST LAST".
    pub full_name: String,
    /// Rounded integer hours printed on the certificate.
    pub hours: i64,
    pub scope: CertificateScope,
    pub issued_on: NaiveDate,
}

impl CertificateDocument {
    /// Certificate for one event participation.
    pub fn for_participation(
        first_name: &str,
        last_name: &str,
        pending_hours: f64,
        event_name: &str,
        event_date: NaiveDate,
        leader_name: Option<String>,
        issued_on: NaiveDate,
    ) -> Result<Self, CoreError> {
        ensure_certifiable(pending_hours)?;
        Ok(Self {
            full_name: display_name(first_name, last_name),
            hours: certificate_hours(pending_hours),
            scope: CertificateScope::Event {
                event_name: event_name.to_string(),
                event_date,
                leader_name,
            },
            issued_on,
        })
    }

    /// Aggregate certificate for a scanner's claimed hours.
    ///
    /// When `itemized` is false the item list is left empty; the period is
    /// always printed.
    pub fn for_claim(
        first_name: &str,
        last_name: &str,
        claim: &AggregateClaim,
        itemized: bool,
        issued_on: NaiveDate,
    ) -> Self {
        let items = if itemized {
            claim
                .entries
                .iter()
                .map(|e| CertificateItem {
                    event_name: e.event_name.clone(),
                    event_date: e.event_date,
                    hours: e.hours,
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            full_name: display_name(first_name, last_name),
            hours: certificate_hours(claim.total_hours),
            scope: CertificateScope::Period {
                first_date: claim.first_date,
                last_date: claim.last_date,
                items,
            },
            issued_on,
        }
    }

    /// The "DD.MM.YYYY - DD.MM.YYYY" period line, for aggregate certificates.
    pub fn period_text(&self) -> Option<String> {
        match &self.scope {
            CertificateScope::Period {
                first_date,
                last_date,
                ..
            } => Some(format_period(*first_date, *last_date)),
            CertificateScope::Event { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// A pending ledger entry as read (and locked) during aggregate issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub participant_id: DbId,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub hours: f64,
}

/// The result of summing a scanner's pending entries.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateClaim {
    /// Exact (unrounded) sum; this is what is added to
    /// `total_certificate_hours`.
    pub total_hours: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Contributing entries (those with hours > 0), ordered by event date.
    pub entries: Vec<PendingEntry>,
}

impl AggregateClaim {
    /// Ids of the ledger rows this claim will zero.
    pub fn participant_ids(&self) -> Vec<DbId> {
        self.entries.iter().map(|e| e.participant_id).collect()
    }
}

/// Sum the pending entries of one scanner.
///
/// Entries with no pending hours do not contribute to the total, the period
/// or the item list. Fails with [`CoreError::NoHoursAvailable`] when the
/// total would print as zero hours.
pub fn aggregate(entries: &[PendingEntry]) -> Result<AggregateClaim, CoreError> {
    let mut contributing: Vec<PendingEntry> = entries
        .iter()
        .filter(|e| e.hours.is_finite() && e.hours > 0.0)
        .cloned()
        .collect();
    contributing.sort_by_key(|e| (e.event_date, e.participant_id));

    let (first, last) = match (contributing.first(), contributing.last()) {
        (Some(first), Some(last)) => (first.event_date, last.event_date),
        _ => return Err(CoreError::NoHoursAvailable),
    };
    let total_hours: f64 = contributing.iter().map(|e| e.hours).sum();
    ensure_certifiable(total_hours)?;

    Ok(AggregateClaim {
        total_hours,
        first_date: first,
        last_date: last,
        entries: contributing,
    })
}

/// A certificate must print at least one hour. Smaller balances stay
/// pending so they can add up across events.
fn ensure_certifiable(hours: f64) -> Result<(), CoreError> {
    if certificate_hours(hours) > 0 {
        Ok(())
    } else {
        Err(CoreError::NoHoursAvailable)
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Round pending hours to the integer printed on a certificate.
///
/// Halves round to the nearest even number, so 2.5 prints as 2 and 3.5 as 4.
pub fn certificate_hours(hours: f64) -> i64 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    hours.round_ties_even() as i64
}

/// Upper-cased "FIRST LAST" as printed on certificates.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name.trim(), last_name.trim())
        .trim()
        .to_uppercase()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn format_period(first: NaiveDate, last: NaiveDate) -> String {
    format!("{} - {}", format_date(first), format_date(last))
}

/// File name for a single-participation certificate.
pub fn participation_file_name(last_name: &str, event_name: &str, format: ArtifactFormat) -> String {
    format!(
        "certificate_{}_{}.{}",
        sanitize_file_component(last_name),
        sanitize_file_component(event_name),
        format.extension()
    )
}

/// File name for a scanner's certificate. The scanner id keeps archive
/// entries unique when two scanners share a name.
pub fn scanner_file_name(
    scanner_id: DbId,
    first_name: &str,
    last_name: &str,
    format: ArtifactFormat,
) -> String {
    format!(
        "certificate_{}_{}_{}.{}",
        sanitize_file_component(last_name),
        sanitize_file_component(first_name),
        scanner_id,
        format.extension()
    )
}

/// Replace characters that are unsafe in file names and archive paths.
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(id: DbId, name: &str, on: NaiveDate, hours: f64) -> PendingEntry {
        PendingEntry {
            participant_id: id,
            event_name: name.to_string(),
            event_date: on,
            hours,
        }
    }

    #[test]
    fn aggregate_sums_and_spans_contributing_entries() {
        let entries = vec![
            entry(3, "Concert", date(2025, 6, 1), 4.0),
            entry(1, "Expo", date(2025, 3, 10), 2.5),
            entry(2, "Already cashed", date(2024, 12, 31), 0.0),
        ];
        let claim = aggregate(&entries).unwrap();
        assert_eq!(claim.total_hours, 6.5);
        assert_eq!(claim.first_date, date(2025, 3, 10));
        assert_eq!(claim.last_date, date(2025, 6, 1));
        assert_eq!(claim.participant_ids(), vec![1, 3]);
    }

    #[test]
    fn aggregate_of_nothing_fails() {
        assert_matches!(aggregate(&[]), Err(CoreError::NoHoursAvailable));
        let zeroed = vec![entry(1, "Expo", date(2025, 3, 10), 0.0)];
        assert_matches!(aggregate(&zeroed), Err(CoreError::NoHoursAvailable));
    }

    #[test]
    fn participation_document_requires_hours() {
        let result = CertificateDocument::for_participation(
            "Aida",
            "Serikova",
            0.0,
            "Expo",
            date(2025, 3, 10),
            None,
            date(2025, 4, 1),
        );
        assert_matches!(result, Err(CoreError::NoHoursAvailable));
    }

    #[test]
    fn balances_that_round_to_zero_are_not_certified() {
        let result = CertificateDocument::for_participation(
            "Aida",
            "Serikova",
            0.4,
            "Expo",
            date(2025, 3, 10),
            None,
            date(2025, 4, 1),
        );
        assert_matches!(result, Err(CoreError::NoHoursAvailable));

        // Half an hour rounds to even, which is zero.
        let half = vec![entry(1, "Expo", date(2025, 3, 10), 0.5)];
        assert_matches!(aggregate(&half), Err(CoreError::NoHoursAvailable));

        // Fractions from several events add up to something printable.
        let claim = aggregate(&[
            entry(1, "Expo", date(2025, 3, 10), 0.4),
            entry(2, "Concert", date(2025, 6, 1), 0.4),
        ])
        .unwrap();
        assert_eq!(CertificateDocument::for_claim("a", "b", &claim, false, date(2025, 7, 1)).hours, 1);
    }

    #[test]
    fn participation_document_rounds_and_uppercases() {
        let doc = CertificateDocument::for_participation(
            " Aida",
            "Serikova ",
            4.6,
            "Expo",
            date(2025, 3, 10),
            Some("Marat Nurlanov".into()),
            date(2025, 4, 1),
        )
        .unwrap();
        assert_eq!(doc.full_name, "AIDA SERIKOVA");
        assert_eq!(doc.hours, 5);
        assert_eq!(doc.period_text(), None);
    }

    #[test]
    fn claim_document_itemizes_on_request() {
        let claim = aggregate(&[
            entry(1, "Expo", date(2025, 3, 10), 2.5),
            entry(2, "Concert", date(2025, 6, 1), 4.0),
        ])
        .unwrap();

        let plain = CertificateDocument::for_claim("a", "b", &claim, false, date(2025, 7, 1));
        assert_matches!(&plain.scope, CertificateScope::Period { items, .. } if items.is_empty());
        assert_eq!(plain.period_text().unwrap(), "10.03.2025 - 01.06.2025");

        let itemized = CertificateDocument::for_claim("a", "b", &claim, true, date(2025, 7, 1));
        assert_matches!(&itemized.scope, CertificateScope::Period { items, .. } if items.len() == 2);
    }

    #[test]
    fn certificate_hours_round_half_to_even() {
        assert_eq!(certificate_hours(2.5), 2);
        assert_eq!(certificate_hours(3.5), 4);
        assert_eq!(certificate_hours(3.49), 3);
        assert_eq!(certificate_hours(-1.0), 0);
    }

    #[test]
    fn format_parsing_falls_back_to_pdf() {
        assert_eq!(ArtifactFormat::parse(None), ArtifactFormat::Pdf);
        assert_eq!(ArtifactFormat::parse(Some("PNG")), ArtifactFormat::Pdf);
        assert_eq!(ArtifactFormat::parse(Some("txt")), ArtifactFormat::Txt);
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            participation_file_name("Doe", "Rock/Pop Fest", ArtifactFormat::Pdf),
            "certificate_Doe_Rock_Pop_Fest.pdf"
        );
        assert_eq!(
            scanner_file_name(7, "Jane", "", ArtifactFormat::Txt),
            "certificate_unnamed_Jane_7.txt"
        );
    }
}
