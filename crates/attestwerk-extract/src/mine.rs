// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate field mining.
//
// Runs a fixed battery of pattern groups over normalised text and collects
// structured fields (names, institutions, dates, degrees, emails, ids).
// The rules are recall-oriented: they tolerate noisy entries rather than
// miss real values, and display surfaces are expected to cope. Mining
// never fails; text with no matches yields empty field lists.

use std::collections::HashSet;

use regex::Regex;
use tracing::{debug, instrument};

use attestwerk_core::CertificateInfo;
use attestwerk_core::error::AttestwerkError;

// Recipient names, either after a certifying phrase or a label.
const NAME_AFTER_PHRASE: &str = r"(?i)(?:this is to certify that|hereby certify that|awarded to|presented to|granted to)\s+([A-Z][a-zA-Z\s.'-]+?)(?:\s+has|\s+is|\s+was|,|\n)";
const NAME_LABELLED: &str = r"(?i)(?:name|student|recipient):\s*([A-Z][a-zA-Z\s.'-]+?)(?:\s+|,|\n)";

// Institutions, as "University of X" or a "... University" suffix run.
const INSTITUTION_OF: &str =
    r"(?i)(?:university|college|institute|school|academy)\s+of\s+([a-zA-Z\s&.-]+?)(?:\s+|,|\n)";
const INSTITUTION_SUFFIX: &str =
    r"(?i)([a-zA-Z\s&.-]*(?:university|college|institute|school|academy))\s";

// Dates: numeric day-first, numeric year-first, and the two spelled forms.
const DATE_NUMERIC_DAY_FIRST: &str = r"\b(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{4})\b";
const DATE_NUMERIC_YEAR_FIRST: &str = r"\b(\d{4}[/.\-]\d{1,2}[/.\-]\d{1,2})\b";
const DATE_MONTH_FIRST: &str = r"(?i)\b((?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},?\s+\d{4})";
const DATE_DAY_FIRST: &str = r"(?i)\b(\d{1,2}(?:st|nd|rd|th)?\s+(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4})";

// Degrees: a level word followed by a subject, or a qualification suffix run.
const DEGREE_LEVEL: &str = r"(?i)\b(bachelor|master|doctor|phd|mba|bsc|msc|ba|ma|diploma|certificate)\s+(?:of\s+)?([a-zA-Z\s&.-]+?)(?:\s+|,|\n)";
const DEGREE_SUFFIX: &str = r"(?i)\b([a-zA-Z\s.-]+(?:degree|diploma|certificate|qualification))\b";

const EMAIL: &str = r"\b([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})\b";

// Identifiers: labelled (any case) or a bare run of six-plus capitals/digits.
const ID_LABELLED: &str = r"(?i)(?:id|serial|number|ref|certificate\s+no?):\s*([A-Z0-9\-]+)";
const ID_BARE: &str = r"\b([A-Z0-9]{6,})\b";

/// Compiled extraction rules for every mined category.
pub struct FieldMiner {
    names: Vec<Regex>,
    institutions: Vec<Regex>,
    dates: Vec<Regex>,
    degrees: Vec<Regex>,
    email: Regex,
    ids: Vec<Regex>,
}

impl FieldMiner {
    /// Compile the rule set.
    pub fn new() -> Result<Self, AttestwerkError> {
        Ok(Self {
            names: compile(&[NAME_AFTER_PHRASE, NAME_LABELLED])?,
            institutions: compile(&[INSTITUTION_OF, INSTITUTION_SUFFIX])?,
            dates: compile(&[
                DATE_NUMERIC_DAY_FIRST,
                DATE_NUMERIC_YEAR_FIRST,
                DATE_MONTH_FIRST,
                DATE_DAY_FIRST,
            ])?,
            degrees: compile(&[DEGREE_LEVEL, DEGREE_SUFFIX])?,
            email: compile_one(EMAIL)?,
            ids: compile(&[ID_LABELLED, ID_BARE])?,
        })
    }

    /// Mine every category from `text`.
    ///
    /// Rules run in a fixed order, so output order is deterministic: all of
    /// one rule's matches in text order, then the next rule's. Each category
    /// deduplicates exact repeats, keeping first occurrences. Absence of
    /// matches is not an error.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn mine(&self, text: &str) -> CertificateInfo {
        let mut info = CertificateInfo::default();
        if text.is_empty() {
            return info;
        }

        for re in &self.names {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    let value = m.as_str().trim();
                    if value.len() > 2 {
                        info.names.push(value.to_string());
                    }
                }
            }
        }

        for re in &self.institutions {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    let value = m.as_str().trim();
                    if value.len() > 5 {
                        info.institutions.push(value.to_string());
                    }
                }
            }
        }

        for re in &self.dates {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    info.dates.push(m.as_str().trim().to_string());
                }
            }
        }

        // Degree rules keep the whole match; the level word is part of the value.
        for re in &self.degrees {
            for m in re.find_iter(text) {
                let value = m.as_str().trim();
                if value.len() > 3 {
                    info.degrees.push(value.to_string());
                }
            }
        }

        for caps in self.email.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                info.emails.push(m.as_str().to_string());
            }
        }

        for re in &self.ids {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    let value = m.as_str().trim();
                    if value.len() >= 6 {
                        info.ids.push(value.to_string());
                    }
                }
            }
        }

        dedup_in_place(&mut info.names);
        dedup_in_place(&mut info.institutions);
        dedup_in_place(&mut info.dates);
        dedup_in_place(&mut info.degrees);
        dedup_in_place(&mut info.emails);
        dedup_in_place(&mut info.ids);

        debug!(
            names = info.names.len(),
            institutions = info.institutions.len(),
            dates = info.dates.len(),
            degrees = info.degrees.len(),
            emails = info.emails.len(),
            ids = info.ids.len(),
            "field mining complete"
        );
        info
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>, AttestwerkError> {
    patterns.iter().map(|pattern| compile_one(pattern)).collect()
}

fn compile_one(pattern: &str) -> Result<Regex, AttestwerkError> {
    Regex::new(pattern).map_err(|err| AttestwerkError::Mining(err.to_string()))
}

/// Exact-match dedup preserving first occurrences in order.
fn dedup_in_place(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|value| seen.insert(value.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner() -> FieldMiner {
        FieldMiner::new().unwrap()
    }

    #[test]
    fn certificate_sentence_yields_all_expected_fields() {
        let text = "This is to certify that Jane Doe has completed the Bachelor of Science, \
                    awarded by University of Example on 12/05/2020. ID: AB123456.";
        let info = miner().mine(text);

        assert_eq!(info.names, vec!["Jane Doe"]);
        assert_eq!(info.dates, vec!["12/05/2020"]);
        assert_eq!(info.ids, vec!["AB123456"]);
        assert!(info.degrees[0].starts_with("Bachelor of Science"));
        assert!(info.institutions.iter().any(|i| i == "Example"));
        assert!(info.emails.is_empty());
        assert!(info.certificates.is_empty());
    }

    #[test]
    fn empty_and_unmatched_text_yield_empty_fields() {
        assert!(miner().mine("").is_empty());
        assert!(miner().mine("@@@ ;;; ???").is_empty());
    }

    #[test]
    fn names_follow_certifying_phrases_across_spaces() {
        let info = miner().mine("presented to Mary Jane Watson, in recognition");
        assert_eq!(info.names, vec!["Mary Jane Watson"]);
    }

    #[test]
    fn labelled_names_capture_the_first_word() {
        // The label rule stops at the first separator, so only the first
        // word of a labelled name survives.
        let info = miner().mine("Student: Grace Hopper\n");
        assert_eq!(info.names, vec!["Grace"]);
    }

    #[test]
    fn institutions_collect_both_rule_shapes() {
        let info = miner().mine("Awarded by the University of Oxford in May");
        assert_eq!(info.institutions, vec!["Oxford", "Awarded by the University"]);
    }

    #[test]
    fn dates_cover_numeric_and_spelled_forms() {
        let text = "Issued 12/05/2020, revalidated 2020-06-01, signed May 12, 2020 and 3rd June 2021\n";
        let info = miner().mine(text);
        assert_eq!(
            info.dates,
            vec!["12/05/2020", "2020-06-01", "May 12, 2020", "3rd June 2021"]
        );
    }

    #[test]
    fn degree_level_rule_keeps_the_whole_match() {
        let info = miner().mine("Completed: Bachelor of Engineering\nwith distinction");
        assert_eq!(info.degrees, vec!["Bachelor of Engineering"]);
    }

    #[test]
    fn degree_suffix_rule_matches_qualification_runs() {
        let info = miner().mine("Higher National Diploma\n");
        assert_eq!(info.degrees, vec!["Higher National Diploma"]);
    }

    #[test]
    fn ids_require_six_characters_and_respect_case() {
        let text = "Serial: AB12\nRef: XY-99231-A\nIssued ABCDEF99 to holder abcdef123\n";
        let info = miner().mine(text);
        assert_eq!(info.ids, vec!["XY-99231-A", "ABCDEF99"]);
    }

    #[test]
    fn emails_are_collected_case_sensitively() {
        let info = miner().mine("Contact registry@example.edu or REGISTRY@EXAMPLE.EDU today");
        assert_eq!(info.emails, vec!["registry@example.edu", "REGISTRY@EXAMPLE.EDU"]);
    }

    #[test]
    fn duplicate_values_collapse_to_first_occurrence() {
        let info = miner().mine("ID: ABC123\nSerial: ABC123\n");
        assert_eq!(info.ids, vec!["ABC123"]);
    }
}
