use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use journal_desk_core::{
    build_facets, count_by_status, filter_journals, recommendation_affordance, DateRange, Facets,
    FilterCriteria, JournalRecord, JournalStatus, RecommendationAffordance, RecommendationRecord,
    Selection,
};
use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

pub const API_CONTRACT_VERSION: &str = "api.v1";

/// Filter parameters as a caller supplies them: sentinel strings instead of
/// typed selections, and an optional evaluation date. Conversion into
/// [`FilterCriteria`] is where unknown values are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterRequest {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subject_area: Option<String>,
    #[serde(default)]
    pub journal_section: Option<String>,
    #[serde(default)]
    pub submitted_within: Option<String>,
    #[serde(default, with = "calendar_date::option")]
    pub as_of: Option<Date>,
}

impl FilterRequest {
    /// Resolve the request into engine criteria.
    ///
    /// # Errors
    /// Returns an error when the status or date-range value is not one the
    /// engine knows.
    pub fn criteria(&self) -> Result<FilterCriteria> {
        let status = match self.status.as_deref() {
            None | Some("all") => Selection::All,
            Some(value) => match JournalStatus::parse(value) {
                Some(status) => Selection::Only(status),
                None => bail!("unknown status filter: {value}"),
            },
        };

        let submitted_within = match self.submitted_within.as_deref() {
            None | Some("") => None,
            Some(value) => match DateRange::parse(value) {
                Some(range) => Some(range),
                None => bail!("unknown date range: {value} (expected 7d, 14d, 1mo, 6mo, or 1y)"),
            },
        };

        Ok(FilterCriteria {
            search_term: self.search_term.clone(),
            status,
            subject_area: facet_selection(self.subject_area.as_deref()),
            journal_section: facet_selection(self.journal_section.as_deref()),
            submitted_within,
        })
    }
}

fn facet_selection(value: Option<&str>) -> Selection<String> {
    match value {
        None | Some("all") => Selection::All,
        Some(value) => Selection::Only(value.to_string()),
    }
}

/// In-memory view over one load of journal and recommendation data. Records
/// are validated once at ingestion; every query after that is a pure read.
#[derive(Debug, Clone)]
pub struct JournalDesk {
    journals: Vec<JournalRecord>,
    recommendations: HashMap<u64, RecommendationRecord>,
}

impl JournalDesk {
    /// Ingest externally fetched records. Recommendations are keyed by
    /// journal id, last write winning per key.
    ///
    /// # Errors
    /// Returns an error when any record fails validation; a bad batch is
    /// rejected whole rather than partially loaded.
    pub fn load(
        journals: Vec<JournalRecord>,
        recommendations: Vec<RecommendationRecord>,
    ) -> Result<Self> {
        for journal in &journals {
            journal.validate()?;
        }
        for recommendation in &recommendations {
            recommendation.validate()?;
        }

        let mut keyed = HashMap::new();
        for recommendation in recommendations {
            keyed.insert(recommendation.journal_id, recommendation);
        }

        Ok(Self { journals, recommendations: keyed })
    }

    #[must_use]
    pub fn journals(&self) -> &[JournalRecord] {
        &self.journals
    }

    /// Apply a filter request. `fallback_as_of` is used when the request
    /// does not carry its own evaluation date; the engine itself never
    /// reads a clock.
    ///
    /// # Errors
    /// Returns an error when the request carries unknown filter values.
    pub fn filter(
        &self,
        request: &FilterRequest,
        fallback_as_of: Date,
    ) -> Result<Vec<&JournalRecord>> {
        let criteria = request.criteria()?;
        let as_of = request.as_of.unwrap_or(fallback_as_of);
        Ok(filter_journals(&self.journals, &criteria, as_of))
    }

    #[must_use]
    pub fn facets(&self) -> Facets {
        build_facets(&self.journals)
    }

    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<JournalStatus, usize> {
        count_by_status(&self.journals)
    }

    #[must_use]
    pub fn recommendation(&self, journal_id: u64) -> Option<&RecommendationRecord> {
        self.recommendations.get(&journal_id)
    }

    #[must_use]
    pub fn affordance(&self, journal_id: u64) -> RecommendationAffordance {
        recommendation_affordance(self.recommendations.get(&journal_id))
    }

    /// Journals with a final accept decision, in load order.
    #[must_use]
    pub fn accepted(&self) -> Vec<&JournalRecord> {
        self.journals
            .iter()
            .filter(|journal| journal.status == JournalStatus::Accepted)
            .collect()
    }

    /// Journals still moving through the pipeline (not accepted, not
    /// rejected), in load order.
    #[must_use]
    pub fn open_submissions(&self) -> Vec<&JournalRecord> {
        self.journals.iter().filter(|journal| journal.status.is_open()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditorProfile {
    pub editor_id: u64,
    pub display_name: String,
    #[serde(default)]
    pub is_approved: bool,
}

/// An explicitly constructed editor session. Login is the only constructor
/// and logout is the only teardown; nothing initializes or mutates session
/// state as a side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    profile: EditorProfile,
    token: String,
}

impl EditorSession {
    /// # Errors
    /// Returns an error when the token or the profile display name is blank.
    pub fn login(profile: EditorProfile, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("session token MUST be non-empty");
        }
        if profile.display_name.trim().is_empty() {
            bail!("display_name MUST be non-empty");
        }
        Ok(Self { profile, token })
    }

    #[must_use]
    pub fn profile(&self) -> &EditorProfile {
        &self.profile
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Approval gates every editorial action in the consuming UI.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.profile.is_approved
    }

    /// Tear the session down, dropping the token. The profile survives so
    /// the caller can show who just signed out.
    #[must_use]
    pub fn logout(self) -> EditorProfile {
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use journal_desk_core::RecommendationChoice;

    use super::*;

    fn fixture_date() -> Date {
        match Date::from_calendar_date(2024, time::Month::January, 10) {
            Ok(date) => date,
            Err(err) => panic!("invalid fixture date: {err}"),
        }
    }

    fn mk_journal(id: u64, status: JournalStatus) -> JournalRecord {
        JournalRecord {
            id,
            title: format!("Manuscript {id}"),
            abstract_text: String::new(),
            author_name_text: format!("Author {id}"),
            status,
            subject_area_name: None,
            journal_section_name: None,
            submission_date: None,
            keywords: String::new(),
            user_id: None,
        }
    }

    fn mk_recommendation(journal_id: u64, is_final: bool) -> RecommendationRecord {
        RecommendationRecord {
            journal_id,
            recommendation: RecommendationChoice::Revise,
            overall_rating: Some(3),
            is_final_decision: is_final,
        }
    }

    // Test IDs: TAPI-001
    #[test]
    fn load_rejects_invalid_records_whole() {
        let mut bad = mk_journal(1, JournalStatus::Submitted);
        bad.title = " ".to_string();

        let result = JournalDesk::load(vec![bad], vec![]);

        assert!(result.is_err());
    }

    // Test IDs: TAPI-002
    #[test]
    fn duplicate_recommendation_keys_last_write_wins() {
        let desk = match JournalDesk::load(
            vec![mk_journal(1, JournalStatus::Submitted)],
            vec![mk_recommendation(1, false), mk_recommendation(1, true)],
        ) {
            Ok(desk) => desk,
            Err(err) => panic!("load should succeed: {err}"),
        };

        assert_eq!(desk.affordance(1), RecommendationAffordance::Finalized);
        assert_eq!(desk.affordance(2), RecommendationAffordance::Create);
    }

    // Test IDs: TAPI-003
    #[test]
    fn filter_request_resolves_sentinels_and_rejects_unknown_values() {
        let desk = match JournalDesk::load(
            vec![
                mk_journal(1, JournalStatus::Accepted),
                mk_journal(2, JournalStatus::Submitted),
            ],
            vec![],
        ) {
            Ok(desk) => desk,
            Err(err) => panic!("load should succeed: {err}"),
        };

        let all = FilterRequest { status: Some("all".to_string()), ..FilterRequest::default() };
        let accepted =
            FilterRequest { status: Some("accepted".to_string()), ..FilterRequest::default() };
        let bogus = FilterRequest { status: Some("bogus".to_string()), ..FilterRequest::default() };

        let all_hits = match desk.filter(&all, fixture_date()) {
            Ok(hits) => hits,
            Err(err) => panic!("all-sentinel filter should succeed: {err}"),
        };
        let accepted_hits = match desk.filter(&accepted, fixture_date()) {
            Ok(hits) => hits,
            Err(err) => panic!("accepted filter should succeed: {err}"),
        };

        assert_eq!(all_hits.len(), 2);
        assert_eq!(accepted_hits.len(), 1);
        assert_eq!(accepted_hits[0].id, 1);
        assert!(desk.filter(&bogus, fixture_date()).is_err());
    }

    // Test IDs: TAPI-004
    #[test]
    fn request_as_of_overrides_the_fallback_date() {
        let mut journal = mk_journal(1, JournalStatus::Submitted);
        journal.submission_date = match Date::from_calendar_date(2024, time::Month::January, 1) {
            Ok(date) => Some(date),
            Err(err) => panic!("invalid fixture date: {err}"),
        };
        let desk = match JournalDesk::load(vec![journal], vec![]) {
            Ok(desk) => desk,
            Err(err) => panic!("load should succeed: {err}"),
        };

        // 9 days old at the fallback date, 1 day old at the request date.
        let request = FilterRequest {
            submitted_within: Some("7d".to_string()),
            as_of: match Date::from_calendar_date(2024, time::Month::January, 2) {
                Ok(date) => Some(date),
                Err(err) => panic!("invalid fixture date: {err}"),
            },
            ..FilterRequest::default()
        };

        let hits = match desk.filter(&request, fixture_date()) {
            Ok(hits) => hits,
            Err(err) => panic!("filter should succeed: {err}"),
        };

        assert_eq!(hits.len(), 1);
    }

    // Test IDs: TAPI-005
    #[test]
    fn accepted_and_open_submissions_partition_by_status() {
        let desk = match JournalDesk::load(
            vec![
                mk_journal(1, JournalStatus::Accepted),
                mk_journal(2, JournalStatus::Rejected),
                mk_journal(3, JournalStatus::UnderReview),
                mk_journal(4, JournalStatus::Submitted),
            ],
            vec![],
        ) {
            Ok(desk) => desk,
            Err(err) => panic!("load should succeed: {err}"),
        };

        let accepted: Vec<u64> = desk.accepted().iter().map(|journal| journal.id).collect();
        let open: Vec<u64> = desk.open_submissions().iter().map(|journal| journal.id).collect();

        assert_eq!(accepted, vec![1]);
        assert_eq!(open, vec![3, 4]);
    }

    // Test IDs: TAPI-006
    #[test]
    fn filter_request_deserializes_from_wire_json() {
        let body = r#"{
            "search_term": "grid",
            "status": "accepted",
            "submitted_within": "1mo",
            "as_of": "2024-01-10"
        }"#;

        let request: FilterRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => panic!("request should deserialize: {err}"),
        };

        assert_eq!(request.search_term, "grid");
        assert_eq!(request.status.as_deref(), Some("accepted"));
        assert_eq!(request.as_of, Some(fixture_date()));
        let criteria = match request.criteria() {
            Ok(criteria) => criteria,
            Err(err) => panic!("criteria should resolve: {err}"),
        };
        assert_eq!(criteria.submitted_within, Some(DateRange::OneMonth));
    }

    // Test IDs: TSES-001
    #[test]
    fn session_login_validates_and_logout_drops_the_token() {
        let profile = EditorProfile {
            editor_id: 7,
            display_name: "Chief Editor".to_string(),
            is_approved: true,
        };

        let session = match EditorSession::login(profile.clone(), "token-abc") {
            Ok(session) => session,
            Err(err) => panic!("login should succeed: {err}"),
        };
        assert!(session.is_approved());
        assert_eq!(session.token(), "token-abc");

        let restored = session.logout();
        assert_eq!(restored, profile);

        assert!(EditorSession::login(profile, "  ").is_err());
    }
}
