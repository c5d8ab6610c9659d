use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum DeskError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("query error: {0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JournalStatus {
    Submitted,
    UnderReview,
    RevisionsRequested,
    Accepted,
    Rejected,
    ReviewDone,
    AssignedToAreaEditor,
    AssignedToAssociateEditor,
}

impl JournalStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::RevisionsRequested => "revisions_requested",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::ReviewDone => "review_done",
            Self::AssignedToAreaEditor => "assigned_to_area_editor",
            Self::AssignedToAssociateEditor => "assigned_to_associate_editor",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "submitted" => Some(Self::Submitted),
            "under_review" => Some(Self::UnderReview),
            "revisions_requested" => Some(Self::RevisionsRequested),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "review_done" => Some(Self::ReviewDone),
            "assigned_to_area_editor" => Some(Self::AssignedToAreaEditor),
            "assigned_to_associate_editor" => Some(Self::AssignedToAssociateEditor),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::UnderReview => "Under Review",
            Self::RevisionsRequested => "Revisions Requested",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::ReviewDone => "Review Done",
            Self::AssignedToAreaEditor => "Assigned to Area Editor",
            Self::AssignedToAssociateEditor => "Assigned to Associate Editor",
        }
    }

    #[must_use]
    pub fn badge_color(self) -> BadgeColor {
        match self {
            Self::Submitted => BadgeColor::Info,
            Self::UnderReview => BadgeColor::Warning,
            Self::RevisionsRequested => BadgeColor::Primary,
            Self::Accepted => BadgeColor::Success,
            Self::Rejected => BadgeColor::Danger,
            Self::ReviewDone => BadgeColor::Secondary,
            Self::AssignedToAreaEditor => BadgeColor::Dark,
            Self::AssignedToAssociateEditor => BadgeColor::Light,
        }
    }

    /// Canonical status list, in the fixed order filter controls present it.
    #[must_use]
    pub fn canonical() -> [Self; 8] {
        [
            Self::Submitted,
            Self::UnderReview,
            Self::RevisionsRequested,
            Self::Accepted,
            Self::Rejected,
            Self::ReviewDone,
            Self::AssignedToAreaEditor,
            Self::AssignedToAssociateEditor,
        ]
    }

    /// True when the submission is still moving through the editorial
    /// pipeline (neither accepted nor rejected).
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl Display for JournalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Info,
    Warning,
    Primary,
    Success,
    Danger,
    Secondary,
    Dark,
    Light,
}

impl BadgeColor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Primary => "primary",
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Secondary => "secondary",
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct StatusBadge {
    pub label: String,
    pub color: BadgeColor,
}

/// Classify a raw status value into its display label and badge color.
///
/// Unknown values pass through as the label with the neutral `secondary`
/// color, so rendering never fails on data the enum does not know about.
#[must_use]
pub fn classify_status(raw: &str) -> StatusBadge {
    match JournalStatus::parse(raw) {
        Some(status) => StatusBadge {
            label: status.display_label().to_string(),
            color: status.badge_color(),
        },
        None => StatusBadge { label: raw.to_string(), color: BadgeColor::Secondary },
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationChoice {
    Accept,
    Reject,
    Revise,
    #[default]
    Pending,
}

impl RecommendationChoice {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Revise => "revise",
            Self::Pending => "pending",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "revise" => Some(Self::Revise),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Journal status implied by a finalized editorial decision. Anything that
/// is not an outright accept or reject sends the manuscript back for
/// revisions.
#[must_use]
pub fn decision_status(choice: RecommendationChoice) -> JournalStatus {
    match choice {
        RecommendationChoice::Accept => JournalStatus::Accepted,
        RecommendationChoice::Reject => JournalStatus::Rejected,
        RecommendationChoice::Revise | RecommendationChoice::Pending => {
            JournalStatus::RevisionsRequested
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RatingBand {
    High,
    Medium,
    Low,
}

#[must_use]
pub fn rating_band(rating: u8) -> RatingBand {
    match rating {
        4.. => RatingBand::High,
        2..=3 => RatingBand::Medium,
        _ => RatingBand::Low,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub abstract_text: String,
    pub author_name_text: String,
    pub status: JournalStatus,
    #[serde(default)]
    pub subject_area_name: Option<String>,
    #[serde(default)]
    pub journal_section_name: Option<String>,
    #[serde(default, with = "calendar_date::option")]
    pub submission_date: Option<Date>,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub user_id: Option<u64>,
}

impl JournalRecord {
    /// Validate the fields the engine treats as required.
    ///
    /// # Errors
    /// Returns [`DeskError::Validation`] when `title` or `author_name_text`
    /// is blank.
    pub fn validate(&self) -> Result<(), DeskError> {
        if self.title.trim().is_empty() {
            return Err(DeskError::Validation("title MUST be non-empty".to_string()));
        }
        if self.author_name_text.trim().is_empty() {
            return Err(DeskError::Validation("author_name_text MUST be non-empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationRecord {
    pub journal_id: u64,
    #[serde(default)]
    pub recommendation: RecommendationChoice,
    #[serde(default)]
    pub overall_rating: Option<u8>,
    #[serde(default)]
    pub is_final_decision: bool,
}

impl RecommendationRecord {
    /// # Errors
    /// Returns [`DeskError::Validation`] when `overall_rating` exceeds 5.
    pub fn validate(&self) -> Result<(), DeskError> {
        if let Some(rating) = self.overall_rating {
            if rating > 5 {
                return Err(DeskError::Validation(
                    "overall_rating MUST be in 0..=5".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAffordance {
    Create,
    EditAndFinalize,
    Finalized,
}

/// Derive the editorial affordance for a journal from its possibly-absent
/// recommendation. Idempotent per record state; the caller owns any cache.
#[must_use]
pub fn recommendation_affordance(
    record: Option<&RecommendationRecord>,
) -> RecommendationAffordance {
    match record {
        None => RecommendationAffordance::Create,
        Some(rec) if rec.is_final_decision => RecommendationAffordance::Finalized,
        Some(_) => RecommendationAffordance::EditAndFinalize,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    #[must_use]
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == value,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum DateRange {
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "14d")]
    FourteenDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl DateRange {
    #[must_use]
    pub fn max_age_days(self) -> i64 {
        match self {
            Self::SevenDays => 7,
            Self::FourteenDays => 14,
            Self::OneMonth => 30,
            Self::SixMonths => 182,
            Self::OneYear => 365,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenDays => "7d",
            Self::FourteenDays => "14d",
            Self::OneMonth => "1mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "7d" => Some(Self::SevenDays),
            "14d" => Some(Self::FourteenDays),
            "1mo" => Some(Self::OneMonth),
            "6mo" => Some(Self::SixMonths),
            "1y" => Some(Self::OneYear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterCriteria {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub status: Selection<JournalStatus>,
    #[serde(default)]
    pub subject_area: Selection<String>,
    #[serde(default)]
    pub journal_section: Selection<String>,
    #[serde(default)]
    pub submitted_within: Option<DateRange>,
}

/// Grouping label shown for journals without an assigned category.
pub const GENERAL_CATEGORY: &str = "General";

/// Normalize an optional category to its grouping label. The underlying
/// record keeps its `None`; the label exists only for faceting, filtering,
/// and display, all of which use this one function.
#[must_use]
pub fn category_label(value: Option<&str>) -> &str {
    match value {
        Some(label) if !label.trim().is_empty() => label,
        _ => GENERAL_CATEGORY,
    }
}

/// Whole-day difference between a submission date and the evaluation date.
/// Negative for future-dated submissions.
#[must_use]
pub fn days_since(date: Date, as_of: Date) -> i64 {
    i64::from(as_of.to_julian_day()) - i64::from(date.to_julian_day())
}

/// Select the order-preserving subsequence of `records` matching every
/// criterion. `as_of` is the evaluation date for range checks; passing it
/// explicitly keeps the filter deterministic under test.
#[must_use]
pub fn filter_journals<'a>(
    records: &'a [JournalRecord],
    criteria: &FilterCriteria,
    as_of: Date,
) -> Vec<&'a JournalRecord> {
    records.iter().filter(|record| matches_criteria(record, criteria, as_of)).collect()
}

fn matches_criteria(record: &JournalRecord, criteria: &FilterCriteria, as_of: Date) -> bool {
    matches_search(record, &criteria.search_term)
        && criteria.status.admits(&record.status)
        && matches_category(record.subject_area_name.as_deref(), &criteria.subject_area)
        && matches_category(record.journal_section_name.as_deref(), &criteria.journal_section)
        && matches_date_range(record.submission_date, criteria.submitted_within, as_of)
}

fn matches_search(record: &JournalRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record.title.to_lowercase().contains(&needle)
        || record.author_name_text.to_lowercase().contains(&needle)
        || record.id.to_string().contains(&needle)
}

fn matches_category(value: Option<&str>, selection: &Selection<String>) -> bool {
    match selection {
        Selection::All => true,
        Selection::Only(only) => category_label(value) == only,
    }
}

fn matches_date_range(submitted: Option<Date>, range: Option<DateRange>, as_of: Date) -> bool {
    let (Some(submitted), Some(range)) = (submitted, range) else {
        return true;
    };
    days_since(submitted, as_of) <= range.max_age_days()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Facets {
    pub subject_areas: Vec<String>,
    pub journal_sections: Vec<String>,
    pub authors: Vec<String>,
    pub statuses: Vec<JournalStatus>,
}

/// Build the distinct-value lists that populate filter controls. Category
/// and author facets are first-occurrence ordered with exact-equality
/// dedup; the status facet is always the complete canonical list so the
/// control stays stable while data arrives.
#[must_use]
pub fn build_facets(records: &[JournalRecord]) -> Facets {
    let mut subject_areas: Vec<String> = Vec::new();
    let mut journal_sections: Vec<String> = Vec::new();
    let mut authors: Vec<String> = Vec::new();

    for record in records {
        push_unique(&mut subject_areas, category_label(record.subject_area_name.as_deref()));
        push_unique(
            &mut journal_sections,
            category_label(record.journal_section_name.as_deref()),
        );
        push_unique(&mut authors, &record.author_name_text);
    }

    Facets {
        subject_areas,
        journal_sections,
        authors,
        statuses: JournalStatus::canonical().to_vec(),
    }
}

fn push_unique(values: &mut Vec<String>, candidate: &str) {
    if !values.iter().any(|existing| existing == candidate) {
        values.push(candidate.to_string());
    }
}

/// Tally journals by status. Statuses with no journals are absent from the
/// map; callers default to zero on lookup.
#[must_use]
pub fn count_by_status(records: &[JournalRecord]) -> BTreeMap<JournalStatus, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.status).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AreaEditorRecord {
    pub id: u64,
    pub user_id: u64,
    pub full_name: String,
    pub email: String,
    pub institution: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub assignments_handled: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditorDirectoryQuery {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub department: String,
}

/// Filter the area-editor directory by free-text search (name, email,
/// institution) and a substring department filter. Order-preserving, like
/// the journal filter.
#[must_use]
pub fn filter_area_editors<'a>(
    editors: &'a [AreaEditorRecord],
    query: &EditorDirectoryQuery,
) -> Vec<&'a AreaEditorRecord> {
    let needle = query.search_term.to_lowercase();
    let department = query.department.to_lowercase();
    editors
        .iter()
        .filter(|editor| {
            let matches_search = needle.is_empty()
                || editor.full_name.to_lowercase().contains(&needle)
                || editor.email.to_lowercase().contains(&needle)
                || editor.institution.to_lowercase().contains(&needle);
            let matches_department = department.is_empty()
                || editor
                    .department
                    .as_deref()
                    .is_some_and(|dept| dept.to_lowercase().contains(&department));
            matches_search && matches_department
        })
        .collect()
}

/// Distinct non-empty departments in first-occurrence order. Unlike journal
/// categories, a missing department is simply skipped here.
#[must_use]
pub fn department_facet(editors: &[AreaEditorRecord]) -> Vec<String> {
    let mut departments: Vec<String> = Vec::new();
    for editor in editors {
        if let Some(dept) = editor.department.as_deref() {
            if !dept.trim().is_empty() {
                push_unique(&mut departments, dept);
            }
        }
    }
    departments
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentCheck {
    Eligible,
    OwnSubmission,
}

/// An editor cannot be assigned to review their own manuscript.
#[must_use]
pub fn check_assignment(editor: &AreaEditorRecord, journal: &JournalRecord) -> AssignmentCheck {
    match journal.user_id {
        Some(author_user_id) if author_user_id == editor.user_id => {
            AssignmentCheck::OwnSubmission
        }
        _ => AssignmentCheck::Eligible,
    }
}

/// Split a comma-separated keyword field into trimmed labels. No dedup.
#[must_use]
pub fn keyword_list(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Compact `MM-DD` label for table cells, `~` when the date is absent.
#[must_use]
pub fn short_date_label(date: Option<Date>) -> String {
    match date {
        Some(date) => format!("{:02}-{:02}", u8::from(date.month()), date.day()),
        None => "~".to_string(),
    }
}
