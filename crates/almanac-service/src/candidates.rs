//! Detection, promotion, and rejection of recurring candidates.
//!
//! Detection looks only at calendar events not yet linked to a series. A
//! candidate is inert until the owner promotes it into a series or rejects
//! it; neither outcome deletes it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use uuid::Uuid;

use almanac_core::util::title::normalize_title;
use almanac_db::db::enums::{CandidateStatus, EventCategory, Priority, SeriesSource};
use almanac_db::model::calendar_event::CalendarEvent;
use almanac_db::model::candidate::{NewRecurringCandidate, RecurringCandidate};
use almanac_db::model::series::NewEventSeries;
use almanac_text::WeekdaySet;
use almanac_text::rule::{byday_code, weekly_rule};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{CalendarRepository, CandidateRepository, Promotion};

/// Fewest dates that make a pattern.
pub const MIN_OCCURRENCES: usize = 3;

/// Largest gap between two dates of one run; one skipped week is tolerated.
const MAX_GAP_DAYS: i64 = 14;

const WEEKLY_PATTERN: &str = "weekly";

pub struct CandidateService {
    calendar: Arc<dyn CalendarRepository>,
    candidates: Arc<dyn CandidateRepository>,
}

impl CandidateService {
    #[must_use]
    pub fn new(calendar: Arc<dyn CalendarRepository>, candidates: Arc<dyn CandidateRepository>) -> Self {
        Self { calendar, candidates }
    }

    /// ## Summary
    /// Scans an owner's unlinked calendar events for weekly patterns and
    /// stages a `pending` candidate for each new one.
    ///
    /// Returns only the candidates created by this pass; cluster keys the
    /// owner already has are left alone.
    ///
    /// ## Errors
    /// Returns a database error if reading events or writing candidates fails.
    #[tracing::instrument(skip(self))]
    pub async fn detect(&self, owner_id: Uuid) -> ServiceResult<Vec<RecurringCandidate>> {
        let events = self.calendar.unlinked_events(owner_id).await?;
        let detected = detect_weekly(owner_id, &events);

        let created = self.candidates.insert_candidates(&detected).await?;
        tracing::info!(
            scanned = events.len(),
            detected = detected.len(),
            created = created.len(),
            "Recurring detection finished"
        );
        Ok(created)
    }

    /// ## Summary
    /// Lists an owner's candidates in one review state, most confident first.
    ///
    /// ## Errors
    /// Returns the repository error if the candidates cannot be loaded.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, owner_id: Uuid, status: CandidateStatus) -> ServiceResult<Vec<RecurringCandidate>> {
        self.candidates.list_candidates(owner_id, status).await
    }

    /// ## Summary
    /// Accepts a candidate and creates its series.
    ///
    /// Promoting an already accepted candidate returns the series created the
    /// first time with `created = false`; a cluster key never gets a second
    /// series.
    ///
    /// ## Errors
    /// - `NotFound` if the candidate does not exist.
    /// - `Conflict` if the candidate was rejected.
    #[tracing::instrument(skip(self))]
    pub async fn promote(&self, candidate_id: Uuid) -> ServiceResult<Promotion> {
        let candidate = self.find(candidate_id).await?;
        if candidate.status == CandidateStatus::Rejected {
            return Err(rejected(candidate_id));
        }

        let series = series_from(&candidate)?;
        let promotion = self
            .candidates
            .promote_candidate(&candidate, &series)
            .await?
            .ok_or_else(|| rejected(candidate_id))?;

        tracing::info!(series_id = %promotion.series.id, created = promotion.created, "Candidate promoted");
        Ok(promotion)
    }

    /// ## Summary
    /// Rejects a pending candidate. Rejecting twice is a no-op.
    ///
    /// ## Errors
    /// - `NotFound` if the candidate does not exist.
    /// - `Conflict` if the candidate was already accepted.
    #[tracing::instrument(skip(self))]
    pub async fn reject(&self, candidate_id: Uuid) -> ServiceResult<()> {
        if self.candidates.reject_candidate(candidate_id).await? {
            tracing::info!("Candidate rejected");
            return Ok(());
        }

        match self.find(candidate_id).await?.status {
            CandidateStatus::Rejected => Ok(()),
            status => Err(ServiceError::Conflict(format!(
                "candidate {candidate_id} is {status} and cannot be rejected"
            ))),
        }
    }

    async fn find(&self, candidate_id: Uuid) -> ServiceResult<RecurringCandidate> {
        self.candidates
            .find_candidate(candidate_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("candidate {candidate_id}")))
    }
}

fn rejected(candidate_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!("candidate {candidate_id} was rejected"))
}

/// ## Summary
/// Groups events by normalized title and weekday and turns every group with
/// a weekly run of at least [`MIN_OCCURRENCES`] dates into a candidate.
///
/// A run is a sequence of dates no more than two weeks apart; when a group
/// has several, the longest wins. Confidence is the share of gaps in the run
/// that are exactly one week.
#[must_use]
pub fn detect_weekly(owner_id: Uuid, events: &[CalendarEvent]) -> Vec<NewRecurringCandidate> {
    let mut groups: BTreeMap<(String, u32), Vec<&CalendarEvent>> = BTreeMap::new();
    for event in events {
        let normalized = normalize_title(&event.title);
        if normalized.is_empty() {
            continue;
        }
        groups
            .entry((normalized, event.event_date.weekday().num_days_from_monday()))
            .or_default()
            .push(event);
    }

    groups
        .into_iter()
        .filter_map(|((normalized_title, _), group)| candidate_for(owner_id, normalized_title, &group))
        .collect()
}

fn candidate_for(owner_id: Uuid, normalized_title: String, group: &[&CalendarEvent]) -> Option<NewRecurringCandidate> {
    let mut dates: Vec<NaiveDate> = group.iter().map(|event| event.event_date).collect();
    dates.sort_unstable();
    dates.dedup();

    let run = longest_run(&dates);
    if run.len() < MIN_OCCURRENCES {
        return None;
    }

    let first = *run.first()?;
    let last = *run.last()?;
    let weekday = first.weekday();
    let members: Vec<&CalendarEvent> = group
        .iter()
        .copied()
        .filter(|event| event.event_date >= first && event.event_date <= last)
        .collect();
    let template = members.first()?;

    Some(NewRecurringCandidate {
        id: Uuid::now_v7(),
        owner_id,
        cluster_key: cluster_key(&normalized_title, weekday),
        source_event_ids: members.iter().map(|event| event.id).collect(),
        pattern: WEEKLY_PATTERN.to_string(),
        confidence: weekly_confidence(run),
        title: template.title.clone(),
        normalized_title,
        start_time: template.start_time,
        end_time: template.end_time,
        location: template.location.clone(),
        suggested_rrule: weekly_rule(WeekdaySet::single(weekday), None)?,
        occurrence_dates: run.to_vec(),
        status: CandidateStatus::Pending,
    })
}

/// `"<normalized title>|<weekday code>"`, e.g. `"team standup|mo"`.
#[must_use]
pub fn cluster_key(normalized_title: &str, weekday: Weekday) -> String {
    format!("{normalized_title}|{}", byday_code(weekday).to_ascii_lowercase())
}

fn longest_run(dates: &[NaiveDate]) -> &[NaiveDate] {
    let mut best = &dates[..0];
    let mut start = 0;
    for end in 1..=dates.len() {
        let breaks = end == dates.len() || (dates[end] - dates[end - 1]).num_days() > MAX_GAP_DAYS;
        if breaks {
            if end - start > best.len() {
                best = &dates[start..end];
            }
            start = end;
        }
    }
    best
}

fn weekly_confidence(run: &[NaiveDate]) -> f64 {
    let gaps: Vec<i64> = run.windows(2).map(|pair| (pair[1] - pair[0]).num_days()).collect();
    if gaps.is_empty() {
        return 0.0;
    }
    let weekly = gaps.iter().filter(|gap| **gap == 7).count();
    let ratio = f64::from(u32::try_from(weekly).unwrap_or(u32::MAX)) / f64::from(u32::try_from(gaps.len()).unwrap_or(u32::MAX));
    (ratio * 100.0).round() / 100.0
}

fn series_from(candidate: &RecurringCandidate) -> ServiceResult<NewEventSeries> {
    let start_date = candidate
        .occurrence_dates
        .iter()
        .min()
        .copied()
        .ok_or_else(|| ServiceError::ValidationError(format!("candidate {} has no occurrences", candidate.id)))?;

    let duration_minutes = match (candidate.start_time, candidate.end_time) {
        (Some(start), Some(end)) if end > start => i32::try_from((end - start).num_minutes()).ok(),
        _ => None,
    };

    Ok(NewEventSeries {
        id: Uuid::now_v7(),
        owner_id: candidate.owner_id,
        title: candidate.title.clone(),
        normalized_title: candidate.normalized_title.clone(),
        description: None,
        start_date,
        start_time: candidate.start_time,
        end_time: candidate.end_time,
        duration_minutes,
        location: candidate.location.clone(),
        category: EventCategory::default(),
        priority: Priority::default(),
        rrule: candidate.suggested_rrule.clone(),
        excluded_dates: Vec::new(),
        until_date: None,
        source: SeriesSource::Detected,
        source_cluster_key: Some(candidate.cluster_key.clone()),
        is_active: true,
    })
}
