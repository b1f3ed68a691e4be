//! Recurring-event series: materialization, exclusions, overrides, deletion.
//!
//! A series owns the calendar events linked to it through `series_id`. Its
//! rule is evaluated once per materialization and the result stored as
//! instance rows; reads never re-evaluate it. Manually created events are
//! never touched by anything here.

pub mod recurrence;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use almanac_db::db::enums::{CalendarSource, SeriesSource};
use almanac_db::model::calendar_event::{InstanceChanges, NewCalendarEvent};
use almanac_db::model::series::{EventOverride, EventSeries, NewEventOverride};

use crate::error::{ServiceError, ServiceResult};
use crate::store::SeriesRepository;

pub use recurrence::occurrence_dates;

/// Replacement values for one occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_completed: bool,
}

pub struct SeriesService {
    series: Arc<dyn SeriesRepository>,
}

impl SeriesService {
    #[must_use]
    pub fn new(series: Arc<dyn SeriesRepository>) -> Self {
        Self { series }
    }

    /// ## Summary
    /// Creates the instance rows for every occurrence up to `window_end`.
    ///
    /// The window is also capped by the series' own `until_date`. Excluded
    /// dates and cancelled overrides produce no row; other overrides replace
    /// the instance's fields. Dates that already have an instance are
    /// skipped, so repeated calls only add what is missing. Returns the
    /// number of rows created.
    ///
    /// ## Errors
    /// - `NotFound` if the series does not exist.
    /// - `ValidationError` if its rule cannot be evaluated.
    #[tracing::instrument(skip(self))]
    pub async fn materialize(&self, series_id: Uuid, window_end: NaiveDate) -> ServiceResult<usize> {
        let series = self.find(series_id).await?;
        if !series.is_active {
            tracing::debug!("Series is inactive, nothing to materialize");
            return Ok(0);
        }

        let last = series.until_date.map_or(window_end, |until| until.min(window_end));
        let dates = occurrence_dates(&series.rrule, series.start_date, last)?;

        let overrides: HashMap<NaiveDate, EventOverride> = self
            .series
            .overrides_for_series(series_id)
            .await?
            .into_iter()
            .map(|o| (o.occurrence_date, o))
            .collect();
        let existing: BTreeSet<NaiveDate> = self.series.instance_dates(series_id).await?.into_iter().collect();

        let instances: Vec<NewCalendarEvent> = dates
            .into_iter()
            .filter(|date| !series.excluded_dates.contains(date) && !existing.contains(date))
            .filter_map(|date| {
                let patch = overrides.get(&date);
                if patch.is_some_and(|o| o.is_cancelled) {
                    return None;
                }
                Some(instance(&series, date, patch))
            })
            .collect();

        let created = self.series.insert_instances(&instances).await?;
        tracing::info!(created, window_end = %last, "Series materialized");
        Ok(created)
    }

    /// ## Summary
    /// Excludes one occurrence: records the date on the series and deletes
    /// its instance, if any.
    ///
    /// ## Errors
    /// Returns `NotFound` if the series does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn exclude(&self, series_id: Uuid, date: NaiveDate) -> ServiceResult<()> {
        if !self.series.exclude_occurrence(series_id, date).await? {
            return Err(not_found(series_id));
        }
        Ok(())
    }

    /// ## Summary
    /// Inserts or replaces the override for `(series, date)` and brings the
    /// instance in line with it.
    ///
    /// A cancellation deletes the instance. Any other override rewrites the
    /// instance with the patch, falling back to the series' values. Dates the
    /// rule never generates are accepted; their override has no effect.
    ///
    /// ## Errors
    /// Returns `NotFound` if the series does not exist.
    #[tracing::instrument(skip(self, patch))]
    pub async fn upsert_override(
        &self,
        series_id: Uuid,
        date: NaiveDate,
        patch: OverridePatch,
    ) -> ServiceResult<EventOverride> {
        let series = self.find(series_id).await?;

        let changes = (!patch.is_cancelled).then(|| InstanceChanges {
            title: patch.title.clone().unwrap_or_else(|| series.title.clone()),
            description: patch.description.clone().or_else(|| series.description.clone()),
            start_time: patch.start_time.or(series.start_time),
            end_time: patch.end_time.or(series.end_time),
            location: patch.location.clone().or_else(|| series.location.clone()),
            is_completed: patch.is_completed,
        });

        let new_override = NewEventOverride {
            id: Uuid::now_v7(),
            series_id,
            occurrence_date: date,
            title: patch.title,
            description: patch.description,
            start_time: patch.start_time,
            end_time: patch.end_time,
            location: patch.location,
            is_cancelled: patch.is_cancelled,
            is_completed: patch.is_completed,
        };

        self.series.upsert_override(&new_override, changes.as_ref()).await
    }

    /// ## Summary
    /// Deletes the series together with its instances and overrides.
    ///
    /// ## Errors
    /// Returns `NotFound` if the series does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, series_id: Uuid) -> ServiceResult<()> {
        if !self.series.delete_series(series_id).await? {
            return Err(not_found(series_id));
        }
        tracing::info!("Series deleted");
        Ok(())
    }

    async fn find(&self, series_id: Uuid) -> ServiceResult<EventSeries> {
        self.series
            .find_series(series_id)
            .await?
            .ok_or_else(|| not_found(series_id))
    }
}

fn not_found(series_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("series {series_id}"))
}

fn instance(series: &EventSeries, date: NaiveDate, patch: Option<&EventOverride>) -> NewCalendarEvent {
    let source = match series.source {
        SeriesSource::Extracted => CalendarSource::Extracted,
        SeriesSource::Manual | SeriesSource::Detected => CalendarSource::Manual,
    };

    NewCalendarEvent {
        id: Uuid::now_v7(),
        owner_id: series.owner_id,
        title: patch
            .and_then(|o| o.title.clone())
            .unwrap_or_else(|| series.title.clone()),
        description: patch
            .and_then(|o| o.description.clone())
            .or_else(|| series.description.clone()),
        event_date: date,
        start_time: patch.and_then(|o| o.start_time).or(series.start_time),
        end_time: patch.and_then(|o| o.end_time).or(series.end_time),
        location: patch
            .and_then(|o| o.location.clone())
            .or_else(|| series.location.clone()),
        category: series.category,
        priority: series.priority,
        source,
        source_id: None,
        is_completed: patch.is_some_and(|o| o.is_completed),
        series_id: Some(series.id),
        occurrence_date: Some(date),
        is_series_instance: true,
    }
}
