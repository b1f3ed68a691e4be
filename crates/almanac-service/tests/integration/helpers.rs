#![allow(clippy::expect_used, dead_code)]
//! Test helpers for store integration tests.
//!
//! Provides utilities for:
//! - Creating and migrating a scratch database once per test process
//! - Building a `PgStore` on a pool owned by the calling test's runtime
//! - Seeding rows the stores expect to exist
//!
//! ## Database Isolation
//! Tests share one database and isolate themselves by seeding fresh owner
//! and row IDs, so they can run in parallel without truncation.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tokio::sync::OnceCell;
use uuid::Uuid;

use almanac_db::db::connection::DbPool;
use almanac_db::db::enums::{CalendarSource, DocumentStatus, EventCategory, Priority, SeriesSource};
use almanac_db::db::migrations::run_pending_migrations;
use almanac_db::db::query::calendar_event;
use almanac_db::model::calendar_event::{CalendarEvent, NewCalendarEvent};
use almanac_db::model::document::{Document, NewDocument};
use almanac_db::model::series::{EventSeries, NewEventSeries};
use almanac_service::store::{DocumentRepository, PgStore, SeriesRepository};

/// URL of the migrated scratch database, created on first use.
static DATABASE_URL: OnceCell<String> = OnceCell::const_new();

/// Creates the scratch database for this process and applies migrations.
async fn prepare_database(base_url: String) -> String {
    let db_name = format!("almanac_test_{}", std::process::id());
    let admin_url = format!("{base_url}/postgres");

    let name = db_name.clone();
    tokio::task::spawn_blocking(move || {
        let mut admin = diesel::PgConnection::establish(&admin_url)?;
        diesel::RunQueryDsl::execute(
            diesel::sql_query(format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)")),
            &mut admin,
        )?;
        diesel::RunQueryDsl::execute(diesel::sql_query(format!("CREATE DATABASE \"{name}\"")), &mut admin)?;
        Ok::<_, anyhow::Error>(())
    })
    .await
    .expect("database setup task")
    .expect("Failed to create test database");

    let database_url = format!("{base_url}/{db_name}");
    run_pending_migrations(&database_url)
        .await
        .expect("Failed to run migrations");

    eprintln!("[TestDb] Created {db_name}");
    database_url
}

/// Handle on the scratch database for one test.
pub struct TestDb {
    pool: DbPool,
    pub store: Arc<PgStore>,
}

impl TestDb {
    /// Connects to the scratch database, or returns `None` when
    /// `TEST_DATABASE_URL` is unset.
    pub async fn new() -> Option<Self> {
        let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
            tracing::warn!("TEST_DATABASE_URL is not set, skipping database test");
            return None;
        };

        let url = DATABASE_URL
            .get_or_init(|| prepare_database(base_url.trim_end_matches('/').to_string()))
            .await;

        // One pool per test: pooled connections are driven by the runtime
        // that opened them.
        let pool = Pool::builder()
            .max_size(4)
            .build(AsyncDieselConnectionManager::<AsyncPgConnection>::new(url))
            .await
            .expect("Failed to build pool");

        Some(Self {
            store: Arc::new(PgStore::new(Arc::new(pool.clone()))),
            pool,
        })
    }

    pub async fn seed_document(&self, owner_id: Uuid) -> Document {
        let id = Uuid::now_v7();
        let storage_key = format!("{owner_id}/{id}");
        self.store
            .insert_document(&NewDocument {
                id,
                owner_id,
                file_name: "syllabus.txt",
                media_type: "text/plain",
                byte_size: 64,
                storage_key: &storage_key,
                status: DocumentStatus::Pending,
                progress: 0,
            })
            .await
            .expect("Failed to seed document")
    }

    /// Seeds a weekly series with instances on `dates`.
    pub async fn seed_series(&self, owner_id: Uuid, dates: &[NaiveDate]) -> EventSeries {
        let new_series = series_row(owner_id, None, dates[0]);
        let mut conn = self.pool.get().await.expect("connection");
        let created = diesel::insert_into(almanac_db::db::schema::event_series::table)
            .values(&new_series)
            .returning(EventSeries::as_returning())
            .get_result(&mut conn)
            .await
            .expect("Failed to seed series");
        drop(conn);

        let instances: Vec<NewCalendarEvent> = dates
            .iter()
            .map(|date| NewCalendarEvent {
                series_id: Some(created.id),
                occurrence_date: Some(*date),
                is_series_instance: true,
                location: Some("Room 101".to_string()),
                ..calendar_row(owner_id, *date)
            })
            .collect();
        self.store
            .insert_instances(&instances)
            .await
            .expect("Failed to seed instances");
        created
    }

    /// Loads the instances of a series, by occurrence date.
    pub async fn instances(&self, series_id: Uuid) -> Vec<CalendarEvent> {
        let mut conn = self.pool.get().await.expect("connection");
        calendar_event::by_series(series_id)
            .select(CalendarEvent::as_select())
            .load(&mut conn)
            .await
            .expect("Failed to load instances")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn calendar_row(owner_id: Uuid, date: NaiveDate) -> NewCalendarEvent {
    NewCalendarEvent {
        id: Uuid::now_v7(),
        owner_id,
        title: "Chem lab".to_string(),
        description: None,
        event_date: date,
        start_time: NaiveTime::from_hms_opt(14, 0, 0),
        end_time: NaiveTime::from_hms_opt(15, 30, 0),
        location: None,
        category: EventCategory::Class,
        priority: Priority::Medium,
        source: CalendarSource::Manual,
        source_id: None,
        is_completed: false,
        series_id: None,
        occurrence_date: None,
        is_series_instance: false,
    }
}

pub fn series_row(owner_id: Uuid, cluster_key: Option<&str>, start_date: NaiveDate) -> NewEventSeries {
    NewEventSeries {
        id: Uuid::now_v7(),
        owner_id,
        title: "Chem lab".to_string(),
        normalized_title: "chem lab".to_string(),
        description: None,
        start_date,
        start_time: NaiveTime::from_hms_opt(14, 0, 0),
        end_time: NaiveTime::from_hms_opt(15, 30, 0),
        duration_minutes: Some(90),
        location: Some("Room 101".to_string()),
        category: EventCategory::Class,
        priority: Priority::Medium,
        rrule: "FREQ=WEEKLY;BYDAY=TU".to_string(),
        excluded_dates: Vec::new(),
        until_date: None,
        source: if cluster_key.is_some() {
            SeriesSource::Detected
        } else {
            SeriesSource::Manual
        },
        source_cluster_key: cluster_key.map(str::to_string),
        is_active: true,
    }
}
