//! Dashboard and chart figures for a single student.
//!
//! Every function re-reads the store and returns full-precision values;
//! rounding belongs to whoever renders them.

use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::dates;
use crate::models::{DailyHours, DashboardSummary, PracticeRecord};
use crate::store::PracticeStore;

pub const NOTE_WINDOW_DAYS: i64 = 7;
pub const CHART_WINDOW_DAYS: usize = 30;
pub const MAX_WINDOW_DAYS: usize = 3660;

pub async fn today_hours(
    store: &impl PracticeStore,
    student_id: Uuid,
    today: NaiveDate,
) -> anyhow::Result<f64> {
    let record = store.fetch_record(student_id, today).await?;
    Ok(record.map_or(0.0, |record| record.effective_hours()))
}

pub async fn month_to_date_hours(
    store: &impl PracticeStore,
    student_id: Uuid,
    reference: NaiveDate,
) -> anyhow::Result<f64> {
    let (first, last) = dates::month_bounds(reference);
    let records = store.fetch_range(student_id, first, last).await?;
    Ok(total_hours(&records))
}

/// Practice records carrying a note plus special notes, both counted over
/// `[reference - window_days, reference]`.
pub async fn recent_note_count(
    store: &impl PracticeStore,
    student_id: Uuid,
    reference: NaiveDate,
    window_days: i64,
) -> anyhow::Result<i64> {
    let since = dates::lookback_start(reference, window_days);
    let records = store.fetch_range(student_id, since, reference).await?;
    let record_notes = records.iter().filter(|record| record.has_note()).count() as i64;
    let special_notes = store.count_special_notes(student_id, since, reference).await?;
    Ok(record_notes + special_notes)
}

pub async fn trailing_daily_series(
    store: &impl PracticeStore,
    student_id: Uuid,
    reference: NaiveDate,
    window_days: usize,
) -> anyhow::Result<Vec<DailyHours>> {
    if window_days == 0 {
        return Ok(Vec::new());
    }
    anyhow::ensure!(
        window_days <= MAX_WINDOW_DAYS,
        "chart window of {window_days} days exceeds the {MAX_WINDOW_DAYS}-day limit"
    );
    let start = dates::window_start(reference, window_days)
        .with_context(|| format!("{window_days}-day window before {reference} is out of range"))?;
    let records = store.fetch_range(student_id, start, reference).await?;
    zero_fill(&records, reference, window_days)
}

pub async fn dashboard_summary(
    store: &impl PracticeStore,
    student_id: Uuid,
    reference: NaiveDate,
) -> anyhow::Result<DashboardSummary> {
    Ok(DashboardSummary {
        today_hours: today_hours(store, student_id, reference).await?,
        month_hours: month_to_date_hours(store, student_id, reference).await?,
        notes_this_week: recent_note_count(store, student_id, reference, NOTE_WINDOW_DAYS)
            .await?,
    })
}

pub fn total_hours(records: &[PracticeRecord]) -> f64 {
    records.iter().map(PracticeRecord::effective_hours).sum()
}

/// One entry per day of the window, oldest first, with 0.0 for days without a record.
pub fn zero_fill(
    records: &[PracticeRecord],
    reference: NaiveDate,
    window_days: usize,
) -> anyhow::Result<Vec<DailyHours>> {
    let by_day: HashMap<NaiveDate, f64> = records
        .iter()
        .map(|record| (record.day, record.effective_hours()))
        .collect();

    let days = dates::window_days(reference, window_days)
        .with_context(|| format!("{window_days}-day window before {reference} is out of range"))?;
    Ok(days
        .map(|day| DailyHours {
            day,
            hours: by_day.get(&day).copied().unwrap_or(0.0),
        })
        .collect())
}
