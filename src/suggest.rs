//! Rule-based coaching suggestions over a student's most recent practice records.
//!
//! Three detectors run in a fixed order (consistency, focus area, low
//! activity) and each contributes at most one suggestion. The order of the
//! output is the display order.

use std::collections::HashMap;

use uuid::Uuid;

use crate::aggregate::total_hours;
use crate::models::{PracticeRecord, Suggestion};
use crate::store::PracticeStore;

pub const RECENT_RECORD_LIMIT: usize = 30;
const WEEK_RECORDS: usize = 7;
const TREND_THRESHOLD_PCT: f64 = 10.0;
const LOW_PRACTICE_HOURS: f64 = 2.0;

pub async fn suggestions_for(
    store: &impl PracticeStore,
    student_id: Uuid,
) -> anyhow::Result<Vec<Suggestion>> {
    let records = store.fetch_recent(student_id, RECENT_RECORD_LIMIT).await?;
    let suggestions = suggest(&records);
    tracing::debug!(
        student = %student_id,
        records = records.len(),
        suggestions = suggestions.len(),
        "computed suggestions"
    );
    Ok(suggestions)
}

/// `records` must be ordered most recent day first.
pub fn suggest(records: &[PracticeRecord]) -> Vec<Suggestion> {
    [consistency(records), focus_area(records), low_activity(records)]
        .into_iter()
        .flatten()
        .collect()
}

/// Compares the latest seven records with the seven before them. Slices are
/// positional, so gaps between practice days widen the compared span.
fn consistency(records: &[PracticeRecord]) -> Option<Suggestion> {
    let last = &records[..records.len().min(WEEK_RECORDS)];
    let prev = &records[last.len()..records.len().min(2 * WEEK_RECORDS)];
    let s_last = total_hours(last);
    let s_prev = total_hours(prev);

    if s_prev > 0.0 {
        let pct = (s_last - s_prev) / s_prev * 100.0;
        if pct >= TREND_THRESHOLD_PCT {
            Some(Suggestion::new(
                "Consistency improved",
                format!(
                    "Your practice time increased by {}% vs previous week.",
                    pct as i64
                ),
            ))
        } else if pct <= -TREND_THRESHOLD_PCT {
            Some(Suggestion::new(
                "Consistency drop",
                format!(
                    "Your practice time dropped by {}% vs previous week. Try 3 short sessions.",
                    pct.abs() as i64
                ),
            ))
        } else {
            None
        }
    } else if s_last > 0.0 {
        Some(Suggestion::new(
            "New streak",
            "Nice job starting a consistent practice! Keep going.",
        ))
    } else {
        None
    }
}

fn focus_area(records: &[PracticeRecord]) -> Option<Suggestion> {
    let (technique, count) = top_technique(records)?;
    Some(Suggestion::new(
        "Focus area",
        format!(
            "You've practiced '{technique}' {count} times recently — consider drilling it deliberately."
        ),
    ))
}

fn low_activity(records: &[PracticeRecord]) -> Option<Suggestion> {
    (total_hours(records) < LOW_PRACTICE_HOURS).then(|| {
        Suggestion::new(
            "Low practice",
            "You practiced less than 2 hours in the last 30 recorded sessions. Try a 10-minute daily goal.",
        )
    })
}

pub fn normalize_technique(raw: &str) -> Option<String> {
    let technique = raw.trim().to_lowercase();
    (!technique.is_empty()).then_some(technique)
}

/// Technique counts in first-seen order.
pub fn technique_counts(records: &[PracticeRecord]) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for technique in records.iter().filter_map(|r| normalize_technique(&r.technique)) {
        match index.get(&technique) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(technique.clone(), counts.len());
                counts.push((technique, 1));
            }
        }
    }

    counts
}

/// Most frequent technique; ties go to whichever was seen first.
fn top_technique(records: &[PracticeRecord]) -> Option<(String, usize)> {
    let mut best: Option<(String, usize)> = None;
    for (technique, count) in technique_counts(records) {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((technique, count));
        }
    }
    best
}
