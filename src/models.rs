use anyhow::bail;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// One student's logged practice for a single calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeRecord {
    pub student_id: Uuid,
    pub day: NaiveDate,
    pub hours: f64,
    pub technique: String,
    pub notes: String,
}

impl PracticeRecord {
    /// Builds a record for the write path, rejecting hours that are negative or not finite.
    pub fn new(
        student_id: Uuid,
        day: NaiveDate,
        hours: f64,
        technique: impl Into<String>,
        notes: impl Into<String>,
    ) -> anyhow::Result<Self> {
        if !hours.is_finite() || hours < 0.0 {
            bail!("practice hours must be a non-negative number, got {hours}");
        }

        Ok(Self {
            student_id,
            day,
            hours,
            technique: technique.into(),
            notes: notes.into(),
        })
    }

    /// Hours as they count toward sums. Corrupt values contribute nothing.
    pub fn effective_hours(&self) -> f64 {
        if self.hours.is_finite() && self.hours > 0.0 {
            self.hours
        } else {
            0.0
        }
    }

    pub fn has_note(&self) -> bool {
        !self.notes.is_empty()
    }
}

/// Whether a non-blank hours field fails to parse as a non-negative number.
pub fn hours_are_malformed(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && !matches!(raw.parse::<f64>(), Ok(value) if value.is_finite() && value >= 0.0)
}

/// Parses an hours field from free-form input. Blank or unparseable input counts as zero.
pub fn coerce_hours(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

#[derive(Debug, Clone)]
pub struct Student {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct SpecialNote {
    pub day: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub message: String,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub today_hours: f64,
    pub month_hours: f64,
    pub notes_this_week: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyHours {
    pub day: NaiveDate,
    pub hours: f64,
}

#[derive(Debug, Clone)]
pub struct TechniqueSummary {
    pub technique: String,
    pub sessions: usize,
    pub avg_hours: f64,
}
