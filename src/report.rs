use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{
    DailyHours, DashboardSummary, PracticeRecord, Suggestion, TechniqueSummary,
};
use crate::suggest;

pub fn summarize_by_technique(records: &[PracticeRecord]) -> Vec<TechniqueSummary> {
    let mut summaries: Vec<TechniqueSummary> = suggest::technique_counts(records)
        .into_iter()
        .map(|(technique, sessions)| {
            let total: f64 = records
                .iter()
                .filter(|r| {
                    suggest::normalize_technique(&r.technique).as_ref() == Some(&technique)
                })
                .map(PracticeRecord::effective_hours)
                .sum();
            TechniqueSummary {
                technique,
                sessions,
                avg_hours: if sessions == 0 {
                    0.0
                } else {
                    total / sessions as f64
                },
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.sessions.cmp(&a.sessions));
    summaries
}

pub struct ReportInput<'a> {
    pub student_label: &'a str,
    pub reference: NaiveDate,
    pub summary: DashboardSummary,
    pub recent: &'a [PracticeRecord],
    pub series: &'a [DailyHours],
    pub suggestions: &'a [Suggestion],
}

pub fn build_report(input: &ReportInput<'_>) -> String {
    let techniques = summarize_by_technique(input.recent);
    let mut output = String::new();

    let _ = writeln!(output, "# Practice Report");
    let _ = writeln!(
        output,
        "Generated for {} as of {}",
        input.student_label, input.reference
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Today: {:.2} h", input.summary.today_hours);
    let _ = writeln!(output, "- This month: {:.2} h", input.summary.month_hours);
    let _ = writeln!(output, "- Notes this week: {}", input.summary.notes_this_week);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Technique Mix");

    if techniques.is_empty() {
        let _ = writeln!(output, "No techniques recorded in recent sessions.");
    } else {
        for summary in techniques.iter() {
            let _ = writeln!(
                output,
                "- {}: {} sessions (avg {:.2} h)",
                summary.technique, summary.sessions, summary.avg_hours
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last {} Days", input.series.len());

    let practiced: Vec<&DailyHours> = input.series.iter().filter(|p| p.hours > 0.0).collect();
    if practiced.is_empty() {
        let _ = writeln!(output, "No practice logged in this window.");
    } else {
        let total: f64 = input.series.iter().map(|p| p.hours).sum();
        let _ = writeln!(
            output,
            "{} of {} days practiced, {:.2} h total",
            practiced.len(),
            input.series.len(),
            total
        );
        for point in practiced {
            let _ = writeln!(output, "- {}: {:.2} h", point.day, point.hours);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Suggestions");

    if input.suggestions.is_empty() {
        let _ = writeln!(output, "Nothing to flag. Keep it up.");
    } else {
        for suggestion in input.suggestions {
            let _ = writeln!(output, "- **{}**: {}", suggestion.title, suggestion.message);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(days_ago: i64, hours: f64, technique: &str) -> PracticeRecord {
        let day =
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap() - chrono::Duration::days(days_ago);
        PracticeRecord::new(Uuid::nil(), day, hours, technique, "").unwrap()
    }

    #[test]
    fn technique_mix_sorted_by_sessions() {
        let records = vec![
            record(0, 1.0, "arpeggios"),
            record(1, 2.0, "Scales"),
            record(2, 1.0, "scales"),
            record(3, 0.5, ""),
        ];

        let summaries = summarize_by_technique(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].technique, "scales");
        assert_eq!(summaries[0].sessions, 2);
        assert!((summaries[0].avg_hours - 1.5).abs() < 1e-9);
        assert_eq!(summaries[1].technique, "arpeggios");
    }

    #[test]
    fn report_lists_every_section() {
        let reference = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let recent = vec![record(0, 1.25, "scales")];
        let series = crate::aggregate::zero_fill(&recent, reference, 30).unwrap();
        let suggestions = suggest::suggest(&recent);

        let report = build_report(&ReportInput {
            student_label: "Student 10001 (10001)",
            reference,
            summary: DashboardSummary {
                today_hours: 1.25,
                month_hours: 1.25,
                notes_this_week: 0,
            },
            recent: &recent,
            series: &series,
            suggestions: &suggestions,
        });

        assert!(report.starts_with(
            "# Practice Report\nGenerated for Student 10001 (10001) as of 2024-09-30"
        ));
        assert!(report.contains("- Today: 1.25 h"));
        assert!(report.contains("- scales: 1 sessions (avg 1.25 h)"));
        assert!(report.contains("## Last 30 Days\n1 of 30 days practiced, 1.25 h total"));
        assert!(report
            .contains("- **New streak**: Nice job starting a consistent practice! Keep going."));
        assert!(report.contains("- **Low practice**"));
    }

    #[test]
    fn empty_report_has_placeholders() {
        let reference = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        let series = crate::aggregate::zero_fill(&[], reference, 30).unwrap();
        let report = build_report(&ReportInput {
            student_label: "nobody",
            reference,
            summary: DashboardSummary {
                today_hours: 0.0,
                month_hours: 0.0,
                notes_this_week: 0,
            },
            recent: &[],
            series: &series,
            suggestions: &[],
        });

        assert!(report.contains("No techniques recorded in recent sessions."));
        assert!(report.contains("No practice logged in this window."));
        assert!(report.contains("Nothing to flag. Keep it up."));
    }
}
