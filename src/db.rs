use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dates;
use crate::models::{coerce_hours, hours_are_malformed, PracticeRecord, SpecialNote, Student};
use crate::store::PracticeStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Default student accounts plus two weeks of sample practice for the first one.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    for number in 10001..=10050 {
        let username = number.to_string();
        ensure_student(pool, &username, &format!("Student {username}")).await?;
    }

    let student = find_student(pool, "10001")
        .await?
        .context("seed student 10001 missing after insert")?;

    let sessions = [
        (0, 1.0, "scales", "Even sixteenths at 92 bpm"),
        (1, 0.5, "arpeggios", ""),
        (2, 1.25, "scales", ""),
        (4, 0.75, "sight reading", "Bach chorale no. 12"),
        (6, 1.5, "Scales", ""),
        (8, 0.5, "arpeggios", ""),
        (9, 1.0, "repertoire", "Slow practice on bars 17-32"),
        (12, 0.5, "scales", ""),
    ];

    let today = dates::today();
    for (days_ago, hours, technique, notes) in sessions {
        let record = PracticeRecord::new(
            student.id,
            today - Duration::days(days_ago),
            hours,
            technique,
            notes,
        )?;
        pool.upsert_record(&record).await?;
    }

    pool.add_special_note(student.id, today, "Ask about fingering in the Czerny etude")
        .await?;

    Ok(())
}

/// Creates the student if the username is new and returns its id either way.
pub async fn ensure_student(
    pool: &PgPool,
    username: &str,
    full_name: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO practice_coach.students (id, username, full_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO UPDATE
        SET username = EXCLUDED.username
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(full_name)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

pub async fn find_student(pool: &PgPool, username: &str) -> anyhow::Result<Option<Student>> {
    let row = sqlx::query(
        "SELECT id, username, full_name FROM practice_coach.students WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Student {
        id: row.get("id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
    }))
}

pub async fn list_special_notes(
    pool: &PgPool,
    student_id: Uuid,
) -> anyhow::Result<Vec<SpecialNote>> {
    let rows = sqlx::query(
        r#"
        SELECT day, note_text
        FROM practice_coach.special_notes
        WHERE student_id = $1
        ORDER BY day DESC, created_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SpecialNote {
            day: row.get("day"),
            text: row.get("note_text"),
        })
        .collect())
}

/// Upserts practice records from a CSV with `username,day,hours,technique,notes` columns.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        username: String,
        day: NaiveDate,
        #[serde(default)]
        hours: String,
        #[serde(default)]
        technique: String,
        #[serde(default)]
        notes: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut upserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let username = row.username.trim();
        let student_id = ensure_student(pool, username, &format!("Student {username}")).await?;

        if hours_are_malformed(&row.hours) {
            tracing::warn!(
                username,
                day = %row.day,
                raw = %row.hours,
                "unparseable hours, storing 0"
            );
        }
        let hours = coerce_hours(&row.hours);

        let record = PracticeRecord::new(student_id, row.day, hours, row.technique, row.notes)?;
        pool.upsert_record(&record).await?;
        upserted += 1;
    }

    tracing::info!(path = %csv_path.display(), upserted, "imported practice records");
    Ok(upserted)
}

fn row_to_record(row: &PgRow) -> PracticeRecord {
    let hours: Option<f64> = row.get("hours");
    PracticeRecord {
        student_id: row.get("student_id"),
        day: row.get("day"),
        hours: hours.unwrap_or(0.0),
        technique: row.get("technique"),
        notes: row.get("notes"),
    }
}

impl PracticeStore for PgPool {
    async fn fetch_record(
        &self,
        student_id: Uuid,
        day: NaiveDate,
    ) -> anyhow::Result<Option<PracticeRecord>> {
        let row = sqlx::query(
            r#"
            SELECT student_id, day, hours, technique, notes
            FROM practice_coach.practice_entries
            WHERE student_id = $1 AND day = $2
            "#,
        )
        .bind(student_id)
        .bind(day)
        .fetch_optional(self)
        .await?;

        Ok(row.as_ref().map(row_to_record))
    }

    async fn fetch_range(
        &self,
        student_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<PracticeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT student_id, day, hours, technique, notes
            FROM practice_coach.practice_entries
            WHERE student_id = $1 AND day BETWEEN $2 AND $3
            ORDER BY day
            "#,
        )
        .bind(student_id)
        .bind(start)
        .bind(end)
        .fetch_all(self)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn fetch_recent(
        &self,
        student_id: Uuid,
        limit: usize,
    ) -> anyhow::Result<Vec<PracticeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT student_id, day, hours, technique, notes
            FROM practice_coach.practice_entries
            WHERE student_id = $1
            ORDER BY day DESC
            LIMIT $2
            "#,
        )
        .bind(student_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(self)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count_special_notes(
        &self,
        student_id: Uuid,
        since: NaiveDate,
        until: NaiveDate,
    ) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS c
            FROM practice_coach.special_notes
            WHERE student_id = $1 AND day BETWEEN $2 AND $3
            "#,
        )
        .bind(student_id)
        .bind(since)
        .bind(until)
        .fetch_one(self)
        .await?
        .get("c");

        Ok(count)
    }

    async fn upsert_record(&self, record: &PracticeRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO practice_coach.practice_entries
            (student_id, day, hours, technique, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, day) DO UPDATE
            SET hours = EXCLUDED.hours,
                technique = EXCLUDED.technique,
                notes = EXCLUDED.notes,
                updated_at = now()
            "#,
        )
        .bind(record.student_id)
        .bind(record.day)
        .bind(record.hours)
        .bind(&record.technique)
        .bind(&record.notes)
        .execute(self)
        .await?;

        tracing::debug!(
            student = %record.student_id,
            day = %record.day,
            hours = record.hours,
            "upserted practice record"
        );
        Ok(())
    }

    async fn delete_record(&self, student_id: Uuid, day: NaiveDate) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM practice_coach.practice_entries WHERE student_id = $1 AND day = $2",
        )
        .bind(student_id)
        .bind(day)
        .execute(self)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_special_note(
        &self,
        student_id: Uuid,
        day: NaiveDate,
        text: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO practice_coach.special_notes (id, student_id, day, note_text)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(day)
        .bind(text)
        .execute(self)
        .await?;

        Ok(())
    }
}
