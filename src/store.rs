use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::PracticeRecord;

/// Read/write access to one student's practice history.
///
/// Implementations hand back a consistent snapshot per call; callers never lock.
#[allow(async_fn_in_trait)]
pub trait PracticeStore {
    async fn fetch_record(
        &self,
        student_id: Uuid,
        day: NaiveDate,
    ) -> anyhow::Result<Option<PracticeRecord>>;

    /// Records with `start <= day <= end`, in no particular order.
    async fn fetch_range(
        &self,
        student_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<PracticeRecord>>;

    /// Up to `limit` records, most recent day first.
    async fn fetch_recent(
        &self,
        student_id: Uuid,
        limit: usize,
    ) -> anyhow::Result<Vec<PracticeRecord>>;

    /// Special notes dated within `since..=until`.
    async fn count_special_notes(
        &self,
        student_id: Uuid,
        since: NaiveDate,
        until: NaiveDate,
    ) -> anyhow::Result<i64>;

    /// Inserts the record, or replaces hours, technique and notes of the existing one for that day.
    async fn upsert_record(&self, record: &PracticeRecord) -> anyhow::Result<()>;

    /// Returns whether a record existed.
    async fn delete_record(&self, student_id: Uuid, day: NaiveDate) -> anyhow::Result<bool>;

    async fn add_special_note(
        &self,
        student_id: Uuid,
        day: NaiveDate,
        text: &str,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
pub mod memory {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        records: Mutex<BTreeMap<(Uuid, NaiveDate), PracticeRecord>>,
        notes: Mutex<Vec<(Uuid, NaiveDate, String)>>,
    }

    impl MemoryStore {
        pub fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    impl PracticeStore for MemoryStore {
        async fn fetch_record(
            &self,
            student_id: Uuid,
            day: NaiveDate,
        ) -> anyhow::Result<Option<PracticeRecord>> {
            Ok(self.records.lock().unwrap().get(&(student_id, day)).cloned())
        }

        async fn fetch_range(
            &self,
            student_id: Uuid,
            start: NaiveDate,
            end: NaiveDate,
        ) -> anyhow::Result<Vec<PracticeRecord>> {
            if start > end {
                return Ok(Vec::new());
            }
            Ok(self
                .records
                .lock()
                .unwrap()
                .range((student_id, start)..=(student_id, end))
                .map(|(_, record)| record.clone())
                .collect())
        }

        async fn fetch_recent(
            &self,
            student_id: Uuid,
            limit: usize,
        ) -> anyhow::Result<Vec<PracticeRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|record| record.student_id == student_id)
                .rev()
                .take(limit)
                .cloned()
                .collect())
        }

        async fn count_special_notes(
            &self,
            student_id: Uuid,
            since: NaiveDate,
            until: NaiveDate,
        ) -> anyhow::Result<i64> {
            Ok(self
                .notes
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, day, _)| *id == student_id && (since..=until).contains(day))
                .count() as i64)
        }

        async fn upsert_record(&self, record: &PracticeRecord) -> anyhow::Result<()> {
            self.records
                .lock()
                .unwrap()
                .insert((record.student_id, record.day), record.clone());
            Ok(())
        }

        async fn delete_record(&self, student_id: Uuid, day: NaiveDate) -> anyhow::Result<bool> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .remove(&(student_id, day))
                .is_some())
        }

        async fn add_special_note(
            &self,
            student_id: Uuid,
            day: NaiveDate,
            text: &str,
        ) -> anyhow::Result<()> {
            self.notes
                .lock()
                .unwrap()
                .push((student_id, day, text.to_string()));
            Ok(())
        }
    }

    /// Every call fails, as a store would when the database is unreachable.
    pub struct FailingStore;

    pub const FAILURE: &str = "practice store unavailable";

    impl PracticeStore for FailingStore {
        async fn fetch_record(
            &self,
            _student_id: Uuid,
            _day: NaiveDate,
        ) -> anyhow::Result<Option<PracticeRecord>> {
            anyhow::bail!(FAILURE)
        }

        async fn fetch_range(
            &self,
            _student_id: Uuid,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> anyhow::Result<Vec<PracticeRecord>> {
            anyhow::bail!(FAILURE)
        }

        async fn fetch_recent(
            &self,
            _student_id: Uuid,
            _limit: usize,
        ) -> anyhow::Result<Vec<PracticeRecord>> {
            anyhow::bail!(FAILURE)
        }

        async fn count_special_notes(
            &self,
            _student_id: Uuid,
            _since: NaiveDate,
            _until: NaiveDate,
        ) -> anyhow::Result<i64> {
            anyhow::bail!(FAILURE)
        }

        async fn upsert_record(&self, _record: &PracticeRecord) -> anyhow::Result<()> {
            anyhow::bail!(FAILURE)
        }

        async fn delete_record(&self, _student_id: Uuid, _day: NaiveDate) -> anyhow::Result<bool> {
            anyhow::bail!(FAILURE)
        }

        async fn add_special_note(
            &self,
            _student_id: Uuid,
            _day: NaiveDate,
            _text: &str,
        ) -> anyhow::Result<()> {
            anyhow::bail!(FAILURE)
        }
    }
}
