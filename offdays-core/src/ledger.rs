//! The vacation ledger: authoritative person and vacation state.
//!
//! Local state is authoritative; the external calendar mirror is advisory
//! and may drift. Every read-modify-persist sequence runs under a single
//! ledger-wide lock. External calendar calls are dispatched as background
//! tasks after the local commit and never hold that lock while doing
//! network I/O.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::person::{Person, PersonDraft, PersonPatch, VacationBooking, VacationRecord};
use crate::remote::{CalendarMirror, MirrorEvent};
use crate::store::{LedgerState, RecordStore};

pub struct VacationLedger {
    store: Arc<dyn RecordStore>,
    mirror: CalendarMirror,
    write_lock: Arc<Mutex<()>>,
}

impl VacationLedger {
    pub fn new(store: Arc<dyn RecordStore>, mirror: CalendarMirror) -> Self {
        VacationLedger {
            store,
            mirror,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn mirror(&self) -> &CalendarMirror {
        &self.mirror
    }

    /// Fresh snapshot of everyone in the ledger, in insertion order.
    pub fn persons(&self) -> LedgerResult<Vec<Person>> {
        Ok(self.store.load()?.persons)
    }

    pub fn person(&self, id: &str) -> LedgerResult<Person> {
        self.store
            .load()?
            .persons
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| LedgerError::PersonNotFound(id.to_string()))
    }

    pub async fn add_person(&self, draft: PersonDraft) -> LedgerResult<Person> {
        if draft.name.trim().is_empty() || draft.email.trim().is_empty() {
            return Err(LedgerError::Validation("name and email are required".into()));
        }

        let person = Person {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            email: draft.email,
            team: draft.team.filter(|t| !t.is_empty()),
            birthday: draft.birthday,
            hiring_date: draft.hiring_date,
            total_vacation_days: draft.total_vacation_days.unwrap_or(0),
            vacations: Vec::new(),
        };

        let _guard = self.write_lock.lock().await;
        let mut state = self.store.load()?;
        state.persons.push(person.clone());
        self.store.save(&state)?;

        Ok(person)
    }

    pub async fn update_person(&self, id: &str, patch: PersonPatch) -> LedgerResult<Person> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.store.load()?;
        let person = find_person_mut(&mut state, id)?;
        patch.apply(person);
        let updated = person.clone();
        self.store.save(&state)?;

        Ok(updated)
    }

    /// Remove a person and all of their vacation records. Mirrored events
    /// are cleaned up best-effort after the local commit.
    pub async fn remove_person(&self, id: &str) -> LedgerResult<()> {
        let removed = {
            let _guard = self.write_lock.lock().await;
            let mut state = self.store.load()?;
            let index = state
                .persons
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| LedgerError::PersonNotFound(id.to_string()))?;
            let removed = state.persons.remove(index);
            self.store.save(&state)?;
            removed
        };

        for vacation in removed.vacations {
            if let Some(event_id) = vacation.external_event_id {
                self.spawn_delete(event_id);
            }
        }

        Ok(())
    }

    /// Book a vacation. The record is committed locally first; mirroring
    /// runs in the background and writes the external event id back in a
    /// second commit only when the remote create succeeds.
    pub async fn add_vacation(
        &self,
        person_id: &str,
        booking: VacationBooking,
    ) -> LedgerResult<VacationRecord> {
        let (start, end, days_used) = booking.validated()?;

        let record = VacationRecord {
            id: Uuid::new_v4().to_string(),
            start_date: start,
            end_date: end,
            days_used,
            external_event_id: None,
        };

        let person_name = {
            let _guard = self.write_lock.lock().await;
            let mut state = self.store.load()?;
            let person = find_person_mut(&mut state, person_id)?;
            person.vacations.push(record.clone());
            let name = person.name.clone();
            self.store.save(&state)?;
            name
        };

        self.spawn_create(person_id.to_string(), record.clone(), person_name);

        Ok(record)
    }

    pub async fn update_vacation(
        &self,
        person_id: &str,
        vacation_id: &str,
        booking: VacationBooking,
    ) -> LedgerResult<VacationRecord> {
        let (start, end, days_used) = booking.validated()?;

        let (record, person_name) = {
            let _guard = self.write_lock.lock().await;
            let mut state = self.store.load()?;
            let person = find_person_mut(&mut state, person_id)?;
            let person_name = person.name.clone();
            let vacation = person
                .vacations
                .iter_mut()
                .find(|v| v.id == vacation_id)
                .ok_or_else(|| LedgerError::VacationNotFound(vacation_id.to_string()))?;

            vacation.start_date = start;
            vacation.end_date = end;
            vacation.days_used = days_used;
            // external_event_id is preserved as-is
            let record = vacation.clone();
            self.store.save(&state)?;
            (record, person_name)
        };

        if let Some(event_id) = record.external_event_id.clone() {
            let mirror = self.mirror.clone();
            let event = MirrorEvent::vacation(&person_name, start, end);
            tokio::spawn(async move {
                if let Err(e) = mirror.update_event(&event_id, &event).await {
                    tracing::warn!(event_id = %event_id, "failed to mirror vacation update: {e}");
                }
            });
        }

        Ok(record)
    }

    /// Remove a booking. The record is removed regardless of the external
    /// outcome; a mirrored event is deleted best-effort.
    pub async fn remove_vacation(&self, person_id: &str, vacation_id: &str) -> LedgerResult<()> {
        let removed = {
            let _guard = self.write_lock.lock().await;
            let mut state = self.store.load()?;
            let person = find_person_mut(&mut state, person_id)?;
            let index = person
                .vacations
                .iter()
                .position(|v| v.id == vacation_id)
                .ok_or_else(|| LedgerError::VacationNotFound(vacation_id.to_string()))?;
            let removed = person.vacations.remove(index);
            self.store.save(&state)?;
            removed
        };

        if let Some(event_id) = removed.external_event_id {
            self.spawn_delete(event_id);
        }

        Ok(())
    }

    fn spawn_create(&self, person_id: String, record: VacationRecord, person_name: String) {
        let mirror = self.mirror.clone();
        let store = Arc::clone(&self.store);
        let lock = Arc::clone(&self.write_lock);

        tokio::spawn(async move {
            let event = MirrorEvent::vacation(&person_name, record.start_date, record.end_date);
            let event_id = match mirror.create_event(&event).await {
                Ok(Some(id)) => id,
                // Sync not configured; nothing to record.
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(person = %person_name, "failed to mirror vacation: {e}");
                    return;
                }
            };

            let _guard = lock.lock().await;
            let mut state = match store.load() {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("failed to reload ledger for mirrored event id: {e}");
                    return;
                }
            };

            let vacation = state
                .persons
                .iter_mut()
                .find(|p| p.id == person_id)
                .and_then(|p| p.vacations.iter_mut().find(|v| v.id == record.id));

            // The record may have been deleted while the create was in
            // flight; the remote event then drifts, which is accepted.
            if let Some(vacation) = vacation {
                vacation.external_event_id = Some(event_id);
                if let Err(e) = store.save(&state) {
                    tracing::warn!("failed to persist mirrored event id: {e}");
                }
            }
        });
    }

    fn spawn_delete(&self, event_id: String) {
        let mirror = self.mirror.clone();
        tokio::spawn(async move {
            if let Err(e) = mirror.delete_event(&event_id).await {
                tracing::warn!(event_id = %event_id, "failed to delete mirrored event: {e}");
            }
        });
    }
}

fn find_person_mut<'a>(state: &'a mut LedgerState, id: &str) -> LedgerResult<&'a mut Person> {
    state
        .persons
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| LedgerError::PersonNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{CalendarSync, Credential};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Recording calendar fake; optionally fails creates.
    #[derive(Default)]
    struct FakeCalendar {
        fail_create: bool,
        create_calls: AtomicUsize,
        updated: std::sync::Mutex<Vec<String>>,
        deleted: std::sync::Mutex<Vec<String>>,
        counter: AtomicUsize,
    }

    #[async_trait]
    impl CalendarSync for FakeCalendar {
        async fn create_event(
            &self,
            _credential: &Credential,
            _event: &MirrorEvent,
        ) -> LedgerResult<String> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                return Err(LedgerError::Sync("remote unavailable".into()));
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("evt-{n}"))
        }

        async fn update_event(
            &self,
            _credential: &Credential,
            event_id: &str,
            _event: &MirrorEvent,
        ) -> LedgerResult<()> {
            self.updated.lock().unwrap().push(event_id.to_string());
            Ok(())
        }

        async fn delete_event(
            &self,
            _credential: &Credential,
            event_id: &str,
        ) -> LedgerResult<()> {
            self.deleted.lock().unwrap().push(event_id.to_string());
            Ok(())
        }
    }

    fn credential() -> Credential {
        Credential {
            access_token: "token".into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    async fn connected_ledger(calendar: Arc<FakeCalendar>) -> (VacationLedger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let mirror = CalendarMirror::new(calendar);
        mirror.connect(credential()).await;
        (
            VacationLedger::new(store.clone() as Arc<dyn RecordStore>, mirror),
            store,
        )
    }

    fn draft(name: &str) -> PersonDraft {
        PersonDraft {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            total_vacation_days: Some(25),
            ..Default::default()
        }
    }

    fn booking(start: &str, end: &str, days_used: u32) -> VacationBooking {
        VacationBooking {
            start_date: Some(start.parse().unwrap()),
            end_date: Some(end.parse().unwrap()),
            days_used: Some(days_used),
        }
    }

    /// Poll until the background mirror task has done its work.
    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within 1s");
    }

    #[tokio::test]
    async fn add_person_assigns_id_and_empty_vacations() {
        let (ledger, _store) = connected_ledger(Arc::new(FakeCalendar::default())).await;

        let person = ledger.add_person(draft("Jane")).await.unwrap();
        assert!(!person.id.is_empty());
        assert!(person.vacations.is_empty());
        assert_eq!(person.total_vacation_days, 25);

        let persons = ledger.persons().unwrap();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].id, person.id);
    }

    #[tokio::test]
    async fn update_person_merges_only_supplied_fields() {
        let (ledger, _store) = connected_ledger(Arc::new(FakeCalendar::default())).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();

        let patch = PersonPatch {
            team: Some("Design".into()),
            total_vacation_days: Some(30),
            ..Default::default()
        };
        let updated = ledger.update_person(&person.id, patch).await.unwrap();

        assert_eq!(updated.name, "Jane");
        assert_eq!(updated.email, "jane@example.com");
        assert_eq!(updated.team.as_deref(), Some("Design"));
        assert_eq!(updated.total_vacation_days, 30);
    }

    #[tokio::test]
    async fn unknown_person_id_is_not_found() {
        let (ledger, _store) = connected_ledger(Arc::new(FakeCalendar::default())).await;

        let err = ledger.person("nope").unwrap_err();
        assert!(matches!(err, LedgerError::PersonNotFound(_)));

        let err = ledger
            .update_person("nope", PersonPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::PersonNotFound(_)));

        let err = ledger.remove_person("nope").await.unwrap_err();
        assert!(matches!(err, LedgerError::PersonNotFound(_)));
    }

    #[tokio::test]
    async fn add_vacation_keeps_caller_supplied_days_and_mirrors() {
        let calendar = Arc::new(FakeCalendar::default());
        let (ledger, store) = connected_ledger(calendar.clone()).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();

        // 4 is stored verbatim even though the range has 5 calendar days.
        let record = ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-05", 4))
            .await
            .unwrap();
        assert_eq!(record.days_used, 4);
        assert_eq!(record.external_event_id, None);

        wait_until(move || {
            store.load().unwrap().persons[0]
                .vacations
                .iter()
                .all(|v| v.external_event_id.is_some())
        })
        .await;

        let stored = &ledger.person(&person.id).unwrap().vacations[0];
        assert_eq!(stored.days_used, 4);
        assert_eq!(stored.external_event_id.as_deref(), Some("evt-0"));
        assert_eq!(calendar.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn vacation_with_missing_or_zero_days_is_rejected() {
        let (ledger, _store) = connected_ledger(Arc::new(FakeCalendar::default())).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();

        let err = ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-05", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let no_days = VacationBooking {
            start_date: Some("2025-06-01".parse().unwrap()),
            end_date: Some("2025-06-05".parse().unwrap()),
            days_used: None,
        };
        let err = ledger.add_vacation(&person.id, no_days).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        // No mutation happened.
        assert!(ledger.person(&person.id).unwrap().vacations.is_empty());
    }

    #[tokio::test]
    async fn inverted_booking_range_is_rejected() {
        let (ledger, _store) = connected_ledger(Arc::new(FakeCalendar::default())).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();

        let err = ledger
            .add_vacation(&person.id, booking("2025-06-05", "2025-06-01", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_mirror_create_still_books_the_vacation() {
        let calendar = Arc::new(FakeCalendar {
            fail_create: true,
            ..Default::default()
        });
        let (ledger, _store) = connected_ledger(calendar.clone()).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();

        let record = ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-05", 4))
            .await
            .unwrap();
        assert_eq!(record.external_event_id, None);

        let probe = calendar.clone();
        wait_until(move || probe.create_calls.load(Ordering::SeqCst) == 1).await;

        let stored = &ledger.person(&person.id).unwrap().vacations[0];
        assert_eq!(stored.external_event_id, None);
        assert_eq!(stored.days_used, 4);
    }

    #[tokio::test]
    async fn update_vacation_preserves_external_id_and_mirrors_update() {
        let calendar = Arc::new(FakeCalendar::default());
        let (ledger, _store) = connected_ledger(calendar.clone()).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();
        let record = ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-05", 4))
            .await
            .unwrap();

        let probe = calendar.clone();
        wait_until(move || probe.create_calls.load(Ordering::SeqCst) == 1).await;

        let updated = ledger
            .update_vacation(&person.id, &record.id, booking("2025-06-02", "2025-06-06", 3))
            .await
            .unwrap();
        assert_eq!(updated.days_used, 3);
        assert_eq!(updated.external_event_id.as_deref(), Some("evt-0"));

        let probe = calendar.clone();
        wait_until(move || probe.updated.lock().unwrap().len() == 1).await;
        assert_eq!(calendar.updated.lock().unwrap()[0], "evt-0");
    }

    #[tokio::test]
    async fn remove_vacation_deletes_locally_and_mirrors_delete() {
        let calendar = Arc::new(FakeCalendar::default());
        let (ledger, _store) = connected_ledger(calendar.clone()).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();
        let record = ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-05", 4))
            .await
            .unwrap();

        let probe = calendar.clone();
        wait_until(move || probe.create_calls.load(Ordering::SeqCst) == 1).await;

        ledger.remove_vacation(&person.id, &record.id).await.unwrap();
        assert!(ledger.person(&person.id).unwrap().vacations.is_empty());

        let probe = calendar.clone();
        wait_until(move || probe.deleted.lock().unwrap().len() == 1).await;
        assert_eq!(calendar.deleted.lock().unwrap()[0], "evt-0");

        let err = ledger
            .remove_vacation(&person.id, &record.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::VacationNotFound(_)));
    }

    #[tokio::test]
    async fn remove_person_cascades_and_cleans_up_mirrored_events() {
        let calendar = Arc::new(FakeCalendar::default());
        let (ledger, store) = connected_ledger(calendar.clone()).await;
        let person = ledger.add_person(draft("Jane")).await.unwrap();

        ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-05", 4))
            .await
            .unwrap();
        ledger
            .add_vacation(&person.id, booking("2025-07-01", "2025-07-02", 2))
            .await
            .unwrap();

        // Both event ids must hit the store before the removal.
        let store_probe = store.clone();
        wait_until(move || {
            store_probe.load().unwrap().persons[0]
                .vacations
                .iter()
                .all(|v| v.external_event_id.is_some())
        })
        .await;

        ledger.remove_person(&person.id).await.unwrap();
        assert!(ledger.persons().unwrap().is_empty());

        let probe = calendar.clone();
        wait_until(move || probe.deleted.lock().unwrap().len() == 2).await;
        let deleted = calendar.deleted.lock().unwrap();
        assert!(deleted.contains(&"evt-0".to_string()));
        assert!(deleted.contains(&"evt-1".to_string()));
    }

    #[tokio::test]
    async fn remaining_balance_can_go_negative() {
        let (ledger, _store) = connected_ledger(Arc::new(FakeCalendar::default())).await;
        let mut person_draft = draft("Jane");
        person_draft.total_vacation_days = Some(3);
        let person = ledger.add_person(person_draft).await.unwrap();

        ledger
            .add_vacation(&person.id, booking("2025-06-01", "2025-06-10", 5))
            .await
            .unwrap();

        let person = ledger.person(&person.id).unwrap();
        assert_eq!(person.remaining_balance(), -2);
    }
}
