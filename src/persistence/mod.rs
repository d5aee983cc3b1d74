use crate::book::ScheduleBook;
use crate::schedule::Schedule;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::io;

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::FileStore;

/// Key holding the JSON-encoded array of every schedule.
pub const SCHEDULES_KEY: &str = "classSchedules";
/// Key holding the selected schedule id as a plain string.
pub const SELECTED_SCHEDULE_KEY: &str = "selectedScheduleId";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("store lock poisoned")]
    Poisoned,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// String key-value storage the schedule book is persisted through.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> PersistenceResult<()>;
    fn remove(&mut self, key: &str) -> PersistenceResult<()>;
}

/// Volatile store; contents vanish with the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads the book from `store`. A store with no schedules key yields an
/// empty book; a value that is not a JSON array is an error.
pub fn load_book(store: &dyn KeyValueStore) -> PersistenceResult<ScheduleBook> {
    load_book_repaired(store).map(|(book, _)| book)
}

/// Like [`load_book`], also returning how many stored records were repaired
/// or skipped. Records that do not decode as a schedule are skipped; the rest
/// go through [`ScheduleBook::from_parts`].
pub fn load_book_repaired(store: &dyn KeyValueStore) -> PersistenceResult<(ScheduleBook, usize)> {
    let records: Vec<Value> = match store.load(SCHEDULES_KEY)? {
        Some(json) => serde_json::from_str(&json)?,
        None => Vec::new(),
    };
    let mut skipped = 0;
    let mut schedules = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Schedule>(record) {
            Ok(schedule) => schedules.push(schedule),
            Err(err) => {
                warn!("event=stored_schedule_skipped index={index} error={err}");
                skipped += 1;
            }
        }
    }
    let selected_id = store
        .load(SELECTED_SCHEDULE_KEY)?
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    debug!(
        "event=book_loaded schedules={} selected={}",
        schedules.len(),
        selected_id.as_deref().unwrap_or("-")
    );
    let (book, repaired) = ScheduleBook::from_parts(schedules, selected_id);
    Ok((book, skipped + repaired))
}

/// Writes the whole book. The selected key is removed when nothing is selected.
pub fn save_book(store: &mut dyn KeyValueStore, book: &ScheduleBook) -> PersistenceResult<()> {
    let json = serde_json::to_string(book.schedules())?;
    store.save(SCHEDULES_KEY, &json)?;
    match book.selected_id() {
        Some(id) => store.save(SELECTED_SCHEDULE_KEY, id)?,
        None => store.remove(SELECTED_SCHEDULE_KEY)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodDraft;

    #[test]
    fn empty_store_loads_empty_book() {
        let store = MemoryStore::new();
        let book = load_book(&store).unwrap();
        assert!(book.is_empty());
        assert_eq!(book.selected_id(), None);
    }

    #[test]
    fn book_round_trips_through_memory_store() {
        let mut book = ScheduleBook::new();
        book.add_schedule("Fall").unwrap();
        book.add_period(&PeriodDraft::new("Math", "08:00", "09:00").with_agenda("Ch. 3"))
            .unwrap();

        let mut store = MemoryStore::new();
        save_book(&mut store, &book).unwrap();
        let loaded = load_book(&store).unwrap();
        assert_eq!(loaded, book);
    }

    #[test]
    fn clearing_selection_removes_the_key() {
        let mut book = ScheduleBook::new();
        let id = book.add_schedule("Fall").unwrap().id.clone();
        let mut store = MemoryStore::new();
        save_book(&mut store, &book).unwrap();
        assert_eq!(store.load(SELECTED_SCHEDULE_KEY).unwrap(), Some(id.clone()));

        book.delete_schedule(&id).unwrap();
        save_book(&mut store, &book).unwrap();
        assert_eq!(store.load(SELECTED_SCHEDULE_KEY).unwrap(), None);
        assert_eq!(store.load(SCHEDULES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn corrupt_schedules_value_is_an_error() {
        let mut store = MemoryStore::new();
        store.save(SCHEDULES_KEY, "{not json").unwrap();
        assert!(matches!(
            load_book(&store),
            Err(PersistenceError::Serialization(_))
        ));
    }

    #[test]
    fn one_damaged_record_does_not_cost_the_others() {
        let mut store = MemoryStore::new();
        store
            .save(
                SCHEDULES_KEY,
                r#"[
                    {"id":"fall","name":"Fall","periods":[{"id":"a","name":"Art","startTime":"08:00","endTime":"09:00"}]},
                    {"id":"spring","name":"Spring","periods":[
                        {"id":"p1","name":"Math","startTime":"08:00","endTime":"09:00"},
                        {"id":"p1","name":"Band","startTime":"09:00","endTime":"10:00"}
                    ]},
                    {"id":"broken","name":"Broken","periods":[{"id":"x","name":"X","startTime":"noon","endTime":"13:00"}]}
                ]"#,
            )
            .unwrap();
        store.save(SELECTED_SCHEDULE_KEY, "broken").unwrap();

        let (book, repairs) = load_book_repaired(&store).unwrap();
        assert_eq!(repairs, 2);
        assert_eq!(book.len(), 2);
        assert_eq!(book.find("fall").unwrap().periods[0].name, "Art");
        let spring = book.find("spring").unwrap();
        assert_eq!(spring.periods.len(), 2);
        assert_ne!(spring.periods[0].id, spring.periods[1].id);
        assert_eq!(book.selected_id(), Some("fall"));
    }

    #[test]
    fn stored_documents_use_the_shared_shape() {
        let mut store = MemoryStore::new();
        store
            .save(
                SCHEDULES_KEY,
                r#"[{"id":"s1","name":"Legacy","periods":[{"id":"p1","name":"Math","startTime":"08:00","endTime":"09:00"}]}]"#,
            )
            .unwrap();
        store.save(SELECTED_SCHEDULE_KEY, "s1").unwrap();
        let book = load_book(&store).unwrap();
        assert_eq!(book.selected().unwrap().name, "Legacy");
        assert_eq!(book.selected().unwrap().periods[0].end_time.to_string(), "09:00");
    }
}
