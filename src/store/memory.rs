use std::convert::Infallible;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PersonStore;
use crate::structs::person::{today, Person, PersonFields};

type Clock = dyn Fn() -> NaiveDate + Send + Sync;

/// In-process store. Records are kept in insertion order, which is the
/// order `search` returns them in.
///
/// Cloning is cheap and clones share the same records.
#[derive(Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Person>>>,
    clock: Arc<Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(today)
    }

    /// Use `clock` instead of the system date for `created_at` / `updated_at`.
    pub fn with_clock(clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        MemoryStore {
            records: Arc::new(RwLock::new(Vec::new())),
            clock: Arc::new(clock),
        }
    }
}

fn matches(person: &Person, needle: &str) -> bool {
    let fields = &person.fields;
    [
        Some(fields.first_name.as_str()),
        fields.middle_name.as_deref(),
        Some(fields.last_name.as_str()),
    ]
    .into_iter()
    .flatten()
    .any(|name| name.to_lowercase().contains(needle))
}

impl PersonStore for MemoryStore {
    type Error = Infallible;

    async fn list(&self) -> Result<Vec<Person>, Infallible> {
        let records = self.records.read().await;
        // Newest insert first among equal dates; sort_by is stable.
        let mut persons = records.iter().rev().cloned().collect::<Vec<_>>();
        persons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(persons)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Person>, Infallible> {
        let records = self.records.read().await;
        Ok(records.iter().find(|person| person.id == id).cloned())
    }

    async fn insert(&self, fields: PersonFields) -> Result<Person, Infallible> {
        let now = (self.clock)();
        let person = Person {
            id: Uuid::new_v4(),
            fields,
            created_at: now,
            updated_at: now,
        };

        self.records.write().await.push(person.clone());
        Ok(person)
    }

    async fn update(&self, id: Uuid, fields: PersonFields) -> Result<Option<Person>, Infallible> {
        let now = (self.clock)();
        let mut records = self.records.write().await;

        Ok(records
            .iter_mut()
            .find(|person| person.id == id)
            .map(|person| {
                person.fields = fields;
                person.updated_at = now.max(person.updated_at);
                person.clone()
            }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, Infallible> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|person| person.id != id);
        Ok(records.len() != before)
    }

    async fn search<'a>(&'a self, term: &'a str) -> Result<Vec<Person>, Infallible> {
        let needle = term.to_lowercase();
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|person| matches(person, &needle))
            .cloned()
            .collect())
    }
}
