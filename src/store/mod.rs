//! The [`PersonStore`] trait and its backends.
//!
//! Handlers only see the trait. The store owns identity and timestamps:
//! `insert` assigns `id`, `created_at` and `updated_at`; `update` refreshes
//! `updated_at` and never touches `created_at`.

use std::future::Future;

use uuid::Uuid;

use crate::structs::person::{Person, PersonFields};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::{MongoStore, MongoStoreError};

pub trait PersonStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All records, newest `created_at` first.
    fn list(&self) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

    fn get(&self, id: Uuid) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

    fn insert(
        &self,
        fields: PersonFields,
    ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

    /// Replace the writable fields of `id` in a single write. Returns `None`
    /// if no such record exists.
    fn update(
        &self,
        id: Uuid,
        fields: PersonFields,
    ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

    /// Returns `false` if no such record exists.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

    /// Case-insensitive substring match on first, middle or last name.
    /// `term` is literal text, never a pattern.
    fn search<'a>(
        &'a self,
        term: &'a str,
    ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;
}
