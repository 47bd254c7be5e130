use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc, Document, Regex};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::PersonStore;
use crate::configuration::DatabaseConfiguration;
use crate::structs::person::{today, Person, PersonFields};

pub const PERSONS_COLLECTION: &str = "persons";

#[derive(Debug, Error)]
pub enum MongoStoreError {
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("bson serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),
}

/// A person as stored in the `persons` collection.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
struct PersonDocument {
    #[serde(rename(serialize = "_id", deserialize = "_id"))]
    id: bson::Uuid,
    #[serde(flatten)]
    fields: PersonFields,
    created_at: NaiveDate,
    updated_at: NaiveDate,
    /// Insertion order among records sharing a `created_at` date.
    inserted: ObjectId,
}

impl From<PersonDocument> for Person {
    fn from(document: PersonDocument) -> Self {
        Person {
            id: document.id.to_uuid_1(),
            fields: document.fields,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// `$max` keeps `updated_at` from moving backwards, so it never drops
/// below `created_at`. ISO dates compare correctly as strings.
fn update_document(fields: &PersonFields, today: NaiveDate) -> Result<Document, MongoStoreError> {
    Ok(doc! {
        "$set": bson::to_document(fields)?,
        "$max": { "updated_at": bson::to_bson(&today)? },
    })
}

fn by_id(id: Uuid) -> Document {
    doc! { "_id": bson::Uuid::from_uuid_1(id) }
}

/// Case-insensitive literal match on any of the three name fields.
fn name_filter(term: &str) -> Document {
    let pattern = Regex {
        pattern: regex::escape(term),
        options: String::from("i"),
    };

    doc! {
        "$or": [
            { "first_name": pattern.clone() },
            { "middle_name": pattern.clone() },
            { "last_name": pattern },
        ]
    }
}

#[derive(Clone)]
pub struct MongoStore {
    persons: Collection<PersonDocument>,
}

impl MongoStore {
    pub fn new(database: &Database) -> Self {
        MongoStore {
            persons: database.collection(PERSONS_COLLECTION),
        }
    }
}

pub async fn get_database_connection(
    database_config: &DatabaseConfiguration,
) -> Result<Database, mongodb::error::Error> {
    let client_options = ClientOptions::parse(database_config.connection_string()).await?;
    let client = Client::with_options(client_options)?;
    Ok(client.database(&database_config.database_name))
}

impl PersonStore for MongoStore {
    type Error = MongoStoreError;

    async fn list(&self) -> Result<Vec<Person>, MongoStoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "inserted": -1 })
            .build();
        let cursor = self.persons.find(None, options).await?;
        let documents: Vec<PersonDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Person::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Person>, MongoStoreError> {
        let document = self.persons.find_one(by_id(id), None).await?;
        Ok(document.map(Person::from))
    }

    async fn insert(&self, fields: PersonFields) -> Result<Person, MongoStoreError> {
        let now = today();
        let document = PersonDocument {
            id: bson::Uuid::from_uuid_1(Uuid::new_v4()),
            fields,
            created_at: now,
            updated_at: now,
            inserted: ObjectId::new(),
        };

        self.persons.insert_one(&document, None).await?;
        Ok(document.into())
    }

    async fn update(
        &self,
        id: Uuid,
        fields: PersonFields,
    ) -> Result<Option<Person>, MongoStoreError> {
        let update = update_document(&fields, today())?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let document = self
            .persons
            .find_one_and_update(by_id(id), update, options)
            .await?;
        Ok(document.map(Person::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, MongoStoreError> {
        let result = self.persons.delete_one(by_id(id), None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn search<'a>(&'a self, term: &'a str) -> Result<Vec<Person>, MongoStoreError> {
        let cursor = self.persons.find(name_filter(term), None).await?;
        let documents: Vec<PersonDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Person::from).collect())
    }
}
