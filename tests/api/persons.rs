use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use reqwest::header::LOCATION;
use reqwest::StatusCode;
use serde_json::{json, Value};

use person_registry::store::MemoryStore;
use person_registry::structs::api::PersonBody;

use crate::helpers::{ada, alan, spawn_app, spawn_app_with_store};

#[tokio::test]
async fn create_returns_the_stored_person() {
    let app = spawn_app().await;

    let response = app.create_person(&ada()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(LOCATION)
        .expect("header not found")
        .to_str()
        .expect("not ASCII value")
        .to_owned();
    let person = response.json::<PersonBody>().await.unwrap();
    assert_eq!(location, format!("/persons/{}/", person.id));
    assert_eq!(person.full_name, "Ada Lovelace");
    assert_eq!(person.first_name, "Ada");
    assert_eq!(person.middle_name, None);
    assert_eq!(person.birth_date, NaiveDate::from_ymd_opt(1815, 12, 10).unwrap());
    assert_eq!(person.height_in_cm, 160);
    assert_eq!(person.weight_in_kg, 55.0);
    assert_eq!(person.created_at, person.updated_at);
    assert_eq!(person.created_at, chrono::Utc::now().date_naive());
}

#[tokio::test]
async fn full_name_includes_the_middle_name() {
    let app = spawn_app().await;

    let person = app.created(&alan()).await;

    assert_eq!(person["full_name"], "Alan Mathison Turing");
}

#[tokio::test]
async fn create_ignores_server_owned_and_unknown_fields() {
    let app = spawn_app().await;
    let mut body = ada();
    body["id"] = json!("00000000-0000-0000-0000-000000000000");
    body["created_at"] = json!("1900-01-01");
    body["full_name"] = json!("Countess of Lovelace");
    body["favourite_engine"] = json!("analytical");

    let person = app.created(&body).await;

    assert_ne!(person["id"], "00000000-0000-0000-0000-000000000000");
    assert_ne!(person["created_at"], "1900-01-01");
    assert_eq!(person["full_name"], "Ada Lovelace");
    assert!(person.get("favourite_engine").is_none());
}

#[tokio::test]
async fn create_reports_every_invalid_field() {
    let app = spawn_app().await;

    let response = app
        .create_person(&json!({
            "first_name": "Ada",
            "gender": "X",
            "height_in_cm": "tall",
            "weight_in_kg": 55.0
        }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = response.json::<Value>().await.unwrap();
    assert_eq!(errors["last_name"], json!(["This field is required."]));
    assert_eq!(errors["birth_date"], json!(["This field is required."]));
    assert_eq!(errors["gender"], json!(["\"X\" is not a valid choice."]));
    assert_eq!(errors["height_in_cm"], json!(["A valid integer is required."]));
    assert!(errors.get("first_name").is_none());
    assert!(errors.get("weight_in_kg").is_none());
}

#[tokio::test]
async fn create_rejects_names_over_one_hundred_characters() {
    let app = spawn_app().await;
    let mut body = ada();
    body["middle_name"] = json!("m".repeat(101));

    let response = app.create_person(&body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = response.json::<Value>().await.unwrap();
    assert_eq!(
        errors["middle_name"],
        json!(["Ensure this field has no more than 100 characters."])
    );
}

#[tokio::test]
async fn create_rejects_non_positive_measurements() {
    let app = spawn_app().await;
    let mut body = ada();
    body["height_in_cm"] = json!(0);
    body["weight_in_kg"] = json!(-1.5);

    let response = app.create_person(&body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = response.json::<Value>().await.unwrap();
    assert_eq!(
        errors["height_in_cm"],
        json!(["Ensure this value is greater than or equal to 1."])
    );
    assert_eq!(
        errors["weight_in_kg"],
        json!(["Ensure this value is greater than 0."])
    );
}

#[tokio::test]
async fn list_returns_newest_first() {
    let offset = Arc::new(AtomicI64::new(0));
    let clock_offset = offset.clone();
    let store = MemoryStore::with_clock(move || {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            + Days::new(clock_offset.load(Ordering::SeqCst) as u64)
    });
    let app = spawn_app_with_store(store).await;

    let older = app.created(&ada()).await;
    offset.store(2, Ordering::SeqCst);
    let newer = app.created(&alan()).await;

    let response = app
        .client
        .get(app.url("/persons/"))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    let persons = response.json::<Vec<Value>>().await.unwrap();
    assert_eq!(persons.len(), 2);
    assert_eq!(persons[0]["id"], newer["id"]);
    assert_eq!(persons[1]["id"], older["id"]);
    assert_eq!(persons[0]["created_at"], "2024-03-03");
}

#[tokio::test]
async fn list_on_empty_store_is_empty() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/persons/"))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Vec<Value>>().await.unwrap(), Vec::<Value>::new());
}

#[tokio::test]
async fn retrieve_returns_the_person() {
    let app = spawn_app().await;
    let created = app.created(&ada()).await;

    let response = app.get_person(created["id"].as_str().unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap(), created);
}

#[tokio::test]
async fn retrieve_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let response = app.get_person("e50408fa-e368-4ccd-9ade-851fdb553e0f").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_update_replaces_writable_fields() {
    let app = spawn_app().await;
    let created = app.created(&ada()).await;
    let id = created["id"].as_str().unwrap();
    let mut body = ada();
    body["middle_name"] = json!("Augusta");
    body["last_name"] = json!("King");
    body["weight_in_kg"] = json!(57.25);

    let response = app
        .client
        .put(app.url(&format!("/persons/{id}/")))
        .json(&body)
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<Value>().await.unwrap();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["full_name"], "Ada Augusta King");
    assert_eq!(updated["weight_in_kg"], 57.25);
    assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn full_update_without_middle_name_keeps_the_stored_one() {
    let app = spawn_app().await;
    let mut body = ada();
    body["middle_name"] = json!("Augusta");
    let created = app.created(&body).await;
    let id = created["id"].as_str().unwrap();
    body.as_object_mut().unwrap().remove("middle_name");
    body["last_name"] = json!("King");

    let response = app
        .client
        .put(app.url(&format!("/persons/{id}/")))
        .json(&body)
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<Value>().await.unwrap();
    assert_eq!(updated["middle_name"], "Augusta");
    assert_eq!(updated["full_name"], "Ada Augusta King");
}

#[tokio::test]
async fn full_update_with_null_middle_name_clears_it() {
    let app = spawn_app().await;
    let mut body = ada();
    body["middle_name"] = json!("Augusta");
    let created = app.created(&body).await;
    let id = created["id"].as_str().unwrap();
    body["middle_name"] = Value::Null;

    let response = app
        .client
        .put(app.url(&format!("/persons/{id}/")))
        .json(&body)
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<Value>().await.unwrap();
    assert_eq!(updated["middle_name"], Value::Null);
    assert_eq!(updated["full_name"], "Ada Lovelace");
}

#[tokio::test]
async fn full_update_with_a_missing_field_leaves_the_record_alone() {
    let app = spawn_app().await;
    let created = app.created(&ada()).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/persons/{id}/")))
        .json(&json!({ "first_name": "Augusta" }))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = response.json::<Value>().await.unwrap();
    assert_eq!(errors["last_name"], json!(["This field is required."]));

    let stored = app.get_person(id).await.json::<Value>().await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn full_update_of_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .put(app.url("/persons/e50408fa-e368-4ccd-9ade-851fdb553e0f/"))
        .json(&ada())
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_changes_only_supplied_fields() {
    let offset = Arc::new(AtomicI64::new(0));
    let clock_offset = offset.clone();
    let store = MemoryStore::with_clock(move || {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            + Days::new(clock_offset.load(Ordering::SeqCst) as u64)
    });
    let app = spawn_app_with_store(store).await;
    let created = app.created(&alan()).await;
    let id = created["id"].as_str().unwrap();

    offset.store(1, Ordering::SeqCst);
    let response = app
        .client
        .patch(app.url(&format!("/persons/{id}/")))
        .json(&json!({ "weight_in_kg": 72 }))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<Value>().await.unwrap();
    assert_eq!(updated["weight_in_kg"], 72.0);
    for field in [
        "id",
        "first_name",
        "middle_name",
        "last_name",
        "birth_date",
        "gender",
        "height_in_cm",
        "full_name",
        "created_at",
    ] {
        assert_eq!(updated[field], created[field], "{field} changed");
    }
    assert_eq!(created["updated_at"], "2024-03-01");
    assert_eq!(updated["updated_at"], "2024-03-02");
}

#[tokio::test]
async fn partial_update_rejects_an_invalid_field() {
    let app = spawn_app().await;
    let created = app.created(&ada()).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .client
        .patch(app.url(&format!("/persons/{id}/")))
        .json(&json!({ "gender": "Female", "last_name": "King" }))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = response.json::<Value>().await.unwrap();
    assert_eq!(errors, json!({ "gender": ["\"Female\" is not a valid choice."] }));

    let stored = app.get_person(id).await.json::<Value>().await.unwrap();
    assert_eq!(stored["last_name"], "Lovelace");
}

#[tokio::test]
async fn partial_update_of_unknown_id_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .patch(app.url("/persons/e50408fa-e368-4ccd-9ade-851fdb553e0f/"))
        .json(&json!({ "first_name": "Grace" }))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_retrieve_is_not_found() {
    let app = spawn_app().await;
    let created = app.created(&ada()).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .client
        .delete(app.url(&format!("/persons/{id}/")))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.text().await.unwrap(), "");
    assert_eq!(app.get_person(id).await.status(), StatusCode::NOT_FOUND);

    let again = app
        .client
        .delete(app.url(&format!("/persons/{id}/")))
        .send()
        .await
        .expect("failed request");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_accepts_a_number_as_a_name() {
    let app = spawn_app().await;
    let created = app.created(&ada()).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .client
        .patch(app.url(&format!("/persons/{id}/")))
        .json(&json!({ "first_name": 42 }))
        .send()
        .await
        .expect("failed request");

    assert_eq!(response.status(), StatusCode::OK);
    let updated = response.json::<Value>().await.unwrap();
    assert_eq!(updated["first_name"], "42");
    assert_eq!(updated["full_name"], "42 Lovelace");
}
