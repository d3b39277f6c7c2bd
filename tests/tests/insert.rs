//! Find-or-create by identifying fields.

use pretty_assertions::assert_eq;
use relstore_tests::prelude::*;
use serde_json::json;

#[test]
fn test_insert_is_idempotent_and_overwrites() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let first = session
        .insert("Partner", &data! { "id" => 7i64, "name" => "Ann" })
        .unwrap();

    // WHEN
    let second = session
        .insert("Partner", &data! { "id" => 7i64, "name" => "Annie" })
        .unwrap();

    // THEN
    assert_eq!(first, second);
    assert_eq!(first, LocalId::new("Partner", 7));
    assert_eq!(session.attr(&first, "name").unwrap(), Value::from("Annie"));
    assert_eq!(session.all("Partner").unwrap().len(), 1);
}

#[test]
fn test_create_rejects_existing_identity() {
    let mut session = Session::new(fixtures::mail().unwrap());
    session.create("Partner", &data! { "id" => 7i64 }).unwrap();

    let result = session.create("Partner", &data! { "id" => 7i64 });

    assert!(matches!(
        result,
        Err(SessionError::MutationError(
            relstore_session::MutationError::DuplicateRecord(_)
        ))
    ));
}

#[test]
fn test_insert_and_replace_reuses_and_creates() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let ann = session
        .create("Partner", &data! { "id" => 1i64, "name" => "Ann" })
        .unwrap();
    let t = session.create("Thread", &data! { "id" => 1i64 }).unwrap();
    session.set(&t, "followers", link(&ann)).unwrap();

    // WHEN
    session
        .set(
            &t,
            "followers",
            insert_and_replace(vec![
                data! { "id" => 2i64, "name" => "Bob" },
                data! { "id" => 1i64, "name" => "Ann B." },
            ]),
        )
        .unwrap();

    // THEN
    let bob = LocalId::new("Partner", 2);
    assert_eq!(session.many(&t, "followers").unwrap(), vec![bob.clone(), ann.clone()]);
    assert_eq!(session.attr(&ann, "name").unwrap(), Value::from("Ann B."));
    assert_eq!(session.many(&bob, "followed_threads").unwrap(), vec![t.clone()]);
    check_consistency(&session).unwrap();
}

#[test]
fn test_insert_command_links_existing_record() {
    let mut session = Session::new(fixtures::mail().unwrap());
    let m = session.create("Message", &data! { "id" => 1i64 }).unwrap();
    session
        .create("Attachment", &data! { "id" => 3i64, "filename" => "a.txt" })
        .unwrap();

    session
        .set(&m, "attachments", insert(data! { "id" => 3i64 }))
        .unwrap();

    assert_eq!(
        session.many(&m, "attachments").unwrap(),
        vec![LocalId::new("Attachment", 3)]
    );
    assert_eq!(session.all("Attachment").unwrap().len(), 1);
}

#[test]
fn test_find_from_data() {
    let mut session = Session::new(fixtures::mail().unwrap());
    let ann = session.create("Partner", &data! { "id" => 1i64 }).unwrap();

    assert_eq!(
        session
            .find_from_data("Partner", &data! { "id" => 1i64, "name" => "x" })
            .unwrap(),
        Some(ann)
    );
    assert_eq!(
        session.find_from_data("Partner", &data! { "name" => "x" }).unwrap(),
        None
    );
    assert_eq!(
        session.find_from_data("Composer", &data! {}).unwrap(),
        None
    );
}

#[test]
fn test_insert_many_in_one_batch() {
    let mut session = Session::new(fixtures::mail().unwrap());
    let before = session.revision();

    let ids = session
        .insert_many(
            "Attachment",
            &[
                data! { "id" => 1i64 },
                data! { "id" => 2i64 },
                data! { "id" => 1i64, "filename" => "again" },
            ],
        )
        .unwrap();

    assert_eq!(ids[0], ids[2]);
    assert_eq!(session.all("Attachment").unwrap().len(), 2);
    assert_eq!(session.revision(), before + 1);
}

#[test]
fn test_server_payload_is_ingested() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let payload = json!({
        "id": 10,
        "body": "hello",
        "author": { "id": 2, "name": "Bob" },
        "attachments": [
            { "id": 1, "filename": "a.txt" },
            { "id": 2, "filename": "b.txt" }
        ]
    });

    // WHEN
    let data = Data::from_json(&payload).unwrap();
    let m = session.insert("Message", &data).unwrap();

    // THEN
    assert_eq!(m, LocalId::new("Message", 10));
    let bob = LocalId::new("Partner", 2);
    assert_eq!(session.one(&m, "author").unwrap(), Some(bob.clone()));
    assert_eq!(session.attr(&m, "author_name").unwrap(), Value::from("Bob"));
    assert_eq!(
        session.many(&m, "attachments").unwrap(),
        vec![LocalId::new("Attachment", 1), LocalId::new("Attachment", 2)]
    );
    assert_eq!(session.attr(&m, "is_empty").unwrap(), Value::Bool(false));
    check_consistency(&session).unwrap();
}

#[test]
fn test_records_without_identity_never_match_an_identity() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let anonymous = session
        .create("Partner", &data! { "name" => "anonymous" })
        .unwrap();

    // WHEN
    let real = session
        .insert("Partner", &data! { "id" => 1i64, "name" => "Real" })
        .unwrap();
    let created: Vec<_> = (2..=3i64)
        .map(|id| session.create("Partner", &data! { "id" => id }))
        .collect();

    // THEN
    assert_ne!(anonymous, real);
    assert!(created.iter().all(Result::is_ok));
    assert_eq!(
        session.attr(&anonymous, "name").unwrap(),
        Value::from("anonymous")
    );
    assert_eq!(session.attr(&real, "name").unwrap(), Value::from("Real"));
    assert_eq!(session.all("Partner").unwrap().len(), 4);
}

fn tagged() -> relstore_registry::RegistryResult<relstore_registry::Registry> {
    use relstore_registry::{FieldDef, RegistryBuilder};

    let mut builder = RegistryBuilder::new();
    builder
        .add_model("Tag")
        .field(FieldDef::attr("scope"))
        .field(FieldDef::attr("name"))
        .field(FieldDef::attr("color"))
        .identified_by(&["scope", "name"])
        .done()?;
    builder.build()
}

#[test]
fn test_multi_field_identity_keeps_values_apart() {
    // GIVEN
    let mut session = Session::new(tagged().unwrap());

    // WHEN
    let left = session
        .insert("Tag", &data! { "scope" => "a_b", "name" => "c", "color" => "red" })
        .unwrap();
    let right = session
        .insert("Tag", &data! { "scope" => "a", "name" => "b_c", "color" => "blue" })
        .unwrap();
    let again = session
        .insert("Tag", &data! { "scope" => "a_b", "name" => "c" })
        .unwrap();

    // THEN
    assert_ne!(left, right);
    assert_eq!(again, left);
    assert_eq!(session.attr(&left, "color").unwrap(), Value::from("red"));
    assert_eq!(session.attr(&right, "color").unwrap(), Value::from("blue"));
}

#[test]
fn test_identifying_value_is_fixed_once_set() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let partner = session
        .create("Partner", &data! { "id" => 7i64, "name" => "Ann" })
        .unwrap();

    // WHEN
    let result = session.update(&partner, &data! { "id" => 8i64 });

    // THEN
    assert!(matches!(
        result,
        Err(SessionError::MutationError(
            relstore_session::MutationError::IdentityChange { .. }
        ))
    ));
    assert_eq!(session.attr(&partner, "id").unwrap(), Value::Int(7));
    let found = session
        .insert("Partner", &data! { "id" => 7i64, "name" => "Annie" })
        .unwrap();
    assert_eq!(found, partner);
    assert_eq!(session.all("Partner").unwrap().len(), 1);
}
