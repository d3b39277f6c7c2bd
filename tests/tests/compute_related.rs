//! Computed and related fields follow their dependencies.

use pretty_assertions::assert_eq;
use relstore_registry::{FieldDef, Registry, RegistryBuilder, RegistryResult};
use relstore_session::MutationError;
use relstore_tests::prelude::*;

fn partner(id: i64) -> LocalId {
    LocalId::new("Partner", id)
}

fn seed_thread(session: &mut Session) -> LocalId {
    session
        .create("Partner", &data! { "id" => 1i64, "name" => "Ann" })
        .unwrap();
    session
        .create("Partner", &data! { "id" => 2i64, "name" => "Bob" })
        .unwrap();
    session
        .create("Thread", &data! { "id" => 1i64, "name" => "General" })
        .unwrap()
}

#[test]
fn test_message_count_follows_messages() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = seed_thread(&mut session);
    assert_eq!(session.attr(&t, "message_count").unwrap(), Value::Int(0));

    // WHEN
    let m1 = session
        .create("Message", &data! { "id" => 1i64, "thread" => link(&t) })
        .unwrap();
    session
        .create("Message", &data! { "id" => 2i64, "thread" => link(&t) })
        .unwrap();

    // THEN
    assert_eq!(session.attr(&t, "message_count").unwrap(), Value::Int(2));

    // WHEN
    session.delete(&m1).unwrap();

    // THEN
    assert_eq!(session.attr(&t, "message_count").unwrap(), Value::Int(1));
}

#[test]
fn test_related_through_x2many_gathers_values() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = seed_thread(&mut session);

    // WHEN
    session
        .set(&t, "followers", link(vec![partner(2), partner(1)]))
        .unwrap();

    // THEN
    assert_eq!(
        session.attr(&t, "follower_names").unwrap(),
        Value::List(vec![Value::from("Bob"), Value::from("Ann")])
    );

    // WHEN
    session
        .update(&partner(2), &data! { "name" => "Robert" })
        .unwrap();

    // THEN
    assert_eq!(
        session.attr(&t, "follower_names").unwrap(),
        Value::List(vec![Value::from("Robert"), Value::from("Ann")])
    );
}

#[test]
fn test_related_through_x2one_copies_and_clears() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = seed_thread(&mut session);
    let m = session
        .create(
            "Message",
            &data! { "id" => 1i64, "thread" => link(&t), "author" => link(partner(1)) },
        )
        .unwrap();
    assert_eq!(session.attr(&m, "author_name").unwrap(), Value::from("Ann"));
    assert_eq!(session.attr(&m, "thread_name").unwrap(), Value::from("General"));

    // WHEN
    session.set(&m, "author", link(partner(2))).unwrap();
    session.update(&t, &data! { "name" => "Random" }).unwrap();

    // THEN
    assert_eq!(session.attr(&m, "author_name").unwrap(), Value::from("Bob"));
    assert_eq!(session.attr(&m, "thread_name").unwrap(), Value::from("Random"));

    // WHEN
    session.set(&m, "author", unlink_all()).unwrap();

    // THEN
    assert_eq!(session.attr(&m, "author_name").unwrap(), Value::Null);
}

#[test]
fn test_relational_related_field_mirrors_thread_followers() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = seed_thread(&mut session);
    let m = session
        .create("Message", &data! { "id" => 1i64, "thread" => link(&t) })
        .unwrap();

    // WHEN
    session.set(&t, "followers", link(partner(1))).unwrap();

    // THEN
    assert_eq!(session.many(&m, "thread_followers").unwrap(), vec![partner(1)]);

    // WHEN
    session.set(&m, "thread", unlink_all()).unwrap();

    // THEN
    assert!(session.many(&m, "thread_followers").unwrap().is_empty());
    check_consistency(&session).unwrap();
}

#[test]
fn test_compute_with_several_dependencies() {
    let mut session = Session::new(fixtures::mail().unwrap());
    let m = session.create("Message", &data! { "id" => 1i64 }).unwrap();
    assert_eq!(session.attr(&m, "is_empty").unwrap(), Value::Bool(true));

    session
        .set(&m, "attachments", create(data! { "id" => 1i64 }))
        .unwrap();
    assert_eq!(session.attr(&m, "is_empty").unwrap(), Value::Bool(false));

    session.set(&m, "attachments", unlink_all()).unwrap();
    session.update(&m, &data! { "body" => "hi" }).unwrap();
    assert_eq!(session.attr(&m, "is_empty").unwrap(), Value::Bool(false));
}

#[test]
fn test_batch_recomputes_once() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let before = session.revision();

    // WHEN
    let t = session
        .batch(|s| {
            let t = s.create("Thread", &data! { "id" => 1i64 })?;
            for id in 1..=3i64 {
                s.create("Message", &data! { "id" => id, "thread" => link(&t) })?;
            }
            assert!(s.pending_computes() > 0);
            Ok(t)
        })
        .unwrap();

    // THEN
    assert_eq!(session.revision(), before + 1);
    assert_eq!(session.pending_computes(), 0);
    assert_eq!(session.attr(&t, "message_count").unwrap(), Value::Int(3));
}

#[test]
fn test_read_inside_batch_forces_pending_compute() {
    let mut session = Session::new(fixtures::mail().unwrap());

    let count = session
        .batch(|s| {
            let t = s.create("Thread", &data! { "id" => 1i64 })?;
            s.create("Message", &data! { "id" => 1i64, "thread" => link(&t) })?;
            s.attr(&t, "message_count")
        })
        .unwrap();

    assert_eq!(count, Value::Int(1));
}

fn looping() -> RegistryResult<Registry> {
    let mut builder = RegistryBuilder::new();
    builder
        .add_model("Counter")
        .field(FieldDef::attr("a").compute(&["b"], |view| {
            FieldInput::from(view.attr("b").as_int().unwrap_or(0) + 1)
        }))
        .field(FieldDef::attr("b").compute(&["a"], |view| {
            FieldInput::from(view.attr("a").as_int().unwrap_or(0) + 1)
        }))
        .done()?;
    builder.build()
}

#[test]
fn test_compute_cycle_is_reported() {
    let mut session = Session::new(looping().unwrap());

    let result = session.create("Counter", &data! {});

    assert!(matches!(
        result,
        Err(SessionError::MutationError(MutationError::ComputeCycle { .. }))
    ));
    assert_eq!(session.pending_computes(), 0);
}

#[test]
fn test_compute_step_limit() {
    // GIVEN
    let config = SessionConfig::new().with_max_compute_steps(1);
    let mut session = Session::with_config(fixtures::mail().unwrap(), config);

    // WHEN
    let result = session.create("Partner", &data! { "id" => 1i64 });
    let limited = session.create("Message", &data! { "id" => 1i64 });

    // THEN
    assert!(result.is_ok());
    assert!(matches!(
        limited,
        Err(SessionError::MutationError(
            MutationError::ComputeLimitExceeded { limit: 1 }
        ))
    ));
}

fn latest() -> RegistryResult<Registry> {
    let mut builder = RegistryBuilder::new();
    builder
        .add_model("Thread")
        .field(FieldDef::one2many("messages", "Message").inverse("thread"))
        .field(
            FieldDef::many2one("last_message", "Message").compute(&["messages"], |view| {
                match view.many("messages").last() {
                    Some(last) => FieldInput::from(link(last)),
                    None => FieldInput::from(unlink_all()),
                }
            }),
        )
        .done()?;
    builder
        .add_model("Message")
        .field(FieldDef::attr("body"))
        .field(FieldDef::many2one("thread", "Thread").inverse("messages"))
        .done()?;
    builder.build()
}

#[test]
fn test_computed_relation_keeps_both_sides() {
    // GIVEN
    let mut session = Session::new(latest().unwrap());
    let t = session.create("Thread", &data! {}).unwrap();
    let m1 = session
        .create("Message", &data! { "thread" => link(&t) })
        .unwrap();
    let m2 = session
        .create("Message", &data! { "thread" => link(&t) })
        .unwrap();
    assert_eq!(session.one(&t, "last_message").unwrap(), Some(m2.clone()));

    // WHEN
    session.delete(&m2).unwrap();

    // THEN
    assert_eq!(session.one(&t, "last_message").unwrap(), Some(m1.clone()));
    assert_eq!(
        session.many(&m1, "_inverse_Thread_last_message").unwrap(),
        vec![t.clone()]
    );
    check_consistency(&session).unwrap();
}

fn tagged() -> RegistryResult<Registry> {
    let mut builder = RegistryBuilder::new();
    builder
        .add_model("Thread")
        .field(FieldDef::one2many("messages", "Message").inverse("thread"))
        .field(FieldDef::many2many("all_tags", "Tag").related("messages.tags"))
        .field(FieldDef::attr("bodies").related("messages.body"))
        .done()?;
    builder
        .add_model("Message")
        .field(FieldDef::attr("body"))
        .field(FieldDef::many2one("thread", "Thread").inverse("messages"))
        .field(FieldDef::many2many("tags", "Tag").inverse("messages"))
        .done()?;
    builder
        .add_model("Tag")
        .field(FieldDef::attr("label"))
        .field(FieldDef::many2many("messages", "Message").inverse("tags"))
        .done()?;
    builder.build()
}

#[test]
fn test_related_relation_flattens_x2many_targets() {
    // GIVEN
    let mut session = Session::new(tagged().unwrap());
    let tags: Vec<LocalId> = ["bug", "ui", "docs"]
        .iter()
        .map(|label| session.create("Tag", &data! { "label" => *label }).unwrap())
        .collect();
    let t = session.create("Thread", &data! {}).unwrap();
    let m1 = session
        .create(
            "Message",
            &data! { "thread" => link(&t), "tags" => link(vec![tags[0].clone(), tags[1].clone()]) },
        )
        .unwrap();
    session
        .create("Message", &data! { "thread" => link(&t), "tags" => link(&tags[2]) })
        .unwrap();

    // WHEN
    let before = session.many(&t, "all_tags").unwrap();
    session.set(&m1, "tags", unlink(&tags[0])).unwrap();

    // THEN
    assert_eq!(before, tags);
    assert_eq!(
        session.many(&t, "all_tags").unwrap(),
        vec![tags[1].clone(), tags[2].clone()]
    );
    check_consistency(&session).unwrap();
}

#[test]
fn test_related_values_over_x2many_keep_duplicates() {
    // GIVEN
    let mut session = Session::new(tagged().unwrap());
    let t = session.create("Thread", &data! {}).unwrap();

    // WHEN
    for _ in 0..2 {
        session
            .create("Message", &data! { "thread" => link(&t), "body" => "same" })
            .unwrap();
    }

    // THEN
    assert_eq!(
        session.attr(&t, "bodies").unwrap(),
        Value::List(vec![Value::from("same"), Value::from("same")])
    );
}
