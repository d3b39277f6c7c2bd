//! Causal fields delete what they stop referencing.

use pretty_assertions::assert_eq;
use relstore_tests::prelude::*;

fn message(id: i64) -> LocalId {
    LocalId::new("Message", id)
}

mod thread_lifecycle {
    use super::*;
    use pretty_assertions::assert_eq;

    fn thread() -> LocalId {
        LocalId::new("Thread", 1)
    }

    pub fn scenario() -> Scenario {
        Scenario::new("thread_lifecycle", fixtures::mail)
            .step(
                "create_thread_with_messages",
                |s| {
                    s.create("Thread", &data! { "id" => 1i64 })?;
                    for id in 1..=3i64 {
                        s.create("Message", &data! { "id" => id, "thread" => link(thread()) })?;
                    }
                    s.create("Attachment", &data! { "id" => 1i64 })?;
                    s.set(&message(1), "attachments", link(LocalId::new("Attachment", 1)))?;
                    Ok(())
                },
                |a| a.created(6),
            )
            .step(
                "unlink_one_message",
                |s| s.set(&thread(), "messages", unlink(message(3))).map(|_| ()),
                |a| a.unlinked(1).deleted(1),
            )
            .step(
                "delete_thread",
                |s| s.delete(&thread()).map(|_| ()),
                |a| a.deleted(4),
            )
    }

    #[test]
    fn test_deleting_a_thread_deletes_what_it_owns() {
        let session = scenario().run().unwrap();

        assert!(session.all("Thread").unwrap().is_empty());
        assert!(session.all("Message").unwrap().is_empty());
        assert!(session.all("Composer").unwrap().is_empty());
        assert_eq!(
            session.all("Attachment").unwrap(),
            vec![LocalId::new("Attachment", 1)]
        );
    }
}

#[test]
fn test_unlink_all_deletes_every_message() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = session.create("Thread", &data! { "id" => 1i64 }).unwrap();
    for id in 1..=2i64 {
        session
            .create("Message", &data! { "id" => id, "thread" => link(&t) })
            .unwrap();
    }

    // WHEN
    session.set(&t, "messages", unlink_all()).unwrap();

    // THEN
    assert!(session.all("Message").unwrap().is_empty());
    assert_eq!(session.attr(&t, "message_count").unwrap(), Value::Int(0));
}

#[test]
fn test_unlinking_from_the_non_causal_side_keeps_the_record() {
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = session.create("Thread", &data! { "id" => 1i64 }).unwrap();
    let m = session
        .create("Message", &data! { "id" => 1i64, "thread" => link(&t) })
        .unwrap();

    session.set(&m, "thread", unlink_all()).unwrap();

    assert!(session.exists(&m));
    assert!(session.many(&t, "messages").unwrap().is_empty());
}

#[test]
fn test_mutually_causal_chain_is_deleted_once() {
    // GIVEN
    let mut session = Session::new(fixtures::chain().unwrap());
    let a = session.create("A", &data! {}).unwrap();
    let b = session.create("B", &data! { "a" => link(&a) }).unwrap();
    let cs = session
        .create_many("C", &[data! { "b" => link(&b) }, data! { "b" => link(&b) }])
        .unwrap();
    session.take_events();

    // WHEN
    session.delete(&a).unwrap();

    // THEN
    let deleted: Vec<LocalId> = session
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            MutationEvent::Deleted { record } => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(deleted.len(), 4);
    assert!(!session.exists(&b));
    assert!(cs.iter().all(|c| !session.exists(c)));
    check_consistency(&session).unwrap();
}

#[test]
fn test_compute_on_deleted_record_fails_without_side_effects() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = session.create("Thread", &data! { "id" => 1i64 }).unwrap();
    let other = session.create("Thread", &data! { "id" => 2i64 }).unwrap();
    session.delete(&t).unwrap();

    // WHEN
    let err = session.compute(&t, "message_count").unwrap_err();

    // THEN
    assert!(err.is_record_deleted());
    assert_eq!(session.attr(&other, "message_count").unwrap(), Value::Int(0));
    session
        .create("Message", &data! { "id" => 1i64, "thread" => link(&other) })
        .unwrap();
    assert_eq!(session.attr(&other, "message_count").unwrap(), Value::Int(1));
}

#[test]
fn test_linking_a_deleted_record_is_rejected() {
    let mut session = Session::new(fixtures::mail().unwrap());
    let t = session.create("Thread", &data! { "id" => 1i64 }).unwrap();
    session.delete(&t).unwrap();

    let result = session.create("Message", &data! { "id" => 1i64, "thread" => link(&t) });

    assert!(result.is_err());
}

#[test]
fn test_delete_all_empties_the_store() {
    let mut session = Session::new(fixtures::mail().unwrap());
    session.create("Thread", &data! { "id" => 1i64 }).unwrap();
    session
        .create("Message", &data! { "id" => 1i64, "thread" => link(LocalId::new("Thread", 1)) })
        .unwrap();

    session.delete_all().unwrap();

    for model in ["Thread", "Message", "Composer", "Partner"] {
        assert!(session.all(model).unwrap().is_empty());
    }
}
