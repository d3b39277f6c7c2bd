//! `replace` applies the minimal difference and preserves the given order.

use pretty_assertions::assert_eq;
use relstore_tests::prelude::*;

fn message(id: i64) -> LocalId {
    LocalId::new("Message", id)
}

fn attachment(id: i64) -> LocalId {
    LocalId::new("Attachment", id)
}

fn attachments(ids: &[i64]) -> Vec<LocalId> {
    ids.iter().map(|id| attachment(*id)).collect()
}

fn seed(s: &mut Session) -> SessionResult<()> {
    s.create("Message", &data! { "id" => 1i64 })?;
    for id in 1..=4i64 {
        s.create("Attachment", &data! { "id" => id })?;
    }
    Ok(())
}

mod minimal_diff {
    use super::*;
    use pretty_assertions::assert_eq;

    pub fn scenario() -> Scenario {
        Scenario::new("minimal_diff", fixtures::mail)
            .step("seed", seed, |a| a.created(5))
            .step(
                "replace_initial",
                |s| {
                    s.set(&message(1), "attachments", replace(attachments(&[1, 2, 3])))
                        .map(|_| ())
                },
                |a| a.linked(3).unlinked(0),
            )
            .step(
                "replace_overlapping",
                |s| {
                    s.set(&message(1), "attachments", replace(attachments(&[2, 3, 4])))
                        .map(|_| ())
                },
                |a| {
                    a.linked(1).unlinked(1).assert_fn(|events| {
                        events.iter().any(|e| {
                            matches!(e, MutationEvent::Linked { target, mirrored: false, .. }
                                if *target == attachment(4))
                        }) && events.iter().any(|e| {
                            matches!(e, MutationEvent::Unlinked { target, mirrored: false, .. }
                                if *target == attachment(1))
                        })
                    })
                },
            )
            .step(
                "replace_reorder_only",
                |s| {
                    s.set(&message(1), "attachments", replace(attachments(&[4, 2, 3])))
                        .map(|_| ())
                },
                |a| a.linked(0).unlinked(0).mirrored(0).reordered(1),
            )
            .step(
                "replace_same_order",
                |s| {
                    s.set(&message(1), "attachments", replace(attachments(&[4, 2, 3])))
                        .map(|_| ())
                },
                |a| a.linked(0).unlinked(0).reordered(0),
            )
    }

    #[test]
    fn test_replace_applies_minimal_difference() {
        let mut session = scenario().run().unwrap();

        assert_eq!(
            session.many(&message(1), "attachments").unwrap(),
            attachments(&[4, 2, 3])
        );
        assert!(session.many(&attachment(1), "messages").unwrap().is_empty());
        assert_eq!(
            session.many(&attachment(4), "messages").unwrap(),
            vec![message(1)]
        );
    }
}

#[test]
fn test_reorder_only_keeps_requested_order() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    seed(&mut session).unwrap();
    session
        .set(&message(1), "attachments", replace(attachments(&[1, 2, 3])))
        .unwrap();
    session.take_events();

    // WHEN
    let changed = session
        .set(&message(1), "attachments", replace(attachments(&[3, 1, 2])))
        .unwrap();

    // THEN
    assert!(changed);
    assert_eq!(
        session.many(&message(1), "attachments").unwrap(),
        attachments(&[3, 1, 2])
    );
    let relinks = session
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, MutationEvent::Linked { .. } | MutationEvent::Unlinked { .. }))
        .count();
    assert_eq!(relinks, 0);
}

#[test]
fn test_duplicate_targets_collapse_to_first_occurrence() {
    let mut session = Session::new(fixtures::mail().unwrap());
    seed(&mut session).unwrap();

    session
        .set(
            &message(1),
            "attachments",
            replace(attachments(&[2, 1, 2, 1])),
        )
        .unwrap();

    assert_eq!(
        session.many(&message(1), "attachments").unwrap(),
        attachments(&[2, 1])
    );
    check_consistency(&session).unwrap();
}

#[test]
fn test_replace_on_x2one_behaves_as_link() {
    // GIVEN
    let mut session = Session::new(fixtures::mail().unwrap());
    let ann = session.create("Partner", &data! { "id" => 1i64 }).unwrap();
    let bob = session.create("Partner", &data! { "id" => 2i64 }).unwrap();
    let m = session
        .create("Message", &data! { "id" => 1i64, "author" => link(&ann) })
        .unwrap();

    // WHEN
    session.set(&m, "author", replace(&bob)).unwrap();

    // THEN
    assert_eq!(session.one(&m, "author").unwrap(), Some(bob.clone()));
    assert!(session
        .many(&ann, "_inverse_Message_author")
        .unwrap()
        .is_empty());
    assert_eq!(
        session.many(&bob, "_inverse_Message_author").unwrap(),
        vec![m.clone()]
    );

    // WHEN
    session.set(&m, "author", replace(Vec::<LocalId>::new())).unwrap();

    // THEN
    assert_eq!(session.one(&m, "author").unwrap(), None);
    check_consistency(&session).unwrap();
}

#[test]
fn test_replace_with_unknown_target_changes_nothing() {
    let mut session = Session::new(fixtures::mail().unwrap());
    seed(&mut session).unwrap();
    session
        .set(&message(1), "attachments", replace(attachments(&[1])))
        .unwrap();

    let result = session.set(
        &message(1),
        "attachments",
        replace(vec![attachment(2), attachment(99)]),
    );

    assert!(result.is_err());
    assert_eq!(
        session.many(&message(1), "attachments").unwrap(),
        attachments(&[1])
    );
}
