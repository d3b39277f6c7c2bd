//! Schemas shared by the integration tests.

use relstore_core::{create, Data, FieldInput, Value};
use relstore_registry::{FieldDef, Registry, RegistryBuilder, RegistryResult};

/// A small messaging schema.
///
/// - `Partner`: identified by `id`, follows threads.
/// - `Thread`: identified by `id`, owns its messages and its composer
///   (both causal) and counts its messages.
/// - `Message`: identified by `id`, has an author without declared inverse,
///   attachments, and fields related to its author and thread.
/// - `Attachment`: identified by `id`, shared between messages.
/// - `Composer`: created with every thread.
pub fn mail() -> RegistryResult<Registry> {
    let mut builder = RegistryBuilder::new();
    builder
        .add_model("Partner")
        .field(FieldDef::attr("id"))
        .field(FieldDef::attr("name"))
        .field(FieldDef::many2many("followed_threads", "Thread").inverse("followers"))
        .identified_by(&["id"])
        .done()?;
    builder
        .add_model("Thread")
        .field(FieldDef::attr("id"))
        .field(FieldDef::attr("name").default("New thread"))
        .field(
            FieldDef::one2many("messages", "Message")
                .inverse("thread")
                .causal(),
        )
        .field(FieldDef::many2many("followers", "Partner").inverse("followed_threads"))
        .field(
            FieldDef::one2one("composer", "Composer")
                .inverse("thread")
                .causal()
                .default_command(create(Data::new())),
        )
        .field(FieldDef::attr("message_count").compute(&["messages"], |view| {
            FieldInput::from(view.many("messages").len() as i64)
        }))
        .field(FieldDef::attr("follower_names").related("followers.name"))
        .identified_by(&["id"])
        .done()?;
    builder
        .add_model("Message")
        .field(FieldDef::attr("id"))
        .field(FieldDef::attr("body").default(""))
        .field(FieldDef::many2one("thread", "Thread").inverse("messages"))
        .field(FieldDef::many2one("author", "Partner"))
        .field(FieldDef::many2many("attachments", "Attachment").inverse("messages"))
        .field(FieldDef::attr("author_name").related("author.name"))
        .field(FieldDef::attr("thread_name").related("thread.name"))
        .field(FieldDef::many2many("thread_followers", "Partner").related("thread.followers"))
        .field(FieldDef::attr("is_empty").compute(&["body", "attachments"], |view| {
            let body_empty = view.attr("body").as_str().map_or(true, str::is_empty);
            FieldInput::from(body_empty && view.many("attachments").is_empty())
        }))
        .identified_by(&["id"])
        .done()?;
    builder
        .add_model("Attachment")
        .field(FieldDef::attr("id"))
        .field(FieldDef::attr("filename"))
        .field(FieldDef::many2many("messages", "Message").inverse("attachments"))
        .identified_by(&["id"])
        .done()?;
    builder
        .add_model("Composer")
        .field(FieldDef::attr("text").default(Value::from("")))
        .field(FieldDef::one2one("thread", "Thread").inverse("composer"))
        .done()?;
    builder.build()
}

/// Three models chained by causal relations: `A` and `B` own each other
/// through a one2one, `B` owns many `C`.
pub fn chain() -> RegistryResult<Registry> {
    let mut builder = RegistryBuilder::new();
    builder
        .add_model("A")
        .field(FieldDef::one2one("b", "B").inverse("a").causal())
        .done()?;
    builder
        .add_model("B")
        .field(FieldDef::one2one("a", "A").inverse("b").causal())
        .field(FieldDef::one2many("cs", "C").inverse("b").causal())
        .done()?;
    builder
        .add_model("C")
        .field(FieldDef::many2one("b", "B").inverse("cs"))
        .done()?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_build() {
        assert!(mail().is_ok());
        assert!(chain().is_ok());
    }

    #[test]
    fn test_missing_inverse_is_generated() {
        let registry = mail().unwrap();
        let partner = registry.get_model_by_name("Partner").unwrap();

        assert!(partner.field_by_name("_inverse_Message_author").is_some());
    }
}
