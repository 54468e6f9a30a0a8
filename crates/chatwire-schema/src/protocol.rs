//! # Protocol Schema Table
//!
//! The standard registry contents: every message kind, component type,
//! button style, and embedded record the platform documents.
//!
//! ## Message Header
//!
//! All message kinds share one base field list. Everything in it is
//! optional, because partial message objects (gateway updates, forwarded
//! snapshots, referenced messages) routinely omit header fields. Only the
//! `type` discriminant is mandatory. Kinds then tighten individual fields:
//! replies and thread starters require `message_reference`.
//!
//! ## Limits
//!
//! Character limits follow the platform documentation: content 4000,
//! embed title 256, embed description 4096, field name 256 and value 1024,
//! footer 2048, combined embed text 6000, select options 25.

use std::sync::Arc;

use chatwire_core::{ATTACHMENT_FLAGS, EMBED_FLAGS, MESSAGE_FLAGS, USER_FLAGS};

use crate::config::ValidatorConfig;
use crate::model::{ButtonStyle, MessageKind};
use crate::registry::{
    ComponentClass, CrossFieldRule, Family, FieldSpec, Predicate, RecordSchema, RegistryBuilder,
    RegistryError, SchemaRegistry, TypeDescriptor as T, VariantSchema,
};

/// Component `type` tags.
pub mod component_type {
    pub const ACTION_ROW: u64 = 1;
    pub const BUTTON: u64 = 2;
    pub const STRING_SELECT: u64 = 3;
    pub const TEXT_INPUT: u64 = 4;
    pub const USER_SELECT: u64 = 5;
    pub const ROLE_SELECT: u64 = 6;
    pub const MENTIONABLE_SELECT: u64 = 7;
    pub const CHANNEL_SELECT: u64 = 8;
}

/// Keys of which a button carries exactly one.
pub const BUTTON_ACTION_KEYS: &[&str] = &["custom_id", "url", "sku_id"];

/// Combined character budget for an embed's text fields.
pub const EMBED_TOTAL_TEXT_LIMIT: usize = 6000;

const EMBED_TEXT_PATHS: &[&str] = &[
    "title",
    "description",
    "footer.text",
    "author.name",
    "fields[].name",
    "fields[].value",
];

/// Max options, default values, and selectable values for select menus.
const SELECT_MAX: i64 = 25;

/// Build the standard registry.
pub fn standard_registry(config: ValidatorConfig) -> Result<SchemaRegistry, RegistryError> {
    let mut builder = SchemaRegistry::builder(config);
    install(&mut builder)?;
    builder.build()
}

/// Register the standard records and variants into an existing builder,
/// for callers that add their own variants on top.
pub fn install(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    install_records(builder)?;
    install_messages(builder)?;
    install_components(builder)?;
    install_button_styles(builder)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

fn message_base() -> Arc<[FieldSpec]> {
    vec![
        FieldSpec::optional("id", T::Snowflake),
        FieldSpec::optional("channel_id", T::Snowflake),
        FieldSpec::optional("guild_id", T::Snowflake),
        FieldSpec::optional("author", T::Record("user")),
        FieldSpec::optional("member", T::Any),
        FieldSpec::optional("content", T::string_max(4000)),
        FieldSpec::optional("timestamp", T::Timestamp),
        FieldSpec::optional("edited_timestamp", T::Timestamp).nullable(),
        FieldSpec::optional("tts", T::Bool),
        FieldSpec::optional("mention_everyone", T::Bool),
        FieldSpec::optional("mentions", T::array(T::Record("user"))),
        FieldSpec::optional("mention_roles", T::array(T::Snowflake)),
        FieldSpec::optional("mention_channels", T::array(T::Any)),
        FieldSpec::optional("attachments", T::array(T::Record("attachment"))),
        FieldSpec::optional("embeds", T::bounded_array(T::Record("embed"), 0, 10)),
        FieldSpec::optional("reactions", T::array(T::Record("reaction"))),
        FieldSpec::optional(
            "nonce",
            T::OneOf(vec![T::int(i64::MIN, i64::MAX), T::string_max(25)]),
        ),
        FieldSpec::optional("pinned", T::Bool),
        FieldSpec::optional("webhook_id", T::Snowflake),
        FieldSpec::optional("application_id", T::Snowflake),
        FieldSpec::optional("activity", T::Any),
        FieldSpec::optional("application", T::Any),
        FieldSpec::optional("flags", T::Flags(&MESSAGE_FLAGS)),
        FieldSpec::optional("components", T::Components),
        FieldSpec::optional("message_reference", T::Record("message_reference")),
        FieldSpec::required_if(
            "message_snapshots",
            T::array(T::Any),
            Predicate::Equals("message_reference.type", 1),
        ),
        FieldSpec::optional("sticker_items", T::array(T::Any)),
        FieldSpec::optional("stickers", T::array(T::Any)),
        FieldSpec::optional("position", T::non_negative()),
        FieldSpec::optional("thread", T::Any),
        FieldSpec::optional("interaction_metadata", T::Any).provisional(),
        FieldSpec::optional("role_subscription_data", T::Any).provisional(),
        FieldSpec::optional("resolved", T::Any).provisional(),
        FieldSpec::optional("poll", T::Any).provisional(),
        FieldSpec::optional("call", T::Any).provisional(),
    ]
    .into()
}

fn message_variant(kind: MessageKind, base: &Arc<[FieldSpec]>) -> VariantSchema {
    let schema = VariantSchema::new(Family::Message, kind.tag(), kind.name()).with_base(base.clone());
    match kind {
        MessageKind::Reply | MessageKind::ThreadStarterMessage => schema
            .field(FieldSpec::required(
                "message_reference",
                T::Record("message_reference"),
            ))
            .field(FieldSpec::optional("referenced_message", T::Variant(Family::Message)).nullable()),
        // Deprecated in favor of interaction_metadata, still sent.
        MessageKind::ChatInputCommand | MessageKind::ContextMenuCommand => {
            schema.field(FieldSpec::optional("interaction", T::Any))
        }
        _ => schema,
    }
}

fn install_messages(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    let base = message_base();
    for kind in MessageKind::KNOWN {
        b.register(message_variant(*kind, &base))?;
    }
    b.register_generic(VariantSchema::generic(Family::Message, "unknown").with_base(base))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

fn component_id() -> FieldSpec {
    FieldSpec::optional("id", T::int(0, i64::from(i32::MAX)))
}

fn select_common() -> Vec<FieldSpec> {
    vec![
        component_id(),
        FieldSpec::required("custom_id", T::string_max(100)),
        FieldSpec::optional("placeholder", T::string_max(150)),
        FieldSpec::optional("min_values", T::int(0, SELECT_MAX)),
        FieldSpec::optional("max_values", T::int(1, SELECT_MAX)),
        FieldSpec::optional("disabled", T::Bool),
        FieldSpec::optional("required", T::Bool).provisional(),
    ]
}

fn auto_select(tag: u64, name: &'static str) -> VariantSchema {
    VariantSchema::new(Family::Component, tag, name)
        .class(ComponentClass::Selection)
        .fields(select_common())
        .field(FieldSpec::optional(
            "default_values",
            T::bounded_array(T::Record("select_default_value"), 0, SELECT_MAX as usize),
        ))
        .rule(CrossFieldRule::MinNotAboveMax {
            min: "min_values",
            max: "max_values",
        })
}

fn install_components(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    use component_type::*;

    b.register(
        VariantSchema::new(Family::Component, ACTION_ROW, "action_row")
            .class(ComponentClass::Container)
            .field(component_id())
            .field(FieldSpec::required("components", T::Children)),
    )?;

    b.register(
        VariantSchema::new(Family::Component, BUTTON, "button")
            .class(ComponentClass::Control)
            .sub_discriminant(Family::ButtonStyle)
            .fields([
                component_id(),
                FieldSpec::optional("label", T::string_max(80)),
                FieldSpec::optional("emoji", T::Record("emoji")),
                FieldSpec::optional("custom_id", T::string_max(100)),
                FieldSpec::optional("url", T::string_max(512)),
                FieldSpec::optional("sku_id", T::Snowflake),
                FieldSpec::optional("disabled", T::Bool),
            ]),
    )?;

    b.register(
        VariantSchema::new(Family::Component, STRING_SELECT, "string_select")
            .class(ComponentClass::Selection)
            .fields(select_common())
            .field(FieldSpec::required(
                "options",
                T::bounded_array(T::Record("select_option"), 1, SELECT_MAX as usize),
            ))
            .rule(CrossFieldRule::MinNotAboveMax {
                min: "min_values",
                max: "max_values",
            })
            .rule(CrossFieldRule::AtMostArrayLen {
                field: "max_values",
                array: "options",
            }),
    )?;

    b.register(
        VariantSchema::new(Family::Component, TEXT_INPUT, "text_input")
            .class(ComponentClass::TextInput)
            .fields([
                component_id(),
                FieldSpec::required("custom_id", T::string_max(100)),
                FieldSpec::required("style", T::int(1, 2)),
                FieldSpec::optional("label", T::string_max(45)),
                FieldSpec::optional("min_length", T::int(0, 4000)),
                FieldSpec::optional("max_length", T::int(1, 4000)),
                FieldSpec::optional("required", T::Bool),
                FieldSpec::optional("value", T::string_max(4000)),
                FieldSpec::optional("placeholder", T::string_max(100)),
            ])
            .rule(CrossFieldRule::MinNotAboveMax {
                min: "min_length",
                max: "max_length",
            }),
    )?;

    b.register(auto_select(USER_SELECT, "user_select"))?;
    b.register(auto_select(ROLE_SELECT, "role_select"))?;
    b.register(auto_select(MENTIONABLE_SELECT, "mentionable_select"))?;
    b.register(
        auto_select(CHANNEL_SELECT, "channel_select")
            .field(FieldSpec::optional("channel_types", T::array(T::int(0, 255)))),
    )?;
    Ok(())
}

fn install_button_styles(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    for style in ButtonStyle::ALL {
        let mut schema = VariantSchema::new(Family::ButtonStyle, style.tag(), style.name()).rule(
            CrossFieldRule::ExactlyOneOf {
                keys: BUTTON_ACTION_KEYS,
                selected: style.action_key(),
            },
        );
        if style == ButtonStyle::Premium {
            schema = schema
                .field(FieldSpec::forbidden("label"))
                .field(FieldSpec::forbidden("emoji"));
        }
        b.register(schema)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

fn install_records(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    b.register_record(RecordSchema::new(
        "user",
        [
            FieldSpec::required("id", T::Snowflake),
            FieldSpec::required("username", T::string_max(80)),
            FieldSpec::optional("discriminator", T::string_max(4)),
            FieldSpec::optional("global_name", T::string_max(80)).nullable(),
            FieldSpec::optional("avatar", T::string()).nullable(),
            FieldSpec::optional("bot", T::Bool),
            FieldSpec::optional("system", T::Bool),
            FieldSpec::optional("public_flags", T::Flags(&USER_FLAGS)),
            FieldSpec::optional("banner", T::Any),
            FieldSpec::optional("accent_color", T::Any),
            FieldSpec::optional("avatar_decoration_data", T::Any).provisional(),
            FieldSpec::optional("primary_guild", T::Any).provisional(),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "emoji",
        [
            FieldSpec::optional("id", T::Snowflake).nullable(),
            FieldSpec::required_if(
                "name",
                T::string_max(100),
                Predicate::not(Predicate::Present("id")),
            )
            .nullable(),
            FieldSpec::optional("animated", T::Bool),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "attachment",
        [
            FieldSpec::required("id", T::Snowflake),
            FieldSpec::required("filename", T::string_max(1024)),
            FieldSpec::optional("title", T::string()),
            FieldSpec::optional("description", T::string_max(1024)),
            FieldSpec::optional("content_type", T::string()),
            FieldSpec::optional("size", T::non_negative()),
            FieldSpec::optional("url", T::string()),
            FieldSpec::optional("proxy_url", T::string()),
            FieldSpec::optional("height", T::non_negative()).nullable(),
            FieldSpec::optional("width", T::non_negative()).nullable(),
            FieldSpec::optional("ephemeral", T::Bool),
            FieldSpec::optional("duration_secs", T::Number).provisional(),
            FieldSpec::optional("waveform", T::string()).provisional(),
            FieldSpec::optional("flags", T::Flags(&ATTACHMENT_FLAGS)),
        ],
    ))?;

    b.register_record(
        RecordSchema::new(
            "embed",
            [
                FieldSpec::optional("title", T::string_max(256)),
                FieldSpec::optional("type", T::string()),
                FieldSpec::optional("description", T::string_max(4096)),
                FieldSpec::optional("url", T::string()),
                FieldSpec::optional("timestamp", T::Timestamp),
                FieldSpec::optional("color", T::int(0, 0xFF_FFFF)),
                FieldSpec::optional("footer", T::Record("embed_footer")),
                FieldSpec::optional("image", T::Record("embed_image")),
                FieldSpec::optional("thumbnail", T::Record("embed_image")),
                FieldSpec::optional("video", T::Record("embed_video")),
                FieldSpec::optional("provider", T::Record("embed_provider")),
                FieldSpec::optional("author", T::Record("embed_author")),
                FieldSpec::optional("fields", T::bounded_array(T::Record("embed_field"), 0, 25)),
                FieldSpec::optional("flags", T::Flags(&EMBED_FLAGS)).provisional(),
            ],
        )
        .rule(CrossFieldRule::TotalTextLength {
            paths: EMBED_TEXT_PATHS,
            limit: EMBED_TOTAL_TEXT_LIMIT,
        }),
    )?;

    b.register_record(RecordSchema::new(
        "embed_footer",
        [
            FieldSpec::required("text", T::string_max(2048)),
            FieldSpec::optional("icon_url", T::string()),
            FieldSpec::optional("proxy_icon_url", T::string()),
        ],
    ))?;

    let media = |url: FieldSpec| {
        [
            url,
            FieldSpec::optional("proxy_url", T::string()),
            FieldSpec::optional("height", T::non_negative()),
            FieldSpec::optional("width", T::non_negative()),
        ]
    };
    b.register_record(RecordSchema::new(
        "embed_image",
        media(FieldSpec::required("url", T::string())),
    ))?;
    b.register_record(RecordSchema::new(
        "embed_video",
        media(FieldSpec::optional("url", T::string())),
    ))?;

    b.register_record(RecordSchema::new(
        "embed_provider",
        [
            FieldSpec::optional("name", T::string()),
            FieldSpec::optional("url", T::string()),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "embed_author",
        [
            FieldSpec::required("name", T::string_max(256)),
            FieldSpec::optional("url", T::string()),
            FieldSpec::optional("icon_url", T::string()),
            FieldSpec::optional("proxy_icon_url", T::string()),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "embed_field",
        [
            FieldSpec::required("name", T::string_max(256)),
            FieldSpec::required("value", T::string_max(1024)),
            FieldSpec::optional("inline", T::Bool),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "reaction",
        [
            FieldSpec::required("count", T::non_negative()),
            FieldSpec::optional("count_details", T::Record("reaction_count_details")),
            FieldSpec::required("me", T::Bool),
            FieldSpec::optional("me_burst", T::Bool),
            FieldSpec::required("emoji", T::Record("emoji")),
            FieldSpec::optional("burst_colors", T::array(T::string())),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "reaction_count_details",
        [
            FieldSpec::required("burst", T::non_negative()),
            FieldSpec::required("normal", T::non_negative()),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "message_reference",
        [
            FieldSpec::optional("type", T::non_negative()),
            FieldSpec::required_if("message_id", T::Snowflake, Predicate::Equals("type", 1)),
            FieldSpec::required_if("channel_id", T::Snowflake, Predicate::Equals("type", 1)),
            FieldSpec::optional("guild_id", T::Snowflake),
            FieldSpec::optional("fail_if_not_exists", T::Bool),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "select_option",
        [
            FieldSpec::required("label", T::string_max(100)),
            FieldSpec::required("value", T::string_max(100)),
            FieldSpec::optional("description", T::string_max(100)),
            FieldSpec::optional("emoji", T::Record("emoji")),
            FieldSpec::optional("default", T::Bool),
        ],
    ))?;

    b.register_record(RecordSchema::new(
        "select_default_value",
        [
            FieldSpec::required("id", T::Snowflake),
            FieldSpec::required("type", T::string()),
        ],
    ))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PresencePolicy;

    fn registry() -> SchemaRegistry {
        standard_registry(ValidatorConfig::default()).unwrap()
    }

    #[test]
    fn standard_registry_builds() {
        let reg = registry();
        assert_eq!(reg.variants(Family::Message).len(), MessageKind::KNOWN.len());
        assert_eq!(reg.variants(Family::Component).len(), 8);
        assert_eq!(reg.variants(Family::ButtonStyle).len(), 6);
        assert!(reg.generic(Family::Message).is_some());
        assert!(reg.generic(Family::Component).is_none());
    }

    #[test]
    fn reply_requires_message_reference() {
        let reg = registry();
        let reply = reg.lookup(Family::Message, 19).unwrap();
        let spec = reply.field_spec("message_reference").unwrap();
        assert!(matches!(spec.presence, PresencePolicy::Required));
        assert!(reply.field_spec("referenced_message").unwrap().is_nullable());

        let default = reg.lookup(Family::Message, 0).unwrap();
        assert!(matches!(
            default.field_spec("message_reference").unwrap().presence,
            PresencePolicy::Optional
        ));
        assert!(default.field_spec("referenced_message").is_none());
    }

    #[test]
    fn tag_thirteen_is_not_registered() {
        assert!(registry().lookup(Family::Message, 13).is_err());
    }

    #[test]
    fn button_declares_style_family() {
        let reg = registry();
        let button = reg.lookup(Family::Component, component_type::BUTTON).unwrap();
        assert_eq!(button.secondary_family(), Some(Family::ButtonStyle));
        assert_eq!(button.component_class(), Some(ComponentClass::Control));
        let premium = reg.lookup(Family::ButtonStyle, 6).unwrap();
        assert!(matches!(
            premium.field_spec("label").unwrap().presence,
            PresencePolicy::Forbidden
        ));
    }

    #[test]
    fn select_bounds_match_platform() {
        let reg = registry();
        let select = reg.lookup(Family::Component, component_type::STRING_SELECT).unwrap();
        match &select.field_spec("max_values").unwrap().ty {
            T::Integer { min, max } => assert_eq!((*min, *max), (1, 25)),
            other => panic!("unexpected type {other:?}"),
        }
        match &select.field_spec("min_values").unwrap().ty {
            T::Integer { min, max } => assert_eq!((*min, *max), (0, 25)),
            other => panic!("unexpected type {other:?}"),
        }
    }

    #[test]
    fn install_rejects_double_registration() {
        let mut b = SchemaRegistry::builder(ValidatorConfig::default());
        install(&mut b).unwrap();
        assert!(install(&mut b).is_err());
    }
}
