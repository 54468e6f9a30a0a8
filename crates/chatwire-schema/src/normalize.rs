//! # Normalizer
//!
//! Second pass over a payload that already validated: builds the typed
//! canonical model. Every optional field is read into a [`Presence`], so a
//! field sent as `null` stays distinct from one never sent. Keys the
//! resolved schema does not cover go to the object's `extras` bag, and
//! known fields typed as opaque values go to `untyped`. Both are written
//! back unchanged by the serializer.
//!
//! The normalizer trusts the validator for shape but still returns a
//! [`ValidationError`] instead of panicking when a value does not fit,
//! so calling it on an unvalidated payload is safe.

use chatwire_core::{
    BitfieldSpec, FieldPath, FlagSet, Presence, Snowflake, Timestamp, ValidationError,
    ATTACHMENT_FLAGS, EMBED_FLAGS, MESSAGE_FLAGS, USER_FLAGS,
};
use serde_json::{Map, Value};

use crate::config::Strictness;
use crate::fields::json_kind;
use crate::model::*;
use crate::protocol::component_type;
use crate::registry::{Family, FieldSpec, SchemaRegistry};
use crate::resolver::discriminant_of;

type Decoded<T> = Result<T, ValidationError>;

// ---------------------------------------------------------------------------
// Primitive decoders
// ---------------------------------------------------------------------------

fn mismatch(expected: &str, value: &Value, path: &FieldPath) -> ValidationError {
    ValidationError::TypeMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        found: json_kind(value).to_string(),
    }
}

fn object<'a>(value: &'a Value, path: &FieldPath) -> Decoded<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| mismatch("object", value, path))
}

fn string(value: &Value, path: &FieldPath) -> Decoded<String> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| mismatch("string", value, path))
}

fn integer(value: &Value, path: &FieldPath) -> Decoded<i64> {
    value.as_i64().ok_or_else(|| mismatch("integer", value, path))
}

fn number(value: &Value, path: &FieldPath) -> Decoded<f64> {
    value.as_f64().ok_or_else(|| mismatch("number", value, path))
}

fn boolean(value: &Value, path: &FieldPath) -> Decoded<bool> {
    value.as_bool().ok_or_else(|| mismatch("boolean", value, path))
}

fn snowflake(value: &Value, path: &FieldPath) -> Decoded<Snowflake> {
    Snowflake::from_value(value).map_err(|_| mismatch("snowflake", value, path))
}

fn timestamp(value: &Value, path: &FieldPath) -> Decoded<Timestamp> {
    value
        .as_str()
        .and_then(|s| Timestamp::parse(s).ok())
        .ok_or_else(|| mismatch("ISO 8601 timestamp", value, path))
}

fn flags(spec: &'static BitfieldSpec) -> impl Fn(&Value, &FieldPath) -> Decoded<FlagSet> {
    move |value: &Value, path: &FieldPath| {
        value
            .as_u64()
            .map(|raw| spec.decode(raw))
            .ok_or_else(|| mismatch("non-negative flag integer", value, path))
    }
}

fn nonce(value: &Value, path: &FieldPath) -> Decoded<Nonce> {
    match value {
        Value::Number(n) if n.is_i64() => Ok(Nonce::Integer(n.clone())),
        Value::String(s) => Ok(Nonce::String(s.clone())),
        other => Err(mismatch("integer or string", other, path)),
    }
}

fn array<'a, T>(
    value: &'a Value,
    path: &FieldPath,
    mut item: impl FnMut(&'a Value, &FieldPath) -> Decoded<T>,
) -> Decoded<Vec<T>> {
    let items = value.as_array().ok_or_else(|| mismatch("array", value, path))?;
    items
        .iter()
        .enumerate()
        .map(|(i, element)| item(element, &path.index(i)))
        .collect()
}

/// Keys of `map` rejected by `covers`.
fn extras(map: &Map<String, Value>, covers: impl Fn(&str) -> bool) -> Extras {
    map.iter()
        .filter(|(k, _)| !covers(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Opaque-typed fields that were sent, null included.
fn untyped<'s>(map: &Map<String, Value>, specs: impl IntoIterator<Item = &'s FieldSpec>) -> Map<String, Value> {
    specs
        .into_iter()
        .filter(|spec| spec.ty.is_opaque())
        .filter_map(|spec| map.get(spec.name).map(|v| (spec.name.to_string(), v.clone())))
        .collect()
}

/// Field access over one object, carrying its path.
struct Reader<'a> {
    map: &'a Map<String, Value>,
    path: &'a FieldPath,
}

impl<'a> Reader<'a> {
    fn slot(&self, key: &str) -> Presence<&'a Value> {
        Presence::of(self.map, key)
    }

    fn opt<T>(&self, key: &str, decode: impl FnOnce(&'a Value, &FieldPath) -> Decoded<T>) -> Decoded<Presence<T>> {
        let path = self.path.key(key);
        self.slot(key).try_map(|v| decode(v, &path))
    }

    fn req<T>(&self, key: &str, decode: impl FnOnce(&'a Value, &FieldPath) -> Decoded<T>) -> Decoded<T> {
        let path = self.path.key(key);
        match self.slot(key) {
            Presence::Present(v) => decode(v, &path),
            Presence::Absent | Presence::Null => Err(ValidationError::MissingField { path }),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Message keys with a typed slot in [`MessageHeader`], plus the
/// discriminant.
const HEADER_KEYS: &[&str] = &[
    "type",
    "id",
    "channel_id",
    "guild_id",
    "author",
    "content",
    "timestamp",
    "edited_timestamp",
    "tts",
    "mention_everyone",
    "mentions",
    "mention_roles",
    "attachments",
    "embeds",
    "reactions",
    "nonce",
    "pinned",
    "webhook_id",
    "application_id",
    "flags",
    "components",
    "message_reference",
    "position",
];

/// Builds canonical objects against one registry.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Normalizer<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Normalize a message object. `ref_depth` counts the
    /// `referenced_message` hops that led here.
    pub fn message(&self, value: &Value, path: &FieldPath, ref_depth: usize) -> Decoded<CanonicalMessage> {
        let map = object(value, path)?;
        let tag = discriminant_of(map, Family::Message).ok_or_else(|| {
            ValidationError::MissingDiscriminant {
                path: path.clone(),
                field: "type".to_string(),
                context: "message".to_string(),
            }
        })?;

        let schema = match self.registry.lookup(Family::Message, tag) {
            Ok(schema) => schema,
            Err(_) => match (
                self.registry.config().strictness,
                self.registry.generic(Family::Message),
            ) {
                (Strictness::Lenient, Some(generic)) => generic,
                _ => {
                    return Err(ValidationError::UnknownVariant {
                        path: path.key("type"),
                        context: "message".to_string(),
                        tag: tag.to_string(),
                    })
                }
            },
        };

        // The typed model only sees keys the resolved schema covers.
        let covered: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| schema.covers(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let kind = MessageKind::from_tag(tag);
        let r = Reader { map: &covered, path };
        let header = self.header(&r)?;
        let body = match (schema.tag(), kind) {
            (None, _) => MessageBody::Unrecognized,
            (Some(_), MessageKind::Reply) => MessageBody::Reply {
                referenced: self.referenced(&r, ref_depth)?,
            },
            (Some(_), MessageKind::ThreadStarterMessage) => MessageBody::ThreadStarter {
                referenced: self.referenced(&r, ref_depth)?,
            },
            (Some(_), _) => MessageBody::Standard,
        };

        let body_typed = |k: &str| k == "referenced_message" && kind.references_message();
        let untyped = covered
            .iter()
            .filter(|(k, _)| !HEADER_KEYS.contains(&k.as_str()) && !body_typed(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(CanonicalMessage {
            kind,
            header,
            body,
            untyped,
            extras: extras(map, |k| schema.covers(k)),
        })
    }

    fn header(&self, r: &Reader<'_>) -> Decoded<MessageHeader> {
        Ok(MessageHeader {
            id: r.opt("id", snowflake)?,
            channel_id: r.opt("channel_id", snowflake)?,
            guild_id: r.opt("guild_id", snowflake)?,
            author: r.opt("author", |v, p| self.user(v, p))?,
            content: r.opt("content", string)?,
            timestamp: r.opt("timestamp", timestamp)?,
            edited_timestamp: r.opt("edited_timestamp", timestamp)?,
            tts: r.opt("tts", boolean)?,
            mention_everyone: r.opt("mention_everyone", boolean)?,
            mentions: r.opt("mentions", |v, p| array(v, p, |x, q| self.user(x, q)))?,
            mention_roles: r.opt("mention_roles", |v, p| array(v, p, snowflake))?,
            attachments: r.opt("attachments", |v, p| array(v, p, |x, q| self.attachment(x, q)))?,
            embeds: r.opt("embeds", |v, p| array(v, p, |x, q| self.embed(x, q)))?,
            reactions: r.opt("reactions", |v, p| array(v, p, |x, q| self.reaction(x, q)))?,
            nonce: r.opt("nonce", nonce)?,
            pinned: r.opt("pinned", boolean)?,
            webhook_id: r.opt("webhook_id", snowflake)?,
            application_id: r.opt("application_id", snowflake)?,
            flags: r.opt("flags", flags(&MESSAGE_FLAGS))?,
            components: r.opt("components", |v, p| self.components(v, p))?,
            message_reference: r.opt("message_reference", |v, p| self.message_reference(v, p))?,
            position: r.opt("position", integer)?,
        })
    }

    fn referenced(&self, r: &Reader<'_>, ref_depth: usize) -> Decoded<ReferencedMessage> {
        match r.slot("referenced_message") {
            Presence::Absent => Ok(ReferencedMessage::NotAttempted),
            Presence::Null => Ok(ReferencedMessage::Deleted),
            Presence::Present(value) => {
                let path = r.path.key("referenced_message");
                let depth = ref_depth + 1;
                let limit = self.registry.config().max_reference_depth;
                if depth > limit {
                    return Err(ValidationError::PayloadTooLarge {
                        path,
                        limit,
                        actual: depth,
                    });
                }
                let message = self.message(value, &path, depth)?;
                Ok(ReferencedMessage::Resolved(Box::new(message)))
            }
        }
    }

    fn record_extras(&self, name: &str, map: &Map<String, Value>) -> Extras {
        match self.registry.record(name) {
            Some(record) => extras(map, |k| record.covers(k)),
            None => map.clone(),
        }
    }

    // -- Components ----------------------------------------------------------

    /// Normalize a component list.
    pub fn components(&self, value: &Value, path: &FieldPath) -> Decoded<Vec<CanonicalComponent>> {
        array(value, path, |v, p| self.component(v, p))
    }

    /// Normalize one component node. Unregistered types and button styles
    /// come back as [`CanonicalComponent::Unrecognized`] with the raw object.
    pub fn component(&self, value: &Value, path: &FieldPath) -> Decoded<CanonicalComponent> {
        let map = object(value, path)?;
        let tag = discriminant_of(map, Family::Component).ok_or_else(|| {
            ValidationError::MissingDiscriminant {
                path: path.clone(),
                field: "type".to_string(),
                context: "component".to_string(),
            }
        })?;
        let unrecognized = |tag: u64| {
            tracing::debug!(tag, path = %path, "keeping unrecognized component");
            CanonicalComponent::Unrecognized(UnrecognizedComponent {
                tag,
                raw: map.clone(),
            })
        };

        let Ok(schema) = self.registry.lookup(Family::Component, tag) else {
            return Ok(unrecognized(tag));
        };
        let r = Reader { map, path };
        let extras = extras(map, |k| schema.covers(k));

        let component = match tag {
            component_type::ACTION_ROW => CanonicalComponent::ActionRow(ActionRow {
                id: r.opt("id", integer)?,
                components: r.req("components", |v, p| self.components(v, p))?,
                extras,
            }),

            component_type::BUTTON => {
                let style = discriminant_of(map, Family::ButtonStyle).and_then(ButtonStyle::from_tag);
                let Some(style) = style else {
                    return Ok(unrecognized(tag));
                };
                let action = match style {
                    ButtonStyle::Link => ButtonAction::Url(r.req("url", string)?),
                    ButtonStyle::Premium => ButtonAction::Sku(r.req("sku_id", snowflake)?),
                    _ => ButtonAction::CustomId(r.req("custom_id", string)?),
                };
                CanonicalComponent::Button(Button {
                    id: r.opt("id", integer)?,
                    style,
                    label: r.opt("label", string)?,
                    emoji: r.opt("emoji", |v, p| self.emoji(v, p))?,
                    action,
                    disabled: r.opt("disabled", boolean)?,
                    extras,
                })
            }

            component_type::TEXT_INPUT => CanonicalComponent::TextInput(TextInput {
                id: r.opt("id", integer)?,
                custom_id: r.req("custom_id", string)?,
                style: r.req("style", integer)?,
                label: r.opt("label", string)?,
                min_length: r.opt("min_length", integer)?,
                max_length: r.opt("max_length", integer)?,
                required: r.opt("required", boolean)?,
                value: r.opt("value", string)?,
                placeholder: r.opt("placeholder", string)?,
                extras,
            }),

            other => match SelectKind::from_tag(other) {
                Some(kind) => CanonicalComponent::Select(SelectMenu {
                    kind,
                    id: r.opt("id", integer)?,
                    custom_id: r.req("custom_id", string)?,
                    placeholder: r.opt("placeholder", string)?,
                    min_values: r.opt("min_values", integer)?,
                    max_values: r.opt("max_values", integer)?,
                    disabled: r.opt("disabled", boolean)?,
                    required: r.opt("required", boolean)?,
                    options: r.opt("options", |v, p| array(v, p, |x, q| self.select_option(x, q)))?,
                    default_values: r.opt("default_values", |v, p| {
                        array(v, p, |x, q| self.select_default_value(x, q))
                    })?,
                    channel_types: r.opt("channel_types", |v, p| array(v, p, integer))?,
                    extras,
                }),
                None => return Ok(unrecognized(other)),
            },
        };
        Ok(component)
    }

    fn select_option(&self, value: &Value, path: &FieldPath) -> Decoded<SelectOption> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(SelectOption {
            label: r.req("label", string)?,
            value: r.req("value", string)?,
            description: r.opt("description", string)?,
            emoji: r.opt("emoji", |v, p| self.emoji(v, p))?,
            default: r.opt("default", boolean)?,
            extras: self.record_extras("select_option", map),
        })
    }

    fn select_default_value(&self, value: &Value, path: &FieldPath) -> Decoded<SelectDefaultValue> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(SelectDefaultValue {
            id: r.req("id", snowflake)?,
            kind: r.req("type", string)?,
            extras: self.record_extras("select_default_value", map),
        })
    }

    // -- Records -------------------------------------------------------------

    pub fn user(&self, value: &Value, path: &FieldPath) -> Decoded<User> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        let specs = self.registry.record("user").map(|s| s.fields()).unwrap_or_default();
        Ok(User {
            id: r.req("id", snowflake)?,
            username: r.req("username", string)?,
            discriminator: r.opt("discriminator", string)?,
            global_name: r.opt("global_name", string)?,
            avatar: r.opt("avatar", string)?,
            bot: r.opt("bot", boolean)?,
            system: r.opt("system", boolean)?,
            public_flags: r.opt("public_flags", flags(&USER_FLAGS))?,
            untyped: untyped(map, specs),
            extras: self.record_extras("user", map),
        })
    }

    pub fn emoji(&self, value: &Value, path: &FieldPath) -> Decoded<Emoji> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(Emoji {
            id: r.opt("id", snowflake)?,
            name: r.opt("name", string)?,
            animated: r.opt("animated", boolean)?,
            extras: self.record_extras("emoji", map),
        })
    }

    pub fn attachment(&self, value: &Value, path: &FieldPath) -> Decoded<Attachment> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(Attachment {
            id: r.req("id", snowflake)?,
            filename: r.req("filename", string)?,
            title: r.opt("title", string)?,
            description: r.opt("description", string)?,
            content_type: r.opt("content_type", string)?,
            size: r.opt("size", integer)?,
            url: r.opt("url", string)?,
            proxy_url: r.opt("proxy_url", string)?,
            height: r.opt("height", integer)?,
            width: r.opt("width", integer)?,
            ephemeral: r.opt("ephemeral", boolean)?,
            duration_secs: r.opt("duration_secs", number)?,
            waveform: r.opt("waveform", string)?,
            flags: r.opt("flags", flags(&ATTACHMENT_FLAGS))?,
            extras: self.record_extras("attachment", map),
        })
    }

    pub fn embed(&self, value: &Value, path: &FieldPath) -> Decoded<Embed> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(Embed {
            kind: r.opt("type", |v, p| string(v, p).map(|s| EmbedKind::parse(&s)))?,
            title: r.opt("title", string)?,
            description: r.opt("description", string)?,
            url: r.opt("url", string)?,
            timestamp: r.opt("timestamp", timestamp)?,
            color: r.opt("color", integer)?,
            footer: r.opt("footer", |v, p| self.embed_footer(v, p))?,
            image: r.opt("image", |v, p| self.embed_media("embed_image", v, p))?,
            thumbnail: r.opt("thumbnail", |v, p| self.embed_media("embed_image", v, p))?,
            video: r.opt("video", |v, p| self.embed_media("embed_video", v, p))?,
            provider: r.opt("provider", |v, p| self.embed_provider(v, p))?,
            author: r.opt("author", |v, p| self.embed_author(v, p))?,
            fields: r.opt("fields", |v, p| array(v, p, |x, q| self.embed_field(x, q)))?,
            flags: r.opt("flags", flags(&EMBED_FLAGS))?,
            extras: self.record_extras("embed", map),
        })
    }

    fn embed_footer(&self, value: &Value, path: &FieldPath) -> Decoded<EmbedFooter> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(EmbedFooter {
            text: r.req("text", string)?,
            icon_url: r.opt("icon_url", string)?,
            proxy_icon_url: r.opt("proxy_icon_url", string)?,
            extras: self.record_extras("embed_footer", map),
        })
    }

    fn embed_media(&self, record: &str, value: &Value, path: &FieldPath) -> Decoded<EmbedMedia> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(EmbedMedia {
            url: r.opt("url", string)?,
            proxy_url: r.opt("proxy_url", string)?,
            height: r.opt("height", integer)?,
            width: r.opt("width", integer)?,
            extras: self.record_extras(record, map),
        })
    }

    fn embed_provider(&self, value: &Value, path: &FieldPath) -> Decoded<EmbedProvider> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(EmbedProvider {
            name: r.opt("name", string)?,
            url: r.opt("url", string)?,
            extras: self.record_extras("embed_provider", map),
        })
    }

    fn embed_author(&self, value: &Value, path: &FieldPath) -> Decoded<EmbedAuthor> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(EmbedAuthor {
            name: r.req("name", string)?,
            url: r.opt("url", string)?,
            icon_url: r.opt("icon_url", string)?,
            proxy_icon_url: r.opt("proxy_icon_url", string)?,
            extras: self.record_extras("embed_author", map),
        })
    }

    fn embed_field(&self, value: &Value, path: &FieldPath) -> Decoded<EmbedField> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(EmbedField {
            name: r.req("name", string)?,
            value: r.req("value", string)?,
            inline: r.opt("inline", boolean)?,
            extras: self.record_extras("embed_field", map),
        })
    }

    pub fn reaction(&self, value: &Value, path: &FieldPath) -> Decoded<Reaction> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(Reaction {
            count: r.req("count", integer)?,
            count_details: r.opt("count_details", |v, p| {
                let details = object(v, p)?;
                let d = Reader { map: details, path: p };
                Ok(ReactionCountDetails {
                    burst: d.req("burst", integer)?,
                    normal: d.req("normal", integer)?,
                    extras: self.record_extras("reaction_count_details", details),
                })
            })?,
            me: r.req("me", boolean)?,
            me_burst: r.opt("me_burst", boolean)?,
            emoji: r.req("emoji", |v, p| self.emoji(v, p))?,
            burst_colors: r.opt("burst_colors", |v, p| array(v, p, string))?,
            extras: self.record_extras("reaction", map),
        })
    }

    pub fn message_reference(&self, value: &Value, path: &FieldPath) -> Decoded<MessageReference> {
        let map = object(value, path)?;
        let r = Reader { map, path };
        Ok(MessageReference {
            kind: r.opt("type", |v, p| integer(v, p).map(ReferenceKind::from_tag))?,
            message_id: r.opt("message_id", snowflake)?,
            channel_id: r.opt("channel_id", snowflake)?,
            guild_id: r.opt("guild_id", snowflake)?,
            fail_if_not_exists: r.opt("fail_if_not_exists", boolean)?,
            extras: self.record_extras("message_reference", map),
        })
    }
}
