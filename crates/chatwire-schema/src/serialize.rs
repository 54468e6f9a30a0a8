//! # Wire Serializer
//!
//! Turns canonical objects back into wire JSON. Absent fields are omitted,
//! null fields are written as `null`, and both the `untyped` and `extras`
//! bags are written back unchanged. Serializing and then normalizing again
//! yields an equal canonical object.
//!
//! Snowflakes always go out as decimal strings, even when they arrived as
//! integers. Timestamps go out as the exact string they were parsed from.

use chatwire_core::{FlagSet, Presence, Snowflake, Timestamp};
use serde_json::{Map, Value};

use crate::model::*;

/// Conversion to wire JSON.
pub trait ToWire {
    fn to_wire(&self) -> Value;
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> Value {
        Value::Array(self.iter().map(ToWire::to_wire).collect())
    }
}

fn snowflake(s: &Snowflake) -> Value {
    s.to_value()
}

fn timestamp(t: &Timestamp) -> Value {
    Value::String(t.as_str().to_string())
}

fn flags(f: &FlagSet) -> Value {
    Value::from(f.bits())
}

#[allow(clippy::ptr_arg)]
fn string(s: &String) -> Value {
    Value::String(s.clone())
}

fn integer(n: &i64) -> Value {
    Value::from(*n)
}

fn boolean(b: &bool) -> Value {
    Value::Bool(*b)
}

fn wire<T: ToWire>(v: &T) -> Value {
    v.to_wire()
}

/// Add the bags last, so a typed field always wins over a stale extra.
fn finish(mut map: Map<String, Value>, untyped: &Map<String, Value>, extras: &Extras) -> Value {
    for (k, v) in untyped.iter().chain(extras) {
        map.entry(k.clone()).or_insert_with(|| v.clone());
    }
    Value::Object(map)
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

impl ToWire for CanonicalMessage {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(self.kind.tag()));

        let h = &self.header;
        h.id.emit(&mut map, "id", snowflake);
        h.channel_id.emit(&mut map, "channel_id", snowflake);
        h.guild_id.emit(&mut map, "guild_id", snowflake);
        h.author.emit(&mut map, "author", wire);
        h.content.emit(&mut map, "content", string);
        h.timestamp.emit(&mut map, "timestamp", timestamp);
        h.edited_timestamp.emit(&mut map, "edited_timestamp", timestamp);
        h.tts.emit(&mut map, "tts", boolean);
        h.mention_everyone.emit(&mut map, "mention_everyone", boolean);
        h.mentions.emit(&mut map, "mentions", wire);
        h.mention_roles
            .emit(&mut map, "mention_roles", |ids| ids.iter().map(|s| s.to_value()).collect());
        h.attachments.emit(&mut map, "attachments", wire);
        h.embeds.emit(&mut map, "embeds", wire);
        h.reactions.emit(&mut map, "reactions", wire);
        h.nonce.emit(&mut map, "nonce", |n| match n {
            Nonce::Integer(n) => Value::Number(n.clone()),
            Nonce::String(s) => Value::String(s.clone()),
        });
        h.pinned.emit(&mut map, "pinned", boolean);
        h.webhook_id.emit(&mut map, "webhook_id", snowflake);
        h.application_id.emit(&mut map, "application_id", snowflake);
        h.flags.emit(&mut map, "flags", flags);
        h.components.emit(&mut map, "components", wire);
        h.message_reference.emit(&mut map, "message_reference", wire);
        h.position.emit(&mut map, "position", integer);

        match self.referenced() {
            None | Some(ReferencedMessage::NotAttempted) => {}
            Some(ReferencedMessage::Deleted) => {
                map.insert("referenced_message".into(), Value::Null);
            }
            Some(ReferencedMessage::Resolved(inner)) => {
                map.insert("referenced_message".into(), inner.to_wire());
            }
        }

        finish(map, &self.untyped, &self.extras)
    }
}

impl ToWire for User {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), self.id.to_value());
        map.insert("username".into(), Value::String(self.username.clone()));
        self.discriminator.emit(&mut map, "discriminator", string);
        self.global_name.emit(&mut map, "global_name", string);
        self.avatar.emit(&mut map, "avatar", string);
        self.bot.emit(&mut map, "bot", boolean);
        self.system.emit(&mut map, "system", boolean);
        self.public_flags.emit(&mut map, "public_flags", flags);
        finish(map, &self.untyped, &self.extras)
    }
}

impl ToWire for Emoji {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        self.id.emit(&mut map, "id", snowflake);
        self.name.emit(&mut map, "name", string);
        self.animated.emit(&mut map, "animated", boolean);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for Attachment {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), self.id.to_value());
        map.insert("filename".into(), Value::String(self.filename.clone()));
        self.title.emit(&mut map, "title", string);
        self.description.emit(&mut map, "description", string);
        self.content_type.emit(&mut map, "content_type", string);
        self.size.emit(&mut map, "size", integer);
        self.url.emit(&mut map, "url", string);
        self.proxy_url.emit(&mut map, "proxy_url", string);
        self.height.emit(&mut map, "height", integer);
        self.width.emit(&mut map, "width", integer);
        self.ephemeral.emit(&mut map, "ephemeral", boolean);
        self.duration_secs.emit(&mut map, "duration_secs", |d| {
            serde_json::Number::from_f64(*d).map_or(Value::Null, Value::Number)
        });
        self.waveform.emit(&mut map, "waveform", string);
        self.flags.emit(&mut map, "flags", flags);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for Embed {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        self.kind
            .emit(&mut map, "type", |k| Value::String(k.as_str().to_string()));
        self.title.emit(&mut map, "title", string);
        self.description.emit(&mut map, "description", string);
        self.url.emit(&mut map, "url", string);
        self.timestamp.emit(&mut map, "timestamp", timestamp);
        self.color.emit(&mut map, "color", integer);
        self.footer.emit(&mut map, "footer", wire);
        self.image.emit(&mut map, "image", wire);
        self.thumbnail.emit(&mut map, "thumbnail", wire);
        self.video.emit(&mut map, "video", wire);
        self.provider.emit(&mut map, "provider", wire);
        self.author.emit(&mut map, "author", wire);
        self.fields.emit(&mut map, "fields", wire);
        self.flags.emit(&mut map, "flags", flags);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for EmbedFooter {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("text".into(), Value::String(self.text.clone()));
        self.icon_url.emit(&mut map, "icon_url", string);
        self.proxy_icon_url.emit(&mut map, "proxy_icon_url", string);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for EmbedMedia {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        self.url.emit(&mut map, "url", string);
        self.proxy_url.emit(&mut map, "proxy_url", string);
        self.height.emit(&mut map, "height", integer);
        self.width.emit(&mut map, "width", integer);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for EmbedProvider {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        self.name.emit(&mut map, "name", string);
        self.url.emit(&mut map, "url", string);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for EmbedAuthor {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        self.url.emit(&mut map, "url", string);
        self.icon_url.emit(&mut map, "icon_url", string);
        self.proxy_icon_url.emit(&mut map, "proxy_icon_url", string);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for EmbedField {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("value".into(), Value::String(self.value.clone()));
        self.inline.emit(&mut map, "inline", boolean);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for Reaction {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("count".into(), Value::from(self.count));
        self.count_details.emit(&mut map, "count_details", |d| {
            let mut details = Map::new();
            details.insert("burst".into(), Value::from(d.burst));
            details.insert("normal".into(), Value::from(d.normal));
            finish(details, &Map::new(), &d.extras)
        });
        map.insert("me".into(), Value::Bool(self.me));
        self.me_burst.emit(&mut map, "me_burst", boolean);
        map.insert("emoji".into(), self.emoji.to_wire());
        self.burst_colors.emit(&mut map, "burst_colors", |colors| {
            colors.iter().cloned().map(Value::String).collect()
        });
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for MessageReference {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        self.kind.emit(&mut map, "type", |k| Value::from(k.tag()));
        self.message_id.emit(&mut map, "message_id", snowflake);
        self.channel_id.emit(&mut map, "channel_id", snowflake);
        self.guild_id.emit(&mut map, "guild_id", snowflake);
        self.fail_if_not_exists.emit(&mut map, "fail_if_not_exists", boolean);
        finish(map, &Map::new(), &self.extras)
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

impl ToWire for CanonicalComponent {
    fn to_wire(&self) -> Value {
        match self {
            Self::ActionRow(row) => {
                let mut map = Map::new();
                map.insert("type".into(), Value::from(crate::protocol::component_type::ACTION_ROW));
                row.id.emit(&mut map, "id", integer);
                map.insert("components".into(), row.components.to_wire());
                finish(map, &Map::new(), &row.extras)
            }
            Self::Button(button) => button.to_wire(),
            Self::Select(select) => select.to_wire(),
            Self::TextInput(input) => input.to_wire(),
            Self::Unrecognized(raw) => Value::Object(raw.raw.clone()),
        }
    }
}

impl ToWire for Button {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(crate::protocol::component_type::BUTTON));
        map.insert("style".into(), Value::from(self.style.tag()));
        self.id.emit(&mut map, "id", integer);
        self.label.emit(&mut map, "label", string);
        self.emoji.emit(&mut map, "emoji", wire);
        let action = match &self.action {
            ButtonAction::CustomId(id) => Value::String(id.clone()),
            ButtonAction::Url(url) => Value::String(url.clone()),
            ButtonAction::Sku(sku) => sku.to_value(),
        };
        map.insert(self.style.action_key().into(), action);
        self.disabled.emit(&mut map, "disabled", boolean);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for SelectMenu {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(self.kind.tag()));
        self.id.emit(&mut map, "id", integer);
        map.insert("custom_id".into(), Value::String(self.custom_id.clone()));
        self.placeholder.emit(&mut map, "placeholder", string);
        self.min_values.emit(&mut map, "min_values", integer);
        self.max_values.emit(&mut map, "max_values", integer);
        self.disabled.emit(&mut map, "disabled", boolean);
        self.required.emit(&mut map, "required", boolean);
        self.options.emit(&mut map, "options", wire);
        self.default_values.emit(&mut map, "default_values", wire);
        self.channel_types
            .emit(&mut map, "channel_types", |types| types.iter().copied().map(Value::from).collect());
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for SelectOption {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("label".into(), Value::String(self.label.clone()));
        map.insert("value".into(), Value::String(self.value.clone()));
        self.description.emit(&mut map, "description", string);
        self.emoji.emit(&mut map, "emoji", wire);
        self.default.emit(&mut map, "default", boolean);
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for SelectDefaultValue {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), self.id.to_value());
        map.insert("type".into(), Value::String(self.kind.clone()));
        finish(map, &Map::new(), &self.extras)
    }
}

impl ToWire for TextInput {
    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(crate::protocol::component_type::TEXT_INPUT));
        self.id.emit(&mut map, "id", integer);
        map.insert("custom_id".into(), Value::String(self.custom_id.clone()));
        map.insert("style".into(), Value::from(self.style));
        self.label.emit(&mut map, "label", string);
        self.min_length.emit(&mut map, "min_length", integer);
        self.max_length.emit(&mut map, "max_length", integer);
        self.required.emit(&mut map, "required", boolean);
        self.value.emit(&mut map, "value", string);
        self.placeholder.emit(&mut map, "placeholder", string);
        finish(map, &Map::new(), &self.extras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::normalize::Normalizer;
    use crate::protocol::standard_registry;
    use chatwire_core::FieldPath;
    use serde_json::json;

    fn round_trip(payload: Value) -> Value {
        let reg = standard_registry(ValidatorConfig::lenient()).unwrap();
        Normalizer::new(&reg)
            .message(&payload, &FieldPath::root(), 0)
            .unwrap()
            .to_wire()
    }

    #[test]
    fn null_and_absent_survive_serialization() {
        let out = round_trip(json!({
            "type": 19,
            "message_reference": {"channel_id": "1"},
            "referenced_message": null,
            "edited_timestamp": null
        }));
        assert_eq!(out["referenced_message"], Value::Null);
        assert_eq!(out["edited_timestamp"], Value::Null);
        assert!(out.get("content").is_none());

        let out = round_trip(json!({"type": 19, "message_reference": {"channel_id": "1"}}));
        assert!(out.get("referenced_message").is_none());
    }

    #[test]
    fn extras_and_untyped_are_written_back() {
        let payload = json!({
            "type": 0,
            "content": "hi",
            "poll": {"question": {"text": "?"}},
            "brand_new": {"nested": [1, 2, 3]}
        });
        assert_eq!(round_trip(payload.clone()), payload);
    }

    #[test]
    fn integer_snowflakes_go_out_as_strings() {
        let out = round_trip(json!({"type": 0, "id": 175928847299117063u64}));
        assert_eq!(out["id"], json!("175928847299117063"));
    }

    #[test]
    fn timestamps_keep_their_original_text() {
        let raw = "2024-01-01T00:00:00.000000+00:00";
        let out = round_trip(json!({"type": 0, "timestamp": raw}));
        assert_eq!(out["timestamp"], json!(raw));
    }

    #[test]
    fn flags_round_trip_with_unknown_bits() {
        let bits = (1u64 << 2) | (1u64 << 40);
        let out = round_trip(json!({"type": 0, "flags": bits}));
        assert_eq!(out["flags"], json!(bits));
    }

    #[test]
    fn buttons_write_only_their_action_key() {
        let payload = json!({
            "type": 0,
            "components": [{
                "type": 1,
                "components": [
                    {"type": 2, "style": 1, "custom_id": "go", "label": "Go"},
                    {"type": 2, "style": 5, "url": "https://example.com"},
                    {"type": 2, "style": 6, "sku_id": "77"}
                ]
            }]
        });
        assert_eq!(round_trip(payload.clone()), payload);
    }

    #[test]
    fn unrecognized_component_is_written_verbatim() {
        let payload = json!({"type": 0, "components": [{"type": 99, "whatever": [null]}]});
        assert_eq!(round_trip(payload.clone()), payload);
    }

    #[test]
    fn resolved_reference_is_nested() {
        let payload = json!({
            "type": 19,
            "message_reference": {"type": 0, "message_id": "2", "channel_id": "1"},
            "referenced_message": {"type": 0, "id": "2", "content": "orig", "pinned": false}
        });
        assert_eq!(round_trip(payload.clone()), payload);
    }
}
