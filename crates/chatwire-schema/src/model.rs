//! # Canonical Model
//!
//! Typed forms of validated payloads. Every optional wire field is a
//! [`Presence`] so normalization never merges "not sent" into "sent as
//! null", and every object keeps an `extras` bag of keys no schema covers.
//! Known fields with no typed representation (deep objects such as `poll`
//! or `thread`) are kept verbatim in `untyped`.
//!
//! ## Message Shape
//!
//! ```text
//! CanonicalMessage
//! ├── kind: MessageKind            (Unknown(tag) for lenient fallbacks)
//! ├── header: MessageHeader        (fields shared by every kind)
//! ├── body: MessageBody            (kind-specific payload)
//! ├── untyped: Map                 (known but uninterpreted fields)
//! └── extras: Map                  (unknown keys, preserved)
//! ```

use chatwire_core::{FlagSet, Presence, Snowflake, Timestamp};
use serde_json::{Map, Value};

/// Keys a schema does not describe, kept for re-serialization.
pub type Extras = Map<String, Value>;

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

macro_rules! message_kinds {
    ($($variant:ident = $tag:literal => $name:literal,)*) => {
        /// Message `type`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageKind {
            $($variant,)*
            /// A tag this build does not register, kept in lenient mode.
            Unknown(u64),
        }

        impl MessageKind {
            /// Every registered kind, in tag order.
            pub const KNOWN: &'static [MessageKind] = &[$(MessageKind::$variant,)*];

            pub fn from_tag(tag: u64) -> Self {
                match tag {
                    $($tag => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            pub fn tag(self) -> u64 {
                match self {
                    $(Self::$variant => $tag,)*
                    Self::Unknown(tag) => tag,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                    Self::Unknown(_) => "unknown",
                }
            }
        }
    };
}

message_kinds! {
    Default = 0 => "default",
    RecipientAdd = 1 => "recipient_add",
    RecipientRemove = 2 => "recipient_remove",
    Call = 3 => "call",
    ChannelNameChange = 4 => "channel_name_change",
    ChannelIconChange = 5 => "channel_icon_change",
    ChannelPinnedMessage = 6 => "channel_pinned_message",
    UserJoin = 7 => "user_join",
    GuildBoost = 8 => "guild_boost",
    GuildBoostTier1 = 9 => "guild_boost_tier_1",
    GuildBoostTier2 = 10 => "guild_boost_tier_2",
    GuildBoostTier3 = 11 => "guild_boost_tier_3",
    ChannelFollowAdd = 12 => "channel_follow_add",
    GuildDiscoveryDisqualified = 14 => "guild_discovery_disqualified",
    GuildDiscoveryRequalified = 15 => "guild_discovery_requalified",
    GuildDiscoveryGracePeriodInitialWarning = 16 => "guild_discovery_grace_period_initial_warning",
    GuildDiscoveryGracePeriodFinalWarning = 17 => "guild_discovery_grace_period_final_warning",
    ThreadCreated = 18 => "thread_created",
    Reply = 19 => "reply",
    ChatInputCommand = 20 => "chat_input_command",
    ThreadStarterMessage = 21 => "thread_starter_message",
    GuildInviteReminder = 22 => "guild_invite_reminder",
    ContextMenuCommand = 23 => "context_menu_command",
    AutoModerationAction = 24 => "auto_moderation_action",
    RoleSubscriptionPurchase = 25 => "role_subscription_purchase",
    InteractionPremiumUpsell = 26 => "interaction_premium_upsell",
    StageStart = 27 => "stage_start",
    StageEnd = 28 => "stage_end",
    StageSpeaker = 29 => "stage_speaker",
    StageTopic = 31 => "stage_topic",
    GuildApplicationPremiumSubscription = 32 => "guild_application_premium_subscription",
    GuildIncidentAlertModeEnabled = 36 => "guild_incident_alert_mode_enabled",
    GuildIncidentAlertModeDisabled = 37 => "guild_incident_alert_mode_disabled",
    GuildIncidentReportRaid = 38 => "guild_incident_report_raid",
    GuildIncidentReportFalseAlarm = 39 => "guild_incident_report_false_alarm",
    PurchaseNotification = 44 => "purchase_notification",
    PollResult = 46 => "poll_result",
}

impl MessageKind {
    /// Kinds whose body points at another message.
    pub fn references_message(self) -> bool {
        matches!(self, Self::Reply | Self::ThreadStarterMessage)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A validated, normalized message.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMessage {
    pub kind: MessageKind,
    pub header: MessageHeader,
    pub body: MessageBody,
    pub untyped: Map<String, Value>,
    pub extras: Extras,
}

impl CanonicalMessage {
    /// The referenced message slot for replies and thread starters.
    pub fn referenced(&self) -> Option<&ReferencedMessage> {
        match &self.body {
            MessageBody::Reply { referenced } | MessageBody::ThreadStarter { referenced } => {
                Some(referenced)
            }
            _ => None,
        }
    }
}

/// Fields every message kind shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageHeader {
    pub id: Presence<Snowflake>,
    pub channel_id: Presence<Snowflake>,
    pub guild_id: Presence<Snowflake>,
    pub author: Presence<User>,
    pub content: Presence<String>,
    pub timestamp: Presence<Timestamp>,
    pub edited_timestamp: Presence<Timestamp>,
    pub tts: Presence<bool>,
    pub mention_everyone: Presence<bool>,
    pub mentions: Presence<Vec<User>>,
    pub mention_roles: Presence<Vec<Snowflake>>,
    pub attachments: Presence<Vec<Attachment>>,
    pub embeds: Presence<Vec<Embed>>,
    pub reactions: Presence<Vec<Reaction>>,
    pub nonce: Presence<Nonce>,
    pub pinned: Presence<bool>,
    pub webhook_id: Presence<Snowflake>,
    pub application_id: Presence<Snowflake>,
    pub flags: Presence<FlagSet>,
    pub components: Presence<Vec<CanonicalComponent>>,
    pub message_reference: Presence<MessageReference>,
    pub position: Presence<i64>,
}

/// Kind-specific message content.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Standard,
    Reply { referenced: ReferencedMessage },
    ThreadStarter { referenced: ReferencedMessage },
    /// Lenient fallback for an unregistered kind.
    Unrecognized,
}

/// State of `referenced_message` on a reply or thread starter.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferencedMessage {
    /// The key was absent: the platform did not try to resolve it.
    NotAttempted,
    /// The key was `null`: the target no longer exists.
    Deleted,
    Resolved(Box<CanonicalMessage>),
}

/// A message nonce: integer or string on the wire. Integers keep their
/// JSON number form, so they re-emit exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nonce {
    Integer(serde_json::Number),
    String(String),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: Presence<String>,
    pub global_name: Presence<String>,
    pub avatar: Presence<String>,
    pub bot: Presence<bool>,
    pub system: Presence<bool>,
    pub public_flags: Presence<FlagSet>,
    pub untyped: Map<String, Value>,
    pub extras: Extras,
}

/// Custom emoji (`id` set) or unicode emoji (`id` null, `name` the glyph).
#[derive(Debug, Clone, PartialEq)]
pub struct Emoji {
    pub id: Presence<Snowflake>,
    pub name: Presence<String>,
    pub animated: Presence<bool>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    pub title: Presence<String>,
    pub description: Presence<String>,
    pub content_type: Presence<String>,
    pub size: Presence<i64>,
    pub url: Presence<String>,
    pub proxy_url: Presence<String>,
    pub height: Presence<i64>,
    pub width: Presence<i64>,
    pub ephemeral: Presence<bool>,
    pub duration_secs: Presence<f64>,
    pub waveform: Presence<String>,
    pub flags: Presence<FlagSet>,
    pub extras: Extras,
}

/// Embed `type`. Unlisted values are tolerated in every mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedKind {
    Rich,
    Image,
    Video,
    Gifv,
    Article,
    Link,
    PollResult,
    AutoModerationMessage,
    Other(String),
}

impl EmbedKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "rich" => Self::Rich,
            "image" => Self::Image,
            "video" => Self::Video,
            "gifv" => Self::Gifv,
            "article" => Self::Article,
            "link" => Self::Link,
            "poll_result" => Self::PollResult,
            "auto_moderation_message" => Self::AutoModerationMessage,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Rich => "rich",
            Self::Image => "image",
            Self::Video => "video",
            Self::Gifv => "gifv",
            Self::Article => "article",
            Self::Link => "link",
            Self::PollResult => "poll_result",
            Self::AutoModerationMessage => "auto_moderation_message",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub kind: Presence<EmbedKind>,
    pub title: Presence<String>,
    pub description: Presence<String>,
    pub url: Presence<String>,
    pub timestamp: Presence<Timestamp>,
    pub color: Presence<i64>,
    pub footer: Presence<EmbedFooter>,
    pub image: Presence<EmbedMedia>,
    pub thumbnail: Presence<EmbedMedia>,
    pub video: Presence<EmbedMedia>,
    pub provider: Presence<EmbedProvider>,
    pub author: Presence<EmbedAuthor>,
    pub fields: Presence<Vec<EmbedField>>,
    pub flags: Presence<FlagSet>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Presence<String>,
    pub proxy_icon_url: Presence<String>,
    pub extras: Extras,
}

/// Image, thumbnail, or video of an embed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedMedia {
    pub url: Presence<String>,
    pub proxy_url: Presence<String>,
    pub height: Presence<i64>,
    pub width: Presence<i64>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedProvider {
    pub name: Presence<String>,
    pub url: Presence<String>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Presence<String>,
    pub icon_url: Presence<String>,
    pub proxy_icon_url: Presence<String>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: Presence<bool>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub count: i64,
    pub count_details: Presence<ReactionCountDetails>,
    pub me: bool,
    pub me_burst: Presence<bool>,
    pub emoji: Emoji,
    pub burst_colors: Presence<Vec<String>>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCountDetails {
    pub burst: i64,
    pub normal: i64,
    pub extras: Extras,
}

/// `message_reference.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Default,
    Forward,
    Other(i64),
}

impl ReferenceKind {
    pub fn from_tag(tag: i64) -> Self {
        match tag {
            0 => Self::Default,
            1 => Self::Forward,
            other => Self::Other(other),
        }
    }

    pub fn tag(self) -> i64 {
        match self {
            Self::Default => 0,
            Self::Forward => 1,
            Self::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReference {
    pub kind: Presence<ReferenceKind>,
    pub message_id: Presence<Snowflake>,
    pub channel_id: Presence<Snowflake>,
    pub guild_id: Presence<Snowflake>,
    pub fail_if_not_exists: Presence<bool>,
    pub extras: Extras,
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// A normalized component node.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalComponent {
    ActionRow(ActionRow),
    Button(Button),
    Select(SelectMenu),
    TextInput(TextInput),
    /// Lenient fallback: the raw object is kept as sent.
    Unrecognized(UnrecognizedComponent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRow {
    pub id: Presence<i64>,
    pub components: Vec<CanonicalComponent>,
    pub extras: Extras,
}

/// Button `style`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
    Premium,
}

impl ButtonStyle {
    pub const ALL: [ButtonStyle; 6] = [
        Self::Primary,
        Self::Secondary,
        Self::Success,
        Self::Danger,
        Self::Link,
        Self::Premium,
    ];

    pub fn from_tag(tag: u64) -> Option<Self> {
        Some(match tag {
            1 => Self::Primary,
            2 => Self::Secondary,
            3 => Self::Success,
            4 => Self::Danger,
            5 => Self::Link,
            6 => Self::Premium,
            _ => return None,
        })
    }

    pub fn tag(self) -> u64 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Success => 3,
            Self::Danger => 4,
            Self::Link => 5,
            Self::Premium => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Link => "link",
            Self::Premium => "premium",
        }
    }

    /// The one action key this style requires.
    pub fn action_key(self) -> &'static str {
        match self {
            Self::Link => "url",
            Self::Premium => "sku_id",
            _ => "custom_id",
        }
    }
}

/// What pressing a button does. Exactly one per button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    CustomId(String),
    Url(String),
    Sku(Snowflake),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub id: Presence<i64>,
    pub style: ButtonStyle,
    pub label: Presence<String>,
    pub emoji: Presence<Emoji>,
    pub action: ButtonAction,
    pub disabled: Presence<bool>,
    pub extras: Extras,
}

/// Which select menu variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectKind {
    String,
    User,
    Role,
    Mentionable,
    Channel,
}

impl SelectKind {
    pub fn from_tag(tag: u64) -> Option<Self> {
        Some(match tag {
            3 => Self::String,
            5 => Self::User,
            6 => Self::Role,
            7 => Self::Mentionable,
            8 => Self::Channel,
            _ => return None,
        })
    }

    pub fn tag(self) -> u64 {
        match self {
            Self::String => 3,
            Self::User => 5,
            Self::Role => 6,
            Self::Mentionable => 7,
            Self::Channel => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectMenu {
    pub kind: SelectKind,
    pub id: Presence<i64>,
    pub custom_id: String,
    pub placeholder: Presence<String>,
    pub min_values: Presence<i64>,
    pub max_values: Presence<i64>,
    pub disabled: Presence<bool>,
    pub required: Presence<bool>,
    pub options: Presence<Vec<SelectOption>>,
    pub default_values: Presence<Vec<SelectDefaultValue>>,
    pub channel_types: Presence<Vec<i64>>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Presence<String>,
    pub emoji: Presence<Emoji>,
    pub default: Presence<bool>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectDefaultValue {
    pub id: Snowflake,
    pub kind: String,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub id: Presence<i64>,
    pub custom_id: String,
    pub style: i64,
    pub label: Presence<String>,
    pub min_length: Presence<i64>,
    pub max_length: Presence<i64>,
    pub required: Presence<bool>,
    pub value: Presence<String>,
    pub placeholder: Presence<String>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedComponent {
    pub tag: u64,
    pub raw: Map<String, Value>,
}
