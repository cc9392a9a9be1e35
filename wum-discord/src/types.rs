use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

id_newtype!(GuildId);
id_newtype!(ChannelId);
id_newtype!(UserId);

/// Ephemeral message flag: the response is visible to the invoking user only.
pub const EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    Other(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            other => Self::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for InteractionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Ok(Self::from(raw))
    }
}

/// An inbound interaction as delivered to the webhook endpoint.
///
/// `guild_id` and `member` are both required for a command to be
/// dispatchable; DM invocations carry neither.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub token: String,
    #[serde(default)]
    pub data: Option<CommandData>,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub member: Option<GuildMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    /// Name of the first option, which for our commands is the subcommand.
    pub fn subcommand(&self) -> Option<&CommandOption> {
        self.options.first()
    }
}

/// One `{name, value}` entry of an interaction's option list. Subcommand
/// options carry nested `options` instead of a value.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<OptionValue>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    pub user: DiscordUser,
    /// Permission bitmask serialized as a decimal string.
    #[serde(default)]
    pub permissions: Option<String>,
}

impl GuildMember {
    const ADMINISTRATOR: u64 = 0x8;

    pub fn is_admin(&self) -> bool {
        self.permissions
            .as_deref()
            .and_then(|raw| raw.parse::<u64>().ok())
            .is_some_and(|bits| bits & Self::ADMINISTRATOR != 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl DiscordUser {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            format!(
                "https://cdn.discordapp.com/avatars/{}/{hash}.png",
                self.id.as_str()
            )
        })
    }
}

/// Outbound interaction response, serialized as `{"type": .., "data": ..}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ResponseData>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
}

impl InteractionResponse {
    const PONG: u8 = 1;
    const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
    const DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE: u8 = 5;

    pub fn pong() -> Self {
        Self {
            kind: Self::PONG,
            data: None,
        }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: Self::CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(ResponseData {
                content: Some(content.into()),
                flags: None,
            }),
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: Self::CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(ResponseData {
                content: Some(content.into()),
                flags: Some(EPHEMERAL),
            }),
        }
    }

    pub fn deferred(ephemeral: bool) -> Self {
        Self {
            kind: Self::DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE,
            data: ephemeral.then_some(ResponseData {
                content: None,
                flags: Some(EPHEMERAL),
            }),
        }
    }
}

/// Payload of a deferred-response follow-up call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FollowupMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl FollowupMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            flags: None,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            flags: Some(EPHEMERAL),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadRef {
    pub id: ChannelId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
}
