//! The slice of the Bot API object model the gerai bot touches.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// How the user is attributed in status updates: `@username`, or the
    /// full name when no username is set.
    pub fn actor_identity(&self) -> String {
        match &self.username {
            Some(u) if !u.is_empty() => format!("@{u}"),
            _ => match &self.last_name {
                Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
                _ => self.first_name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Outgoing
// ---------------------------------------------------------------------------

/// `chat_id` accepts an integer or a `@channel` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Name(String),
}

impl ChatId {
    /// Subscriber ids are stored as strings; numeric ones go out as integers.
    pub fn parse(recipient: &str) -> Self {
        match recipient.trim().parse::<i64>() {
            Ok(id) => ChatId::Id(id),
            Err(_) => ChatId::Name(recipient.trim().to_string()),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some("Markdown");
        self
    }

    pub fn keyboard(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText {
    pub chat_id: ChatId,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: Option<&str>, last: Option<&str>) -> User {
        User {
            id: 7,
            first_name: "Siti".into(),
            last_name: last.map(str::to_string),
            username: username.map(str::to_string),
        }
    }

    #[test]
    fn actor_identity_prefers_username() {
        assert_eq!(user(Some("siti"), Some("Aminah")).actor_identity(), "@siti");
        assert_eq!(user(None, Some("Aminah")).actor_identity(), "Siti Aminah");
        assert_eq!(user(None, None).actor_identity(), "Siti");
    }

    #[test]
    fn chat_id_serializes_as_int_or_string() {
        let msg = SendMessage::new(ChatId::parse("12345"), "hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["chat_id"], 12345);
        assert!(json.get("parse_mode").is_none());

        let msg = SendMessage::new(ChatId::parse("@gerai_news"), "hi").markdown();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["chat_id"], "@gerai_news");
        assert_eq!(json["parse_mode"], "Markdown");
    }

    #[test]
    fn update_with_callback_parses() {
        let raw = r#"{
            "update_id": 10,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 1, "first_name": "A", "username": "alice"},
                "message": {"message_id": 5, "chat": {"id": 99}},
                "data": "update_gerai11"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let cb = update.callback_query.unwrap();
        assert_eq!(cb.data.as_deref(), Some("update_gerai11"));
        assert_eq!(cb.message.unwrap().chat.id, 99);
    }
}
