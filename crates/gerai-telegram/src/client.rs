use crate::error::{Result, TelegramError};
use crate::types::{
    ApiResponse, ChatId, EditMessageText, InlineKeyboardMarkup, Message, SendMessage, Update,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Long-poll wait passed to `getUpdates`, in seconds.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Thin async Bot API client. Every method is a JSON POST to
/// `{base}/bot{token}/{method}`.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        // Outlive the long poll so the server, not reqwest, ends each wait.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: &P) -> Result<R> {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);
        let resp = self.client.post(url).json(params).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        let parsed: ApiResponse<R> = serde_json::from_slice(&body)?;
        match parsed {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(TelegramError::Api {
                code: error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: description.unwrap_or_else(|| format!("{method} failed")),
            }),
        }
    }

    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        #[derive(Serialize)]
        struct Params<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            offset: Option<i64>,
            timeout: u64,
            allowed_updates: &'a [&'a str],
        }
        self.call(
            "getUpdates",
            &Params {
                offset,
                timeout: timeout_secs,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    pub async fn send_message(&self, message: &SendMessage) -> Result<Message> {
        self.call("sendMessage", message).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: impl Into<ChatId>,
        message_id: i64,
        text: impl Into<String>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let params = EditMessageText {
            chat_id: chat_id.into(),
            message_id,
            text: text.into(),
            reply_markup: markup,
        };
        // Responds with the edited Message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", &params).await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Params<'a> {
            callback_query_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<&'a str>,
        }
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &Params {
                    callback_query_id,
                    text,
                },
            )
            .await?;
        Ok(())
    }
}
