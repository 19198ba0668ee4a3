//! Update routing for the chat bot.
//!
//! The bot long-polls `getUpdates`, turns each message or button press into
//! a [`GeraiService`] call and replies with the rendered outcome.

use crate::client::{TelegramClient, POLL_TIMEOUT_SECS};
use crate::error::Result;
use crate::keyboard::{
    main_menu, stall_menu, BACK_TO_MAIN, SHOW_UPDATE_OPTIONS, SUBSCRIBE, UNSUBSCRIBE,
    UPDATE_PREFIX,
};
use crate::types::{CallbackQuery, Message, SendMessage, Update, User};
use gerai_core::render::{
    render_admin_outcome, render_snapshot, render_subscribe, render_unsubscribe,
    render_vote_outcome,
};
use gerai_core::service::CHECK_STATUS_ACTION;
use gerai_core::{GeraiError, GeraiService};
use std::sync::Arc;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(5);

const HELP_TEXT: &str = "Commands:\n\
/start - main menu\n\
/status - current status of every gerai\n\
/subscribe - get notified when a gerai opens or closes\n\
/unsubscribe - stop notifications\n\
/open <id>, /close <id> - admin override\n\
/help - this message";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    Subscribe,
    Unsubscribe,
    /// Admin override. `None` when the stall id argument is missing.
    Open(Option<String>),
    Close(Option<String>),
    Help,
}

/// Parse `/cmd[@botname] [arg]`. Anything else is not a command.
pub fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head);
    let arg = parts.next().map(str::to_lowercase);
    match name {
        "start" | "menu" => Some(Command::Start),
        "status" => Some(Command::Status),
        "subscribe" => Some(Command::Subscribe),
        "unsubscribe" => Some(Command::Unsubscribe),
        "open" => Some(Command::Open(arg)),
        "close" => Some(Command::Close(arg)),
        "help" => Some(Command::Help),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    ShowUpdateOptions,
    BackToMain,
    Status,
    Update(String),
    Subscribe,
    Unsubscribe,
}

pub fn parse_callback(data: &str) -> Option<Callback> {
    match data {
        SHOW_UPDATE_OPTIONS => Some(Callback::ShowUpdateOptions),
        BACK_TO_MAIN => Some(Callback::BackToMain),
        CHECK_STATUS_ACTION => Some(Callback::Status),
        SUBSCRIBE => Some(Callback::Subscribe),
        UNSUBSCRIBE => Some(Callback::Unsubscribe),
        _ => data
            .strip_prefix(UPDATE_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| Callback::Update(id.to_string())),
    }
}

/// Reply text for service errors a chat user can cause.
fn error_reply(err: &GeraiError) -> String {
    match err {
        GeraiError::UnknownStall(_) => "❌ Invalid gerai selected.".to_string(),
        GeraiError::NotAuthorized(_) => "⛔ Admin only.".to_string(),
        GeraiError::InvalidRecipient(_) => "❌ This chat cannot be subscribed.".to_string(),
        other => {
            tracing::warn!("request failed: {other}");
            "⚠️ Something went wrong. Please try again.".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

pub struct Bot {
    client: TelegramClient,
    service: Arc<GeraiService>,
}

impl Bot {
    pub fn new(client: TelegramClient, service: Arc<GeraiService>) -> Self {
        Self { client, service }
    }

    /// Poll forever. Errors are logged; a failed poll backs off briefly.
    pub async fn run(&self) {
        let mut offset: Option<i64> = None;
        tracing::info!("telegram bot polling");
        loop {
            match self.client.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        let id = update.update_id;
                        if let Err(e) = self.handle_update(update).await {
                            tracing::warn!(update_id = id, "update failed: {e}");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed: {e}");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    pub async fn handle_update(&self, update: Update) -> Result<()> {
        if let Some(cb) = update.callback_query {
            return self.handle_callback(cb).await;
        }
        if let Some(msg) = update.message {
            return self.handle_message(msg).await;
        }
        Ok(())
    }

    /// Run a service call on the blocking pool. Subscriber stores may touch
    /// the disk and a commit fans out to every subscriber inline.
    async fn blocking<T, F>(&self, f: F) -> gerai_core::Result<T>
    where
        F: FnOnce(&GeraiService) -> gerai_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = self.service.clone();
        match tokio::task::spawn_blocking(move || f(&service)).await {
            Ok(out) => out,
            Err(e) => Err(GeraiError::Io(std::io::Error::other(format!(
                "task join error: {e}"
            )))),
        }
    }

    fn menu_text(&self) -> String {
        format!("{} 🏪\nWhat would you like to do?", self.service.config().name)
    }

    async fn reply(&self, chat_id: i64, text: impl Into<String>) -> Result<()> {
        self.client
            .send_message(&SendMessage::new(chat_id, text))
            .await
            .map(|_| ())
    }

    async fn send_snapshot(&self, chat_id: i64) -> Result<()> {
        let text = render_snapshot(&self.service.status_snapshot());
        self.client
            .send_message(&SendMessage::new(chat_id, text).markdown())
            .await
            .map(|_| ())
    }

    async fn handle_message(&self, msg: Message) -> Result<()> {
        let Some(command) = msg.text.as_deref().and_then(parse_command) else {
            return Ok(());
        };
        let chat_id = msg.chat.id;
        match command {
            Command::Start => {
                let menu = SendMessage::new(chat_id, self.menu_text()).keyboard(main_menu());
                self.client.send_message(&menu).await?;
                Ok(())
            }
            Command::Status => self.send_snapshot(chat_id).await,
            Command::Subscribe => self.reply(chat_id, self.subscribe(chat_id).await).await,
            Command::Unsubscribe => self.reply(chat_id, self.unsubscribe(chat_id).await).await,
            Command::Open(None) | Command::Close(None) => {
                self.reply(chat_id, "Usage: /open <gerai id> or /close <gerai id>")
                    .await
            }
            Command::Open(Some(id)) => {
                let text = self.admin(msg.from.as_ref(), &id, true).await;
                self.reply(chat_id, text).await
            }
            Command::Close(Some(id)) => {
                let text = self.admin(msg.from.as_ref(), &id, false).await;
                self.reply(chat_id, text).await
            }
            Command::Help => self.reply(chat_id, HELP_TEXT).await,
        }
    }

    async fn handle_callback(&self, cb: CallbackQuery) -> Result<()> {
        let handled = match (&cb.message, cb.data.as_deref().and_then(parse_callback)) {
            (Some(msg), Some(action)) => self.dispatch_callback(&cb.from, msg, action).await,
            _ => Ok(()),
        };
        // Always clear the button's loading state, even if handling failed.
        let answered = self.client.answer_callback_query(&cb.id, None).await;
        handled.and(answered)
    }

    async fn dispatch_callback(&self, from: &User, msg: &Message, action: Callback) -> Result<()> {
        let chat_id = msg.chat.id;
        match action {
            Callback::ShowUpdateOptions => {
                self.client
                    .edit_message_text(
                        chat_id,
                        msg.message_id,
                        "Select a gerai to update its status:",
                        Some(stall_menu(self.service.registry())),
                    )
                    .await
            }
            Callback::BackToMain => {
                self.client
                    .edit_message_text(chat_id, msg.message_id, self.menu_text(), Some(main_menu()))
                    .await
            }
            Callback::Status => self.send_snapshot(chat_id).await,
            Callback::Update(stall_id) => {
                let actor = from.actor_identity();
                let id = stall_id.clone();
                let voted = self
                    .blocking(move |svc| svc.request_status_change(&id, &actor))
                    .await;
                let text = match voted {
                    Ok(outcome) => match self.service.registry().get(&stall_id) {
                        Some(stall) => render_vote_outcome(
                            stall,
                            &outcome,
                            &self.service.gate().window,
                        ),
                        None => error_reply(&GeraiError::UnknownStall(stall_id.clone())),
                    },
                    Err(e) => error_reply(&e),
                };
                self.reply(chat_id, text).await?;
                self.send_snapshot(chat_id).await?;
                self.client
                    .edit_message_text(
                        chat_id,
                        msg.message_id,
                        "Select another gerai to update its status:",
                        Some(stall_menu(self.service.registry())),
                    )
                    .await
            }
            Callback::Subscribe => self.reply(chat_id, self.subscribe(chat_id).await).await,
            Callback::Unsubscribe => self.reply(chat_id, self.unsubscribe(chat_id).await).await,
        }
    }

    async fn subscribe(&self, chat_id: i64) -> String {
        match self.blocking(move |svc| svc.subscribe(&chat_id.to_string())).await {
            Ok(outcome) => render_subscribe(outcome).to_string(),
            Err(e) => error_reply(&e),
        }
    }

    async fn unsubscribe(&self, chat_id: i64) -> String {
        match self.blocking(move |svc| svc.unsubscribe(&chat_id.to_string())).await {
            Ok(outcome) => render_unsubscribe(outcome).to_string(),
            Err(e) => error_reply(&e),
        }
    }

    /// Admins are listed by numeric user id or username; try both.
    fn admin_identity(&self, user: &User) -> String {
        let id = user.id.to_string();
        if self.service.is_admin(&id) {
            return id;
        }
        match &user.username {
            Some(name) if self.service.is_admin(name) => name.clone(),
            _ => id,
        }
    }

    async fn admin(&self, from: Option<&User>, stall_id: &str, is_open: bool) -> String {
        let Some(user) = from else {
            return error_reply(&GeraiError::NotAuthorized("anonymous".into()));
        };
        let admin = self.admin_identity(user);
        let id = stall_id.to_string();
        let changed = self
            .blocking(move |svc| svc.request_admin_status_change(&id, is_open, &admin))
            .await;
        match changed {
            Ok(outcome) => match self.service.registry().get(stall_id) {
                Some(stall) => render_admin_outcome(stall, &outcome),
                None => error_reply(&GeraiError::UnknownStall(stall_id.to_string())),
            },
            Err(e) => error_reply(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use gerai_core::clock::ManualClock;
    use gerai_core::config::Config;
    use gerai_core::notify::NullNotifier;
    use gerai_core::subscribers::{FileSubscribers, MemorySubscribers};
    use mockito::Matcher;

    fn service() -> Arc<GeraiService> {
        let now = FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .unwrap();
        let config = Config {
            admins: vec!["1001".into(), "warden".into()],
            subscribers_path: None,
            ..Config::default()
        };
        Arc::new(
            GeraiService::new(
                config,
                Arc::new(ManualClock::new(now)),
                Arc::new(MemorySubscribers::new()),
                Arc::new(NullNotifier),
            )
            .unwrap(),
        )
    }

    fn update(raw: &str) -> Update {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/menu"), Some(Command::Start));
        assert_eq!(parse_command("/status@GeraiBot"), Some(Command::Status));
        assert_eq!(
            parse_command("/open Gerai11"),
            Some(Command::Open(Some("gerai11".into())))
        );
        assert_eq!(parse_command("/close"), Some(Command::Close(None)));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/unknown"), None);
    }

    #[test]
    fn callbacks_parse() {
        assert_eq!(parse_callback("gerai_status"), Some(Callback::Status));
        assert_eq!(
            parse_callback("update_gerai17"),
            Some(Callback::Update("gerai17".into()))
        );
        assert_eq!(parse_callback("update_"), None);
        assert_eq!(parse_callback("bogus"), None);
    }

    #[tokio::test]
    async fn update_button_votes_replies_and_answers() {
        let mut server = mockito::Server::new_async().await;
        let send = server
            .mock("POST", "/botT/sendMessage")
            .with_body(r#"{"ok":true,"result":{"message_id":2,"chat":{"id":99}}}"#)
            .expect(2)
            .create_async()
            .await;
        let edit = server
            .mock("POST", "/botT/editMessageText")
            .with_body(r#"{"ok":true,"result":true}"#)
            .expect(1)
            .create_async()
            .await;
        let answer = server
            .mock("POST", "/botT/answerCallbackQuery")
            .match_body(Matcher::PartialJson(serde_json::json!({"callback_query_id": "cb1"})))
            .with_body(r#"{"ok":true,"result":true}"#)
            .expect(1)
            .create_async()
            .await;

        let svc = service();
        let bot = Bot::new(
            TelegramClient::with_base_url(server.url(), "T").unwrap(),
            svc.clone(),
        );
        bot.handle_update(update(
            r#"{"update_id":1,"callback_query":{"id":"cb1",
                "from":{"id":5,"first_name":"Alice","username":"alice"},
                "message":{"message_id":7,"chat":{"id":99}},
                "data":"update_gerai11"}}"#,
        ))
        .await
        .unwrap();

        send.assert_async().await;
        edit.assert_async().await;
        answer.assert_async().await;
        let snap = svc.status_snapshot();
        assert_eq!(snap.stall("gerai11").unwrap().pending_votes, 1);
    }

    #[tokio::test]
    async fn callback_answered_even_when_reply_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botT/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request"}"#)
            .create_async()
            .await;
        let answer = server
            .mock("POST", "/botT/answerCallbackQuery")
            .with_body(r#"{"ok":true,"result":true}"#)
            .expect(1)
            .create_async()
            .await;

        let bot = Bot::new(
            TelegramClient::with_base_url(server.url(), "T").unwrap(),
            service(),
        );
        let result = bot
            .handle_update(update(
                r#"{"update_id":1,"callback_query":{"id":"cb2",
                    "from":{"id":5,"first_name":"Alice"},
                    "message":{"message_id":7,"chat":{"id":99}},
                    "data":"gerai_status"}}"#,
            ))
            .await;
        assert!(result.is_err());
        answer.assert_async().await;
    }

    #[tokio::test]
    async fn subscribe_command_registers_chat() {
        let mut server = mockito::Server::new_async().await;
        let send = server
            .mock("POST", "/botT/sendMessage")
            .match_body(Matcher::Regex("Subscribed".into()))
            .with_body(r#"{"ok":true,"result":{"message_id":2,"chat":{"id":42}}}"#)
            .expect(1)
            .create_async()
            .await;

        let svc = service();
        let bot = Bot::new(
            TelegramClient::with_base_url(server.url(), "T").unwrap(),
            svc.clone(),
        );
        bot.handle_update(update(
            r#"{"update_id":3,"message":{"message_id":1,"chat":{"id":42},"text":"/subscribe"}}"#,
        ))
        .await
        .unwrap();
        send.assert_async().await;
        assert_eq!(svc.subscribers().unwrap(), vec!["42".to_string()]);
    }

    #[tokio::test]
    async fn open_command_requires_admin() {
        let mut server = mockito::Server::new_async().await;
        let denied = server
            .mock("POST", "/botT/sendMessage")
            .match_body(Matcher::Regex("Admin only".into()))
            .with_body(r#"{"ok":true,"result":{"message_id":2,"chat":{"id":42}}}"#)
            .expect(1)
            .create_async()
            .await;

        let svc = service();
        let bot = Bot::new(
            TelegramClient::with_base_url(server.url(), "T").unwrap(),
            svc.clone(),
        );
        bot.handle_update(update(
            r#"{"update_id":4,"message":{"message_id":1,"chat":{"id":42},
                "from":{"id":5,"first_name":"Mallory"},"text":"/open gerai11"}}"#,
        ))
        .await
        .unwrap();
        denied.assert_async().await;
        assert!(!svc.status_snapshot().stall("gerai11").unwrap().is_open);
    }

    #[tokio::test]
    async fn admin_by_username_can_open() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botT/sendMessage")
            .with_body(r#"{"ok":true,"result":{"message_id":2,"chat":{"id":42}}}"#)
            .create_async()
            .await;

        let svc = service();
        let bot = Bot::new(
            TelegramClient::with_base_url(server.url(), "T").unwrap(),
            svc.clone(),
        );
        bot.handle_update(update(
            r#"{"update_id":5,"message":{"message_id":1,"chat":{"id":42},
                "from":{"id":6,"first_name":"W","username":"warden"},"text":"/open gerai17"}}"#,
        ))
        .await
        .unwrap();
        let snap = svc.status_snapshot();
        let stall = snap.stall("gerai17").unwrap();
        assert!(stall.is_open);
        assert_eq!(stall.last_updated_by.as_deref(), Some("admin/warden"));
    }

    #[tokio::test]
    async fn subscription_commands_write_the_file_store() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botT/sendMessage")
            .with_body(r#"{"ok":true,"result":{"message_id":2,"chat":{"id":42}}}"#)
            .expect(2)
            .create_async()
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("subscribers.json");
        let now = FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .unwrap();
        let svc = Arc::new(
            GeraiService::new(
                Config::default(),
                Arc::new(ManualClock::new(now)),
                Arc::new(FileSubscribers::open(&path).unwrap()),
                Arc::new(NullNotifier),
            )
            .unwrap(),
        );
        let bot = Bot::new(
            TelegramClient::with_base_url(server.url(), "T").unwrap(),
            svc,
        );

        bot.handle_update(update(
            r#"{"update_id":5,"message":{"message_id":1,"chat":{"id":42},"text":"/subscribe"}}"#,
        ))
        .await
        .unwrap();
        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["42".to_string()]);

        bot.handle_update(update(
            r#"{"update_id":6,"message":{"message_id":2,"chat":{"id":42},"text":"/unsubscribe"}}"#,
        ))
        .await
        .unwrap();
        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }
}
