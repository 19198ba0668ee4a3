use crate::client::TelegramClient;
use crate::keyboard::options_keyboard;
use crate::types::{ChatId, SendMessage};
use gerai_core::notify::{Notification, Notifier, NotifyError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A message waiting to be sent by the delivery task.
#[derive(Debug)]
pub struct Delivery {
    pub recipient: String,
    pub message: SendMessage,
}

/// Queues each notification for the background delivery task so commits
/// never wait on the network.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    tx: mpsc::UnboundedSender<Delivery>,
}

/// Receiving end of a [`TelegramNotifier`].
#[derive(Debug)]
pub struct DeliveryQueue {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl TelegramNotifier {
    pub fn channel() -> (Self, DeliveryQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DeliveryQueue { rx })
    }
}

impl Notifier for TelegramNotifier {
    fn deliver(&self, recipient: &str, notification: &Notification) -> Result<(), NotifyError> {
        let mut message = SendMessage::new(ChatId::parse(recipient), notification.text());
        if let Some(kb) = options_keyboard(&notification.options) {
            message = message.keyboard(kb);
        }
        self.tx
            .send(Delivery {
                recipient: recipient.to_string(),
                message,
            })
            .map_err(|_| NotifyError::new(recipient, "delivery queue closed"))
    }
}

impl DeliveryQueue {
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Drain the queue through `client` until every notifier is dropped.
    pub fn spawn(mut self, client: TelegramClient) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(delivery) = self.recv().await {
                if let Err(e) = client.send_message(&delivery.message).await {
                    tracing::warn!(recipient = %delivery.recipient, "notification failed: {e}");
                }
            }
        })
    }
}

/// Wait up to `limit` for a spawned queue to send what is already queued.
///
/// The queue finishes only after every [`TelegramNotifier`] is dropped, so
/// release the service first. Returns `false` if the limit ran out and the
/// remaining deliveries were abandoned.
pub async fn drain(handle: JoinHandle<()>, limit: Duration) -> bool {
    let abort = handle.abort_handle();
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!("delivery task failed: {e}");
            false
        }
        Err(_) => {
            abort.abort();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use gerai_core::notify::{ChangeCause, NotifyOption};

    fn notification() -> Notification {
        Notification {
            stall_id: "gerai11".into(),
            stall_name: "Gerai 11".into(),
            is_open: true,
            cause: ChangeCause::Vote {
                voters: vec!["@a".into(), "@b".into()],
            },
            at: FixedOffset::east_opt(8 * 3600)
                .unwrap()
                .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
                .unwrap(),
            options: vec![NotifyOption::new("📊 Check All Gerai Status", "gerai_status")],
        }
    }

    #[tokio::test]
    async fn deliver_queues_message_with_buttons() {
        let (notifier, mut queue) = TelegramNotifier::channel();
        notifier.deliver("42", &notification()).unwrap();
        let d = queue.recv().await.unwrap();
        assert_eq!(d.recipient, "42");
        assert_eq!(d.message.chat_id, ChatId::Id(42));
        assert!(d.message.text.contains("Gerai 11"));
        let kb = d.message.reply_markup.unwrap();
        assert_eq!(kb.inline_keyboard[0][0].callback_data, "gerai_status");
    }

    #[tokio::test]
    async fn closed_queue_is_a_delivery_error() {
        let (notifier, queue) = TelegramNotifier::channel();
        drop(queue);
        let err = notifier.deliver("42", &notification()).unwrap_err();
        assert_eq!(err.recipient, "42");
    }

    #[tokio::test]
    async fn spawned_queue_sends_through_client() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botT/sendMessage")
            .with_body(r#"{"ok":true,"result":{"message_id":1,"chat":{"id":42}}}"#)
            .expect(1)
            .create_async()
            .await;

        let (notifier, queue) = TelegramNotifier::channel();
        let client = TelegramClient::with_base_url(server.url(), "T").unwrap();
        let handle = queue.spawn(client);
        notifier.deliver("42", &notification()).unwrap();
        drop(notifier);
        handle.await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn drain_sends_everything_queued_before_shutdown() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botT/sendMessage")
            .with_body(r#"{"ok":true,"result":{"message_id":1,"chat":{"id":42}}}"#)
            .expect(2)
            .create_async()
            .await;

        let (notifier, queue) = TelegramNotifier::channel();
        notifier.deliver("42", &notification()).unwrap();
        notifier.deliver("43", &notification()).unwrap();
        let client = TelegramClient::with_base_url(server.url(), "T").unwrap();
        let handle = queue.spawn(client);
        drop(notifier);

        assert!(drain(handle, Duration::from_secs(5)).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn drain_gives_up_while_a_notifier_is_alive() {
        let server = mockito::Server::new_async().await;
        let (notifier, queue) = TelegramNotifier::channel();
        let client = TelegramClient::with_base_url(server.url(), "T").unwrap();
        let handle = queue.spawn(client);

        assert!(!drain(handle, Duration::from_millis(20)).await);
        drop(notifier);
    }
}
