use super::load_config;
use anyhow::Context;
use gerai_core::config::WarnLevel;
use gerai_core::notify::{Notifier, NullNotifier};
use gerai_core::GeraiService;
use gerai_server::auth::ApiAuth;
use gerai_telegram::notifier::drain;
use gerai_telegram::{Bot, TelegramClient, TelegramNotifier};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How long shutdown waits for queued notifications to go out.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub fn run(
    config_path: &Path,
    port: u16,
    token: Option<String>,
    api_token: Option<String>,
    no_bot: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("config: {}", w.message),
            WarnLevel::Error => {
                anyhow::bail!("config: {} (run `gerai config validate`)", w.message)
            }
        }
    }

    let token = match (no_bot, token.filter(|t| !t.trim().is_empty())) {
        (true, _) => None,
        (false, Some(t)) => Some(t),
        (false, None) => {
            tracing::warn!("no bot token (--token / GERAI_BOT_TOKEN); serving the HTTP API only");
            None
        }
    };

    let auth = match api_token {
        Some(t) => ApiAuth::with_token(t),
        None => ApiAuth::locked(),
    };
    if auth.is_locked() {
        tracing::warn!(
            "no API token (--api-token / GERAI_API_TOKEN); voting, admin and subscriber routes will refuse requests"
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut bot_parts = None;
        let notifier: Arc<dyn Notifier> = match token {
            Some(token) => {
                let client =
                    TelegramClient::new(token).context("failed to build Telegram client")?;
                let (notifier, queue) = TelegramNotifier::channel();
                bot_parts = Some((client, queue));
                Arc::new(notifier)
            }
            None => Arc::new(NullNotifier),
        };

        let service = Arc::new(GeraiService::from_config(config, notifier)?);
        tracing::info!(
            name = %service.config().name,
            stalls = service.registry().len(),
            hours = %service.gate().window.label(),
            "gerai service ready"
        );

        let scheduler = gerai_server::scheduler::spawn_auto_close(service.clone());
        let (bot_task, delivery_task) = match bot_parts {
            Some((client, queue)) => {
                let delivery = queue.spawn(client.clone());
                let bot = Bot::new(client, service.clone());
                (Some(tokio::spawn(async move { bot.run().await })), Some(delivery))
            }
            None => (None, None),
        };

        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        println!("gerai API → http://localhost:{}", listener.local_addr()?.port());

        let result = tokio::select! {
            res = gerai_server::serve_on(service.clone(), listener, auth) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        };

        // Stop everything holding the service so the delivery queue closes,
        // then let it send what was already queued.
        scheduler.abort();
        let _ = scheduler.await;
        if let Some(task) = bot_task {
            task.abort();
            let _ = task.await;
        }
        drop(service);
        if let Some(delivery) = delivery_task {
            if !drain(delivery, DRAIN_TIMEOUT).await {
                tracing::warn!("shutdown: undelivered notifications dropped");
            }
        }
        result
    })
}
