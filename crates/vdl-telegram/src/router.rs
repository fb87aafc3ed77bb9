use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher,
    dptree,
    prelude::*,
    types::{Chat, Message},
};

use vdl_core::{
    config::Config,
    domain::{ChatId, MessageId, UserId},
    download::DownloadOrchestrator,
    messaging::{
        port::MessagingPort,
        types::{ChatKind, IncomingText},
    },
    router::MessageRouter,
};

use crate::TelegramMessenger;

/// Run the long-polling loop until the process is terminated.
pub async fn run_polling(
    cfg: Arc<Config>,
    orchestrator: DownloadOrchestrator,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_api_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        tracing::info!("vdl started: @{}", me.username());
    }
    tracing::info!(
        yt_dlp = %cfg.ytdlp_path.display(),
        timeout_secs = cfg.download_timeout.as_secs(),
        "download backend"
    );

    // Updates queued while the bot was offline are skipped.
    bot.delete_webhook().drop_pending_updates(true).await?;

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let router = Arc::new(MessageRouter::new(messenger, orchestrator, cfg.temp_dir.clone()));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        // No per-chat ordering: every update is its own independent task.
        .distribution_function(|_| None::<std::convert::Infallible>)
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, router: Arc<MessageRouter>) -> ResponseResult<()> {
    let Some(incoming) = to_incoming(&msg) else {
        return Ok(());
    };

    // Failures stay inside this update; the dispatcher keeps serving others.
    if let Err(e) = router.handle_message(&incoming).await {
        tracing::error!(
            chat_id = incoming.chat_id.0,
            user_id = ?incoming.user_id.map(|u| u.0),
            error = %e,
            "failed to handle message"
        );
    }

    Ok(())
}

fn to_incoming(msg: &Message) -> Option<IncomingText> {
    let text = msg.text()?;
    Some(IncomingText {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        chat_kind: chat_kind(&msg.chat),
        text: text.to_string(),
    })
}

/// Groups, supergroups and channels all count as non-private.
fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::Group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(chat: serde_json::Value, extra: serde_json::Value) -> Message {
        let mut raw = json!({
            "message_id": 11,
            "date": 1_700_000_000,
            "chat": chat,
            "from": { "id": 7, "is_bot": false, "first_name": "A" },
        });
        if let (Some(obj), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
            obj.extend(extra.clone());
        }
        serde_json::from_value(raw).unwrap()
    }

    fn private_chat() -> serde_json::Value {
        json!({ "id": 7, "type": "private", "first_name": "A" })
    }

    #[test]
    fn private_text_message_maps_to_private_incoming() {
        let msg = message(private_chat(), json!({ "text": "https://example.com/v" }));

        let incoming = to_incoming(&msg).unwrap();

        assert_eq!(incoming.chat_kind, ChatKind::Private);
        assert_eq!(incoming.chat_id, ChatId(7));
        assert_eq!(incoming.message_id, MessageId(11));
        assert_eq!(incoming.user_id, Some(UserId(7)));
        assert_eq!(incoming.text, "https://example.com/v");
    }

    #[test]
    fn groups_supergroups_and_channels_are_not_private() {
        let chats = [
            json!({ "id": -100, "type": "group", "title": "G" }),
            json!({ "id": -1001, "type": "supergroup", "title": "S" }),
            json!({ "id": -1002, "type": "channel", "title": "C" }),
        ];
        for chat in chats {
            let msg = message(chat, json!({ "text": "https://example.com/v" }));
            assert_eq!(chat_kind(&msg.chat), ChatKind::Group);
            assert_eq!(to_incoming(&msg).unwrap().chat_kind, ChatKind::Group);
        }
    }

    #[test]
    fn message_without_text_is_skipped() {
        let msg = message(
            private_chat(),
            json!({ "location": { "longitude": 1.5, "latitude": 2.5 } }),
        );

        assert!(to_incoming(&msg).is_none());
    }
}
