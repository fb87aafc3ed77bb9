//! Telegram adapter (teloxide).
//!
//! This crate implements the `vdl-core` MessagingPort over Telegram Bot API.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::InputFile,
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod router;

use vdl_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::ChatAction},
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// Uploads fail with a network error (connection reset mid-body) or an
    /// explicit 413 when the file exceeds the Bot API limit.
    fn map_upload_err(e: RequestError) -> Error {
        match e {
            RequestError::Network(_) | RequestError::Api(ApiError::RequestEntityTooLarge) => {
                Error::AttachmentRejected(e.to_string())
            }
            other => Self::map_err(other),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        self.with_retry_raw(&mut op).await.map_err(Self::map_err)
    }

    async fn with_retry_raw<T, Fut>(
        &self,
        op: &mut impl FnMut() -> Fut,
    ) -> std::result::Result<T, RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(to.chat_id), text.to_string())
                    .reply_to_message_id(Self::tg_msg_id(to.message_id))
            })
            .await?;

        Ok(MessageRef {
            chat_id: to.chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            )
        })
        .await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::UploadVideo => teloxide::types::ChatAction::UploadVideo,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat_id: ChatId,
        path: &Path,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let mut op = || {
            let mut req = self
                .bot
                .send_video(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()));
            if let Some(id) = reply_to {
                req = req.reply_to_message_id(Self::tg_msg_id(id));
            }
            req
        };
        let msg = self
            .with_retry_raw(&mut op)
            .await
            .map_err(Self::map_upload_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}
