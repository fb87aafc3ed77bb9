use crate::domain::{ChatId, MessageId, MessageRef, UserId};

/// Kind of chat a message arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    /// One-to-one chat with the bot.
    Private,
    /// Groups, supergroups and channels.
    Group,
}

/// Transport-neutral inbound text message.
///
/// Telegram-specific fields should live in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct IncomingText {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub chat_kind: ChatKind,
    pub text: String,
}

impl IncomingText {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }
}

/// Outgoing "chat action" (presence indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    UploadVideo,
}
