use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::ChatAction,
    Result,
};

/// Outbound side of the chat transport.
///
/// One instance is shared by every in-flight request; implementations must be
/// safe to call concurrently.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send `text` as a reply to `to` and return the new message.
    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef>;

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;

    /// Upload the file at `path` as a video.
    ///
    /// Returns `Error::AttachmentRejected` when the transport refuses the upload
    /// (network-class failure, typically the file is too large).
    async fn send_video(
        &self,
        chat_id: ChatId,
        path: &Path,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;
}
