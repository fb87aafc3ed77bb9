//! Delivery Handler: turns a [`DownloadResult`] into acknowledgment edits and the upload.

use crate::{
    domain::MessageRef,
    download::DownloadResult,
    errors::Error,
    messaging::{port::MessagingPort, types::ChatAction},
    Result,
};

pub const TEXT_SENDING: &str = "Download complete! Sending now...";
pub const TEXT_SUCCESS: &str = "Download success!";
pub const TEXT_FETCH_FAILED: &str = "Download failed. Check your link or try again.";
pub const TEXT_TOO_LARGE: &str = "Download failed. File is large :(";

/// Finalize the acknowledgment `ack` and, on success, upload the file as a reply to it.
///
/// A rejected attachment is reported to the user and swallowed; any other
/// transport error propagates.
pub async fn deliver(
    messenger: &dyn MessagingPort,
    result: &DownloadResult,
    ack: MessageRef,
) -> Result<()> {
    let file_path = match result {
        DownloadResult::Failure { .. } => {
            return messenger.edit_text(ack, TEXT_FETCH_FAILED).await;
        }
        DownloadResult::Success { file_path } => file_path,
    };

    messenger.edit_text(ack, TEXT_SENDING).await?;
    messenger
        .send_chat_action(ack.chat_id, ChatAction::UploadVideo)
        .await?;

    match messenger
        .send_video(ack.chat_id, file_path, Some(ack.message_id))
        .await
    {
        Ok(_) => messenger.edit_text(ack, TEXT_SUCCESS).await,
        Err(Error::AttachmentRejected(reason)) => {
            tracing::warn!(path = %file_path.display(), %reason, "video upload rejected");
            messenger.edit_text(ack, TEXT_TOO_LARGE).await
        }
        Err(e) => Err(e),
    }
}
