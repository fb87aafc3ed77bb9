//! Message Router: intent dispatch and the per-request download flow.

use std::{path::PathBuf, sync::Arc};

use crate::{
    delivery::deliver,
    download::{DownloadOrchestrator, DownloadRequest},
    intent::{is_link, parse_intent, Intent},
    messaging::{port::MessagingPort, types::IncomingText},
    Result,
};

pub const TEXT_GREETING: &str = "Hi!\nI'm VideoDownloader Bot\n\
Just send me link to any video and I'll download it for you";
pub const TEXT_ABOUT: &str = "CuteDownloader by @Omny_N\n\
GitHub: https://github.com/omny-n/video-downloader-bot";
pub const TEXT_NOT_A_LINK: &str = "It's not a link :(";
pub const TEXT_DOWNLOADING: &str = "Downloading...";

/// Entry point for every inbound text message.
///
/// Holds no per-request state; concurrent calls are independent.
pub struct MessageRouter {
    messenger: Arc<dyn MessagingPort>,
    orchestrator: DownloadOrchestrator,
    temp_root: Option<PathBuf>,
}

impl MessageRouter {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        orchestrator: DownloadOrchestrator,
        temp_root: Option<PathBuf>,
    ) -> Self {
        Self {
            messenger,
            orchestrator,
            temp_root,
        }
    }

    /// Classify `msg` and run the matching handler. Unmatched text is ignored.
    pub async fn handle_message(&self, msg: &IncomingText) -> Result<()> {
        match parse_intent(&msg.text, msg.chat_kind) {
            Some(Intent::Start) => self.handle_start(msg).await,
            Some(Intent::Help) => self.handle_help(msg).await,
            Some(Intent::Download(candidate)) => {
                self.handle_download_intent(msg, &candidate).await
            }
            None => Ok(()),
        }
    }

    pub async fn handle_start(&self, msg: &IncomingText) -> Result<()> {
        self.messenger
            .reply_text(msg.message_ref(), TEXT_GREETING)
            .await?;
        Ok(())
    }

    pub async fn handle_help(&self, msg: &IncomingText) -> Result<()> {
        self.messenger
            .reply_text(msg.message_ref(), TEXT_ABOUT)
            .await?;
        Ok(())
    }

    /// Validate `candidate`, then acknowledge, download and deliver.
    ///
    /// The work directory is removed before returning, whatever the outcome.
    pub async fn handle_download_intent(
        &self,
        msg: &IncomingText,
        candidate: &str,
    ) -> Result<()> {
        if !is_link(candidate) {
            self.messenger
                .reply_text(msg.message_ref(), TEXT_NOT_A_LINK)
                .await?;
            return Ok(());
        }

        let request = DownloadRequest::new(candidate, self.temp_root.as_deref())?;
        let outcome = self.run_download(msg, &request).await;
        request.cleanup();
        outcome
    }

    async fn run_download(&self, msg: &IncomingText, request: &DownloadRequest) -> Result<()> {
        let ack = self
            .messenger
            .reply_text(msg.message_ref(), TEXT_DOWNLOADING)
            .await?;

        let result = self
            .orchestrator
            .download(request.url(), request.work_dir())
            .await;

        deliver(self.messenger.as_ref(), &result, ack).await
    }
}
