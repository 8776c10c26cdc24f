//! Free-text handler: every TikTok link in a message is fetched and sent back,
//! one after another.

use std::time::Duration;

use teloxide::types::ChatId;

use super::types::IncomingRequest;
use crate::core::error::AppResult;
use crate::download::classify::classify_failure;
use crate::download::links::extract_video_urls;
use crate::download::pipeline::{DownloadedVideo, RetrievalOutcome, RetrievalPipeline};
use crate::telegram::delivery::{build_caption, delete_best_effort, Delivery, VideoUpload};

/// Reply when a message contains no TikTok link
pub const NO_URL_REPLY: &str = "Please send a valid TikTok URL.";

/// Transient status shown while a video is being fetched
pub const STATUS_TEXT: &str = "Downloading... This might take a moment! ⏳";

/// Reply for a video over the upload ceiling.
pub fn too_large_message(max_file_size_mb: u64) -> String {
    format!(
        "Video is too large (>{}MB) for Telegram. Try another video or ask for compression help!",
        max_file_size_mb
    )
}

/// Handles one text message.
///
/// No links: a single corrective reply and nothing else. Otherwise the
/// request message is deleted (best-effort) and each link is processed in
/// order, followed by `delay` before the next one starts. A Telegram error
/// while handling one link is logged and does not stop the remaining links.
pub async fn handle_link_message(
    delivery: &dyn Delivery,
    pipeline: &RetrievalPipeline,
    delay: Duration,
    request: &IncomingRequest,
) -> AppResult<()> {
    let urls = extract_video_urls(&request.text);
    if urls.is_empty() {
        delivery.send_text(request.chat_id, NO_URL_REPLY).await?;
        return Ok(());
    }

    log::info!("Found {} TikTok link(s) in {}", urls.len(), request.summary());
    delete_best_effort(delivery, request.chat_id, request.message_id).await;

    for url in &urls {
        if let Err(e) = process_url(delivery, pipeline, request.chat_id, url).await {
            log::error!("Failed to deliver {} for {}: {}", url, request.summary(), e);
        }
        tokio::time::sleep(delay).await;
    }

    Ok(())
}

async fn process_url(delivery: &dyn Delivery, pipeline: &RetrievalPipeline, chat_id: ChatId, url: &str) -> AppResult<()> {
    let status = delivery.send_text(chat_id, STATUS_TEXT).await?;

    let result = match pipeline.retrieve(url).await {
        RetrievalOutcome::Success(mut video) => {
            let sent = send_downloaded(delivery, chat_id, url, &video).await;
            if let Err(e) = video.cleanup().await {
                log::warn!("Failed to remove {}: {}", video.file.path().display(), e);
            }
            sent
        }
        RetrievalOutcome::TooLarge { .. } => delivery
            .send_text(chat_id, &too_large_message(pipeline.settings().max_file_size_mb))
            .await
            .map(|_| ()),
        RetrievalOutcome::Failed(failure) => {
            log::info!("Reporting {} failure for {}", failure.label(), url);
            delivery.send_text(chat_id, &failure.user_message(url)).await.map(|_| ())
        }
    };

    delete_best_effort(delivery, chat_id, status).await;
    result
}

/// Opens and uploads the video. Open or upload failures are reported to the
/// user like extraction failures.
async fn send_downloaded(
    delivery: &dyn Delivery,
    chat_id: ChatId,
    url: &str,
    video: &DownloadedVideo,
) -> AppResult<()> {
    let file = match video.open().await {
        Ok(file) => file,
        Err(e) => {
            log::error!("Download error for {}: cannot open {}: {}", url, video.file.path().display(), e);
            let failure = classify_failure(&e.failure_text());
            delivery.send_text(chat_id, &failure.user_message(url)).await?;
            return Ok(());
        }
    };

    let upload = VideoUpload {
        file,
        file_name: video.file_name(),
        caption: build_caption(video.uploader.as_deref()),
    };

    if let Err(e) = delivery.send_video(chat_id, upload).await {
        log::error!("Failed to send video for {}: {}", url, e);
        let failure = classify_failure(&e.failure_text());
        delivery.send_text(chat_id, &failure.user_message(url)).await?;
        return Ok(());
    }

    log::info!(
        "Sent \"{}\" ({} bytes) to chat {}",
        video.title.as_deref().unwrap_or("untitled"),
        video.size,
        chat_id
    );
    Ok(())
}
