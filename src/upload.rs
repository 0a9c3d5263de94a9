use std::sync::Arc;

use uuid::Uuid;

use crate::backend::Backend;
use crate::error::UploadError;
use crate::models::*;

const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Size and type limits checked before a byte leaves the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_content_types: [
                "video/mp4",
                "video/webm",
                "video/quicktime",
                "video/x-matroska",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, file: &MediaFile) -> Result<(), UploadError> {
        if file.is_empty() {
            return Err(UploadError::Rejected(format!("{} is empty", file.file_name)));
        }
        if file.len() > self.max_bytes {
            return Err(UploadError::Rejected(format!(
                "{} is {} bytes, the limit is {}",
                file.file_name,
                file.len(),
                self.max_bytes
            )));
        }
        // "video/mp4; codecs=avc1" -> "video/mp4"
        let essence = file
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !self.allowed_content_types.iter().any(|t| t.eq_ignore_ascii_case(&essence)) {
            return Err(UploadError::Rejected(format!(
                "{} has unsupported type {}",
                file.file_name, file.content_type
            )));
        }
        Ok(())
    }
}

/// Converts byte counts into a 0-100 figure that never goes backwards.
/// Transfer progress tops out at 99; only [`ProgressTracker::finish`]
/// reports 100, once the media service has answered.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value to report, or `None` if it would not advance.
    pub fn observe(&mut self, sent: u64, total: u64) -> Option<u8> {
        let percent = if total == 0 {
            0
        } else {
            let scaled = u128::from(sent.min(total)) * 100 / u128::from(total);
            u8::try_from(scaled).unwrap_or(100).min(99)
        };
        self.advance(percent)
    }

    pub fn finish(&mut self) -> Option<u8> {
        self.advance(100)
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    fn advance(&mut self, percent: u8) -> Option<u8> {
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}

/// Upload state shown on the lesson form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    InFlight { percent: u8 },
    Completed(MediaRef),
    Failed(String),
}

impl UploadStatus {
    /// The form cannot be submitted while bytes are still moving.
    pub fn blocks_submit(&self) -> bool {
        matches!(self, UploadStatus::InFlight { .. })
    }

    pub fn media_id(&self) -> Option<&MediaId> {
        match self {
            UploadStatus::Completed(media) => Some(&media.media_id),
            _ => None,
        }
    }
}

pub struct UploadPipeline<B: ?Sized> {
    backend: Arc<B>,
    policy: UploadPolicy,
}

impl<B: Backend + ?Sized> UploadPipeline<B> {
    pub fn new(backend: Arc<B>, policy: UploadPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Streams `file` to the media service. `on_progress` sees a
    /// non-decreasing percentage and, on success, a final 100 before this
    /// returns.
    pub async fn upload_video(
        &self,
        file: MediaFile,
        actor: ActorId,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<MediaRef, UploadError> {
        self.policy.check(&file)?;

        let upload_id = Uuid::new_v4();
        let file_name = file.file_name.clone();
        tracing::info!(%upload_id, file_name = %file_name, bytes = file.len(), "upload started");

        let mut tracker = ProgressTracker::new();
        let result = {
            let mut report = |sent: u64, total: u64| {
                if let Some(percent) = tracker.observe(sent, total) {
                    on_progress(percent);
                }
            };
            self.backend.upload_video(file, actor, &mut report).await
        };

        match result {
            Ok(media) => {
                if let Some(percent) = tracker.finish() {
                    on_progress(percent);
                }
                tracing::info!(%upload_id, media_id = %media.media_id, "upload finished");
                Ok(media)
            }
            Err(e) => {
                tracing::error!(%upload_id, file_name = %file_name, error = %e, "upload failed");
                Err(UploadError::Transfer(e))
            }
        }
    }

    /// Runs an upload for a form, keeping `status` in step with it.
    pub async fn upload_into(
        &self,
        status: &mut UploadStatus,
        file: MediaFile,
        actor: ActorId,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<MediaRef, UploadError> {
        *status = UploadStatus::InFlight { percent: 0 };
        let result = {
            let shown = &mut *status;
            let mut report = |percent: u8| {
                *shown = UploadStatus::InFlight { percent };
                on_progress(percent);
            };
            self.upload_video(file, actor, &mut report).await
        };
        *status = match &result {
            Ok(media) => UploadStatus::Completed(media.clone()),
            Err(e) => UploadStatus::Failed(e.to_string()),
        };
        result
    }

    /// Produces a playable URL. Referenced media is re-signed on every call;
    /// signed URLs are never kept.
    pub async fn resolve_url(
        &self,
        source: &VideoSource,
        actor: ActorId,
    ) -> Result<String, UploadError> {
        match source {
            VideoSource::Direct { url } => Ok(url.clone()),
            VideoSource::ByReference { media_id } => self.sign(media_id, actor).await,
        }
    }

    /// `None` for lessons that have no video.
    pub async fn playback_url(
        &self,
        lesson: &Lesson,
        actor: ActorId,
    ) -> Result<Option<String>, UploadError> {
        match &lesson.content {
            LessonContent::Video { source } => self.resolve_url(source, actor).await.map(Some),
            _ => Ok(None),
        }
    }

    pub async fn attached_media(
        &self,
        lesson_id: LessonId,
        actor: ActorId,
    ) -> Result<Vec<MediaRef>, UploadError> {
        let listed = self
            .backend
            .list_media_by_lesson(lesson_id)
            .await
            .map_err(UploadError::Transfer)?;
        let mut resolved = Vec::with_capacity(listed.len());
        for media in listed {
            let url = self.sign(&media.id, actor).await?;
            resolved.push(MediaRef {
                media_id: media.id,
                url,
            });
        }
        Ok(resolved)
    }

    async fn sign(&self, media_id: &MediaId, actor: ActorId) -> Result<String, UploadError> {
        self.backend
            .get_signed_media_url(media_id, actor)
            .await
            .map_err(|source| UploadError::Resolve {
                media_id: media_id.to_string(),
                source,
            })
    }
}
