//! Create, update and delete for every node of the authoring tree.
//!
//! Each operation validates locally, calls the backend, and only touches the
//! store once the backend has answered successfully. A rejected call leaves
//! the store and any open modal as they were.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::Backend;
use crate::error::{AuthoringError, BackendError, Result, ValidationError};
use crate::models::*;
use crate::ordering::next_order_index;
use crate::store::EntityStore;
use crate::upload::{UploadPipeline, UploadStatus};

const MAX_LESSON_SECONDS: i64 = 24 * 60 * 60;
const MAX_QUESTION_SCORE: i64 = 100;
const MAX_ASSIGNMENT_SCORE: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    /// Creating a child under `subject`.
    Create,
    Edit,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenModal {
    pub subject: EntityRef,
    pub mode: ModalMode,
}

#[derive(Debug, Default)]
pub struct ModalState {
    open: Option<OpenModal>,
}

impl ModalState {
    pub fn current(&self) -> Option<OpenModal> {
        self.open
    }

    pub fn open(&mut self, subject: EntityRef, mode: ModalMode) {
        self.open = Some(OpenModal { subject, mode });
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    /// Closes the modal if its subject is `target` or sits beneath it.
    pub fn close_within(&mut self, target: &EntityRef) -> bool {
        match self.open {
            Some(modal) if modal.subject.is_within(target) => {
                self.open = None;
                true
            }
            _ => false,
        }
    }

    fn close_exact(&mut self, target: &EntityRef, mode: ModalMode) {
        if self.open == Some(OpenModal { subject: *target, mode }) {
            self.open = None;
        }
    }

    fn close_edit_of(&mut self, target: &EntityRef) {
        let editing =
            |modal: &OpenModal| modal.subject == *target && modal.mode != ModalMode::Create;
        if self.open.as_ref().is_some_and(editing) {
            self.open = None;
        }
    }
}

/// A delete the author has been asked to confirm. Only
/// [`MutationCoordinator::request_delete`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    target: EntityRef,
    label: String,
}

impl PendingDelete {
    pub fn target(&self) -> EntityRef {
        self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn prompt(&self) -> String {
        let kind = self.target.to_string();
        let kind = kind.split(' ').next().unwrap_or("item");
        format!("Delete {kind} \"{}\"? This cannot be undone.", self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDraft {
    pub title: String,
    pub description: String,
}

/// Lesson creation form. The type is chosen here and nowhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDraft {
    pub title: String,
    pub kind: LessonKind,
    pub body: String,
    pub video_url: Option<String>,
    pub duration_sec: u32,
    pub upload: UploadStatus,
}

impl LessonDraft {
    pub fn new(kind: LessonKind, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            body: String::new(),
            video_url: None,
            duration_sec: 0,
            upload: UploadStatus::Idle,
        }
    }
}

/// Lesson edit form. It has no type field; a lesson's type is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonEdit {
    pub title: String,
    pub duration_sec: u32,
    pub body: Option<String>,
    pub video_url: Option<String>,
    /// Media the lesson already references. Kept unless a new upload
    /// completes or a URL is entered.
    pub media_id: Option<MediaId>,
    pub upload: UploadStatus,
}

impl LessonEdit {
    pub fn from_lesson(lesson: &Lesson) -> Self {
        let (body, video_url, media_id) = match &lesson.content {
            LessonContent::Reading { body } => (Some(body.clone()), None, None),
            LessonContent::Video {
                source: VideoSource::Direct { url },
            } => (None, Some(url.clone()), None),
            LessonContent::Video {
                source: VideoSource::ByReference { media_id },
            } => (None, None, Some(media_id.clone())),
            _ => (None, None, None),
        };
        Self {
            title: lesson.title.clone(),
            duration_sec: lesson.duration_sec,
            body,
            video_url,
            media_id,
            upload: UploadStatus::Idle,
        }
    }

    fn video_source(&self) -> Result<VideoSource, ValidationError> {
        match (video_source(&self.upload, self.video_url.as_ref()), &self.media_id) {
            (Err(ValidationError::MissingField(_)), Some(media_id)) => Ok(VideoSource::ByReference {
                media_id: media_id.clone(),
            }),
            (source, _) => source,
        }
    }

    /// Title and duration, checked the same way before and after an upload.
    fn header(&self) -> Result<String, ValidationError> {
        let title = required("title", &self.title)?;
        in_range("duration", i64::from(self.duration_sec), 0, MAX_LESSON_SECONDS)?;
        Ok(title)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub pass_score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub text: String,
    pub question_type: QuestionType,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionDraft {
    pub text: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDraft {
    pub title: String,
    pub description: String,
    pub submission_type: SubmissionType,
    pub max_score: u32,
    pub due_at: Option<DateTime<Utc>>,
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn required_opt(
    field: &'static str,
    value: Option<&String>,
) -> Result<Option<String>, ValidationError> {
    value.map(|v| required(field, v)).transpose()
}

fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(())
}

fn check_question_option_count(question: &Question) -> Result<(), ValidationError> {
    if question.question_type == QuestionType::TrueFalse && question.options.len() >= 2 {
        return Err(ValidationError::TooManyOptions);
    }
    Ok(())
}

fn video_source(
    upload: &UploadStatus,
    video_url: Option<&String>,
) -> Result<VideoSource, ValidationError> {
    if upload.blocks_submit() {
        return Err(ValidationError::UploadInFlight);
    }
    if let Some(media_id) = upload.media_id() {
        return Ok(VideoSource::ByReference {
            media_id: media_id.clone(),
        });
    }
    match video_url.map(|u| u.trim()).filter(|u| !u.is_empty()) {
        Some(url) => Ok(VideoSource::Direct { url: url.to_string() }),
        None => Err(ValidationError::MissingField("video")),
    }
}

fn lesson_header(draft: &LessonDraft) -> Result<String, ValidationError> {
    let title = required("title", &draft.title)?;
    in_range("duration", i64::from(draft.duration_sec), 0, MAX_LESSON_SECONDS)?;
    Ok(title)
}

fn lesson_payload(draft: &LessonDraft, order_index: u32) -> Result<NewLesson, ValidationError> {
    let title = lesson_header(draft)?;
    let content = match draft.kind {
        LessonKind::Video => LessonContent::Video {
            source: video_source(&draft.upload, draft.video_url.as_ref())?,
        },
        LessonKind::Reading => LessonContent::Reading {
            body: required("body", &draft.body)?,
        },
        LessonKind::Quiz => LessonContent::Quiz,
        LessonKind::Assignment => LessonContent::Assignment,
        LessonKind::CodeLab => LessonContent::CodeLab,
    };
    Ok(NewLesson {
        title,
        content,
        order_index,
        duration_sec: draft.duration_sec,
    })
}

pub struct MutationCoordinator<B: ?Sized> {
    backend: Arc<B>,
    uploads: UploadPipeline<B>,
    modal: ModalState,
}

impl<B: Backend + ?Sized> MutationCoordinator<B> {
    pub fn new(backend: Arc<B>, uploads: UploadPipeline<B>) -> Self {
        Self {
            backend,
            uploads,
            modal: ModalState::default(),
        }
    }

    pub fn uploads(&self) -> &UploadPipeline<B> {
        &self.uploads
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut ModalState {
        &mut self.modal
    }

    /// Fails with a stale reference, closing anything open under `target`.
    fn stale<T>(&mut self, target: EntityRef) -> Result<T> {
        tracing::warn!(entity = %target, "operation on a removed entity");
        self.modal.close_within(&target);
        Err(AuthoringError::StaleReference(target))
    }

    fn ensure_present(&mut self, store: &EntityStore, target: EntityRef) -> Result<()> {
        if store.contains(&target) {
            Ok(())
        } else {
            self.stale(target)
        }
    }

    /// Maps a failed fetch of a single record: 404 means the record is gone.
    fn fetch_failed<T>(
        &mut self,
        store: &mut EntityStore,
        target: EntityRef,
        e: BackendError,
    ) -> Result<T> {
        let missing = matches!(
            &e,
            BackendError::Status { status, .. } if *status == http::StatusCode::NOT_FOUND
        );
        if missing {
            match target {
                EntityRef::Lesson { lesson_id, .. } => store.remove_lesson(lesson_id),
                EntityRef::Quiz { quiz_id, .. } => store.remove_quiz(quiz_id),
                EntityRef::Assignment { assignment_id, .. } => {
                    store.remove_assignment(assignment_id)
                }
                _ => false,
            };
            return self.stale(target);
        }
        Err(AuthoringError::remote("load", e))
    }

    fn rejected(
        operation: &'static str,
        target: impl std::fmt::Display,
        e: BackendError,
    ) -> AuthoringError {
        tracing::error!(entity = %target, error = %e, "{operation} rejected");
        AuthoringError::remote(operation, e)
    }

    // --- course header ---

    pub async fn update_course(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        patch: CoursePatch,
    ) -> Result<Course> {
        let course_id = store.course().map(|c| c.id).ok_or(ValidationError::NoCourseSelected)?;
        let patch = CoursePatch {
            title: required_opt("title", patch.title.as_ref())?,
            ..patch
        };
        let course = self
            .backend
            .update_course(course_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update course", course_id, e))?;
        store.set_course(Some(course.clone()));
        Ok(course)
    }

    /// Draft -> pending. Later transitions happen outside the authoring tool.
    pub async fn submit_course(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
    ) -> Result<Course> {
        let course = store.course().ok_or(ValidationError::NoCourseSelected)?;
        if course.status != CourseStatus::Draft {
            return Err(ValidationError::CourseNotDraft.into());
        }
        let course_id = course.id;
        let course = self
            .backend
            .submit_course(course_id, actor)
            .await
            .map_err(|e| Self::rejected("submit course", course_id, e))?;
        tracing::info!(course_id = %course_id, "course submitted for approval");
        store.set_course(Some(course.clone()));
        Ok(course)
    }

    // --- modules ---

    pub async fn create_module(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        draft: &ModuleDraft,
    ) -> Result<Module> {
        let course_id = store.course().map(|c| c.id).ok_or(ValidationError::NoCourseSelected)?;
        if !store.modules().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        let payload = NewModule {
            title: required("title", &draft.title)?,
            description: draft.description.trim().to_string(),
            order_index: next_order_index(store.modules().len()),
        };
        let module = self
            .backend
            .create_module(course_id, actor, &payload)
            .await
            .map_err(|e| Self::rejected("create module", course_id, e))?;
        store.insert_module(module.clone());
        tracing::info!(module_id = %module.id, "module created");
        Ok(module)
    }

    pub async fn update_module(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        module_id: ModuleId,
        patch: ModulePatch,
    ) -> Result<Module> {
        let target = EntityRef::Module(module_id);
        self.ensure_present(store, target)?;
        let patch = ModulePatch {
            title: required_opt("title", patch.title.as_ref())?,
            ..patch
        };
        let module = self
            .backend
            .update_module(module_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update module", target, e))?;
        store.upsert_module(module.clone());
        self.modal.close_edit_of(&target);
        Ok(module)
    }

    // --- lessons ---

    fn lesson_ref(store: &EntityStore, lesson_id: LessonId) -> EntityRef {
        let module_id = store
            .lesson(lesson_id)
            .map(|l| l.module_id)
            .or(store.scope())
            .unwrap_or(ModuleId(0));
        EntityRef::Lesson { module_id, lesson_id }
    }

    fn scoped_module(&mut self, store: &EntityStore, module_id: ModuleId) -> Result<()> {
        self.ensure_present(store, EntityRef::Module(module_id))?;
        if store.scope() != Some(module_id) {
            return Err(ValidationError::NoModuleSelected.into());
        }
        Ok(())
    }

    pub async fn create_lesson(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        module_id: ModuleId,
        draft: &LessonDraft,
    ) -> Result<Lesson> {
        self.scoped_module(store, module_id)?;
        if !store.lessons().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        let payload = lesson_payload(draft, next_order_index(store.lessons().len()))?;
        let lesson = self
            .backend
            .create_lesson(module_id, actor, &payload)
            .await
            .map_err(|e| Self::rejected("create lesson", EntityRef::Module(module_id), e))?;
        store.insert_lesson(lesson.clone());
        self.modal.close_exact(&EntityRef::Module(module_id), ModalMode::Create);
        tracing::info!(lesson_id = %lesson.id, kind = %lesson.kind(), "lesson created");
        Ok(lesson)
    }

    /// Uploads `file` and then creates the video lesson that references it.
    /// A failed upload creates nothing and leaves the form open.
    pub async fn create_video_lesson(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        module_id: ModuleId,
        draft: &mut LessonDraft,
        file: MediaFile,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<Lesson> {
        if draft.kind != LessonKind::Video {
            return Err(ValidationError::LessonTypeMismatch {
                expected: draft.kind,
                actual: LessonKind::Video,
            }
            .into());
        }
        self.scoped_module(store, module_id)?;
        if !store.lessons().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        lesson_header(draft)?;
        if draft.upload.blocks_submit() {
            return Err(ValidationError::UploadInFlight.into());
        }
        self.uploads
            .upload_into(&mut draft.upload, file, actor, on_progress)
            .await?;
        self.create_lesson(store, actor, module_id, draft).await
    }

    pub async fn update_lesson(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        lesson_id: LessonId,
        edit: &LessonEdit,
    ) -> Result<Lesson> {
        let target = Self::lesson_ref(store, lesson_id);
        let Some(kind) = store.lesson(lesson_id).map(Lesson::kind) else {
            return self.stale(target);
        };
        let title = edit.header()?;
        let body = match kind {
            LessonKind::Reading => Some(LessonBody::Reading {
                body: required("body", edit.body.as_deref().unwrap_or_default())?,
            }),
            LessonKind::Video => Some(LessonBody::Video {
                source: edit.video_source()?,
            }),
            LessonKind::Quiz | LessonKind::Assignment | LessonKind::CodeLab => None,
        };
        let patch = LessonPatch {
            title: Some(title),
            duration_sec: Some(edit.duration_sec),
            body,
        };
        let lesson = self
            .backend
            .update_lesson(lesson_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update lesson", target, e))?;
        if lesson.kind() != kind {
            tracing::warn!(
                lesson_id = %lesson_id,
                expected = %kind,
                got = %lesson.kind(),
                "backend changed lesson type"
            );
        }
        store.upsert_lesson(lesson.clone());
        self.modal.close_edit_of(&target);
        Ok(lesson)
    }

    /// Replaces a video lesson's media: upload first, then the lesson update.
    pub async fn replace_lesson_video(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        lesson_id: LessonId,
        edit: &mut LessonEdit,
        file: MediaFile,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<Lesson> {
        let Some(kind) = store.lesson(lesson_id).map(Lesson::kind) else {
            return self.stale(Self::lesson_ref(store, lesson_id));
        };
        if kind != LessonKind::Video {
            return Err(ValidationError::LessonTypeMismatch {
                expected: kind,
                actual: LessonKind::Video,
            }
            .into());
        }
        edit.header()?;
        if edit.upload.blocks_submit() {
            return Err(ValidationError::UploadInFlight.into());
        }
        self.uploads
            .upload_into(&mut edit.upload, file, actor, on_progress)
            .await?;
        self.update_lesson(store, actor, lesson_id, edit).await
    }

    /// Fetches the latest copy of a lesson and opens it for editing.
    pub async fn open_lesson(
        &mut self,
        store: &mut EntityStore,
        lesson_id: LessonId,
    ) -> Result<LessonEdit> {
        let target = Self::lesson_ref(store, lesson_id);
        self.ensure_present(store, target)?;
        let lesson = match self.backend.get_lesson(lesson_id).await {
            Ok(lesson) => lesson,
            Err(e) => return self.fetch_failed(store, target, e),
        };
        let edit = LessonEdit::from_lesson(&lesson);
        store.upsert_lesson(lesson);
        self.modal.open(target, ModalMode::Edit);
        Ok(edit)
    }

    // --- quizzes ---

    pub async fn create_quiz(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        module_id: ModuleId,
        draft: &QuizDraft,
    ) -> Result<Quiz> {
        self.scoped_module(store, module_id)?;
        if !store.quizzes().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        in_range("pass score", i64::from(draft.pass_score), 0, 100)?;
        let payload = NewQuiz {
            title: required("title", &draft.title)?,
            description: draft.description.trim().to_string(),
            pass_score: draft.pass_score,
            order_index: next_order_index(store.quizzes().len()),
        };
        let quiz = self
            .backend
            .create_quiz(module_id, actor, &payload)
            .await
            .map_err(|e| Self::rejected("create quiz", EntityRef::Module(module_id), e))?;
        store.insert_quiz(quiz.clone());
        self.modal.close_exact(&EntityRef::Module(module_id), ModalMode::Create);
        Ok(quiz)
    }

    fn quiz_ref(store: &EntityStore, quiz_id: QuizId) -> EntityRef {
        let module_id = store
            .quiz(quiz_id)
            .map(|q| q.module_id)
            .or(store.scope())
            .unwrap_or(ModuleId(0));
        EntityRef::Quiz { module_id, quiz_id }
    }

    fn question_ref(store: &EntityStore, quiz_id: QuizId, question_id: QuestionId) -> EntityRef {
        EntityRef::Question {
            module_id: Self::quiz_ref(store, quiz_id).module_id(),
            quiz_id,
            question_id,
        }
    }

    pub async fn update_quiz(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        quiz_id: QuizId,
        patch: QuizPatch,
    ) -> Result<Quiz> {
        let target = Self::quiz_ref(store, quiz_id);
        self.ensure_present(store, target)?;
        if let Some(score) = patch.pass_score {
            in_range("pass score", i64::from(score), 0, 100)?;
        }
        let patch = QuizPatch {
            title: required_opt("title", patch.title.as_ref())?,
            ..patch
        };
        let mut quiz = self
            .backend
            .update_quiz(quiz_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update quiz", target, e))?;
        if quiz.questions.is_empty() {
            if let Some(existing) = store.quiz(quiz_id) {
                quiz.questions = existing.questions.clone();
            }
        }
        store.upsert_quiz(quiz.clone());
        self.modal.close_edit_of(&target);
        Ok(quiz)
    }

    /// Loads a quiz with its questions and options and opens its detail view.
    pub async fn open_quiz(&mut self, store: &mut EntityStore, quiz_id: QuizId) -> Result<Quiz> {
        let target = Self::quiz_ref(store, quiz_id);
        self.ensure_present(store, target)?;
        let quiz = match self.backend.get_quiz(quiz_id).await {
            Ok(quiz) => quiz,
            Err(e) => return self.fetch_failed(store, target, e),
        };
        store.upsert_quiz(quiz.clone());
        self.modal.open(target, ModalMode::Detail);
        Ok(quiz)
    }

    pub async fn add_question(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        quiz_id: QuizId,
        draft: &QuestionDraft,
    ) -> Result<Question> {
        let parent = Self::quiz_ref(store, quiz_id);
        self.ensure_present(store, parent)?;
        in_range("score", i64::from(draft.score), 1, MAX_QUESTION_SCORE)?;
        let siblings = store.quiz(quiz_id).map_or(0, |q| q.questions.len());
        let payload = NewQuestion {
            text: required("question text", &draft.text)?,
            question_type: draft.question_type,
            score: draft.score,
            order_index: next_order_index(siblings),
        };
        let question = self
            .backend
            .add_quiz_question(quiz_id, actor, &payload)
            .await
            .map_err(|e| Self::rejected("add question", parent, e))?;
        store.insert_question(quiz_id, question.clone());
        Ok(question)
    }

    pub async fn update_question(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        quiz_id: QuizId,
        question_id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Question> {
        let target = Self::question_ref(store, quiz_id, question_id);
        let Some(existing) = store.question(quiz_id, question_id).cloned() else {
            return self.stale(target);
        };
        if let Some(new_type) = patch.question_type {
            if new_type != existing.question_type && !existing.options.is_empty() {
                return Err(ValidationError::QuestionTypeLocked.into());
            }
        }
        if let Some(score) = patch.score {
            in_range("score", i64::from(score), 1, MAX_QUESTION_SCORE)?;
        }
        let patch = QuestionPatch {
            text: required_opt("question text", patch.text.as_ref())?,
            ..patch
        };
        let mut question = self
            .backend
            .update_quiz_question(question_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update question", target, e))?;
        if question.options.is_empty() {
            question.options = existing.options;
        }
        store.upsert_question(quiz_id, question.clone());
        self.modal.close_edit_of(&target);
        Ok(question)
    }

    pub async fn add_option(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        quiz_id: QuizId,
        question_id: QuestionId,
        draft: &OptionDraft,
    ) -> Result<QuizOption> {
        let parent = Self::question_ref(store, quiz_id, question_id);
        let Some(question) = store.question(quiz_id, question_id) else {
            return self.stale(parent);
        };
        check_question_option_count(question)?;
        let payload = NewOption {
            text: required("option text", &draft.text)?,
            correct: draft.correct,
            order_index: next_order_index(question.options.len()),
        };
        let option = self
            .backend
            .add_quiz_option(question_id, actor, &payload)
            .await
            .map_err(|e| Self::rejected("add option", parent, e))?;
        store.insert_option(quiz_id, question_id, option.clone());
        Ok(option)
    }

    pub async fn update_option(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        quiz_id: QuizId,
        question_id: QuestionId,
        option_id: OptionId,
        patch: OptionPatch,
    ) -> Result<QuizOption> {
        let target = EntityRef::QuizOption {
            module_id: Self::quiz_ref(store, quiz_id).module_id(),
            quiz_id,
            question_id,
            option_id,
        };
        self.ensure_present(store, target)?;
        let patch = OptionPatch {
            text: required_opt("option text", patch.text.as_ref())?,
            ..patch
        };
        let option = self
            .backend
            .update_quiz_option(option_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update option", target, e))?;
        store.upsert_option(quiz_id, question_id, option.clone());
        self.modal.close_edit_of(&target);
        Ok(option)
    }

    // --- assignments ---

    pub async fn create_assignment(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        module_id: ModuleId,
        draft: &AssignmentDraft,
    ) -> Result<Assignment> {
        self.scoped_module(store, module_id)?;
        in_range("max score", i64::from(draft.max_score), 1, MAX_ASSIGNMENT_SCORE)?;
        let payload = NewAssignment {
            title: required("title", &draft.title)?,
            description: draft.description.trim().to_string(),
            submission_type: draft.submission_type,
            max_score: draft.max_score,
            due_at: draft.due_at,
        };
        let assignment = self
            .backend
            .create_assignment(module_id, actor, &payload)
            .await
            .map_err(|e| Self::rejected("create assignment", EntityRef::Module(module_id), e))?;
        store.insert_assignment(assignment.clone());
        self.modal.close_exact(&EntityRef::Module(module_id), ModalMode::Create);
        Ok(assignment)
    }

    fn assignment_ref(store: &EntityStore, assignment_id: AssignmentId) -> EntityRef {
        let module_id = store
            .assignment(assignment_id)
            .map(|a| a.module_id)
            .or(store.scope())
            .unwrap_or(ModuleId(0));
        EntityRef::Assignment { module_id, assignment_id }
    }

    pub async fn update_assignment(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        assignment_id: AssignmentId,
        patch: AssignmentPatch,
    ) -> Result<Assignment> {
        let target = Self::assignment_ref(store, assignment_id);
        self.ensure_present(store, target)?;
        if let Some(max_score) = patch.max_score {
            in_range("max score", i64::from(max_score), 1, MAX_ASSIGNMENT_SCORE)?;
        }
        let patch = AssignmentPatch {
            title: required_opt("title", patch.title.as_ref())?,
            ..patch
        };
        let assignment = self
            .backend
            .update_assignment(assignment_id, actor, &patch)
            .await
            .map_err(|e| Self::rejected("update assignment", target, e))?;
        store.upsert_assignment(assignment.clone());
        self.modal.close_edit_of(&target);
        Ok(assignment)
    }

    pub async fn open_assignment(
        &mut self,
        store: &mut EntityStore,
        assignment_id: AssignmentId,
    ) -> Result<Assignment> {
        let target = Self::assignment_ref(store, assignment_id);
        self.ensure_present(store, target)?;
        let assignment = match self.backend.get_assignment(assignment_id).await {
            Ok(assignment) => assignment,
            Err(e) => return self.fetch_failed(store, target, e),
        };
        store.upsert_assignment(assignment.clone());
        self.modal.open(target, ModalMode::Edit);
        Ok(assignment)
    }

    // --- deletes ---

    fn label_of(store: &EntityStore, target: &EntityRef) -> Option<String> {
        let label = match *target {
            EntityRef::Module(id) => store.module(id)?.title.clone(),
            EntityRef::Lesson { lesson_id, .. } => store.lesson(lesson_id)?.title.clone(),
            EntityRef::Quiz { quiz_id, .. } => store.quiz(quiz_id)?.title.clone(),
            EntityRef::Question {
                quiz_id,
                question_id,
                ..
            } => store.question(quiz_id, question_id)?.text.clone(),
            EntityRef::QuizOption {
                quiz_id,
                question_id,
                option_id,
                ..
            } => store.option(quiz_id, question_id, option_id)?.text.clone(),
            EntityRef::Assignment { assignment_id, .. } => {
                store.assignment(assignment_id)?.title.clone()
            }
        };
        Some(label)
    }

    /// First step of every delete: names the exact entity for confirmation.
    pub fn request_delete(
        &mut self,
        store: &EntityStore,
        target: EntityRef,
    ) -> Result<PendingDelete> {
        match Self::label_of(store, &target) {
            Some(label) => Ok(PendingDelete { target, label }),
            None => self.stale(target),
        }
    }

    /// Second step: the author confirmed `pending`, so the delete goes out.
    pub async fn confirm_delete(
        &mut self,
        store: &mut EntityStore,
        actor: ActorId,
        pending: PendingDelete,
    ) -> Result<()> {
        let target = pending.target;
        match Self::label_of(store, &target) {
            None => return self.stale(target),
            Some(label) if label != pending.label => {
                return Err(ValidationError::ConfirmationMismatch(target).into());
            }
            Some(_) => {}
        }

        let backend = &self.backend;
        let result = match target {
            EntityRef::Module(id) => backend.delete_module(id, actor).await,
            EntityRef::Lesson { lesson_id, .. } => backend.delete_lesson(lesson_id, actor).await,
            EntityRef::Quiz { quiz_id, .. } => backend.delete_quiz(quiz_id, actor).await,
            EntityRef::Question { question_id, .. } => {
                backend.delete_quiz_question(question_id, actor).await
            }
            EntityRef::QuizOption { option_id, .. } => {
                backend.delete_quiz_option(option_id, actor).await
            }
            EntityRef::Assignment { assignment_id, .. } => {
                backend.delete_assignment(assignment_id, actor).await
            }
        };
        result.map_err(|e| Self::rejected("delete", target, e))?;

        match target {
            EntityRef::Module(id) => store.remove_module(id),
            EntityRef::Lesson { lesson_id, .. } => store.remove_lesson(lesson_id),
            EntityRef::Quiz { quiz_id, .. } => store.remove_quiz(quiz_id),
            EntityRef::Question {
                quiz_id,
                question_id,
                ..
            } => store.remove_question(quiz_id, question_id),
            EntityRef::QuizOption {
                quiz_id,
                question_id,
                option_id,
                ..
            } => store.remove_option(quiz_id, question_id, option_id),
            EntityRef::Assignment { assignment_id, .. } => store.remove_assignment(assignment_id),
        };
        self.modal.close_within(&target);
        tracing::info!(entity = %target, "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_closes_for_deleted_ancestor_only() {
        let mut modal = ModalState::default();
        let option = EntityRef::QuizOption {
            module_id: ModuleId(1),
            quiz_id: QuizId(2),
            question_id: QuestionId(3),
            option_id: OptionId(4),
        };
        modal.open(option, ModalMode::Edit);
        assert!(!modal.close_within(&EntityRef::Module(ModuleId(5))));
        assert!(modal.current().is_some());
        assert!(modal.close_within(&EntityRef::Quiz {
            module_id: ModuleId(1),
            quiz_id: QuizId(2)
        }));
        assert!(modal.current().is_none());
    }

    #[test]
    fn lesson_draft_needs_a_video_source() {
        let draft = LessonDraft::new(LessonKind::Video, "Intro");
        assert!(matches!(
            lesson_payload(&draft, 1),
            Err(ValidationError::MissingField("video"))
        ));

        let mut in_flight = draft.clone();
        in_flight.upload = UploadStatus::InFlight { percent: 30 };
        in_flight.video_url = Some("https://cdn/intro.mp4".into());
        assert!(matches!(
            lesson_payload(&in_flight, 1),
            Err(ValidationError::UploadInFlight)
        ));

        let mut uploaded = draft;
        uploaded.upload = UploadStatus::Completed(MediaRef {
            media_id: MediaId("m-7".into()),
            url: "https://signed/once".into(),
        });
        let payload = lesson_payload(&uploaded, 4).unwrap();
        assert_eq!(payload.order_index, 4);
        assert_eq!(
            payload.content,
            LessonContent::Video {
                source: VideoSource::ByReference {
                    media_id: MediaId("m-7".into())
                }
            }
        );
    }

    #[test]
    fn edit_form_carries_no_type() {
        let lesson = Lesson {
            id: LessonId(1),
            module_id: ModuleId(1),
            title: "Read me".into(),
            content: LessonContent::Reading { body: "hello".into() },
            order_index: 1,
            duration_sec: 120,
        };
        let edit = LessonEdit::from_lesson(&lesson);
        assert_eq!(edit.body.as_deref(), Some("hello"));
        assert_eq!(edit.video_url, None);
    }

    #[test]
    fn blank_titles_are_rejected() {
        assert_eq!(required("title", "   "), Err(ValidationError::MissingField("title")));
        assert_eq!(required("title", " Intro "), Ok("Intro".to_string()));
        assert!(in_range("score", 0, 1, 100).is_err());
    }
}
