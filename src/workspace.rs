//! The authoring context: one store, one selection, and the engines that
//! act on them, all driven from the host's event loop.

use std::sync::Arc;

use crate::backend::{Backend, Identity};
use crate::error::{AuthoringError, Result};
use crate::models::*;
use crate::mutation::*;
use crate::navigation::{ContentTab, NavigationController, Selection};
use crate::ordering::{Direction, MoveOutcome, OrderingEngine};
use crate::store::EntityStore;
use crate::upload::{UploadPipeline, UploadPolicy};

pub struct Workspace<B: ?Sized, I> {
    backend: Arc<B>,
    identity: I,
    store: EntityStore,
    navigation: NavigationController,
    ordering: OrderingEngine<B>,
    mutations: MutationCoordinator<B>,
}

impl<B: Backend + ?Sized, I: Identity> Workspace<B, I> {
    pub fn new(backend: Arc<B>, identity: I, policy: UploadPolicy) -> Self {
        let uploads = UploadPipeline::new(Arc::clone(&backend), policy);
        Self {
            ordering: OrderingEngine::new(Arc::clone(&backend)),
            mutations: MutationCoordinator::new(Arc::clone(&backend), uploads),
            backend,
            identity,
            store: EntityStore::new(),
            navigation: NavigationController::new(),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn selection(&self) -> Selection {
        self.navigation.selection()
    }

    pub fn modal(&self) -> Option<OpenModal> {
        self.mutations.modal().current()
    }

    pub fn open_modal(&mut self, subject: EntityRef, mode: ModalMode) -> Result<()> {
        if !self.store.contains(&subject) {
            return Err(AuthoringError::StaleReference(subject));
        }
        self.mutations.modal_mut().open(subject, mode);
        Ok(())
    }

    pub fn close_modal(&mut self) {
        self.mutations.modal_mut().close();
    }

    fn actor(&self) -> Result<ActorId> {
        self.identity.current_actor().ok_or(AuthoringError::NoActor)
    }

    // --- navigation ---

    pub async fn open_course(&mut self, course_id: CourseId) -> Result<bool> {
        self.mutations.modal_mut().close();
        self.navigation
            .open_course(&mut self.store, self.backend.as_ref(), course_id)
            .await
    }

    pub async fn open_module(&mut self, module_id: ModuleId) -> Result<bool> {
        self.mutations.modal_mut().close();
        self.navigation
            .open_module(&mut self.store, self.backend.as_ref(), module_id)
            .await
    }

    pub fn select_tab(&mut self, tab: ContentTab) -> Result<()> {
        self.navigation.select_tab(tab)?;
        Ok(())
    }

    pub fn close_module(&mut self) {
        self.mutations.modal_mut().close();
        self.navigation.close_module(&mut self.store);
    }

    pub fn close_course(&mut self) {
        self.mutations.modal_mut().close();
        self.navigation.close_course(&mut self.store);
    }

    // --- ordering ---

    pub async fn move_module(
        &mut self,
        module_id: ModuleId,
        direction: Direction,
    ) -> Result<MoveOutcome> {
        let actor = self.actor()?;
        self.ordering
            .move_module(&mut self.store, actor, module_id, direction)
            .await
    }

    pub async fn drop_lesson(&mut self, from: usize, to: usize) -> Result<MoveOutcome> {
        let actor = self.actor()?;
        self.ordering
            .reposition_lessons(&mut self.store, actor, from, to)
            .await
    }

    // --- course & modules ---

    pub async fn update_course(&mut self, patch: CoursePatch) -> Result<Course> {
        let actor = self.actor()?;
        self.mutations.update_course(&mut self.store, actor, patch).await
    }

    pub async fn submit_course(&mut self) -> Result<Course> {
        let actor = self.actor()?;
        self.mutations.submit_course(&mut self.store, actor).await
    }

    pub async fn create_module(&mut self, draft: &ModuleDraft) -> Result<Module> {
        let actor = self.actor()?;
        self.mutations.create_module(&mut self.store, actor, draft).await
    }

    pub async fn update_module(
        &mut self,
        module_id: ModuleId,
        patch: ModulePatch,
    ) -> Result<Module> {
        let actor = self.actor()?;
        self.mutations
            .update_module(&mut self.store, actor, module_id, patch)
            .await
    }

    // --- lessons ---

    pub async fn create_lesson(
        &mut self,
        module_id: ModuleId,
        draft: &LessonDraft,
    ) -> Result<Lesson> {
        let actor = self.actor()?;
        self.mutations
            .create_lesson(&mut self.store, actor, module_id, draft)
            .await
    }

    pub async fn create_video_lesson(
        &mut self,
        module_id: ModuleId,
        draft: &mut LessonDraft,
        file: MediaFile,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<Lesson> {
        let actor = self.actor()?;
        self.mutations
            .create_video_lesson(&mut self.store, actor, module_id, draft, file, on_progress)
            .await
    }

    pub async fn open_lesson(&mut self, lesson_id: LessonId) -> Result<LessonEdit> {
        self.mutations.open_lesson(&mut self.store, lesson_id).await
    }

    pub async fn update_lesson(
        &mut self,
        lesson_id: LessonId,
        edit: &LessonEdit,
    ) -> Result<Lesson> {
        let actor = self.actor()?;
        self.mutations
            .update_lesson(&mut self.store, actor, lesson_id, edit)
            .await
    }

    pub async fn replace_lesson_video(
        &mut self,
        lesson_id: LessonId,
        edit: &mut LessonEdit,
        file: MediaFile,
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<Lesson> {
        let actor = self.actor()?;
        self.mutations
            .replace_lesson_video(&mut self.store, actor, lesson_id, edit, file, on_progress)
            .await
    }

    /// Fresh playable URL for a lesson's video, or `None` for other types.
    pub async fn playback_url(&self, lesson_id: LessonId) -> Result<Option<String>> {
        let actor = self.actor()?;
        let Some(lesson) = self.store.lesson(lesson_id) else {
            let module_id = self.store.scope().unwrap_or(ModuleId(0));
            return Err(AuthoringError::StaleReference(EntityRef::Lesson { module_id, lesson_id }));
        };
        Ok(self.mutations.uploads().playback_url(lesson, actor).await?)
    }

    pub async fn attached_media(&self, lesson_id: LessonId) -> Result<Vec<MediaRef>> {
        let actor = self.actor()?;
        Ok(self.mutations.uploads().attached_media(lesson_id, actor).await?)
    }

    // --- quizzes ---

    pub async fn create_quiz(&mut self, module_id: ModuleId, draft: &QuizDraft) -> Result<Quiz> {
        let actor = self.actor()?;
        self.mutations
            .create_quiz(&mut self.store, actor, module_id, draft)
            .await
    }

    pub async fn open_quiz(&mut self, quiz_id: QuizId) -> Result<Quiz> {
        self.mutations.open_quiz(&mut self.store, quiz_id).await
    }

    pub async fn update_quiz(&mut self, quiz_id: QuizId, patch: QuizPatch) -> Result<Quiz> {
        let actor = self.actor()?;
        self.mutations
            .update_quiz(&mut self.store, actor, quiz_id, patch)
            .await
    }

    pub async fn add_question(
        &mut self,
        quiz_id: QuizId,
        draft: &QuestionDraft,
    ) -> Result<Question> {
        let actor = self.actor()?;
        self.mutations
            .add_question(&mut self.store, actor, quiz_id, draft)
            .await
    }

    pub async fn update_question(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Question> {
        let actor = self.actor()?;
        self.mutations
            .update_question(&mut self.store, actor, quiz_id, question_id, patch)
            .await
    }

    pub async fn add_option(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        draft: &OptionDraft,
    ) -> Result<QuizOption> {
        let actor = self.actor()?;
        self.mutations
            .add_option(&mut self.store, actor, quiz_id, question_id, draft)
            .await
    }

    pub async fn update_option(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        option_id: OptionId,
        patch: OptionPatch,
    ) -> Result<QuizOption> {
        let actor = self.actor()?;
        self.mutations
            .update_option(&mut self.store, actor, quiz_id, question_id, option_id, patch)
            .await
    }

    // --- assignments ---

    pub async fn create_assignment(
        &mut self,
        module_id: ModuleId,
        draft: &AssignmentDraft,
    ) -> Result<Assignment> {
        let actor = self.actor()?;
        self.mutations
            .create_assignment(&mut self.store, actor, module_id, draft)
            .await
    }

    pub async fn open_assignment(&mut self, assignment_id: AssignmentId) -> Result<Assignment> {
        self.mutations.open_assignment(&mut self.store, assignment_id).await
    }

    pub async fn update_assignment(
        &mut self,
        assignment_id: AssignmentId,
        patch: AssignmentPatch,
    ) -> Result<Assignment> {
        let actor = self.actor()?;
        self.mutations
            .update_assignment(&mut self.store, actor, assignment_id, patch)
            .await
    }

    // --- deletes ---

    pub fn request_delete(&mut self, target: EntityRef) -> Result<PendingDelete> {
        self.mutations.request_delete(&self.store, target)
    }

    pub async fn confirm_delete(&mut self, pending: PendingDelete) -> Result<()> {
        let actor = self.actor()?;
        let target = pending.target();
        self.mutations
            .confirm_delete(&mut self.store, actor, pending)
            .await?;
        if let EntityRef::Module(module_id) = target {
            self.navigation.module_removed(&mut self.store, module_id);
        }
        Ok(())
    }
}
