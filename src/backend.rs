use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::*;

/// Receives `(bytes_sent, bytes_total)` while an upload streams out.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(u64, u64) + Send);

/// The remote collaborators the authoring core talks to: the course REST API
/// and the media service. Every mutating call carries the acting user.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_course(&self, course_id: CourseId) -> Result<Course, BackendError>;
    async fn update_course(
        &self,
        course_id: CourseId,
        actor: ActorId,
        patch: &CoursePatch,
    ) -> Result<Course, BackendError>;
    async fn submit_course(
        &self,
        course_id: CourseId,
        actor: ActorId,
    ) -> Result<Course, BackendError>;

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, BackendError>;
    async fn create_module(
        &self,
        course_id: CourseId,
        actor: ActorId,
        payload: &NewModule,
    ) -> Result<Module, BackendError>;
    async fn update_module(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        patch: &ModulePatch,
    ) -> Result<Module, BackendError>;
    async fn delete_module(&self, module_id: ModuleId, actor: ActorId) -> Result<(), BackendError>;

    async fn list_lessons_by_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<Lesson>, BackendError>;
    async fn get_lesson(&self, lesson_id: LessonId) -> Result<Lesson, BackendError>;
    async fn create_lesson(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        payload: &NewLesson,
    ) -> Result<Lesson, BackendError>;
    async fn update_lesson(
        &self,
        lesson_id: LessonId,
        actor: ActorId,
        patch: &LessonPatch,
    ) -> Result<Lesson, BackendError>;
    async fn delete_lesson(&self, lesson_id: LessonId, actor: ActorId) -> Result<(), BackendError>;
    async fn reorder_lessons(
        &self,
        course_id: CourseId,
        actor: ActorId,
        ordered: &[LessonId],
    ) -> Result<(), BackendError>;

    async fn list_quizzes_by_module(&self, module_id: ModuleId) -> Result<Vec<Quiz>, BackendError>;
    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Quiz, BackendError>;
    async fn create_quiz(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        payload: &NewQuiz,
    ) -> Result<Quiz, BackendError>;
    async fn update_quiz(
        &self,
        quiz_id: QuizId,
        actor: ActorId,
        patch: &QuizPatch,
    ) -> Result<Quiz, BackendError>;
    async fn delete_quiz(&self, quiz_id: QuizId, actor: ActorId) -> Result<(), BackendError>;

    async fn add_quiz_question(
        &self,
        quiz_id: QuizId,
        actor: ActorId,
        payload: &NewQuestion,
    ) -> Result<Question, BackendError>;
    async fn update_quiz_question(
        &self,
        question_id: QuestionId,
        actor: ActorId,
        patch: &QuestionPatch,
    ) -> Result<Question, BackendError>;
    async fn delete_quiz_question(
        &self,
        question_id: QuestionId,
        actor: ActorId,
    ) -> Result<(), BackendError>;

    async fn add_quiz_option(
        &self,
        question_id: QuestionId,
        actor: ActorId,
        payload: &NewOption,
    ) -> Result<QuizOption, BackendError>;
    async fn update_quiz_option(
        &self,
        option_id: OptionId,
        actor: ActorId,
        patch: &OptionPatch,
    ) -> Result<QuizOption, BackendError>;
    async fn delete_quiz_option(
        &self,
        option_id: OptionId,
        actor: ActorId,
    ) -> Result<(), BackendError>;

    async fn list_assignments_by_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<Assignment>, BackendError>;
    async fn get_assignment(&self, assignment_id: AssignmentId) -> Result<Assignment, BackendError>;
    async fn create_assignment(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        payload: &NewAssignment,
    ) -> Result<Assignment, BackendError>;
    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        actor: ActorId,
        patch: &AssignmentPatch,
    ) -> Result<Assignment, BackendError>;
    async fn delete_assignment(
        &self,
        assignment_id: AssignmentId,
        actor: ActorId,
    ) -> Result<(), BackendError>;

    async fn upload_video(
        &self,
        file: MediaFile,
        actor: ActorId,
        on_progress: ProgressFn<'_>,
    ) -> Result<MediaRef, BackendError>;
    async fn get_signed_media_url(
        &self,
        media_id: &MediaId,
        actor: ActorId,
    ) -> Result<String, BackendError>;
    async fn list_media_by_lesson(&self, lesson_id: LessonId) -> Result<Vec<Media>, BackendError>;
}

/// Source of the signed-in user, owned by the session/auth layer.
pub trait Identity: Send + Sync {
    fn current_actor(&self) -> Option<ActorId>;
}

/// Fixed identity, for embedding hosts that resolve the user once.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub Option<ActorId>);

impl Identity for StaticIdentity {
    fn current_actor(&self) -> Option<ActorId> {
        self.0
    }
}
