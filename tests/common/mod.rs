#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use http::StatusCode;

use course_authoring::backend::{Backend, ProgressFn, StaticIdentity};
use course_authoring::error::BackendError;
use course_authoring::models::*;
use course_authoring::upload::UploadPolicy;
use course_authoring::Workspace;

pub const ACTOR: ActorId = ActorId(7);
pub const COURSE: CourseId = CourseId(1);

/// One collaborator call as seen by the fake, in the order it arrived.
/// `Progress` entries are pushed by tests from their progress callbacks so
/// they interleave with the calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetCourse(CourseId),
    UpdateCourse(CourseId, CoursePatch),
    SubmitCourse(CourseId),
    ListModules(CourseId),
    CreateModule(CourseId, NewModule),
    UpdateModule(ModuleId, ModulePatch),
    DeleteModule(ModuleId),
    ListLessons(ModuleId),
    GetLesson(LessonId),
    CreateLesson(ModuleId, NewLesson),
    UpdateLesson(LessonId, LessonPatch),
    DeleteLesson(LessonId),
    ReorderLessons(CourseId, Vec<LessonId>),
    ListQuizzes(ModuleId),
    GetQuiz(QuizId),
    CreateQuiz(ModuleId, NewQuiz),
    UpdateQuiz(QuizId, QuizPatch),
    DeleteQuiz(QuizId),
    AddQuestion(QuizId, NewQuestion),
    UpdateQuestion(QuestionId, QuestionPatch),
    DeleteQuestion(QuestionId),
    AddOption(QuestionId, NewOption),
    UpdateOption(OptionId, OptionPatch),
    DeleteOption(OptionId),
    ListAssignments(ModuleId),
    GetAssignment(AssignmentId),
    CreateAssignment(ModuleId, NewAssignment),
    UpdateAssignment(AssignmentId, AssignmentPatch),
    DeleteAssignment(AssignmentId),
    UploadVideo(String),
    SignMedia(MediaId),
    ListMedia(LessonId),
    Progress(u8),
}

impl Call {
    pub fn op(&self) -> &'static str {
        match self {
            Call::GetCourse(..) => "get_course",
            Call::UpdateCourse(..) => "update_course",
            Call::SubmitCourse(..) => "submit_course",
            Call::ListModules(..) => "list_modules",
            Call::CreateModule(..) => "create_module",
            Call::UpdateModule(..) => "update_module",
            Call::DeleteModule(..) => "delete_module",
            Call::ListLessons(..) => "list_lessons",
            Call::GetLesson(..) => "get_lesson",
            Call::CreateLesson(..) => "create_lesson",
            Call::UpdateLesson(..) => "update_lesson",
            Call::DeleteLesson(..) => "delete_lesson",
            Call::ReorderLessons(..) => "reorder_lessons",
            Call::ListQuizzes(..) => "list_quizzes",
            Call::GetQuiz(..) => "get_quiz",
            Call::CreateQuiz(..) => "create_quiz",
            Call::UpdateQuiz(..) => "update_quiz",
            Call::DeleteQuiz(..) => "delete_quiz",
            Call::AddQuestion(..) => "add_question",
            Call::UpdateQuestion(..) => "update_question",
            Call::DeleteQuestion(..) => "delete_question",
            Call::AddOption(..) => "add_option",
            Call::UpdateOption(..) => "update_option",
            Call::DeleteOption(..) => "delete_option",
            Call::ListAssignments(..) => "list_assignments",
            Call::GetAssignment(..) => "get_assignment",
            Call::CreateAssignment(..) => "create_assignment",
            Call::UpdateAssignment(..) => "update_assignment",
            Call::DeleteAssignment(..) => "delete_assignment",
            Call::UploadVideo(..) => "upload_video",
            Call::SignMedia(..) => "sign_media",
            Call::ListMedia(..) => "list_media",
            Call::Progress(..) => "progress",
        }
    }

    fn is_read(&self) -> bool {
        matches!(
            self,
            Call::GetCourse(..)
                | Call::ListModules(..)
                | Call::ListLessons(..)
                | Call::GetLesson(..)
                | Call::ListQuizzes(..)
                | Call::GetQuiz(..)
                | Call::ListAssignments(..)
                | Call::GetAssignment(..)
                | Call::ListMedia(..)
                | Call::SignMedia(..)
                | Call::Progress(..)
        )
    }
}

struct Failure {
    op: &'static str,
    /// 1-based occurrence to fail; `None` fails every occurrence.
    nth: Option<usize>,
    status: StatusCode,
}

#[derive(Default)]
struct State {
    course: Option<Course>,
    modules: Vec<Module>,
    lessons: Vec<Lesson>,
    quizzes: Vec<Quiz>,
    assignments: Vec<Assignment>,
    media: Vec<Media>,
    calls: Vec<Call>,
    counts: HashMap<&'static str, usize>,
    failures: Vec<Failure>,
    next_id: i64,
    signatures: u64,
    upload_chunks: u64,
}

impl State {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn question_mut(&mut self, question_id: QuestionId) -> Option<&mut Question> {
        self.quizzes
            .iter_mut()
            .flat_map(|quiz| quiz.questions.iter_mut())
            .find(|q| q.id == question_id)
    }
}

fn not_found(what: impl std::fmt::Display) -> BackendError {
    BackendError::status(StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// In-memory course API and media service.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let state = State {
            next_id: 1000,
            upload_chunks: 4,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn seed_course(&self, course: Course, modules: Vec<Module>) {
        let mut state = self.lock();
        state.course = Some(course);
        state.modules = modules;
    }

    pub fn seed_lessons(&self, lessons: Vec<Lesson>) {
        self.lock().lessons = lessons;
    }

    pub fn seed_quizzes(&self, quizzes: Vec<Quiz>) {
        self.lock().quizzes = quizzes;
    }

    pub fn seed_assignments(&self, assignments: Vec<Assignment>) {
        self.lock().assignments = assignments;
    }

    pub fn seed_media(&self, media: Vec<Media>) {
        self.lock().media = media;
    }

    pub fn set_upload_chunks(&self, chunks: u64) {
        self.lock().upload_chunks = chunks;
    }

    /// Fails the `nth` (1-based) call of `op`, counted from now on.
    pub fn fail(&self, op: &'static str, nth: usize) {
        self.fail_with(op, Some(nth), StatusCode::INTERNAL_SERVER_ERROR);
    }

    pub fn fail_always(&self, op: &'static str) {
        self.fail_with(op, None, StatusCode::INTERNAL_SERVER_ERROR);
    }

    pub fn fail_with(&self, op: &'static str, nth: Option<usize>, status: StatusCode) {
        let mut state = self.lock();
        let already = state.counts.get(op).copied().unwrap_or(0);
        state.failures.push(Failure {
            op,
            nth: nth.map(|n| n + already),
            status,
        });
    }

    pub fn heal(&self) {
        self.lock().failures.clear();
    }

    /// Test-side event, interleaved with the recorded calls.
    pub fn push(&self, call: Call) {
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.is_read()).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn remote_modules(&self) -> Vec<Module> {
        let mut modules = self.lock().modules.clone();
        modules.sort_by_key(|m| m.order_index);
        modules
    }

    pub fn remote_lessons(&self) -> Vec<Lesson> {
        let mut lessons = self.lock().lessons.clone();
        lessons.sort_by_key(|l| l.order_index);
        lessons
    }

    fn record(&self, call: Call) -> usize {
        let mut state = self.lock();
        let op = call.op();
        state.calls.push(call);
        let count = state.counts.entry(op).or_default();
        *count += 1;
        *count
    }

    fn check(&self, op: &'static str, count: usize) -> Result<MutexGuard<'_, State>, BackendError> {
        let state = self.lock();
        let failure = state
            .failures
            .iter()
            .find(|f| f.op == op && f.nth.map_or(true, |n| n == count));
        if let Some(failure) = failure {
            return Err(BackendError::status(failure.status, format!("injected {op} failure")));
        }
        Ok(state)
    }

    fn call(&self, call: Call) -> Result<MutexGuard<'_, State>, BackendError> {
        let op = call.op();
        let count = self.record(call);
        self.check(op, count)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get_course(&self, course_id: CourseId) -> Result<Course, BackendError> {
        let state = self.call(Call::GetCourse(course_id))?;
        state.course.clone().filter(|c| c.id == course_id).ok_or_else(|| not_found("course"))
    }

    async fn update_course(
        &self,
        course_id: CourseId,
        _actor: ActorId,
        patch: &CoursePatch,
    ) -> Result<Course, BackendError> {
        let mut state = self.call(Call::UpdateCourse(course_id, patch.clone()))?;
        let course = state.course.as_mut().ok_or_else(|| not_found("course"))?;
        if let Some(title) = &patch.title {
            course.title = title.clone();
        }
        if let Some(description) = &patch.description {
            course.description = description.clone();
        }
        if let Some(level) = patch.level {
            course.level = level;
        }
        if let Some(price) = patch.price_cents {
            course.price_cents = price;
        }
        Ok(course.clone())
    }

    async fn submit_course(
        &self,
        course_id: CourseId,
        _actor: ActorId,
    ) -> Result<Course, BackendError> {
        let mut state = self.call(Call::SubmitCourse(course_id))?;
        let course = state.course.as_mut().ok_or_else(|| not_found("course"))?;
        course.status = CourseStatus::Pending;
        Ok(course.clone())
    }

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, BackendError> {
        let state = self.call(Call::ListModules(course_id))?;
        Ok(state.modules.iter().filter(|m| m.course_id == course_id).cloned().collect())
    }

    async fn create_module(
        &self,
        course_id: CourseId,
        _actor: ActorId,
        payload: &NewModule,
    ) -> Result<Module, BackendError> {
        let mut state = self.call(Call::CreateModule(course_id, payload.clone()))?;
        let module = Module {
            id: ModuleId(state.id()),
            course_id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            order_index: payload.order_index,
        };
        state.modules.push(module.clone());
        Ok(module)
    }

    async fn update_module(
        &self,
        module_id: ModuleId,
        _actor: ActorId,
        patch: &ModulePatch,
    ) -> Result<Module, BackendError> {
        let mut state = self.call(Call::UpdateModule(module_id, patch.clone()))?;
        let module = state
            .modules
            .iter_mut()
            .find(|m| m.id == module_id)
            .ok_or_else(|| not_found(module_id))?;
        if let Some(order_index) = patch.order_index {
            module.order_index = order_index;
        }
        if let Some(title) = &patch.title {
            module.title = title.clone();
        }
        if let Some(description) = &patch.description {
            module.description = description.clone();
        }
        Ok(module.clone())
    }

    async fn delete_module(
        &self,
        module_id: ModuleId,
        _actor: ActorId,
    ) -> Result<(), BackendError> {
        let mut state = self.call(Call::DeleteModule(module_id))?;
        state.modules.retain(|m| m.id != module_id);
        state.lessons.retain(|l| l.module_id != module_id);
        state.quizzes.retain(|q| q.module_id != module_id);
        state.assignments.retain(|a| a.module_id != module_id);
        Ok(())
    }

    async fn list_lessons_by_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<Lesson>, BackendError> {
        let state = self.call(Call::ListLessons(module_id))?;
        Ok(state.lessons.iter().filter(|l| l.module_id == module_id).cloned().collect())
    }

    async fn get_lesson(&self, lesson_id: LessonId) -> Result<Lesson, BackendError> {
        let state = self.call(Call::GetLesson(lesson_id))?;
        state
            .lessons
            .iter()
            .find(|l| l.id == lesson_id)
            .cloned()
            .ok_or_else(|| not_found(lesson_id))
    }

    async fn create_lesson(
        &self,
        module_id: ModuleId,
        _actor: ActorId,
        payload: &NewLesson,
    ) -> Result<Lesson, BackendError> {
        let mut state = self.call(Call::CreateLesson(module_id, payload.clone()))?;
        let lesson = Lesson {
            id: LessonId(state.id()),
            module_id,
            title: payload.title.clone(),
            content: payload.content.clone(),
            order_index: payload.order_index,
            duration_sec: payload.duration_sec,
        };
        state.lessons.push(lesson.clone());
        Ok(lesson)
    }

    async fn update_lesson(
        &self,
        lesson_id: LessonId,
        _actor: ActorId,
        patch: &LessonPatch,
    ) -> Result<Lesson, BackendError> {
        let mut state = self.call(Call::UpdateLesson(lesson_id, patch.clone()))?;
        let lesson = state
            .lessons
            .iter_mut()
            .find(|l| l.id == lesson_id)
            .ok_or_else(|| not_found(lesson_id))?;
        if let Some(title) = &patch.title {
            lesson.title = title.clone();
        }
        if let Some(duration) = patch.duration_sec {
            lesson.duration_sec = duration;
        }
        if let Some(body) = &patch.body {
            lesson.content = body.clone().into_content();
        }
        Ok(lesson.clone())
    }

    async fn delete_lesson(
        &self,
        lesson_id: LessonId,
        _actor: ActorId,
    ) -> Result<(), BackendError> {
        let mut state = self.call(Call::DeleteLesson(lesson_id))?;
        state.lessons.retain(|l| l.id != lesson_id);
        Ok(())
    }

    async fn reorder_lessons(
        &self,
        course_id: CourseId,
        _actor: ActorId,
        ordered: &[LessonId],
    ) -> Result<(), BackendError> {
        let mut state = self.call(Call::ReorderLessons(course_id, ordered.to_vec()))?;
        for (position, id) in ordered.iter().enumerate() {
            if let Some(lesson) = state.lessons.iter_mut().find(|l| l.id == *id) {
                lesson.order_index = position as u32 + 1;
            }
        }
        Ok(())
    }

    async fn list_quizzes_by_module(&self, module_id: ModuleId) -> Result<Vec<Quiz>, BackendError> {
        let state = self.call(Call::ListQuizzes(module_id))?;
        Ok(state.quizzes.iter().filter(|q| q.module_id == module_id).cloned().collect())
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Quiz, BackendError> {
        let state = self.call(Call::GetQuiz(quiz_id))?;
        state
            .quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| not_found(quiz_id))
    }

    async fn create_quiz(
        &self,
        module_id: ModuleId,
        _actor: ActorId,
        payload: &NewQuiz,
    ) -> Result<Quiz, BackendError> {
        let mut state = self.call(Call::CreateQuiz(module_id, payload.clone()))?;
        let quiz = Quiz {
            id: QuizId(state.id()),
            module_id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            pass_score: payload.pass_score,
            order_index: payload.order_index,
            questions: Vec::new(),
        };
        state.quizzes.push(quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(
        &self,
        quiz_id: QuizId,
        _actor: ActorId,
        patch: &QuizPatch,
    ) -> Result<Quiz, BackendError> {
        let mut state = self.call(Call::UpdateQuiz(quiz_id, patch.clone()))?;
        let quiz = state
            .quizzes
            .iter_mut()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| not_found(quiz_id))?;
        if let Some(title) = &patch.title {
            quiz.title = title.clone();
        }
        if let Some(pass_score) = patch.pass_score {
            quiz.pass_score = pass_score;
        }
        // The real API answers without the nested questions.
        Ok(Quiz {
            questions: Vec::new(),
            ..quiz.clone()
        })
    }

    async fn delete_quiz(&self, quiz_id: QuizId, _actor: ActorId) -> Result<(), BackendError> {
        let mut state = self.call(Call::DeleteQuiz(quiz_id))?;
        state.quizzes.retain(|q| q.id != quiz_id);
        Ok(())
    }

    async fn add_quiz_question(
        &self,
        quiz_id: QuizId,
        _actor: ActorId,
        payload: &NewQuestion,
    ) -> Result<Question, BackendError> {
        let mut state = self.call(Call::AddQuestion(quiz_id, payload.clone()))?;
        let question = Question {
            id: QuestionId(state.id()),
            quiz_id,
            text: payload.text.clone(),
            question_type: payload.question_type,
            score: payload.score,
            order_index: payload.order_index,
            options: Vec::new(),
        };
        let quiz = state
            .quizzes
            .iter_mut()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| not_found(quiz_id))?;
        quiz.questions.push(question.clone());
        Ok(question)
    }

    async fn update_quiz_question(
        &self,
        question_id: QuestionId,
        _actor: ActorId,
        patch: &QuestionPatch,
    ) -> Result<Question, BackendError> {
        let mut state = self.call(Call::UpdateQuestion(question_id, patch.clone()))?;
        let question = state.question_mut(question_id).ok_or_else(|| not_found(question_id))?;
        if let Some(text) = &patch.text {
            question.text = text.clone();
        }
        if let Some(question_type) = patch.question_type {
            question.question_type = question_type;
        }
        if let Some(score) = patch.score {
            question.score = score;
        }
        Ok(Question {
            options: Vec::new(),
            ..question.clone()
        })
    }

    async fn delete_quiz_question(
        &self,
        question_id: QuestionId,
        _actor: ActorId,
    ) -> Result<(), BackendError> {
        let mut state = self.call(Call::DeleteQuestion(question_id))?;
        for quiz in &mut state.quizzes {
            quiz.questions.retain(|q| q.id != question_id);
        }
        Ok(())
    }

    async fn add_quiz_option(
        &self,
        question_id: QuestionId,
        _actor: ActorId,
        payload: &NewOption,
    ) -> Result<QuizOption, BackendError> {
        let mut state = self.call(Call::AddOption(question_id, payload.clone()))?;
        let option = QuizOption {
            id: OptionId(state.id()),
            question_id,
            text: payload.text.clone(),
            correct: payload.correct,
            order_index: payload.order_index,
        };
        let question = state.question_mut(question_id).ok_or_else(|| not_found(question_id))?;
        question.options.push(option.clone());
        Ok(option)
    }

    async fn update_quiz_option(
        &self,
        option_id: OptionId,
        _actor: ActorId,
        patch: &OptionPatch,
    ) -> Result<QuizOption, BackendError> {
        let mut state = self.call(Call::UpdateOption(option_id, patch.clone()))?;
        let option = state
            .quizzes
            .iter_mut()
            .flat_map(|quiz| quiz.questions.iter_mut())
            .flat_map(|question| question.options.iter_mut())
            .find(|o| o.id == option_id)
            .ok_or_else(|| not_found(option_id))?;
        if let Some(text) = &patch.text {
            option.text = text.clone();
        }
        if let Some(correct) = patch.correct {
            option.correct = correct;
        }
        Ok(option.clone())
    }

    async fn delete_quiz_option(
        &self,
        option_id: OptionId,
        _actor: ActorId,
    ) -> Result<(), BackendError> {
        let mut state = self.call(Call::DeleteOption(option_id))?;
        for question in state.quizzes.iter_mut().flat_map(|quiz| quiz.questions.iter_mut()) {
            question.options.retain(|o| o.id != option_id);
        }
        Ok(())
    }

    async fn list_assignments_by_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<Assignment>, BackendError> {
        let state = self.call(Call::ListAssignments(module_id))?;
        Ok(state.assignments.iter().filter(|a| a.module_id == module_id).cloned().collect())
    }

    async fn get_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, BackendError> {
        let state = self.call(Call::GetAssignment(assignment_id))?;
        state
            .assignments
            .iter()
            .find(|a| a.id == assignment_id)
            .cloned()
            .ok_or_else(|| not_found(assignment_id))
    }

    async fn create_assignment(
        &self,
        module_id: ModuleId,
        _actor: ActorId,
        payload: &NewAssignment,
    ) -> Result<Assignment, BackendError> {
        let mut state = self.call(Call::CreateAssignment(module_id, payload.clone()))?;
        let assignment = Assignment {
            id: AssignmentId(state.id()),
            module_id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            submission_type: payload.submission_type,
            max_score: payload.max_score,
            due_at: payload.due_at,
        };
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        _actor: ActorId,
        patch: &AssignmentPatch,
    ) -> Result<Assignment, BackendError> {
        let mut state = self.call(Call::UpdateAssignment(assignment_id, patch.clone()))?;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or_else(|| not_found(assignment_id))?;
        if let Some(title) = &patch.title {
            assignment.title = title.clone();
        }
        if let Some(max_score) = patch.max_score {
            assignment.max_score = max_score;
        }
        if let Some(due_at) = patch.due_at {
            assignment.due_at = Some(due_at);
        }
        Ok(assignment.clone())
    }

    async fn delete_assignment(
        &self,
        assignment_id: AssignmentId,
        _actor: ActorId,
    ) -> Result<(), BackendError> {
        let mut state = self.call(Call::DeleteAssignment(assignment_id))?;
        state.assignments.retain(|a| a.id != assignment_id);
        Ok(())
    }

    async fn upload_video(
        &self,
        file: MediaFile,
        _actor: ActorId,
        on_progress: ProgressFn<'_>,
    ) -> Result<MediaRef, BackendError> {
        let count = self.record(Call::UploadVideo(file.file_name.clone()));
        let chunks = self.lock().upload_chunks.max(1);
        let total = file.len();

        // The lock is not held here: progress callbacks push into the log.
        on_progress(0, total);
        for i in 1..=chunks {
            on_progress(total * i / chunks, total);
        }
        on_progress(total / 2, total);
        on_progress(total, total);

        let mut state = self.check("upload_video", count)?;
        let media_id = MediaId(format!("media-{}", state.id()));
        state.media.push(Media {
            id: media_id.clone(),
            lesson_id: None,
            file_name: file.file_name,
            content_type: file.content_type,
            size_bytes: total,
        });
        Ok(MediaRef {
            url: format!("https://signed.example/{media_id}?sig=upload"),
            media_id,
        })
    }

    async fn get_signed_media_url(
        &self,
        media_id: &MediaId,
        _actor: ActorId,
    ) -> Result<String, BackendError> {
        let mut state = self.call(Call::SignMedia(media_id.clone()))?;
        if !state.media.iter().any(|m| &m.id == media_id) {
            return Err(not_found(media_id));
        }
        state.signatures += 1;
        Ok(format!("https://signed.example/{media_id}?sig={}", state.signatures))
    }

    async fn list_media_by_lesson(&self, lesson_id: LessonId) -> Result<Vec<Media>, BackendError> {
        let state = self.call(Call::ListMedia(lesson_id))?;
        Ok(state
            .media
            .iter()
            .filter(|m| m.lesson_id == Some(lesson_id))
            .cloned()
            .collect())
    }
}

// --- fixtures ---

pub fn course() -> Course {
    Course {
        id: COURSE,
        title: "Rust for Authors".into(),
        description: String::new(),
        level: CourseLevel::Beginner,
        status: CourseStatus::Draft,
        enrollment_count: 0,
        module_count: 0,
        lesson_count: 0,
        price_cents: 0,
    }
}

pub fn module(id: i64, order_index: u32) -> Module {
    Module {
        id: ModuleId(id),
        course_id: COURSE,
        title: format!("Module {id}"),
        description: String::new(),
        order_index,
    }
}

pub fn reading(id: i64, module_id: i64, order_index: u32, title: &str) -> Lesson {
    Lesson {
        id: LessonId(id),
        module_id: ModuleId(module_id),
        title: title.into(),
        content: LessonContent::Reading { body: format!("{title} body") },
        order_index,
        duration_sec: 300,
    }
}

pub fn video(id: i64, module_id: i64, order_index: u32, source: VideoSource) -> Lesson {
    Lesson {
        id: LessonId(id),
        module_id: ModuleId(module_id),
        title: format!("Video {id}"),
        content: LessonContent::Video { source },
        order_index,
        duration_sec: 600,
    }
}

pub fn option(id: i64, question_id: i64, text: &str) -> QuizOption {
    QuizOption {
        id: OptionId(id),
        question_id: QuestionId(question_id),
        text: text.into(),
        correct: false,
        order_index: 1,
    }
}

pub fn question(
    id: i64,
    quiz_id: i64,
    question_type: QuestionType,
    options: Vec<QuizOption>,
) -> Question {
    Question {
        id: QuestionId(id),
        quiz_id: QuizId(quiz_id),
        text: format!("Question {id}?"),
        question_type,
        score: 10,
        order_index: 1,
        options,
    }
}

pub fn quiz(id: i64, module_id: i64, questions: Vec<Question>) -> Quiz {
    Quiz {
        id: QuizId(id),
        module_id: ModuleId(module_id),
        title: format!("Quiz {id}"),
        description: String::new(),
        pass_score: 70,
        order_index: 1,
        questions,
    }
}

pub fn assignment(id: i64, module_id: i64) -> Assignment {
    Assignment {
        id: AssignmentId(id),
        module_id: ModuleId(module_id),
        title: format!("Assignment {id}"),
        description: String::new(),
        submission_type: SubmissionType::Link,
        max_score: 100,
        due_at: None,
    }
}

pub fn mp4(len: usize) -> MediaFile {
    MediaFile::new("intro.mp4", "video/mp4", vec![7; len])
}

pub type TestWorkspace = Workspace<FakeBackend, StaticIdentity>;

pub fn workspace(fake: &FakeBackend) -> TestWorkspace {
    Workspace::new(Arc::new(fake.clone()), StaticIdentity(Some(ACTOR)), UploadPolicy::default())
}

/// Workspace with the course open and, if given, one module selected and
/// loaded. The call log starts empty.
pub async fn opened(fake: &FakeBackend, module_id: Option<i64>) -> TestWorkspace {
    let mut ws = workspace(fake);
    assert!(ws.open_course(COURSE).await.unwrap());
    if let Some(id) = module_id {
        assert!(ws.open_module(ModuleId(id)).await.unwrap());
    }
    fake.clear_calls();
    ws
}
