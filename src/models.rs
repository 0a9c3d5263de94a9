use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($($name:ident),* $(,)?) => {$(
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    )*};
}

entity_id!(CourseId, ModuleId, LessonId, QuizId, QuestionId, OptionId, AssignmentId, ActorId);

/// Storage key of an uploaded asset. Durable, unlike the signed URL it resolves to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Pending,
    Public,
    Archived,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: CourseLevel,
    pub status: CourseStatus,
    #[serde(default)]
    pub enrollment_count: u32,
    #[serde(default)]
    pub module_count: u32,
    #[serde(default)]
    pub lesson_count: u32,
    #[serde(default)]
    pub price_cents: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Reading,
    Quiz,
    Assignment,
    CodeLab,
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LessonKind::Video => "video",
            LessonKind::Reading => "reading",
            LessonKind::Quiz => "quiz",
            LessonKind::Assignment => "assignment",
            LessonKind::CodeLab => "code lab",
        };
        f.write_str(s)
    }
}

/// Where a video lesson's stream comes from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    Direct { url: String },
    ByReference { media_id: MediaId },
}

/// Type-specific payload of a lesson. The variant is the lesson's type and
/// never changes after creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LessonContent {
    Video { source: VideoSource },
    Reading { body: String },
    Quiz,
    Assignment,
    CodeLab,
}

impl LessonContent {
    pub fn kind(&self) -> LessonKind {
        match self {
            LessonContent::Video { .. } => LessonKind::Video,
            LessonContent::Reading { .. } => LessonKind::Reading,
            LessonContent::Quiz => LessonKind::Quiz,
            LessonContent::Assignment => LessonKind::Assignment,
            LessonContent::CodeLab => LessonKind::CodeLab,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub title: String,
    pub content: LessonContent,
    pub order_index: u32,
    #[serde(default)]
    pub duration_sec: u32,
}

impl Lesson {
    pub fn kind(&self) -> LessonKind {
        self.content.kind()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub text: String,
    pub correct: bool,
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub text: String,
    pub question_type: QuestionType,
    pub score: u32,
    pub order_index: u32,
    #[serde(default)]
    pub options: Vec<QuizOption>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub module_id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub pass_score: u8,
    pub order_index: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionType {
    File,
    Text,
    Link,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub module_id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub submission_type: SubmissionType,
    pub max_score: u32,
    pub due_at: Option<DateTime<Utc>>,
}

/// An uploaded asset as listed by the media service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: MediaId,
    pub lesson_id: Option<LessonId>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// A media identifier together with a freshly resolved signed URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub media_id: MediaId,
    pub url: String,
}

/// A file picked by the author. Chunks of it share the one buffer while it
/// is streamed out.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// --- request payloads ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CourseLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    pub title: String,
    pub description: String,
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModulePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModulePatch {
    pub fn order_index(order_index: u32) -> Self {
        Self {
            order_index: Some(order_index),
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
    pub title: String,
    pub content: LessonContent,
    pub order_index: u32,
    pub duration_sec: u32,
}

/// Editable body of an existing lesson. Only the types that carry a body
/// appear here, and there is no way to express a type change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LessonBody {
    Reading { body: String },
    Video { source: VideoSource },
}

impl LessonBody {
    pub fn kind(&self) -> LessonKind {
        match self {
            LessonBody::Reading { .. } => LessonKind::Reading,
            LessonBody::Video { .. } => LessonKind::Video,
        }
    }

    pub fn into_content(self) -> LessonContent {
        match self {
            LessonBody::Reading { body } => LessonContent::Reading { body },
            LessonBody::Video { source } => LessonContent::Video { source },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<LessonBody>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub pass_score: u8,
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_score: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub text: String,
    pub question_type: QuestionType,
    pub score: u32,
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOption {
    pub text: String,
    pub correct: bool,
    pub order_index: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub submission_type: SubmissionType,
    pub max_score: u32,
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_type: Option<SubmissionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReorderLessonsReq {
    pub ordered_lesson_ids: Vec<LessonId>,
}

/// Points at one node of the authoring tree together with its ancestry, so
/// that a deleted ancestor can invalidate anything open beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Module(ModuleId),
    Lesson {
        module_id: ModuleId,
        lesson_id: LessonId,
    },
    Quiz {
        module_id: ModuleId,
        quiz_id: QuizId,
    },
    Question {
        module_id: ModuleId,
        quiz_id: QuizId,
        question_id: QuestionId,
    },
    QuizOption {
        module_id: ModuleId,
        quiz_id: QuizId,
        question_id: QuestionId,
        option_id: OptionId,
    },
    Assignment {
        module_id: ModuleId,
        assignment_id: AssignmentId,
    },
}

impl EntityRef {
    pub fn module_id(&self) -> ModuleId {
        match *self {
            EntityRef::Module(module_id)
            | EntityRef::Lesson { module_id, .. }
            | EntityRef::Quiz { module_id, .. }
            | EntityRef::Question { module_id, .. }
            | EntityRef::QuizOption { module_id, .. }
            | EntityRef::Assignment { module_id, .. } => module_id,
        }
    }

    fn quiz_id(&self) -> Option<QuizId> {
        match *self {
            EntityRef::Quiz { quiz_id, .. }
            | EntityRef::Question { quiz_id, .. }
            | EntityRef::QuizOption { quiz_id, .. } => Some(quiz_id),
            _ => None,
        }
    }

    fn question_id(&self) -> Option<QuestionId> {
        match *self {
            EntityRef::Question { question_id, .. } | EntityRef::QuizOption { question_id, .. } => {
                Some(question_id)
            }
            _ => None,
        }
    }

    /// True when `self` is `ancestor` or lives somewhere beneath it.
    pub fn is_within(&self, ancestor: &EntityRef) -> bool {
        if self == ancestor {
            return true;
        }
        match *ancestor {
            EntityRef::Module(module_id) => self.module_id() == module_id,
            EntityRef::Quiz { quiz_id, .. } => self.quiz_id() == Some(quiz_id),
            EntityRef::Question { question_id, .. } => self.question_id() == Some(question_id),
            EntityRef::Lesson { .. }
            | EntityRef::QuizOption { .. }
            | EntityRef::Assignment { .. } => false,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Module(id) => write!(f, "module {id}"),
            EntityRef::Lesson { lesson_id, .. } => write!(f, "lesson {lesson_id}"),
            EntityRef::Quiz { quiz_id, .. } => write!(f, "quiz {quiz_id}"),
            EntityRef::Question { question_id, .. } => write!(f, "question {question_id}"),
            EntityRef::QuizOption { option_id, .. } => write!(f, "option {option_id}"),
            EntityRef::Assignment { assignment_id, .. } => write!(f, "assignment {assignment_id}"),
        }
    }
}
