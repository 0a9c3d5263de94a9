use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::{multipart, Body, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::backend::{Backend, ProgressFn};
use crate::config::Config;
use crate::error::BackendError;
use crate::models::*;

pub const ACTOR_HEADER: &str = "x-actor-id";

#[derive(Deserialize)]
struct SignedUrl {
    url: String,
}

/// REST client for the course API and media service.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    upload_timeout: Duration,
    chunk_bytes: usize,
}

fn transport(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Client(e)
    }
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            upload_timeout: config.upload_timeout,
            chunk_bytes: config.upload_chunk_bytes.max(1),
        })
    }

    fn request(&self, method: Method, path: &str, actor: Option<ActorId>) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}/{}", self.base_url, path));
        match actor {
            Some(actor) => builder.header(ACTOR_HEADER, actor.0.to_string()),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        tracing::debug!(%status, message = %message, "backend returned an error status");
        Err(BackendError::status(status, message))
    }

    async fn execute(builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await.map_err(transport)?;
        Self::check(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = Self::execute(self.request(Method::GET, path, None)).await?;
        Self::decode(response).await
    }

    async fn send_json<T, P>(
        &self,
        method: Method,
        path: &str,
        actor: ActorId,
        body: &P,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync + ?Sized,
    {
        let response = Self::execute(self.request(method, path, Some(actor)).json(body)).await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str, actor: ActorId) -> Result<(), BackendError> {
        Self::execute(self.request(Method::DELETE, path, Some(actor))).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_course(&self, course_id: CourseId) -> Result<Course, BackendError> {
        self.get_json(&format!("api/courses/{course_id}")).await
    }

    async fn update_course(
        &self,
        course_id: CourseId,
        actor: ActorId,
        patch: &CoursePatch,
    ) -> Result<Course, BackendError> {
        self.send_json(Method::PATCH, &format!("api/courses/{course_id}"), actor, patch)
            .await
    }

    async fn submit_course(
        &self,
        course_id: CourseId,
        actor: ActorId,
    ) -> Result<Course, BackendError> {
        let path = format!("api/courses/{course_id}/submit");
        let response = Self::execute(self.request(Method::POST, &path, Some(actor))).await?;
        Self::decode(response).await
    }

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, BackendError> {
        self.get_json(&format!("api/courses/{course_id}/modules")).await
    }

    async fn create_module(
        &self,
        course_id: CourseId,
        actor: ActorId,
        payload: &NewModule,
    ) -> Result<Module, BackendError> {
        self.send_json(Method::POST, &format!("api/courses/{course_id}/modules"), actor, payload)
            .await
    }

    async fn update_module(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        patch: &ModulePatch,
    ) -> Result<Module, BackendError> {
        self.send_json(Method::PATCH, &format!("api/modules/{module_id}"), actor, patch)
            .await
    }

    async fn delete_module(&self, module_id: ModuleId, actor: ActorId) -> Result<(), BackendError> {
        self.delete(&format!("api/modules/{module_id}"), actor).await
    }

    async fn list_lessons_by_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<Lesson>, BackendError> {
        self.get_json(&format!("api/modules/{module_id}/lessons")).await
    }

    async fn get_lesson(&self, lesson_id: LessonId) -> Result<Lesson, BackendError> {
        self.get_json(&format!("api/lessons/{lesson_id}")).await
    }

    async fn create_lesson(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        payload: &NewLesson,
    ) -> Result<Lesson, BackendError> {
        self.send_json(Method::POST, &format!("api/modules/{module_id}/lessons"), actor, payload)
            .await
    }

    async fn update_lesson(
        &self,
        lesson_id: LessonId,
        actor: ActorId,
        patch: &LessonPatch,
    ) -> Result<Lesson, BackendError> {
        self.send_json(Method::PATCH, &format!("api/lessons/{lesson_id}"), actor, patch)
            .await
    }

    async fn delete_lesson(&self, lesson_id: LessonId, actor: ActorId) -> Result<(), BackendError> {
        self.delete(&format!("api/lessons/{lesson_id}"), actor).await
    }

    async fn reorder_lessons(
        &self,
        course_id: CourseId,
        actor: ActorId,
        ordered: &[LessonId],
    ) -> Result<(), BackendError> {
        let body = ReorderLessonsReq {
            ordered_lesson_ids: ordered.to_vec(),
        };
        let builder = self
            .request(Method::PUT, &format!("api/courses/{course_id}/lessons/order"), Some(actor))
            .json(&body);
        Self::execute(builder).await?;
        Ok(())
    }

    async fn list_quizzes_by_module(&self, module_id: ModuleId) -> Result<Vec<Quiz>, BackendError> {
        self.get_json(&format!("api/modules/{module_id}/quizzes")).await
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Quiz, BackendError> {
        self.get_json(&format!("api/quizzes/{quiz_id}")).await
    }

    async fn create_quiz(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        payload: &NewQuiz,
    ) -> Result<Quiz, BackendError> {
        self.send_json(Method::POST, &format!("api/modules/{module_id}/quizzes"), actor, payload)
            .await
    }

    async fn update_quiz(
        &self,
        quiz_id: QuizId,
        actor: ActorId,
        patch: &QuizPatch,
    ) -> Result<Quiz, BackendError> {
        self.send_json(Method::PATCH, &format!("api/quizzes/{quiz_id}"), actor, patch)
            .await
    }

    async fn delete_quiz(&self, quiz_id: QuizId, actor: ActorId) -> Result<(), BackendError> {
        self.delete(&format!("api/quizzes/{quiz_id}"), actor).await
    }

    async fn add_quiz_question(
        &self,
        quiz_id: QuizId,
        actor: ActorId,
        payload: &NewQuestion,
    ) -> Result<Question, BackendError> {
        self.send_json(Method::POST, &format!("api/quizzes/{quiz_id}/questions"), actor, payload)
            .await
    }

    async fn update_quiz_question(
        &self,
        question_id: QuestionId,
        actor: ActorId,
        patch: &QuestionPatch,
    ) -> Result<Question, BackendError> {
        self.send_json(Method::PATCH, &format!("api/questions/{question_id}"), actor, patch)
            .await
    }

    async fn delete_quiz_question(
        &self,
        question_id: QuestionId,
        actor: ActorId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("api/questions/{question_id}"), actor).await
    }

    async fn add_quiz_option(
        &self,
        question_id: QuestionId,
        actor: ActorId,
        payload: &NewOption,
    ) -> Result<QuizOption, BackendError> {
        let path = format!("api/questions/{question_id}/options");
        self.send_json(Method::POST, &path, actor, payload).await
    }

    async fn update_quiz_option(
        &self,
        option_id: OptionId,
        actor: ActorId,
        patch: &OptionPatch,
    ) -> Result<QuizOption, BackendError> {
        self.send_json(Method::PATCH, &format!("api/options/{option_id}"), actor, patch)
            .await
    }

    async fn delete_quiz_option(
        &self,
        option_id: OptionId,
        actor: ActorId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("api/options/{option_id}"), actor).await
    }

    async fn list_assignments_by_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<Assignment>, BackendError> {
        self.get_json(&format!("api/modules/{module_id}/assignments")).await
    }

    async fn get_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, BackendError> {
        self.get_json(&format!("api/assignments/{assignment_id}")).await
    }

    async fn create_assignment(
        &self,
        module_id: ModuleId,
        actor: ActorId,
        payload: &NewAssignment,
    ) -> Result<Assignment, BackendError> {
        let path = format!("api/modules/{module_id}/assignments");
        self.send_json(Method::POST, &path, actor, payload).await
    }

    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        actor: ActorId,
        patch: &AssignmentPatch,
    ) -> Result<Assignment, BackendError> {
        self.send_json(Method::PATCH, &format!("api/assignments/{assignment_id}"), actor, patch)
            .await
    }

    async fn delete_assignment(
        &self,
        assignment_id: AssignmentId,
        actor: ActorId,
    ) -> Result<(), BackendError> {
        self.delete(&format!("api/assignments/{assignment_id}"), actor).await
    }

    async fn upload_video(
        &self,
        file: MediaFile,
        actor: ActorId,
        on_progress: ProgressFn<'_>,
    ) -> Result<MediaRef, BackendError> {
        let total = file.len();
        let MediaFile {
            file_name,
            content_type,
            bytes,
        } = file;

        // Each chunk reports how far into the file it ends as it is handed
        // to the connection.
        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel::<u64>();
        let chunk = self.chunk_bytes;
        let chunks = bytes.len().div_ceil(chunk);
        let body = stream::iter(0..chunks).map(move |i| {
            let start = i * chunk;
            let end = (start + chunk).min(bytes.len());
            let piece = bytes.slice(start..end);
            let _ = sent_tx.send(end as u64);
            Ok::<_, std::io::Error>(piece)
        });

        let part = multipart::Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file_name)
            .mime_str(&content_type)?;
        let form = multipart::Form::new().part("file", part);
        let request = self
            .request(Method::POST, "api/media/videos", Some(actor))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send();
        tokio::pin!(request);

        on_progress(0, total);
        let result = loop {
            tokio::select! {
                Some(sent) = sent_rx.recv() => on_progress(sent, total),
                result = &mut request => break result,
            }
        };
        while let Ok(sent) = sent_rx.try_recv() {
            on_progress(sent, total);
        }

        let response = Self::check(result.map_err(transport)?).await?;
        Self::decode(response).await
    }

    async fn get_signed_media_url(
        &self,
        media_id: &MediaId,
        actor: ActorId,
    ) -> Result<String, BackendError> {
        let path = format!("api/media/{media_id}/url");
        let response = Self::execute(self.request(Method::GET, &path, Some(actor))).await?;
        let signed: SignedUrl = Self::decode(response).await?;
        Ok(signed.url)
    }

    async fn list_media_by_lesson(&self, lesson_id: LessonId) -> Result<Vec<Media>, BackendError> {
        self.get_json(&format!("api/lessons/{lesson_id}/media")).await
    }
}
