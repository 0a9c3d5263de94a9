//! Which course, module and content tab the author is looking at, and the
//! scoped loads each selection triggers.
//!
//! Every selection change bumps a generation counter and hands out a load
//! ticket stamped with it. Results are applied only if their ticket is still
//! the current one, so a slow answer for a module the author has already
//! left is dropped instead of overwriting the newer view.

use crate::backend::Backend;
use crate::error::{AuthoringError, BackendError, Result, ValidationError};
use crate::models::*;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTab {
    #[default]
    Lessons,
    Quizzes,
    Assignments,
    CodeLabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Course {
        course_id: CourseId,
    },
    Module {
        course_id: CourseId,
        module_id: ModuleId,
        tab: ContentTab,
    },
}

impl Selection {
    pub fn course_id(&self) -> Option<CourseId> {
        match *self {
            Selection::None => None,
            Selection::Course { course_id } | Selection::Module { course_id, .. } => {
                Some(course_id)
            }
        }
    }

    pub fn module_id(&self) -> Option<ModuleId> {
        match *self {
            Selection::Module { module_id, .. } => Some(module_id),
            _ => None,
        }
    }
}

/// Ticket for the course header and module list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseLoad {
    pub course_id: CourseId,
    generation: u64,
}

pub struct CourseContent {
    pub course: Result<Course, BackendError>,
    pub modules: Result<Vec<Module>, BackendError>,
}

impl CourseLoad {
    pub async fn fetch<B: Backend + ?Sized>(&self, backend: &B) -> CourseContent {
        let (course, modules) = tokio::join!(
            backend.get_course(self.course_id),
            backend.list_modules(self.course_id)
        );
        CourseContent { course, modules }
    }
}

/// Ticket for the three scoped loads of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleLoad {
    pub module_id: ModuleId,
    generation: u64,
}

pub struct ModuleContent {
    pub lessons: Result<Vec<Lesson>, BackendError>,
    pub quizzes: Result<Vec<Quiz>, BackendError>,
    pub assignments: Result<Vec<Assignment>, BackendError>,
}

impl ModuleLoad {
    pub async fn fetch<B: Backend + ?Sized>(&self, backend: &B) -> ModuleContent {
        let (lessons, quizzes, assignments) = tokio::join!(
            backend.list_lessons_by_module(self.module_id),
            backend.list_quizzes_by_module(self.module_id),
            backend.list_assignments_by_module(self.module_id),
        );
        ModuleContent {
            lessons,
            quizzes,
            assignments,
        }
    }
}

#[derive(Debug, Default)]
pub struct NavigationController {
    selection: Selection,
    generation: u64,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn select_course(&mut self, store: &mut EntityStore, course_id: CourseId) -> CourseLoad {
        let generation = self.bump();
        self.selection = Selection::Course { course_id };
        store.begin_course();
        tracing::debug!(course_id = %course_id, generation, "course selected");
        CourseLoad { course_id, generation }
    }

    /// Applies a course load. `Ok(false)` means the ticket was stale and the
    /// results were dropped.
    pub fn apply_course(
        &self,
        store: &mut EntityStore,
        load: &CourseLoad,
        content: CourseContent,
    ) -> Result<bool> {
        if load.generation != self.generation
            || self.selection.course_id() != Some(load.course_id)
        {
            tracing::debug!(course_id = %load.course_id, "dropping stale course load");
            return Ok(false);
        }
        let course = content
            .course
            .map_err(|e| AuthoringError::remote("load course", e))?;
        let modules = content
            .modules
            .map_err(|e| AuthoringError::remote("load modules", e))?;
        store.set_course(Some(course));
        store.set_modules(modules);
        Ok(true)
    }

    pub fn select_module(
        &mut self,
        store: &mut EntityStore,
        module_id: ModuleId,
    ) -> Result<ModuleLoad> {
        let Some(course_id) = self.selection.course_id() else {
            return Err(ValidationError::NoCourseSelected.into());
        };
        if !store.modules().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        if store.module(module_id).is_none() {
            return Err(AuthoringError::StaleReference(EntityRef::Module(module_id)));
        }
        let generation = self.bump();
        self.selection = Selection::Module {
            course_id,
            module_id,
            tab: ContentTab::default(),
        };
        // Cleared before the new loads resolve so the previous module's
        // content is never shown under this one.
        store.begin_scope(Some(module_id));
        tracing::debug!(module_id = %module_id, generation, "module selected");
        Ok(ModuleLoad { module_id, generation })
    }

    /// Applies whichever scoped loads succeeded and reports the first failure.
    pub fn apply_module(
        &self,
        store: &mut EntityStore,
        load: &ModuleLoad,
        content: ModuleContent,
    ) -> Result<bool> {
        if load.generation != self.generation
            || self.selection.module_id() != Some(load.module_id)
        {
            tracing::debug!(module_id = %load.module_id, "dropping stale module load");
            return Ok(false);
        }
        let mut first_error = None;
        match content.lessons {
            Ok(lessons) => {
                store.set_lessons_for_module(load.module_id, lessons);
            }
            Err(e) => {
                tracing::error!(module_id = %load.module_id, error = %e, "lesson load failed");
                first_error.get_or_insert(AuthoringError::remote("load lessons", e));
            }
        }
        match content.quizzes {
            Ok(quizzes) => {
                store.set_quizzes_for_module(load.module_id, quizzes);
            }
            Err(e) => {
                tracing::error!(module_id = %load.module_id, error = %e, "quiz load failed");
                first_error.get_or_insert(AuthoringError::remote("load quizzes", e));
            }
        }
        match content.assignments {
            Ok(assignments) => {
                store.set_assignments_for_module(load.module_id, assignments);
            }
            Err(e) => {
                tracing::error!(module_id = %load.module_id, error = %e, "assignment load failed");
                first_error.get_or_insert(AuthoringError::remote("load assignments", e));
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    pub fn select_tab(&mut self, tab: ContentTab) -> Result<(), ValidationError> {
        match &mut self.selection {
            Selection::Module { tab: current, .. } => {
                *current = tab;
                Ok(())
            }
            _ => Err(ValidationError::NoModuleSelected),
        }
    }

    /// Closes the module detail view and tears down its scoped collections.
    pub fn close_module(&mut self, store: &mut EntityStore) {
        if let Selection::Module { course_id, .. } = self.selection {
            self.bump();
            self.selection = Selection::Course { course_id };
            store.begin_scope(None);
        }
    }

    pub fn close_course(&mut self, store: &mut EntityStore) {
        self.bump();
        self.selection = Selection::None;
        store.clear_course();
    }

    /// Falls back to the course view if `module_id` was the selected module.
    pub fn module_removed(&mut self, store: &mut EntityStore, module_id: ModuleId) {
        if self.selection.module_id() == Some(module_id) {
            self.close_module(store);
        }
    }

    pub async fn open_course<B: Backend + ?Sized>(
        &mut self,
        store: &mut EntityStore,
        backend: &B,
        course_id: CourseId,
    ) -> Result<bool> {
        let load = self.select_course(store, course_id);
        let content = load.fetch(backend).await;
        self.apply_course(store, &load, content)
    }

    pub async fn open_module<B: Backend + ?Sized>(
        &mut self,
        store: &mut EntityStore,
        backend: &B,
        module_id: ModuleId,
    ) -> Result<bool> {
        let load = self.select_module(store, module_id)?;
        let content = load.fetch(backend).await;
        self.apply_module(store, &load, content)
    }
}
