//! Client-side copy of the open course's authoring tree.
//!
//! Collections are held behind `Arc` and never edited in place: every change
//! builds a new vector and swaps it in. A [`Snapshot`] taken before an
//! optimistic change therefore stays exactly as it was and can be restored
//! wholesale if the backend rejects the change.

use std::ops::Deref;
use std::sync::Arc;

use crate::models::*;
use crate::ordering::Sibling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Frozen view of a collection at one point in time.
#[derive(Debug)]
pub struct Snapshot<T>(Arc<Vec<T>>);

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Snapshot(Arc::clone(&self.0))
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T: PartialEq> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Arc<Vec<T>>,
    state: LoadState,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            state: LoadState::Idle,
        }
    }
}

impl<T: Clone> Collection<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot(Arc::clone(&self.items))
    }

    fn replace(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
        self.state = LoadState::Ready;
    }

    fn restore(&mut self, snapshot: Snapshot<T>) {
        self.items = snapshot.0;
    }

    fn reset(&mut self, state: LoadState) {
        self.items = Arc::new(Vec::new());
        self.state = state;
    }

    /// Runs `f` on a fresh copy and swaps it in only if `f` reports a change.
    fn update(&mut self, f: impl FnOnce(&mut Vec<T>) -> bool) -> bool {
        let mut next = self.items.as_ref().clone();
        if f(&mut next) {
            self.items = Arc::new(next);
            true
        } else {
            false
        }
    }
}

fn sort_siblings<T: Sibling>(items: &mut [T]) {
    items.sort_by_key(|item| (item.order_index(), item.sibling_key()));
}

fn replace_where<T>(items: &mut [T], item: T, matches: impl Fn(&T) -> bool) -> bool {
    match items.iter_mut().find(|existing| matches(existing)) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

fn remove_where<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|item| !matches(item));
    items.len() != before
}

#[derive(Debug, Default)]
pub struct EntityStore {
    course: Option<Course>,
    modules: Collection<Module>,
    scope: Option<ModuleId>,
    lessons: Collection<Lesson>,
    quizzes: Collection<Quiz>,
    assignments: Collection<Assignment>,
    revision: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every change; renderers compare it to skip redundant work.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn course(&self) -> Option<&Course> {
        self.course.as_ref()
    }

    pub fn modules(&self) -> &Collection<Module> {
        &self.modules
    }

    /// Module whose lessons, quizzes and assignments are currently held.
    pub fn scope(&self) -> Option<ModuleId> {
        self.scope
    }

    pub fn lessons(&self) -> &Collection<Lesson> {
        &self.lessons
    }

    pub fn quizzes(&self) -> &Collection<Quiz> {
        &self.quizzes
    }

    pub fn assignments(&self) -> &Collection<Assignment> {
        &self.assignments
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.items().iter().find(|m| m.id == id)
    }

    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.items().iter().find(|l| l.id == id)
    }

    pub fn quiz(&self, id: QuizId) -> Option<&Quiz> {
        self.quizzes.items().iter().find(|q| q.id == id)
    }

    pub fn question(&self, quiz_id: QuizId, id: QuestionId) -> Option<&Question> {
        self.quiz(quiz_id)?.questions.iter().find(|q| q.id == id)
    }

    pub fn option(
        &self,
        quiz_id: QuizId,
        question_id: QuestionId,
        id: OptionId,
    ) -> Option<&QuizOption> {
        self.question(quiz_id, question_id)?.options.iter().find(|o| o.id == id)
    }

    pub fn assignment(&self, id: AssignmentId) -> Option<&Assignment> {
        self.assignments.items().iter().find(|a| a.id == id)
    }

    /// Whether the referenced node is still present.
    pub fn contains(&self, target: &EntityRef) -> bool {
        match *target {
            EntityRef::Module(id) => self.module(id).is_some(),
            EntityRef::Lesson { lesson_id, .. } => self.lesson(lesson_id).is_some(),
            EntityRef::Quiz { quiz_id, .. } => self.quiz(quiz_id).is_some(),
            EntityRef::Question {
                quiz_id,
                question_id,
                ..
            } => self.question(quiz_id, question_id).is_some(),
            EntityRef::QuizOption {
                quiz_id,
                question_id,
                option_id,
                ..
            } => self.option(quiz_id, question_id, option_id).is_some(),
            EntityRef::Assignment { assignment_id, .. } => self.assignment(assignment_id).is_some(),
        }
    }

    // --- course & modules ---

    pub fn set_course(&mut self, course: Option<Course>) {
        self.course = course;
        self.touch(true);
    }

    /// Forgets the module list and everything scoped under it.
    pub fn begin_course(&mut self) {
        self.course = None;
        self.modules.reset(LoadState::Loading);
        self.begin_scope(None);
    }

    pub fn clear_course(&mut self) {
        self.course = None;
        self.modules.reset(LoadState::Idle);
        self.begin_scope(None);
    }

    pub fn set_modules(&mut self, mut modules: Vec<Module>) {
        sort_siblings(&mut modules);
        self.modules.replace(modules);
        self.touch(true);
    }

    pub fn insert_module(&mut self, module: Module) -> bool {
        let changed = self.modules.update(|items| {
            if items.iter().any(|m| m.id == module.id) {
                return false;
            }
            items.push(module);
            sort_siblings(items);
            true
        });
        self.touch(changed)
    }

    pub fn upsert_module(&mut self, module: Module) -> bool {
        let changed = self.modules.update(|items| {
            let id = module.id;
            let found = replace_where(items, module, |m| m.id == id);
            if found {
                sort_siblings(items);
            }
            found
        });
        self.touch(changed)
    }

    /// Drops the module and, if it is the scoped one, its lessons, quizzes
    /// and assignments with it.
    pub fn remove_module(&mut self, id: ModuleId) -> bool {
        let changed = self.modules.update(|items| remove_where(items, |m| m.id == id));
        if changed && self.scope == Some(id) {
            self.begin_scope(None);
        }
        self.touch(changed)
    }

    pub(crate) fn replace_modules(&mut self, modules: Vec<Module>) {
        self.modules.replace(modules);
        self.touch(true);
    }

    pub fn restore_modules(&mut self, snapshot: Snapshot<Module>) {
        self.modules.restore(snapshot);
        self.touch(true);
    }

    // --- module scope ---

    /// Clears the scoped collections and points them at `module_id`. They stay
    /// empty and `Loading` until the matching `set_*_for_module` arrives.
    pub fn begin_scope(&mut self, module_id: Option<ModuleId>) {
        let state = if module_id.is_some() {
            LoadState::Loading
        } else {
            LoadState::Idle
        };
        self.scope = module_id;
        self.lessons.reset(state);
        self.quizzes.reset(state);
        self.assignments.reset(state);
        self.touch(true);
    }

    pub fn set_lessons_for_module(
        &mut self,
        module_id: ModuleId,
        mut lessons: Vec<Lesson>,
    ) -> bool {
        if self.scope != Some(module_id) {
            return false;
        }
        sort_siblings(&mut lessons);
        self.lessons.replace(lessons);
        self.touch(true)
    }

    pub fn set_quizzes_for_module(&mut self, module_id: ModuleId, mut quizzes: Vec<Quiz>) -> bool {
        if self.scope != Some(module_id) {
            return false;
        }
        sort_siblings(&mut quizzes);
        self.quizzes.replace(quizzes);
        self.touch(true)
    }

    pub fn set_assignments_for_module(
        &mut self,
        module_id: ModuleId,
        assignments: Vec<Assignment>,
    ) -> bool {
        if self.scope != Some(module_id) {
            return false;
        }
        self.assignments.replace(assignments);
        self.touch(true)
    }

    // --- lessons ---

    pub fn insert_lesson(&mut self, lesson: Lesson) -> bool {
        if self.scope != Some(lesson.module_id) {
            return false;
        }
        let changed = self.lessons.update(|items| {
            if items.iter().any(|l| l.id == lesson.id) {
                return false;
            }
            items.push(lesson);
            sort_siblings(items);
            true
        });
        self.touch(changed)
    }

    pub fn upsert_lesson(&mut self, lesson: Lesson) -> bool {
        let changed = self.lessons.update(|items| {
            let id = lesson.id;
            let found = replace_where(items, lesson, |l| l.id == id);
            if found {
                sort_siblings(items);
            }
            found
        });
        self.touch(changed)
    }

    pub fn remove_lesson(&mut self, id: LessonId) -> bool {
        let changed = self.lessons.update(|items| remove_where(items, |l| l.id == id));
        self.touch(changed)
    }

    pub(crate) fn replace_lessons(&mut self, lessons: Vec<Lesson>) {
        self.lessons.replace(lessons);
        self.touch(true);
    }

    pub fn restore_lessons(&mut self, snapshot: Snapshot<Lesson>) {
        self.lessons.restore(snapshot);
        self.touch(true);
    }

    // --- quizzes, questions, options ---

    pub fn insert_quiz(&mut self, quiz: Quiz) -> bool {
        if self.scope != Some(quiz.module_id) {
            return false;
        }
        let changed = self.quizzes.update(|items| {
            if items.iter().any(|q| q.id == quiz.id) {
                return false;
            }
            items.push(quiz);
            sort_siblings(items);
            true
        });
        self.touch(changed)
    }

    pub fn upsert_quiz(&mut self, quiz: Quiz) -> bool {
        let changed = self.quizzes.update(|items| {
            let id = quiz.id;
            replace_where(items, quiz, |q| q.id == id)
        });
        self.touch(changed)
    }

    pub fn remove_quiz(&mut self, id: QuizId) -> bool {
        let changed = self.quizzes.update(|items| remove_where(items, |q| q.id == id));
        self.touch(changed)
    }

    fn update_quiz_record(&mut self, quiz_id: QuizId, f: impl FnOnce(&mut Quiz) -> bool) -> bool {
        let changed = self.quizzes.update(|items| match items.iter_mut().find(|q| q.id == quiz_id) {
            Some(quiz) => f(quiz),
            None => false,
        });
        self.touch(changed)
    }

    pub fn insert_question(&mut self, quiz_id: QuizId, question: Question) -> bool {
        self.update_quiz_record(quiz_id, |quiz| {
            if quiz.questions.iter().any(|q| q.id == question.id) {
                return false;
            }
            quiz.questions.push(question);
            sort_siblings(&mut quiz.questions);
            true
        })
    }

    pub fn upsert_question(&mut self, quiz_id: QuizId, question: Question) -> bool {
        self.update_quiz_record(quiz_id, |quiz| {
            let id = question.id;
            let found = replace_where(&mut quiz.questions, question, |q| q.id == id);
            if found {
                sort_siblings(&mut quiz.questions);
            }
            found
        })
    }

    pub fn remove_question(&mut self, quiz_id: QuizId, id: QuestionId) -> bool {
        self.update_quiz_record(quiz_id, |quiz| remove_where(&mut quiz.questions, |q| q.id == id))
    }

    fn update_question_record(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        f: impl FnOnce(&mut Question) -> bool,
    ) -> bool {
        self.update_quiz_record(quiz_id, |quiz| {
            match quiz.questions.iter_mut().find(|q| q.id == question_id) {
                Some(question) => f(question),
                None => false,
            }
        })
    }

    pub fn insert_option(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        option: QuizOption,
    ) -> bool {
        self.update_question_record(quiz_id, question_id, |question| {
            if question.options.iter().any(|o| o.id == option.id) {
                return false;
            }
            question.options.push(option);
            sort_siblings(&mut question.options);
            true
        })
    }

    pub fn upsert_option(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        option: QuizOption,
    ) -> bool {
        self.update_question_record(quiz_id, question_id, |question| {
            let id = option.id;
            replace_where(&mut question.options, option, |o| o.id == id)
        })
    }

    pub fn remove_option(
        &mut self,
        quiz_id: QuizId,
        question_id: QuestionId,
        id: OptionId,
    ) -> bool {
        self.update_question_record(quiz_id, question_id, |question| {
            remove_where(&mut question.options, |o| o.id == id)
        })
    }

    // --- assignments ---

    pub fn insert_assignment(&mut self, assignment: Assignment) -> bool {
        if self.scope != Some(assignment.module_id) {
            return false;
        }
        let changed = self.assignments.update(|items| {
            if items.iter().any(|a| a.id == assignment.id) {
                return false;
            }
            items.push(assignment);
            true
        });
        self.touch(changed)
    }

    pub fn upsert_assignment(&mut self, assignment: Assignment) -> bool {
        let changed = self.assignments.update(|items| {
            let id = assignment.id;
            replace_where(items, assignment, |a| a.id == id)
        });
        self.touch(changed)
    }

    pub fn remove_assignment(&mut self, id: AssignmentId) -> bool {
        let changed = self.assignments.update(|items| remove_where(items, |a| a.id == id));
        self.touch(changed)
    }
}
