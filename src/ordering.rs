//! Sibling ordering for modules (step moves) and lessons (drag and drop).
//!
//! Both paths change the store first and talk to the backend second. Module
//! swaps write the two affected rows one after another and put the whole
//! previous list back if either write fails. Lesson repositioning renumbers
//! every sibling `1..=N` and sends the full order in one call.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{AuthoringError, Result, ValidationError};
use crate::models::*;
use crate::store::EntityStore;

/// Anything kept in a numbered sibling list.
pub trait Sibling: Clone {
    fn sibling_key(&self) -> i64;
    fn order_index(&self) -> u32;
    fn set_order_index(&mut self, order_index: u32);
}

macro_rules! impl_sibling {
    ($($ty:ty),*) => {$(
        impl Sibling for $ty {
            fn sibling_key(&self) -> i64 {
                self.id.0
            }

            fn order_index(&self) -> u32 {
                self.order_index
            }

            fn set_order_index(&mut self, order_index: u32) {
                self.order_index = order_index;
            }
        }
    )*};
}

impl_sibling!(Module, Lesson, Quiz, Question, QuizOption);

/// Order index for a sibling appended at the end of a list of `count`.
pub fn next_order_index(count: usize) -> u32 {
    u32::try_from(count).map_or(u32::MAX, |c| c.saturating_add(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing to do: already first/last, or dropped onto itself.
    Unchanged,
    Applied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapPlan<T> {
    /// The item the author moved, carrying its new order index.
    pub moved: T,
    /// The neighbour it traded places with, carrying its new order index.
    pub partner: T,
    /// The full sibling list after the swap, sorted for display.
    pub siblings: Vec<T>,
}

/// Exchanges the order index of `key` with its neighbour in `direction`.
/// Returns `None` when `key` is absent or has no neighbour that way.
pub fn plan_adjacent_swap<T: Sibling>(
    siblings: &[T],
    key: i64,
    direction: Direction,
) -> Option<SwapPlan<T>> {
    let mut sorted = siblings.to_vec();
    sorted.sort_by_key(|s| (s.order_index(), s.sibling_key()));

    let index = sorted.iter().position(|s| s.sibling_key() == key)?;
    let partner_index = match direction {
        Direction::Up => index.checked_sub(1)?,
        Direction::Down => index + 1,
    };
    if partner_index >= sorted.len() {
        return None;
    }

    let moved_order = sorted[index].order_index();
    let partner_order = sorted[partner_index].order_index();
    sorted[index].set_order_index(partner_order);
    sorted[partner_index].set_order_index(moved_order);

    let moved = sorted[index].clone();
    let partner = sorted[partner_index].clone();
    sorted.sort_by_key(|s| (s.order_index(), s.sibling_key()));

    Some(SwapPlan {
        moved,
        partner,
        siblings: sorted,
    })
}

/// Moves the item at `from` to `to` and renumbers every sibling `1..=N` in
/// the resulting order.
pub fn plan_reposition<T: Sibling>(
    items: &[T],
    from: usize,
    to: usize,
) -> Result<Vec<T>, ValidationError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(ValidationError::PositionOutOfBounds { index, len });
        }
    }

    let mut reordered = items.to_vec();
    let item = reordered.remove(from);
    reordered.insert(to, item);
    for (position, sibling) in reordered.iter_mut().enumerate() {
        sibling.set_order_index(next_order_index(position));
    }
    Ok(reordered)
}

pub struct OrderingEngine<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> OrderingEngine<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Moves a module one step up or down.
    pub async fn move_module(
        &self,
        store: &mut EntityStore,
        actor: ActorId,
        module_id: ModuleId,
        direction: Direction,
    ) -> Result<MoveOutcome> {
        if !store.modules().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        let Some(original) = store.module(module_id).cloned() else {
            return Err(AuthoringError::StaleReference(EntityRef::Module(module_id)));
        };
        let Some(plan) = plan_adjacent_swap(store.modules().items(), module_id.0, direction) else {
            tracing::debug!(module_id = %module_id, ?direction, "module already at the edge");
            return Ok(MoveOutcome::Unchanged);
        };

        let snapshot = store.modules().snapshot();
        store.replace_modules(plan.siblings);

        let first = self
            .backend
            .update_module(plan.moved.id, actor, &ModulePatch::order_index(plan.moved.order_index))
            .await;
        let first = match first {
            Ok(module) => module,
            Err(e) => {
                tracing::error!(module_id = %plan.moved.id, error = %e, "module move rejected");
                store.restore_modules(snapshot);
                return Err(AuthoringError::remote("move module", e));
            }
        };

        let second = self
            .backend
            .update_module(
                plan.partner.id,
                actor,
                &ModulePatch::order_index(plan.partner.order_index),
            )
            .await;
        let second = match second {
            Ok(module) => module,
            Err(e) => {
                tracing::error!(
                    module_id = %plan.partner.id,
                    error = %e,
                    "module move rejected halfway"
                );
                store.restore_modules(snapshot);
                let undo = ModulePatch::order_index(original.order_index);
                if let Err(undo_err) = self.backend.update_module(original.id, actor, &undo).await {
                    tracing::warn!(
                        module_id = %original.id,
                        error = %undo_err,
                        "could not restore module order remotely"
                    );
                }
                return Err(AuthoringError::remote("move module", e));
            }
        };

        store.upsert_module(first);
        store.upsert_module(second);
        tracing::info!(module_id = %module_id, ?direction, "module moved");
        Ok(MoveOutcome::Applied)
    }

    /// Drops the lesson rendered at `from` onto position `to` of the scoped
    /// module's lesson list.
    pub async fn reposition_lessons(
        &self,
        store: &mut EntityStore,
        actor: ActorId,
        from: usize,
        to: usize,
    ) -> Result<MoveOutcome> {
        let Some(module_id) = store.scope() else {
            return Err(ValidationError::NoModuleSelected.into());
        };
        if !store.lessons().is_ready() {
            return Err(ValidationError::CollectionNotReady.into());
        }
        let course_id = store
            .module(module_id)
            .map(|m| m.course_id)
            .or_else(|| store.course().map(|c| c.id))
            .ok_or(ValidationError::NoCourseSelected)?;

        let reordered = plan_reposition(store.lessons().items(), from, to)?;
        if from == to {
            return Ok(MoveOutcome::Unchanged);
        }

        let snapshot = store.lessons().snapshot();
        let ordered: Vec<LessonId> = reordered.iter().map(|l| l.id).collect();
        store.replace_lessons(reordered);

        if let Err(e) = self.backend.reorder_lessons(course_id, actor, &ordered).await {
            tracing::error!(module_id = %module_id, error = %e, "lesson reorder rejected");
            store.restore_lessons(snapshot);
            return Err(AuthoringError::remote("reorder lessons", e));
        }
        tracing::info!(module_id = %module_id, from, to, "lessons reordered");
        Ok(MoveOutcome::Applied)
    }
}
