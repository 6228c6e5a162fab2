// ============================================================================
// Batching Aggregate Change
// ============================================================================
//
// Accumulates the AggregateChanges of a bulk save or delete and, on demand,
// emits one ordered, batch-coalesced stream of actions for all of them:
//
//   1. locks            AcquireLockRoot / AcquireLockAllRoot, encounter order
//   2. root writes      InsertRoot / UpdateRoot, encounter order
//   3. child deletes    Delete / DeleteAll, grouped by path, deepest first
//   4. child writes     Insert / Update, grouped by path, shallowest first
//   5. root deletes     DeleteRoot / DeleteAllRoot, encounter order
//
// Grouping spans every accumulated aggregate, so deletes of two aggregates
// at the same path end up in one batch. Root actions are never batched.
//
// ============================================================================

use super::action::DbAction;
use super::aggregate_change::{AggregateChange, ChangeKind};
use super::batched_actions::BatchedActions;
use super::config::BatchingConfig;
use crate::core::{EntityType, RelError, Result};
use tracing::{debug, debug_span, trace};

/// Accumulator of same-kind aggregate changes for one root entity type.
///
/// Adding needs `&mut self`; emitting only reads, so it may run any
/// number of times and always yields the same sequence.
#[derive(Debug, Clone)]
pub struct BatchingAggregateChange {
    entity_type: EntityType,
    kind: ChangeKind,
    config: BatchingConfig,
    changes: Vec<AggregateChange>,
}

impl BatchingAggregateChange {
    pub fn for_save(entity_type: impl Into<EntityType>) -> Self {
        Self::new(entity_type.into(), ChangeKind::Save)
    }

    pub fn for_delete(entity_type: impl Into<EntityType>) -> Self {
        Self::new(entity_type.into(), ChangeKind::Delete)
    }

    fn new(entity_type: EntityType, kind: ChangeKind) -> Self {
        Self {
            entity_type,
            kind,
            config: BatchingConfig::default(),
            changes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: BatchingConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn config(&self) -> &BatchingConfig {
        &self.config
    }

    /// Accumulated changes, in the order they were added
    pub fn changes(&self) -> &[AggregateChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Accept one more aggregate change.
    ///
    /// # Errors
    /// Rejects a change whose kind or root entity type differs from the
    /// declared ones; nothing is added in that case.
    pub fn add(&mut self, change: AggregateChange) -> Result<()> {
        if change.kind() != self.kind {
            debug!(
                expected = %self.kind,
                actual = %change.kind(),
                entity_type = %self.entity_type,
                "rejected aggregate change of wrong kind"
            );
            return Err(RelError::ChangeKindMismatch {
                expected: self.kind,
                actual: change.kind(),
            });
        }

        if change.entity_type() != &self.entity_type {
            debug!(
                expected = %self.entity_type,
                actual = %change.entity_type(),
                "rejected aggregate change for wrong entity type"
            );
            return Err(RelError::EntityTypeMismatch {
                expected: self.entity_type.clone(),
                actual: change.entity_type().clone(),
            });
        }

        debug!(
            kind = %self.kind,
            entity_type = %self.entity_type,
            actions = change.len(),
            accumulated = self.changes.len() + 1,
            "accepted aggregate change"
        );
        self.changes.push(change);
        Ok(())
    }

    /// Push every resulting action, in execution order, into `consumer`.
    ///
    /// Batch actions and single actions are both passed exactly once.
    pub fn for_each_action<F: FnMut(DbAction)>(&self, mut consumer: F) {
        let span = debug_span!(
            "batching_emit",
            kind = %self.kind,
            entity_type = %self.entity_type,
            changes = self.changes.len()
        );
        let _guard = span.enter();

        let phases = self.collect_phases();
        let chunk_size = self.config.chunk_size();
        let mut emitted = 0usize;

        let mut emit = |action: DbAction| {
            trace!(action = %action, "emitting action");
            emitted += 1;
            consumer(action);
        };

        phases.locks.into_iter().for_each(&mut emit);
        phases.root_writes.into_iter().for_each(&mut emit);
        phases.deletes.emit(chunk_size, &mut emit);
        phases.writes.emit(chunk_size, &mut emit);
        phases.root_deletes.into_iter().for_each(&mut emit);

        debug!(emitted, "emitted batched actions");
    }

    /// Materialized form of [`for_each_action`](Self::for_each_action)
    pub fn actions(&self) -> Vec<DbAction> {
        let mut actions = Vec::new();
        self.for_each_action(|action| actions.push(action));
        actions
    }

    fn collect_phases(&self) -> Phases {
        let mut phases = Phases::new();
        for change in &self.changes {
            change.for_each_action(|action| phases.push(action.clone()));
        }
        phases
    }
}

struct Phases {
    locks: Vec<DbAction>,
    root_writes: Vec<DbAction>,
    deletes: BatchedActions,
    writes: BatchedActions,
    root_deletes: Vec<DbAction>,
}

impl Phases {
    fn new() -> Self {
        Self {
            locks: Vec::new(),
            root_writes: Vec::new(),
            deletes: BatchedActions::deletes(),
            writes: BatchedActions::writes(),
            root_deletes: Vec::new(),
        }
    }

    fn push(&mut self, action: DbAction) {
        match action {
            DbAction::AcquireLockRoot(_) | DbAction::AcquireLockAllRoot(_) => self.locks.push(action),
            DbAction::InsertRoot(_) | DbAction::UpdateRoot(_) => self.root_writes.push(action),
            DbAction::Delete(delete) => self.deletes.add_delete(delete),
            DbAction::DeleteAll(delete_all) => self.deletes.add_delete_all(delete_all),
            DbAction::Insert(insert) => self.writes.add_insert(insert),
            DbAction::Update(update) => self.writes.add_update(update),
            DbAction::DeleteRoot(_) | DbAction::DeleteAllRoot(_) => self.root_deletes.push(action),
            DbAction::BatchInsert(_) | DbAction::BatchUpdate(_) | DbAction::BatchDelete(_) => {
                // Regrouped with the singles of every other aggregate.
                for member in action.into_members() {
                    self.push(member);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::action::{AcquireLockRoot, Delete, DeleteRoot, InsertRoot, IdValueSource};
    use crate::core::Entity;
    use crate::mapping::{EntityDescriptor, MappingContext, PropertyDescriptor, PropertyPath};

    fn intermediate_path() -> PropertyPath {
        let mut context = MappingContext::new();
        context
            .register(
                EntityDescriptor::new("Root")
                    .id("id")
                    .property(PropertyDescriptor::entity("intermediate", "Intermediate")),
            )
            .unwrap();
        context
            .register(EntityDescriptor::new("Intermediate").id("id"))
            .unwrap();
        context
            .persistent_property_path("intermediate", &"Root".into())
            .unwrap()
    }

    #[test]
    fn test_rejects_wrong_kind_without_side_effects() {
        let mut batching = BatchingAggregateChange::for_delete("Root");
        let mut save = AggregateChange::for_save(Entity::new("Root"));
        save.add_action(InsertRoot::new(Entity::new("Root"), IdValueSource::Generated));

        let err = batching.add(save).unwrap_err();
        assert!(matches!(
            err,
            RelError::ChangeKindMismatch {
                expected: ChangeKind::Delete,
                actual: ChangeKind::Save
            }
        ));
        assert!(batching.is_empty());
        assert!(batching.actions().is_empty());
    }

    #[test]
    fn test_rejects_wrong_entity_type() {
        let mut batching = BatchingAggregateChange::for_delete("Root");
        let change = AggregateChange::for_delete(Entity::new("Other"));

        assert!(matches!(
            batching.add(change),
            Err(RelError::EntityTypeMismatch { .. })
        ));
        assert_eq!(batching.len(), 0);
    }

    #[test]
    fn test_lock_first_root_delete_last() {
        let path = intermediate_path();
        let mut change = AggregateChange::for_delete(Entity::new("Root"));
        change.add_action(DeleteRoot::new(1i64, "Root", None));
        change.add_action(Delete::new(1i64, path.clone()));
        change.add_action(AcquireLockRoot::new(1i64, "Root"));

        let mut batching = BatchingAggregateChange::for_delete("Root");
        batching.add(change).unwrap();

        assert_eq!(
            batching.actions(),
            vec![
                DbAction::from(AcquireLockRoot::new(1i64, "Root")),
                DbAction::from(Delete::new(1i64, path)),
                DbAction::from(DeleteRoot::new(1i64, "Root", None)),
            ]
        );
    }

    #[test]
    fn test_emission_is_repeatable() {
        let path = intermediate_path();
        let mut batching = BatchingAggregateChange::for_delete("Root");
        for id in 1..=3i64 {
            let mut change = AggregateChange::for_delete(Entity::new("Root").with("id", id));
            change.add_action(Delete::new(id, path.clone()));
            change.add_action(DeleteRoot::new(id, "Root", None));
            batching.add(change).unwrap();
        }

        let first = batching.actions();
        assert_eq!(first, batching.actions());
        assert_eq!(batching.len(), 3);
    }

    #[test]
    fn test_disabled_batching_emits_singles() {
        let path = intermediate_path();
        let mut batching = BatchingAggregateChange::for_delete("Root")
            .with_config(BatchingConfig::disabled())
            .unwrap();
        let mut change = AggregateChange::for_delete(Entity::new("Root"));
        change.add_action(Delete::new(1i64, path.clone()));
        change.add_action(Delete::new(2i64, path));
        batching.add(change).unwrap();

        let actions = batching.actions();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| !a.is_batch()));
    }

    #[test]
    fn test_with_invalid_config() {
        let result = BatchingAggregateChange::for_save("Root")
            .with_config(BatchingConfig::new().max_batch_size(0));
        assert!(matches!(result, Err(RelError::InvalidConfig(_))));
    }
}
