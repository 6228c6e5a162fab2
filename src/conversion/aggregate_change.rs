use super::action::DbAction;
use crate::core::{Entity, EntityType, Value};
use std::fmt;

/// Whether an aggregate change persists or removes its aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Save,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Save => write!(f, "save"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// Actions needed to save or delete one aggregate instance.
///
/// Actions are kept in the order they were added, which need not follow
/// the depth of their paths; ordering is the job of
/// [`BatchingAggregateChange`](super::BatchingAggregateChange).
#[derive(Debug, Clone)]
pub struct AggregateChange {
    kind: ChangeKind,
    entity_type: EntityType,
    root: Option<Entity>,
    previous_version: Option<Value>,
    actions: Vec<DbAction>,
}

impl AggregateChange {
    fn new(kind: ChangeKind, entity_type: EntityType, root: Option<Entity>, previous_version: Option<Value>) -> Self {
        Self {
            kind,
            entity_type,
            root,
            previous_version,
            actions: Vec::new(),
        }
    }

    pub fn for_save(root: Entity) -> Self {
        Self::new(ChangeKind::Save, root.entity_type().clone(), Some(root), None)
    }

    /// Save guarded by the version the root had when it was loaded
    pub fn for_save_versioned(root: Entity, previous_version: impl Into<Value>) -> Self {
        Self::new(
            ChangeKind::Save,
            root.entity_type().clone(),
            Some(root),
            Some(previous_version.into()),
        )
    }

    pub fn for_delete(root: Entity) -> Self {
        Self::new(ChangeKind::Delete, root.entity_type().clone(), Some(root), None)
    }

    /// Delete when only the root's type (and id, carried by the actions) is known
    pub fn for_delete_by_type(entity_type: impl Into<EntityType>, previous_version: Option<Value>) -> Self {
        Self::new(ChangeKind::Delete, entity_type.into(), None, previous_version)
    }

    pub fn add_action(&mut self, action: impl Into<DbAction>) {
        self.actions.push(action.into());
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn root(&self) -> Option<&Entity> {
        self.root.as_ref()
    }

    pub fn previous_version(&self) -> Option<&Value> {
        self.previous_version.as_ref()
    }

    pub fn actions(&self) -> &[DbAction] {
        &self.actions
    }

    pub fn for_each_action<F: FnMut(&DbAction)>(&self, mut consumer: F) {
        for action in &self.actions {
            consumer(action);
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
