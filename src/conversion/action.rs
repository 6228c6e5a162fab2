// ============================================================================
// Database Actions
// ============================================================================
//
// One DbAction is one unit of persistence work for an external executor.
// Root actions address the aggregate root by entity type; all other actions
// address a PropertyPath below the root. Batch actions group same-kind,
// same-path actions that one multi-row statement can execute.
//
// ============================================================================

use crate::core::{Entity, EntityType, Value};
use crate::mapping::{PersistentEntity, PropertyPath};
use std::collections::HashMap;
use std::fmt;

/// Where the id of an inserted row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdValueSource {
    /// The database generates it; the executor back-fills the entity
    Generated,
    /// The entity already carries it
    Provided,
    /// The entity has no id property
    None,
}

impl IdValueSource {
    pub fn for_instance(entity: &Entity, persistent: &PersistentEntity) -> Self {
        if persistent.id_property().is_none() {
            return Self::None;
        }

        match persistent.id_value(entity) {
            Some(_) => Self::Provided,
            None => Self::Generated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRoot {
    pub entity: Entity,
    pub id_value_source: IdValueSource,
}

impl InsertRoot {
    pub fn new(entity: Entity, id_value_source: IdValueSource) -> Self {
        Self {
            entity,
            id_value_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoot {
    pub entity: Entity,
    /// Version the row must still have for the update to apply
    pub previous_version: Option<Value>,
}

impl UpdateRoot {
    pub fn new(entity: Entity, previous_version: Option<Value>) -> Self {
        Self {
            entity,
            previous_version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    pub entity: Entity,
    pub path: PropertyPath,
    pub id_value_source: IdValueSource,
    /// List indexes / map keys along the path, back-filled from the parents
    pub qualifiers: HashMap<PropertyPath, Value>,
}

impl Insert {
    pub fn new(entity: Entity, path: PropertyPath, id_value_source: IdValueSource) -> Self {
        Self {
            entity,
            path,
            id_value_source,
            qualifiers: HashMap::new(),
        }
    }

    pub fn with_qualifier(mut self, path: PropertyPath, value: impl Into<Value>) -> Self {
        self.qualifiers.insert(path, value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub entity: Entity,
    pub path: PropertyPath,
}

impl Update {
    pub fn new(entity: Entity, path: PropertyPath) -> Self {
        Self { entity, path }
    }
}

/// Deletes the rows at `path` belonging to the aggregate with `root_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub root_id: Value,
    pub path: PropertyPath,
    /// Qualifying key for a single list/map element
    pub key: Option<Value>,
}

impl Delete {
    pub fn new(root_id: impl Into<Value>, path: PropertyPath) -> Self {
        Self {
            root_id: root_id.into(),
            path,
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRoot {
    pub id: Value,
    pub entity_type: EntityType,
    pub previous_version: Option<Value>,
}

impl DeleteRoot {
    pub fn new(id: impl Into<Value>, entity_type: impl Into<EntityType>, previous_version: Option<Value>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            previous_version,
        }
    }
}

/// Deletes every row at `path`, for all aggregates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAll {
    pub path: PropertyPath,
}

impl DeleteAll {
    pub fn new(path: PropertyPath) -> Self {
        Self { path }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAllRoot {
    pub entity_type: EntityType,
}

impl DeleteAllRoot {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireLockRoot {
    pub id: Value,
    pub entity_type: EntityType,
}

impl AcquireLockRoot {
    pub fn new(id: impl Into<Value>, entity_type: impl Into<EntityType>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireLockAllRoot {
    pub entity_type: EntityType,
}

impl AcquireLockAllRoot {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
        }
    }
}

/// Inserts sharing path and id value source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInsert {
    path: PropertyPath,
    id_value_source: IdValueSource,
    actions: Vec<Insert>,
}

impl BatchInsert {
    pub(crate) fn from_members(path: PropertyPath, id_value_source: IdValueSource, actions: Vec<Insert>) -> Self {
        debug_assert!(actions
            .iter()
            .all(|a| a.path == path && a.id_value_source == id_value_source));
        Self {
            path,
            id_value_source,
            actions,
        }
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// The value all members share besides their path
    pub fn batch_value(&self) -> IdValueSource {
        self.id_value_source
    }

    pub fn actions(&self) -> &[Insert] {
        &self.actions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpdate {
    path: PropertyPath,
    actions: Vec<Update>,
}

impl BatchUpdate {
    pub(crate) fn from_members(path: PropertyPath, actions: Vec<Update>) -> Self {
        debug_assert!(actions.iter().all(|a| a.path == path));
        Self { path, actions }
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn actions(&self) -> &[Update] {
        &self.actions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDelete {
    path: PropertyPath,
    actions: Vec<Delete>,
}

impl BatchDelete {
    pub(crate) fn from_members(path: PropertyPath, actions: Vec<Delete>) -> Self {
        debug_assert!(actions.iter().all(|a| a.path == path));
        Self { path, actions }
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn actions(&self) -> &[Delete] {
        &self.actions
    }

    /// Root ids of the members, in member order
    pub fn root_ids(&self) -> Vec<&Value> {
        self.actions.iter().map(|a| &a.root_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbAction {
    InsertRoot(InsertRoot),
    UpdateRoot(UpdateRoot),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    DeleteRoot(DeleteRoot),
    DeleteAll(DeleteAll),
    DeleteAllRoot(DeleteAllRoot),
    AcquireLockRoot(AcquireLockRoot),
    AcquireLockAllRoot(AcquireLockAllRoot),
    BatchInsert(BatchInsert),
    BatchUpdate(BatchUpdate),
    BatchDelete(BatchDelete),
}

/// Discriminant of a [`DbAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    InsertRoot,
    UpdateRoot,
    Insert,
    Update,
    Delete,
    DeleteRoot,
    DeleteAll,
    DeleteAllRoot,
    AcquireLockRoot,
    AcquireLockAllRoot,
    BatchInsert,
    BatchUpdate,
    BatchDelete,
}

impl ActionKind {
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::BatchInsert | Self::BatchUpdate | Self::BatchDelete)
    }

    pub fn is_root(&self) -> bool {
        matches!(
            self,
            Self::InsertRoot
                | Self::UpdateRoot
                | Self::DeleteRoot
                | Self::DeleteAllRoot
                | Self::AcquireLockRoot
                | Self::AcquireLockAllRoot
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InsertRoot => "INSERT ROOT",
            Self::UpdateRoot => "UPDATE ROOT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::DeleteRoot => "DELETE ROOT",
            Self::DeleteAll => "DELETE ALL",
            Self::DeleteAllRoot => "DELETE ALL ROOT",
            Self::AcquireLockRoot => "LOCK ROOT",
            Self::AcquireLockAllRoot => "LOCK ALL ROOT",
            Self::BatchInsert => "BATCH INSERT",
            Self::BatchUpdate => "BATCH UPDATE",
            Self::BatchDelete => "BATCH DELETE",
        };
        f.write_str(name)
    }
}

impl DbAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::InsertRoot(_) => ActionKind::InsertRoot,
            Self::UpdateRoot(_) => ActionKind::UpdateRoot,
            Self::Insert(_) => ActionKind::Insert,
            Self::Update(_) => ActionKind::Update,
            Self::Delete(_) => ActionKind::Delete,
            Self::DeleteRoot(_) => ActionKind::DeleteRoot,
            Self::DeleteAll(_) => ActionKind::DeleteAll,
            Self::DeleteAllRoot(_) => ActionKind::DeleteAllRoot,
            Self::AcquireLockRoot(_) => ActionKind::AcquireLockRoot,
            Self::AcquireLockAllRoot(_) => ActionKind::AcquireLockAllRoot,
            Self::BatchInsert(_) => ActionKind::BatchInsert,
            Self::BatchUpdate(_) => ActionKind::BatchUpdate,
            Self::BatchDelete(_) => ActionKind::BatchDelete,
        }
    }

    /// Entity type the action writes, locks or deletes
    pub fn entity_type(&self) -> &EntityType {
        match self {
            Self::InsertRoot(a) => a.entity.entity_type(),
            Self::UpdateRoot(a) => a.entity.entity_type(),
            Self::DeleteRoot(a) => &a.entity_type,
            Self::DeleteAllRoot(a) => &a.entity_type,
            Self::AcquireLockRoot(a) => &a.entity_type,
            Self::AcquireLockAllRoot(a) => &a.entity_type,
            Self::Insert(a) => a.path.entity_type(),
            Self::Update(a) => a.path.entity_type(),
            Self::Delete(a) => a.path.entity_type(),
            Self::DeleteAll(a) => a.path.entity_type(),
            Self::BatchInsert(a) => a.path.entity_type(),
            Self::BatchUpdate(a) => a.path.entity_type(),
            Self::BatchDelete(a) => a.path.entity_type(),
        }
    }

    /// Path below the root; `None` for root actions
    pub fn property_path(&self) -> Option<&PropertyPath> {
        match self {
            Self::Insert(a) => Some(&a.path),
            Self::Update(a) => Some(&a.path),
            Self::Delete(a) => Some(&a.path),
            Self::DeleteAll(a) => Some(&a.path),
            Self::BatchInsert(a) => Some(&a.path),
            Self::BatchUpdate(a) => Some(&a.path),
            Self::BatchDelete(a) => Some(&a.path),
            Self::InsertRoot(_)
            | Self::UpdateRoot(_)
            | Self::DeleteRoot(_)
            | Self::DeleteAllRoot(_)
            | Self::AcquireLockRoot(_)
            | Self::AcquireLockAllRoot(_) => None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind().is_root()
    }

    pub fn is_batch(&self) -> bool {
        self.kind().is_batch()
    }

    /// Number of single actions this action stands for
    pub fn member_count(&self) -> usize {
        match self {
            Self::BatchInsert(b) => b.actions.len(),
            Self::BatchUpdate(b) => b.actions.len(),
            Self::BatchDelete(b) => b.actions.len(),
            _ => 1,
        }
    }

    /// Split a batch into its members; single actions yield themselves
    pub fn into_members(self) -> Vec<DbAction> {
        match self {
            Self::BatchInsert(b) => b.actions.into_iter().map(Self::Insert).collect(),
            Self::BatchUpdate(b) => b.actions.into_iter().map(Self::Update).collect(),
            Self::BatchDelete(b) => b.actions.into_iter().map(Self::Delete).collect(),
            single => vec![single],
        }
    }
}

impl fmt::Display for DbAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.property_path() {
            Some(path) => write!(f, "{} {} at '{}'", self.kind(), self.entity_type(), path)?,
            None => write!(f, "{} {}", self.kind(), self.entity_type())?,
        }
        if self.is_batch() {
            write!(f, " ({} rows)", self.member_count())?;
        }
        Ok(())
    }
}

macro_rules! impl_from_action {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for DbAction {
                fn from(action: $variant) -> Self {
                    Self::$variant(action)
                }
            }
        )*
    };
}

impl_from_action!(
    InsertRoot,
    UpdateRoot,
    Insert,
    Update,
    Delete,
    DeleteRoot,
    DeleteAll,
    DeleteAllRoot,
    AcquireLockRoot,
    AcquireLockAllRoot,
    BatchInsert,
    BatchUpdate,
    BatchDelete,
);
