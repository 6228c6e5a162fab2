// ============================================================================
// Path-Grouped Actions
// ============================================================================
//
// Collects non-root actions from any number of aggregates into groups keyed
// by (kind, path[, id value source]). Groups are emitted in depth order
// (deepest first for deletes, shallowest first for writes); groups at equal
// depth keep first-seen order. Each group is emitted as one batch action,
// or as the plain action when it has a single member.
//
// ============================================================================

use super::action::{
    BatchDelete, BatchInsert, BatchUpdate, DbAction, Delete, DeleteAll, IdValueSource, Insert,
    Update,
};
use crate::mapping::{PropertyPath, deepest_first, shallowest_first};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Delete(PropertyPath),
    DeleteAll(PropertyPath),
    Insert(PropertyPath, IdValueSource),
    Update(PropertyPath),
}

#[derive(Debug)]
enum Members {
    Delete(Vec<Delete>),
    DeleteAll(Vec<DeleteAll>),
    Insert(Vec<Insert>),
    Update(Vec<Update>),
}

#[derive(Debug)]
struct PathGroup {
    path: PropertyPath,
    members: Members,
}

impl PathGroup {
    fn emit<F: FnMut(DbAction)>(self, chunk_size: usize, consumer: &mut F) {
        let path = self.path;
        match self.members {
            Members::Delete(deletes) => emit_chunks(deletes, chunk_size, consumer, DbAction::Delete, |m| {
                DbAction::BatchDelete(BatchDelete::from_members(path.clone(), m))
            }),
            // One statement already removes every row at the path.
            Members::DeleteAll(deletes) => deletes
                .into_iter()
                .for_each(|d| consumer(DbAction::DeleteAll(d))),
            Members::Insert(inserts) => {
                let source = inserts
                    .first()
                    .map(|i| i.id_value_source)
                    .unwrap_or(IdValueSource::None);
                emit_chunks(inserts, chunk_size, consumer, DbAction::Insert, |m| {
                    DbAction::BatchInsert(BatchInsert::from_members(path.clone(), source, m))
                })
            }
            Members::Update(updates) => emit_chunks(updates, chunk_size, consumer, DbAction::Update, |m| {
                DbAction::BatchUpdate(BatchUpdate::from_members(path.clone(), m))
            }),
        }
    }
}

fn emit_chunks<A, F, S, B>(members: Vec<A>, chunk_size: usize, consumer: &mut F, single: S, batch: B)
where
    F: FnMut(DbAction),
    S: Fn(A) -> DbAction,
    B: Fn(Vec<A>) -> DbAction,
{
    let mut members = members.into_iter().peekable();
    while members.peek().is_some() {
        let mut chunk: Vec<A> = members.by_ref().take(chunk_size).collect();
        if chunk.len() == 1 {
            if let Some(only) = chunk.pop() {
                consumer(single(only));
            }
        } else {
            consumer(batch(chunk));
        }
    }
}

/// Direction in which path groups are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathOrder {
    DeepestFirst,
    ShallowestFirst,
}

impl PathOrder {
    fn compare(&self, a: &PropertyPath, b: &PropertyPath) -> Ordering {
        match self {
            PathOrder::DeepestFirst => deepest_first(a, b),
            PathOrder::ShallowestFirst => shallowest_first(a, b),
        }
    }
}

#[derive(Debug)]
pub(crate) struct BatchedActions {
    order: PathOrder,
    groups: Vec<PathGroup>,
    index: HashMap<GroupKey, usize>,
}

impl BatchedActions {
    pub(crate) fn deletes() -> Self {
        Self::new(PathOrder::DeepestFirst)
    }

    pub(crate) fn writes() -> Self {
        Self::new(PathOrder::ShallowestFirst)
    }

    fn new(order: PathOrder) -> Self {
        Self {
            order,
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn add_delete(&mut self, action: Delete) {
        let key = GroupKey::Delete(action.path.clone());
        match &mut self.group(key, &action.path, || Members::Delete(Vec::new())).members {
            Members::Delete(members) => members.push(action),
            other => unreachable!("delete key mapped to {:?}", other),
        }
    }

    pub(crate) fn add_delete_all(&mut self, action: DeleteAll) {
        let key = GroupKey::DeleteAll(action.path.clone());
        match &mut self.group(key, &action.path, || Members::DeleteAll(Vec::new())).members {
            Members::DeleteAll(members) => members.push(action),
            other => unreachable!("delete-all key mapped to {:?}", other),
        }
    }

    pub(crate) fn add_insert(&mut self, action: Insert) {
        let key = GroupKey::Insert(action.path.clone(), action.id_value_source);
        match &mut self.group(key, &action.path, || Members::Insert(Vec::new())).members {
            Members::Insert(members) => members.push(action),
            other => unreachable!("insert key mapped to {:?}", other),
        }
    }

    pub(crate) fn add_update(&mut self, action: Update) {
        let key = GroupKey::Update(action.path.clone());
        match &mut self.group(key, &action.path, || Members::Update(Vec::new())).members {
            Members::Update(members) => members.push(action),
            other => unreachable!("update key mapped to {:?}", other),
        }
    }

    fn group(&mut self, key: GroupKey, path: &PropertyPath, empty: impl FnOnce() -> Members) -> &mut PathGroup {
        let next = self.groups.len();
        let idx = *self.index.entry(key).or_insert(next);
        if idx == next {
            self.groups.push(PathGroup {
                path: path.clone(),
                members: empty(),
            });
        }
        &mut self.groups[idx]
    }

    /// Emit all groups in path order; `chunk_size` caps members per batch
    pub(crate) fn emit<F: FnMut(DbAction)>(self, chunk_size: usize, consumer: &mut F) {
        let order = self.order;
        let mut groups = self.groups;
        // Stable: equal depths keep first-seen order.
        groups.sort_by(|a, b| order.compare(&a.path, &b.path));

        for group in groups {
            group.emit(chunk_size, consumer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Entity, EntityType};
    use crate::mapping::{EntityDescriptor, MappingContext, PropertyDescriptor};

    fn paths() -> (PropertyPath, PropertyPath, PropertyPath) {
        let mut context = MappingContext::new();
        context
            .register(
                EntityDescriptor::new("Root")
                    .id("id")
                    .property(PropertyDescriptor::entity("intermediate", "Intermediate"))
                    .property(PropertyDescriptor::entity("other", "Other")),
            )
            .unwrap();
        context
            .register(
                EntityDescriptor::new("Intermediate")
                    .id("id")
                    .property(PropertyDescriptor::entity("leaf", "Leaf")),
            )
            .unwrap();
        context.register(EntityDescriptor::new("Leaf").id("id")).unwrap();
        context.register(EntityDescriptor::new("Other").id("id")).unwrap();

        let root = EntityType::new("Root");
        (
            context.persistent_property_path("intermediate", &root).unwrap(),
            context.persistent_property_path("intermediate.leaf", &root).unwrap(),
            context.persistent_property_path("other", &root).unwrap(),
        )
    }

    fn collect(batched: BatchedActions, chunk_size: usize) -> Vec<DbAction> {
        let mut out = Vec::new();
        batched.emit(chunk_size, &mut |a| out.push(a));
        out
    }

    #[test]
    fn test_deletes_deepest_first_with_stable_ties() {
        let (intermediate, leaf, other) = paths();
        let mut batched = BatchedActions::deletes();
        batched.add_delete(Delete::new(1i64, other.clone()));
        batched.add_delete(Delete::new(1i64, intermediate.clone()));
        batched.add_delete(Delete::new(1i64, leaf.clone()));

        let out = collect(batched, usize::MAX);
        let order: Vec<String> = out
            .iter()
            .filter_map(|a| a.property_path().map(PropertyPath::dot_path))
            .collect();
        assert_eq!(order, vec!["intermediate.leaf", "other", "intermediate"]);
    }

    #[test]
    fn test_writes_shallowest_first() {
        let (intermediate, leaf, _) = paths();
        let mut batched = BatchedActions::writes();
        batched.add_insert(Insert::new(Entity::new("Leaf"), leaf, IdValueSource::Generated));
        batched.add_update(Update::new(Entity::new("Intermediate"), intermediate));

        let out = collect(batched, usize::MAX);
        assert_eq!(out[0].entity_type().name(), "Intermediate");
        assert_eq!(out[1].entity_type().name(), "Leaf");
    }

    #[test]
    fn test_group_of_one_is_not_wrapped() {
        let (intermediate, _, _) = paths();
        let mut batched = BatchedActions::deletes();
        let only = Delete::new(1i64, intermediate);
        batched.add_delete(only.clone());

        assert_eq!(collect(batched, usize::MAX), vec![DbAction::Delete(only)]);
    }

    #[test]
    fn test_inserts_split_by_id_value_source() {
        let (intermediate, _, _) = paths();
        let mut batched = BatchedActions::writes();
        for source in [IdValueSource::Generated, IdValueSource::Provided, IdValueSource::Generated] {
            batched.add_insert(Insert::new(Entity::new("Intermediate"), intermediate.clone(), source));
        }

        let out = collect(batched, usize::MAX);
        assert_eq!(out.len(), 2);
        let DbAction::BatchInsert(generated) = &out[0] else {
            panic!("expected batch insert, got {:?}", out[0]);
        };
        assert_eq!(generated.batch_value(), IdValueSource::Generated);
        assert_eq!(generated.actions().len(), 2);
        assert!(matches!(out[1], DbAction::Insert(_)));
    }

    #[test]
    fn test_chunking() {
        let (intermediate, _, _) = paths();
        let mut batched = BatchedActions::deletes();
        for id in 1..=5i64 {
            batched.add_delete(Delete::new(id, intermediate.clone()));
        }

        let out = collect(batched, 2);
        let sizes: Vec<usize> = out.iter().map(DbAction::member_count).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(matches!(out[2], DbAction::Delete(_)));
    }

    #[test]
    fn test_delete_all_never_batched() {
        let (intermediate, _, _) = paths();
        let mut batched = BatchedActions::deletes();
        batched.add_delete_all(DeleteAll::new(intermediate.clone()));
        batched.add_delete_all(DeleteAll::new(intermediate));

        let out = collect(batched, usize::MAX);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|a| matches!(a, DbAction::DeleteAll(_))));
    }
}
