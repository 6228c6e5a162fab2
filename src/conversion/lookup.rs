//! Helpers for inspecting an emitted action stream.
//!
//! Meant for verification code and executors that want to pick out the
//! batch for one entity; a miss is reported as [`RelError::ActionNotFound`].

use super::action::{ActionKind, BatchInsert, DbAction, IdValueSource};
use crate::core::{EntityType, RelError, Result};

/// All actions of `kind` targeting `entity_type`, in stream order
pub fn batches_of<'a>(actions: &'a [DbAction], kind: ActionKind, entity_type: &EntityType) -> Vec<&'a DbAction> {
    actions
        .iter()
        .filter(|a| a.kind() == kind && a.entity_type() == entity_type)
        .collect()
}

/// First action of `kind` targeting `entity_type`
pub fn find_batch<'a>(actions: &'a [DbAction], kind: ActionKind, entity_type: &EntityType) -> Result<&'a DbAction> {
    batches_of(actions, kind, entity_type)
        .into_iter()
        .next()
        .ok_or_else(|| RelError::ActionNotFound(format!("no {} action for '{}'", kind, entity_type)))
}

/// Batch insert for `entity_type` whose batch value is `id_value_source`
pub fn find_batch_insert<'a>(
    actions: &'a [DbAction],
    entity_type: &EntityType,
    id_value_source: IdValueSource,
) -> Result<&'a BatchInsert> {
    actions
        .iter()
        .find_map(|a| match a {
            DbAction::BatchInsert(batch)
                if batch.path().entity_type() == entity_type
                    && batch.batch_value() == id_value_source =>
            {
                Some(batch)
            }
            _ => None,
        })
        .ok_or_else(|| {
            RelError::ActionNotFound(format!(
                "no BATCH INSERT for '{}' with batch value {:?}",
                entity_type, id_value_source
            ))
        })
}
