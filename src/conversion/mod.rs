// ============================================================================
// Aggregate Change Conversion
// ============================================================================
//
// Turns per-aggregate lists of database actions into one ordered, batched
// action stream for an external executor.
//
// - action:          DbAction sum type and its payloads
// - aggregate_change: actions for one aggregate instance
// - batched_actions: path grouping and batch coalescing
// - batching:        BatchingAggregateChange, the accumulator and emitter
// - config:          batching configuration
// - lookup:          inspection helpers for emitted streams
//
// ============================================================================

pub mod action;
pub mod aggregate_change;
mod batched_actions;
pub mod batching;
pub mod config;
pub mod lookup;

pub use action::{
    AcquireLockAllRoot, AcquireLockRoot, ActionKind, BatchDelete, BatchInsert, BatchUpdate,
    DbAction, Delete, DeleteAll, DeleteAllRoot, DeleteRoot, IdValueSource, Insert, InsertRoot,
    Update, UpdateRoot,
};
pub use aggregate_change::{AggregateChange, ChangeKind};
pub use batching::BatchingAggregateChange;
pub use config::BatchingConfig;
