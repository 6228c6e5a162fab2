// ============================================================================
// Property Paths
// ============================================================================
//
// A PropertyPath addresses a node of an aggregate's type tree, e.g.
// "intermediate" or "intermediate.leaf" below a Root entity. Paths are
// produced by the MappingContext and compared by their segments only.
//
// ============================================================================

use crate::core::EntityType;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug)]
struct PathNode {
    root_type: EntityType,
    segments: Vec<String>,
    entity_type: EntityType,
    collection: bool,
    qualified: bool,
    embedded: bool,
    parent: Option<PropertyPath>,
}

/// Position of a nested entity inside an aggregate.
///
/// Cloning is cheap; the node (and its parent chain) is shared.
#[derive(Clone)]
pub struct PropertyPath {
    node: Arc<PathNode>,
}

impl PropertyPath {
    /// Single-segment path directly below the aggregate root
    pub(crate) fn root_child(
        root_type: EntityType,
        segment: String,
        entity_type: EntityType,
        flags: PathFlags,
    ) -> Self {
        Self {
            node: Arc::new(PathNode {
                root_type,
                segments: vec![segment],
                entity_type,
                collection: flags.collection,
                qualified: flags.qualified,
                embedded: flags.embedded,
                parent: None,
            }),
        }
    }

    pub(crate) fn child(&self, segment: String, entity_type: EntityType, flags: PathFlags) -> Self {
        let mut segments = self.node.segments.clone();
        segments.push(segment);

        Self {
            node: Arc::new(PathNode {
                root_type: self.node.root_type.clone(),
                segments,
                entity_type,
                collection: flags.collection,
                qualified: flags.qualified,
                embedded: flags.embedded || self.node.embedded,
                parent: Some(self.clone()),
            }),
        }
    }

    /// Aggregate root type the path starts from
    pub fn root_type(&self) -> &EntityType {
        &self.node.root_type
    }

    /// Entity type at the end of the path
    pub fn entity_type(&self) -> &EntityType {
        &self.node.entity_type
    }

    pub fn segments(&self) -> &[String] {
        &self.node.segments
    }

    /// Last property name of the path
    pub fn leaf_property(&self) -> &str {
        self.node
            .segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Number of segments; a path directly below the root has depth 1
    pub fn depth(&self) -> usize {
        self.node.segments.len()
    }

    /// Enclosing path, `None` for paths directly below the root
    pub fn parent(&self) -> Option<&PropertyPath> {
        self.node.parent.as_ref()
    }

    pub fn dot_path(&self) -> String {
        self.node.segments.join(".")
    }

    pub fn is_collection(&self) -> bool {
        self.node.collection
    }

    /// Whether rows at this path are identified by a list index or map key
    pub fn is_qualified(&self) -> bool {
        self.node.qualified
    }

    /// Whether any segment of the path is an embedded property
    pub fn is_embedded(&self) -> bool {
        self.node.embedded
    }

    /// True if `other` lies strictly below this path
    pub fn is_ancestor_of(&self, other: &PropertyPath) -> bool {
        other.depth() > self.depth() && other.segments().starts_with(self.segments())
    }
}

/// Delete order: deeper paths come first
pub fn deepest_first(a: &PropertyPath, b: &PropertyPath) -> Ordering {
    b.depth().cmp(&a.depth())
}

/// Insert order: shallower paths come first
pub fn shallowest_first(a: &PropertyPath, b: &PropertyPath) -> Ordering {
    a.depth().cmp(&b.depth())
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PathFlags {
    pub collection: bool,
    pub qualified: bool,
    pub embedded: bool,
}

impl PartialEq for PropertyPath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node) || self.node.segments == other.node.segments
    }
}

impl Eq for PropertyPath {}

impl Hash for PropertyPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.segments.hash(state);
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dot_path())
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PropertyPath({}.{} -> {})",
            self.node.root_type,
            self.dot_path(),
            self.node.entity_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intermediate() -> PropertyPath {
        PropertyPath::root_child(
            EntityType::new("Root"),
            "intermediate".into(),
            EntityType::new("Intermediate"),
            PathFlags::default(),
        )
    }

    #[test]
    fn test_child_path() {
        let parent = intermediate();
        let leaf = parent.child("leaf".into(), EntityType::new("Leaf"), PathFlags::default());

        assert_eq!(leaf.dot_path(), "intermediate.leaf");
        assert_eq!(leaf.depth(), 2);
        assert_eq!(leaf.parent(), Some(&parent));
        assert_eq!(leaf.leaf_property(), "leaf");
        assert_eq!(leaf.entity_type().name(), "Leaf");
        assert!(parent.parent().is_none());
        assert!(parent.is_ancestor_of(&leaf));
        assert!(!leaf.is_ancestor_of(&parent));
        assert!(!parent.is_ancestor_of(&parent));
    }

    #[test]
    fn test_equality_by_segments() {
        assert_eq!(intermediate(), intermediate());
    }

    #[test]
    fn test_depth_comparators() {
        let parent = intermediate();
        let leaf = parent.child("leaf".into(), EntityType::new("Leaf"), PathFlags::default());

        assert_eq!(deepest_first(&leaf, &parent), Ordering::Less);
        assert_eq!(shallowest_first(&parent, &leaf), Ordering::Less);
        assert_eq!(deepest_first(&parent, &intermediate()), Ordering::Equal);
    }

    #[test]
    fn test_embedded_flag_propagates() {
        let embedded = intermediate().child(
            "address".into(),
            EntityType::new("Address"),
            PathFlags {
                embedded: true,
                ..PathFlags::default()
            },
        );
        let below = embedded.child("city".into(), EntityType::new("City"), PathFlags::default());

        assert!(embedded.is_embedded());
        assert!(below.is_embedded());
    }
}
