use crate::Entity;

/// Marks an entity as a child of another entity.
///
/// Use [`set_parent`](crate::hierarchy::set_parent) to set up parent-child
/// relationships (it updates both `Parent` and [`Children`] components and
/// refreshes inherited enablement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered list of child entities.
///
/// Maintained by the functions in [`hierarchy`](crate::hierarchy); do not
/// edit directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Children(pub Vec<Entity>);

impl Children {
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
