use std::any::Any;

/// Typed sparse set storing components of type `T`.
///
/// A sparse array maps entity index to dense index, and two parallel dense
/// arrays hold the component values and their owning entity indices. Insert,
/// remove and lookup are O(1); iteration walks contiguous memory.
///
/// The dense arrays are exposed directly through [`entities`](Self::entities)
/// and [`components`](Self::components). Those two slices are the iteration
/// primitive the rendering layer builds its per-tick snapshots from.
pub struct SparseSet<T: 'static> {
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    entities: Vec<u32>,
}

impl<T: 'static> SparseSet<T> {
    /// Creates a new empty sparse set.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Inserts a component for the given entity index, replacing any previous value.
    pub fn insert(&mut self, entity_index: u32, value: T) {
        let idx = entity_index as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }

        if let Some(dense_idx) = self.sparse[idx] {
            self.dense[dense_idx as usize] = value;
        } else {
            self.sparse[idx] = Some(self.dense.len() as u32);
            self.dense.push(value);
            self.entities.push(entity_index);
        }
    }

    /// Removes a component for the given entity index.
    ///
    /// The last dense element is swapped into the hole, so dense order is
    /// not stable across removals.
    pub fn remove(&mut self, entity_index: u32) -> Option<T> {
        let dense_idx = self.sparse.get_mut(entity_index as usize)?.take()? as usize;
        let last_dense = self.dense.len() - 1;

        if dense_idx != last_dense {
            let swapped_entity = self.entities[last_dense];
            self.sparse[swapped_entity as usize] = Some(dense_idx as u32);
            self.entities[dense_idx] = swapped_entity;
        }

        self.entities.pop();
        Some(self.dense.swap_remove(dense_idx))
    }

    /// Returns a reference to the component for the given entity index.
    pub fn get(&self, entity_index: u32) -> Option<&T> {
        let dense_idx = (*self.sparse.get(entity_index as usize)?)? as usize;
        Some(&self.dense[dense_idx])
    }

    /// Returns a mutable reference to the component for the given entity index.
    pub fn get_mut(&mut self, entity_index: u32) -> Option<&mut T> {
        let dense_idx = (*self.sparse.get(entity_index as usize)?)? as usize;
        Some(&mut self.dense[dense_idx])
    }

    pub fn contains(&self, entity_index: u32) -> bool {
        matches!(self.sparse.get(entity_index as usize), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Reserves capacity for at least `additional` more components.
    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
        self.entities.reserve(additional);
    }

    /// Iterates over `(entity_index, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterates over `(entity_index, &mut component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Entity indices in dense order, parallel to [`components`](Self::components).
    pub fn entities(&self) -> &[u32] {
        &self.entities
    }

    /// Component values in dense order, parallel to [`entities`](Self::entities).
    pub fn components(&self) -> &[T] {
        &self.dense
    }
}

impl<T: 'static> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

type RemoveFn = fn(&mut dyn Any, u32) -> bool;

/// A type-erased sparse set for a single component type.
///
/// Used internally by [`World`](crate::World) so despawn can strip every
/// component from an entity without knowing the concrete types.
pub(crate) struct ComponentStorage {
    inner: Box<dyn Any + Send + Sync>,
    remove_fn: RemoveFn,
}

impl ComponentStorage {
    pub fn new<T: Send + Sync + 'static>() -> Self {
        Self {
            inner: Box::new(SparseSet::<T>::new()),
            remove_fn: |any, entity_index| {
                any.downcast_mut::<SparseSet<T>>()
                    .is_some_and(|set| set.remove(entity_index).is_some())
            },
        }
    }

    /// Downcasts to the typed sparse set.
    pub fn typed<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.inner.downcast_ref::<SparseSet<T>>()
    }

    /// Downcasts to the typed sparse set (mutable).
    pub fn typed_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        self.inner.downcast_mut::<SparseSet<T>>()
    }

    /// Removes a component by entity index (type-erased). Returns true if removed.
    pub fn remove_untyped(&mut self, entity_index: u32) -> bool {
        (self.remove_fn)(self.inner.as_mut(), entity_index)
    }
}
