//! Combination table: renderers grouped by what they draw with.

use std::collections::HashMap;

use crate::render_entity::RendererCombination;

/// Maps each [`RendererCombination`] to the renderer entities using it.
///
/// Combinations keep the order in which they were first added. Clearing
/// keeps the per-combination lists on a free stack so the next tick reuses
/// their allocations.
#[derive(Debug, Default)]
pub struct RendererGroups {
    combinations: Vec<RendererCombination>,
    lists: Vec<Vec<u32>>,
    indices: HashMap<RendererCombination, usize>,
    free: Vec<Vec<u32>>,
}

impl RendererGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `renderer` under `combination`.
    pub fn add(&mut self, combination: RendererCombination, renderer: u32) {
        let slot = match self.indices.get(&combination) {
            Some(&slot) => slot,
            None => {
                let slot = self.combinations.len();
                self.combinations.push(combination);
                self.lists.push(self.free.pop().unwrap_or_default());
                self.indices.insert(combination, slot);
                slot
            }
        };
        self.lists[slot].push(renderer);
    }

    /// Empties the table, keeping list storage for reuse.
    pub fn clear(&mut self) {
        for mut list in self.lists.drain(..) {
            list.clear();
            self.free.push(list);
        }
        self.combinations.clear();
        self.indices.clear();
    }

    /// Renderers sharing `combination`.
    pub fn get(&self, combination: &RendererCombination) -> Option<&[u32]> {
        self.indices
            .get(combination)
            .map(|&slot| self.lists[slot].as_slice())
    }

    /// `(combination, renderers)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&RendererCombination, &[u32])> {
        self.combinations
            .iter()
            .zip(self.lists.iter().map(Vec::as_slice))
    }

    /// Number of distinct combinations.
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Total renderers across all combinations.
    pub fn renderer_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combination(material: u32, mesh: u32) -> RendererCombination {
        RendererCombination {
            material,
            mesh,
            vertex_shader: 7,
            fragment_shader: 8,
        }
    }

    #[test]
    fn renderers_sharing_a_combination_are_grouped() {
        let mut groups = RendererGroups::new();
        groups.add(combination(1, 2), 10);
        groups.add(combination(3, 2), 11);
        groups.add(combination(1, 2), 12);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&combination(1, 2)), Some(&[10, 12][..]));
        assert_eq!(groups.get(&combination(3, 2)), Some(&[11][..]));
        assert_eq!(groups.renderer_count(), 3);
    }

    #[test]
    fn iteration_follows_first_seen_order() {
        let mut groups = RendererGroups::new();
        groups.add(combination(5, 5), 1);
        groups.add(combination(2, 2), 2);
        groups.add(combination(5, 5), 3);

        let order: Vec<u32> = groups.iter().map(|(c, _)| c.material).collect();
        assert_eq!(order, vec![5, 2]);
    }

    #[test]
    fn clear_recycles_lists() {
        let mut groups = RendererGroups::new();
        for i in 0..64 {
            groups.add(combination(1, 1), i);
        }
        groups.clear();
        assert!(groups.is_empty());
        assert_eq!(groups.get(&combination(1, 1)), None);

        groups.add(combination(9, 9), 1);
        let (_, list) = groups.iter().next().unwrap();
        assert_eq!(list, &[1]);
        assert!(groups.lists[0].capacity() >= 64);
    }
}
