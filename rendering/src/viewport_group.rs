//! Per-viewport render batches.

use crate::render_entity::RenderEntity;

/// Renderers of one render group visible to one viewport.
#[derive(Debug, Clone, Default)]
pub struct RenderBatch {
    render_group: i8,
    entities: Vec<RenderEntity>,
}

impl RenderBatch {
    pub fn render_group(&self) -> i8 {
        self.render_group
    }

    pub fn entities(&self) -> &[RenderEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [RenderEntity] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Everything one viewport draws this tick, split by render group.
///
/// Rebuilt every tick. [`clear`](Self::clear) empties the batches but keeps
/// them (and their capacity) around for the next tick.
#[derive(Debug, Clone)]
pub struct ViewportGroup {
    viewport: u32,
    order: i8,
    batches: Vec<RenderBatch>,
    pub(crate) touched: bool,
    /// Position among the groups collected this tick. Breaks order ties.
    pub(crate) sequence: u32,
}

impl ViewportGroup {
    pub fn new(viewport: u32, order: i8) -> Self {
        Self {
            viewport,
            order,
            batches: Vec::new(),
            touched: true,
            sequence: 0,
        }
    }

    /// Index of the viewport entity this group belongs to.
    pub fn viewport(&self) -> u32 {
        self.viewport
    }

    pub fn order(&self) -> i8 {
        self.order
    }

    pub fn set_order(&mut self, order: i8) {
        self.order = order;
    }

    pub fn clear(&mut self) {
        for batch in &mut self.batches {
            batch.entities.clear();
        }
    }

    /// Appends `entity` to the batch of `render_group`, creating it if needed.
    pub fn push(&mut self, render_group: i8, entity: RenderEntity) {
        let slot = match self
            .batches
            .iter()
            .position(|b| b.render_group == render_group)
        {
            Some(slot) => slot,
            None => {
                self.batches.push(RenderBatch {
                    render_group,
                    entities: Vec::new(),
                });
                self.batches.len() - 1
            }
        };
        self.batches[slot].entities.push(entity);
    }

    /// All batches in creation order, including empty ones kept for reuse.
    pub fn batches(&self) -> &[RenderBatch] {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut [RenderBatch] {
        &mut self.batches
    }

    /// Batch for `render_group`, if it has ever been created.
    pub fn batch(&self, render_group: i8) -> Option<&RenderBatch> {
        self.batches.iter().find(|b| b.render_group == render_group)
    }

    pub fn entity_count(&self) -> usize {
        self.batches.iter().map(RenderBatch::len).sum()
    }

    /// Fills `out` with the indices of non-empty batches, sorted by render
    /// group ascending.
    pub fn sorted_batches(&self, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            self.batches
                .iter()
                .enumerate()
                .filter(|(_, b)| !b.is_empty())
                .map(|(i, _)| i),
        );
        out.sort_by_key(|&i| self.batches[i].render_group);
    }
}
