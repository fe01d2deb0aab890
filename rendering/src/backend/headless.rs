//! Headless rendering backend.
//!
//! Draws nothing. Every protocol call is logged at trace level and folded
//! into [`HeadlessStats`], which makes this backend useful for running the
//! frame loop without a GPU.

use std::collections::{HashMap, HashSet};

use lantern_ecs::Entity;

use super::{InstanceHandle, MachineHandle, RenderingBackend, StatusCode, SurfaceHandle};
use crate::render_entity::{RenderEntity, RendererKey};

/// Counters accumulated by a [`HeadlessBackend`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub frames_begun: u64,
    pub frames_ended: u64,
    pub batches: u64,
    pub entities: u64,
    /// Distinct material/mesh pairs seen in the most recent frame.
    pub last_frame_pairs: usize,
}

#[derive(Debug)]
struct HeadlessMachine {
    destination: Entity,
    surface: Option<SurfaceHandle>,
    pairs: HashSet<RendererKey>,
}

/// No-op backend for tests, benches and headless runs.
#[derive(Debug)]
pub struct HeadlessBackend {
    label: String,
    next_handle: u64,
    machines: HashMap<MachineHandle, HeadlessMachine>,
    stats: HeadlessStats,
    require_surface: bool,
}

impl HeadlessBackend {
    /// Label used by [`Default`].
    pub const LABEL: &'static str = "headless";

    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            next_handle: 1,
            machines: HashMap::new(),
            stats: HeadlessStats::default(),
            require_surface: false,
        }
    }

    /// Makes `begin_render` return [`StatusCode::Skip`] until a surface
    /// has been announced for the machine.
    pub fn requiring_surface(mut self) -> Self {
        self.require_surface = true;
        self
    }

    pub fn stats(&self) -> &HeadlessStats {
        &self.stats
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(Self::LABEL)
    }
}

impl RenderingBackend for HeadlessBackend {
    fn label(&self) -> &str {
        &self.label
    }

    fn start(&mut self) {
        log::trace!("HeadlessBackend[{}]: start", self.label);
    }

    fn finish(&mut self) {
        log::info!(
            "HeadlessBackend[{}]: finished after {} frames ({} batches, {} entities)",
            self.label,
            self.stats.frames_ended,
            self.stats.batches,
            self.stats.entities
        );
    }

    fn create(
        &mut self,
        destination: Entity,
        extensions: &[String],
    ) -> (MachineHandle, InstanceHandle) {
        let machine = MachineHandle(self.next_handle);
        let instance = InstanceHandle(self.next_handle);
        self.next_handle += 1;
        log::trace!(
            "HeadlessBackend[{}]: creating machine {:?} for {destination} with extensions {extensions:?}",
            self.label,
            machine
        );
        self.machines.insert(
            machine,
            HeadlessMachine {
                destination,
                surface: None,
                pairs: HashSet::new(),
            },
        );
        (machine, instance)
    }

    fn dispose(&mut self, machine: MachineHandle, instance: InstanceHandle) {
        if let Some(state) = self.machines.remove(&machine) {
            log::trace!(
                "HeadlessBackend[{}]: disposing {:?}/{:?} of {}",
                self.label,
                machine,
                instance,
                state.destination
            );
        }
    }

    fn surface_created(&mut self, machine: MachineHandle, surface: SurfaceHandle) {
        if let Some(state) = self.machines.get_mut(&machine) {
            log::trace!("HeadlessBackend[{}]: surface {surface:?} for {machine:?}", self.label);
            state.surface = Some(surface);
        }
    }

    fn begin_render(&mut self, machine: MachineHandle, clear_color: [f32; 4]) -> StatusCode {
        let Some(state) = self.machines.get_mut(&machine) else {
            return StatusCode::Failed;
        };
        if self.require_surface && state.surface.is_none() {
            return StatusCode::Skip;
        }
        state.pairs.clear();
        self.stats.frames_begun += 1;
        log::trace!(
            "HeadlessBackend[{}]: begin {machine:?} clear {clear_color:?}",
            self.label
        );
        StatusCode::Continue
    }

    fn render(&mut self, machine: MachineHandle, render_group: i8, entities: &[RenderEntity]) {
        if let Some(state) = self.machines.get_mut(&machine) {
            state.pairs.extend(entities.iter().map(RenderEntity::key));
        }
        self.stats.batches += 1;
        self.stats.entities += entities.len() as u64;
        log::trace!(
            "HeadlessBackend[{}]: render group {render_group} with {} entities",
            self.label,
            entities.len()
        );
    }

    fn end_render(&mut self, machine: MachineHandle) {
        if let Some(state) = self.machines.get(&machine) {
            self.stats.last_frame_pairs = state.pairs.len();
        }
        self.stats.frames_ended += 1;
        log::trace!("HeadlessBackend[{}]: end {machine:?}", self.label);
    }
}
