//! Backend registration and machine ownership.

use std::collections::HashMap;

use lantern_ecs::Entity;

use crate::backend::{InstanceHandle, RenderingBackend};
use crate::error::RenderError;
use crate::machine::RenderingMachine;

struct RegisteredBackend {
    backend: Box<dyn RenderingBackend>,
    machines: Vec<RenderingMachine>,
}

/// Registered backends keyed by label, each with the machines it created.
///
/// Owning the machines here means unregistering a backend can always
/// dispose them through the right backend before calling `finish`.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, RegisteredBackend>,
    owners: HashMap<Entity, String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under its label and calls its `start` hook.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DuplicateLabel`] if the label is taken. The
    /// registry is left untouched and `start` is not called.
    pub fn register(&mut self, mut backend: Box<dyn RenderingBackend>) -> Result<(), RenderError> {
        let label = backend.label().to_owned();
        if self.backends.contains_key(&label) {
            return Err(RenderError::DuplicateLabel(label));
        }
        backend.start();
        log::info!("Registered rendering backend `{label}`");
        self.backends.insert(
            label,
            RegisteredBackend {
                backend,
                machines: Vec::new(),
            },
        );
        Ok(())
    }

    /// Disposes every machine of `label`, calls `finish`, and hands the
    /// backend back together with the destinations that lost their machine.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BackendNotFound`] if nothing is registered
    /// under `label`.
    pub fn unregister(
        &mut self,
        label: &str,
    ) -> Result<(Box<dyn RenderingBackend>, Vec<Entity>), RenderError> {
        let RegisteredBackend {
            mut backend,
            machines,
        } = self
            .backends
            .remove(label)
            .ok_or_else(|| RenderError::BackendNotFound(label.to_owned()))?;

        let mut destinations = Vec::with_capacity(machines.len());
        for machine in machines.into_iter().rev() {
            self.owners.remove(&machine.destination());
            destinations.push(machine.destination());
            machine.dispose(backend.as_mut());
        }
        backend.finish();
        log::info!(
            "Unregistered rendering backend `{label}` ({} machines disposed)",
            destinations.len()
        );
        Ok((backend, destinations))
    }

    /// Unregisters every backend in label order.
    pub fn shutdown(&mut self) -> Vec<Entity> {
        let mut labels: Vec<String> = self.backends.keys().cloned().collect();
        labels.sort_unstable();

        let mut destinations = Vec::new();
        for label in labels {
            if let Ok((_, disposed)) = self.unregister(&label) {
                destinations.extend(disposed);
            }
        }
        destinations
    }

    /// Labels of all registered backends, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    // ---- Machines ----

    /// Creates the machine for `destination` with the backend registered
    /// under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownBackendLabel`] if `label` is not
    /// registered. No machine is created in that case.
    pub fn create_machine(
        &mut self,
        destination: Entity,
        label: &str,
        extensions: &[String],
    ) -> Result<InstanceHandle, RenderError> {
        let entry =
            self.backends
                .get_mut(label)
                .ok_or_else(|| RenderError::UnknownBackendLabel {
                    destination,
                    label: label.to_owned(),
                })?;

        debug_assert!(
            !self.owners.contains_key(&destination),
            "{destination} already has a rendering machine"
        );
        let machine = RenderingMachine::create(entry.backend.as_mut(), destination, extensions);
        let instance = machine.instance();
        entry.machines.push(machine);
        self.owners.insert(destination, label.to_owned());
        Ok(instance)
    }

    /// Disposes the machine of `destination`. Returns `false` if it had none.
    pub fn dispose_machine(&mut self, destination: Entity) -> bool {
        let Some(label) = self.owners.remove(&destination) else {
            return false;
        };
        let Some(entry) = self.backends.get_mut(&label) else {
            return false;
        };
        let Some(slot) = entry
            .machines
            .iter()
            .position(|m| m.destination() == destination)
        else {
            return false;
        };
        let machine = entry.machines.swap_remove(slot);
        machine.dispose(entry.backend.as_mut());
        true
    }

    pub fn has_machine(&self, destination: Entity) -> bool {
        self.owners.contains_key(&destination)
    }

    pub fn machine(&self, destination: Entity) -> Option<&RenderingMachine> {
        let label = self.owners.get(&destination)?;
        self.backends
            .get(label)?
            .machines
            .iter()
            .find(|m| m.destination() == destination)
    }

    /// The machine of `destination` together with the backend driving it.
    pub fn machine_mut(
        &mut self,
        destination: Entity,
    ) -> Option<(&mut dyn RenderingBackend, &mut RenderingMachine)> {
        let label = self.owners.get(&destination)?;
        let RegisteredBackend { backend, machines } = self.backends.get_mut(label)?;
        let machine = machines
            .iter_mut()
            .find(|m| m.destination() == destination)?;
        Some((backend.as_mut(), machine))
    }

    /// Label of the backend owning the machine of `destination`.
    pub fn owner(&self, destination: Entity) -> Option<&str> {
        self.owners.get(&destination).map(String::as_str)
    }

    pub fn machine_count(&self) -> usize {
        self.owners.len()
    }

    /// Every machine, grouped by backend.
    pub fn machines(&self) -> impl Iterator<Item = &RenderingMachine> {
        self.backends.values().flat_map(|b| b.machines.iter())
    }

    pub(crate) fn machines_mut(&mut self) -> impl Iterator<Item = &mut RenderingMachine> {
        self.backends.values_mut().flat_map(|b| b.machines.iter_mut())
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("labels", &self.labels())
            .field("machines", &self.owners.len())
            .finish()
    }
}
