use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AssemblyError, ShipModule};
use crate::events::EventLog;
use crate::{Event, FlightRequirements, ModuleDef, ModuleId, ModuleType};

/// Aggregate view of an assembly, cheap to serialize for hosts and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblySummary {
    pub name: String,
    pub module_count: usize,
    pub total_mass_kg: f32,
    pub power_balance_kw: f32,
    pub crew_capacity: u32,
    pub missing: Vec<ModuleType>,
    pub flyable: bool,
    pub complete: bool,
}

/// Arena of ship modules rooted at a single module.
///
/// The root is fixed by the first `add_module` call and can never be removed.
/// Every other module hangs off exactly one parent slot, so the arena is
/// always a tree and every stored module is reachable from the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipAssembly {
    pub name: String,
    requirements: FlightRequirements,
    root: Option<ModuleId>,
    modules: BTreeMap<ModuleId, ShipModule>,
    next_module_id: u64,
    complete: bool,
}

impl ShipAssembly {
    pub fn new(name: impl Into<String>, requirements: FlightRequirements) -> Self {
        Self {
            name: name.into(),
            requirements,
            root: None,
            modules: BTreeMap::new(),
            next_module_id: 0,
            complete: false,
        }
    }

    pub fn root(&self) -> Option<ModuleId> {
        self.root
    }

    pub fn requirements(&self) -> FlightRequirements {
        self.requirements
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn module(&self, id: ModuleId) -> Option<&ShipModule> {
        self.modules.get(&id)
    }

    /// All modules, ordered by handle.
    pub fn modules(&self) -> impl Iterator<Item = &ShipModule> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Instantiate `def` and hang it off `parent`'s slot, or make it the root
    /// when `parent` is `None`. A module that fails to attach is discarded.
    pub fn add_module(
        &mut self,
        def: &ModuleDef,
        parent: Option<ModuleId>,
        slot_index: usize,
        events: &mut EventLog,
    ) -> Result<ModuleId, AssemblyError> {
        if self.complete {
            return Err(AssemblyError::Finalized);
        }
        let id = ModuleId(self.next_module_id);
        self.next_module_id += 1;
        let mut module = ShipModule::from_def(id, def);

        match parent {
            None => {
                if let Some(root) = self.root {
                    return Err(AssemblyError::RootAlreadySet(root));
                }
                self.root = Some(id);
            }
            Some(parent_id) => {
                let parent_module = self
                    .modules
                    .get_mut(&parent_id)
                    .ok_or(AssemblyError::UnknownModule(parent_id))?;
                let placement =
                    parent_module.attach_child(id, module.module_type, slot_index)?;
                module.parent = Some(parent_id);
                module.placement = placement;
            }
        }

        debug!(module_id = %id, def_id = %def.id, ?parent, slot_index, "module added");
        events.emit(Event::ModuleAdded {
            module_id: id,
            module_type: module.module_type,
            parent,
        });
        self.modules.insert(id, module);
        Ok(id)
    }

    /// `add_module` into the lowest free slot on `parent` that takes `def`'s type.
    pub fn attach_module(
        &mut self,
        def: &ModuleDef,
        parent: ModuleId,
        events: &mut EventLog,
    ) -> Result<ModuleId, AssemblyError> {
        if self.complete {
            return Err(AssemblyError::Finalized);
        }
        let parent_module = self
            .modules
            .get(&parent)
            .ok_or(AssemblyError::UnknownModule(parent))?;
        let slot_index = parent_module
            .first_free_slot_for(def.module_type)
            .ok_or(AssemblyError::NoFreeSlot {
                module_id: parent,
                module_type: def.module_type,
            })?;
        self.add_module(def, Some(parent), slot_index, events)
    }

    /// Detach `id` from its parent and destroy it together with everything
    /// attached below it. Returns the destroyed handles, parents first.
    ///
    /// Unknown handles and the root are ignored.
    pub fn remove_module(
        &mut self,
        id: ModuleId,
        events: &mut EventLog,
    ) -> Result<Vec<ModuleId>, AssemblyError> {
        if self.complete {
            return Err(AssemblyError::Finalized);
        }
        if self.root == Some(id) {
            debug!(module_id = %id, "root module cannot be removed");
            return Ok(Vec::new());
        }
        let Some(parent) = self.modules.get(&id).map(ShipModule::parent) else {
            return Ok(Vec::new());
        };
        if let Some(parent_module) = parent.and_then(|p| self.modules.get_mut(&p)) {
            parent_module.detach_child(id);
        }

        let doomed = self.subtree(id);
        for module_id in &doomed {
            self.modules.remove(module_id);
            events.emit(Event::ModuleRemoved {
                module_id: *module_id,
            });
        }
        Ok(doomed)
    }

    /// `id` and all of its descendants in depth-first, parent-first order.
    pub fn subtree(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(module) = self.modules.get(&current) else {
                continue;
            };
            order.push(current);
            stack.extend(module.children().iter().rev());
        }
        order
    }

    pub fn total_mass(&self) -> f32 {
        self.modules.values().map(|m| m.mass_kg).sum()
    }

    /// Generation minus consumption across every module, in kW.
    pub fn power_balance(&self) -> f32 {
        let generated: f32 = self.modules.values().map(|m| m.power_generation_kw).sum();
        let consumed: f32 = self.modules.values().map(|m| m.power_consumption_kw).sum();
        generated - consumed
    }

    pub fn total_crew_capacity(&self) -> u32 {
        self.modules.values().map(|m| m.crew_capacity).sum()
    }

    pub fn count_of(&self, module_type: ModuleType) -> usize {
        self.modules
            .values()
            .filter(|m| m.module_type == module_type)
            .count()
    }

    /// Required module types with no instance in the ship.
    pub fn missing_requirements(&self) -> Vec<ModuleType> {
        self.requirements
            .required_types()
            .into_iter()
            .filter(|t| self.count_of(*t) == 0)
            .collect()
    }

    pub fn is_flyable(&self) -> bool {
        !self.modules.is_empty()
            && self.missing_requirements().is_empty()
            && self.power_balance() >= 0.0
    }

    /// Lock the design in. One-way; a finalized ship rejects further edits.
    pub fn finalize(&mut self, events: &mut EventLog) -> Result<(), AssemblyError> {
        if self.complete {
            return Err(AssemblyError::Finalized);
        }
        if !self.is_flyable() {
            return Err(AssemblyError::NotFlyable {
                missing: self.missing_requirements(),
                power_balance: self.power_balance(),
            });
        }
        self.complete = true;
        let total_mass = self.total_mass();
        let power_balance = self.power_balance();
        info!(ship = %self.name, total_mass, power_balance, "ship finalized");
        events.emit(Event::ShipFinalized {
            total_mass,
            power_balance,
        });
        Ok(())
    }

    pub fn summary(&self) -> AssemblySummary {
        AssemblySummary {
            name: self.name.clone(),
            module_count: self.modules.len(),
            total_mass_kg: self.total_mass(),
            power_balance_kw: self.power_balance(),
            crew_capacity: self.total_crew_capacity(),
            missing: self.missing_requirements(),
            flyable: self.is_flyable(),
            complete: self.complete,
        }
    }
}
