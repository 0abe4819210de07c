//! Modular ship graph.
//!
//! Each `ShipModule` owns its connection slots and knows how to take or
//! release a child; the `ShipAssembly` arena owns the modules themselves.

mod assembly;

pub use assembly::{AssemblySummary, ShipAssembly};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{ModuleDef, ModuleDefId, ModuleId, ModuleType, Placement, SlotAccepts};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("ship already has root module {0}")]
    RootAlreadySet(ModuleId),
    #[error("no module {0} in this assembly")]
    UnknownModule(ModuleId),
    #[error("unknown module definition '{0}'")]
    UnknownModuleDef(ModuleDefId),
    #[error("{module_id} has {slot_count} slots, no slot {slot_index}")]
    SlotOutOfRange {
        module_id: ModuleId,
        slot_index: usize,
        slot_count: usize,
    },
    #[error("slot {slot_index} on {module_id} is taken by {occupant}")]
    SlotOccupied {
        module_id: ModuleId,
        slot_index: usize,
        occupant: ModuleId,
    },
    #[error("slot {slot_index} on {module_id} takes {accepts}, not {found}")]
    TypeMismatch {
        module_id: ModuleId,
        slot_index: usize,
        accepts: ModuleType,
        found: ModuleType,
    },
    #[error("{module_id} has no free slot for {module_type}")]
    NoFreeSlot {
        module_id: ModuleId,
        module_type: ModuleType,
    },
    #[error("{0} cannot be attached here")]
    InvalidChild(ModuleId),
    #[error("ship is finalized")]
    Finalized,
    #[error("ship cannot fly: missing {missing:?}, power balance {power_balance} kW")]
    NotFlyable {
        missing: Vec<ModuleType>,
        power_balance: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSlot {
    pub placement: Placement,
    pub accepts: SlotAccepts,
    occupant: Option<ModuleId>,
}

impl ConnectionSlot {
    pub fn new(placement: Placement, accepts: SlotAccepts) -> Self {
        Self {
            placement,
            accepts,
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<ModuleId> {
        self.occupant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipModule {
    pub id: ModuleId,
    pub def_id: ModuleDefId,
    pub name: String,
    pub module_type: ModuleType,
    pub mass_kg: f32,
    pub power_generation_kw: f32,
    pub power_consumption_kw: f32,
    pub crew_capacity: u32,
    slots: SmallVec<[ConnectionSlot; 4]>,
    children: Vec<ModuleId>,
    parent: Option<ModuleId>,
    placement: Placement,
}

impl ShipModule {
    pub fn from_def(id: ModuleId, def: &ModuleDef) -> Self {
        Self {
            id,
            def_id: def.id.clone(),
            name: def.name.clone(),
            module_type: def.module_type,
            mass_kg: def.mass_kg,
            power_generation_kw: def.power_generation_kw,
            power_consumption_kw: def.power_consumption_kw,
            crew_capacity: def.crew_capacity,
            slots: def
                .slots
                .iter()
                .map(|slot| ConnectionSlot::new(slot.placement, slot.accepts))
                .collect(),
            children: Vec::new(),
            parent: None,
            placement: Placement::default(),
        }
    }

    pub fn slots(&self) -> &[ConnectionSlot] {
        &self.slots
    }

    /// Attached children in attach order.
    pub fn children(&self) -> &[ModuleId] {
        &self.children
    }

    pub fn parent(&self) -> Option<ModuleId> {
        self.parent
    }

    /// Offset copied from the parent slot this module occupies.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn free_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_occupied())
            .map(|(index, _)| index)
    }

    /// Lowest free slot that would take a module of `module_type`.
    pub fn first_free_slot_for(&self, module_type: ModuleType) -> Option<usize> {
        self.free_slots()
            .find(|index| self.slots[*index].accepts.admits(module_type))
    }

    /// Slot index `child` occupies on this module.
    pub fn slot_of(&self, child: ModuleId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.occupant == Some(child))
    }

    /// Occupy `slot_index` with `child_id`, returning the slot's placement for the child.
    pub fn attach_child(
        &mut self,
        child_id: ModuleId,
        child_type: ModuleType,
        slot_index: usize,
    ) -> Result<Placement, AssemblyError> {
        if child_id == self.id || self.children.contains(&child_id) {
            return Err(AssemblyError::InvalidChild(child_id));
        }
        let module_id = self.id;
        let slot_count = self.slots.len();
        let slot = self
            .slots
            .get_mut(slot_index)
            .ok_or(AssemblyError::SlotOutOfRange {
                module_id,
                slot_index,
                slot_count,
            })?;
        if let Some(occupant) = slot.occupant {
            return Err(AssemblyError::SlotOccupied {
                module_id,
                slot_index,
                occupant,
            });
        }
        if let SlotAccepts::Only(accepts) = slot.accepts {
            if accepts != child_type {
                return Err(AssemblyError::TypeMismatch {
                    module_id,
                    slot_index,
                    accepts,
                    found: child_type,
                });
            }
        }

        slot.occupant = Some(child_id);
        self.children.push(child_id);
        Ok(slot.placement)
    }

    /// Free the slot held by `child_id`. Returns the freed index, or `None`
    /// if the child was not attached here.
    pub fn detach_child(&mut self, child_id: ModuleId) -> Option<usize> {
        let slot_index = self.slot_of(child_id)?;
        self.slots[slot_index].occupant = None;
        self.children.retain(|c| *c != child_id);
        Some(slot_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::module_def;

    fn hub() -> ShipModule {
        let def = module_def(
            "module_hub",
            ModuleType::Hull,
            &[
                SlotAccepts::Only(ModuleType::Engine),
                SlotAccepts::Any,
                SlotAccepts::Any,
            ],
        );
        ShipModule::from_def(ModuleId(1), &def)
    }

    #[test]
    fn attach_occupies_slot_and_returns_offset() {
        let mut hub = hub();

        let placement = hub.attach_child(ModuleId(2), ModuleType::Engine, 0).unwrap();

        assert_eq!(placement, hub.slots()[0].placement);
        assert_eq!(hub.slots()[0].occupant(), Some(ModuleId(2)));
        assert_eq!(hub.children(), &[ModuleId(2)]);
        assert_eq!(hub.free_slots().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn attach_rejects_bad_index() {
        let mut hub = hub();
        assert_eq!(
            hub.attach_child(ModuleId(2), ModuleType::Engine, 3),
            Err(AssemblyError::SlotOutOfRange {
                module_id: ModuleId(1),
                slot_index: 3,
                slot_count: 3,
            })
        );
    }

    #[test]
    fn attach_rejects_occupied_slot() {
        let mut hub = hub();
        hub.attach_child(ModuleId(2), ModuleType::Cargo, 1).unwrap();

        assert_eq!(
            hub.attach_child(ModuleId(3), ModuleType::Cargo, 1),
            Err(AssemblyError::SlotOccupied {
                module_id: ModuleId(1),
                slot_index: 1,
                occupant: ModuleId(2),
            })
        );
    }

    #[test]
    fn typed_slot_rejects_other_types_and_wildcard_takes_all() {
        let mut hub = hub();

        assert!(matches!(
            hub.attach_child(ModuleId(2), ModuleType::Cargo, 0),
            Err(AssemblyError::TypeMismatch {
                accepts: ModuleType::Engine,
                found: ModuleType::Cargo,
                ..
            })
        ));
        assert!(hub.attach_child(ModuleId(2), ModuleType::Weapon, 1).is_ok());
        assert!(hub.attach_child(ModuleId(3), ModuleType::Hull, 2).is_ok());
    }

    #[test]
    fn cannot_attach_self_or_twice() {
        let mut hub = hub();
        assert_eq!(
            hub.attach_child(ModuleId(1), ModuleType::Hull, 1),
            Err(AssemblyError::InvalidChild(ModuleId(1)))
        );
        hub.attach_child(ModuleId(2), ModuleType::Hull, 1).unwrap();
        assert_eq!(
            hub.attach_child(ModuleId(2), ModuleType::Hull, 2),
            Err(AssemblyError::InvalidChild(ModuleId(2)))
        );
    }

    #[test]
    fn detach_frees_the_childs_own_slot() {
        let mut hub = hub();
        hub.attach_child(ModuleId(2), ModuleType::Engine, 0).unwrap();
        hub.attach_child(ModuleId(3), ModuleType::Cargo, 1).unwrap();
        hub.attach_child(ModuleId(4), ModuleType::Sensor, 2).unwrap();

        assert_eq!(hub.detach_child(ModuleId(3)), Some(1));

        assert!(hub.slots()[0].is_occupied(), "earlier slot untouched");
        assert!(!hub.slots()[1].is_occupied());
        assert_eq!(hub.slots()[2].occupant(), Some(ModuleId(4)));
        assert_eq!(hub.children(), &[ModuleId(2), ModuleId(4)]);
    }

    #[test]
    fn first_free_slot_respects_type_and_occupancy() {
        let mut hub = hub();
        assert_eq!(hub.first_free_slot_for(ModuleType::Engine), Some(0));
        assert_eq!(hub.first_free_slot_for(ModuleType::Cargo), Some(1));

        hub.attach_child(ModuleId(2), ModuleType::Cargo, 1).unwrap();
        hub.attach_child(ModuleId(3), ModuleType::Cargo, 2).unwrap();

        assert_eq!(hub.first_free_slot_for(ModuleType::Cargo), None);
        assert_eq!(hub.first_free_slot_for(ModuleType::Engine), Some(0));
    }

    #[test]
    fn detach_unknown_child_is_noop() {
        let mut hub = hub();
        hub.attach_child(ModuleId(2), ModuleType::Engine, 0).unwrap();

        assert_eq!(hub.detach_child(ModuleId(9)), None);
        assert!(hub.slots()[0].is_occupied());
    }
}
