//! Type definitions for `astro_core`.
//!
//! ID newtypes, enums, content definitions, commands and events shared by
//! every component of the core.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::crafting::CraftingEngine;
use crate::inventory::Inventory;
use crate::research::ResearchEngine;
use crate::ship::ShipAssembly;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(ItemId);
string_id!(RecipeId);
string_id!(NodeId);
string_id!(ModuleDefId);
string_id!(CommandId);
string_id!(EventId);

/// Handle to a module instance inside a [`ShipAssembly`] arena.
///
/// Handles are never reused, so a handle to a destroyed module stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u64);

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "module_{:04}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModuleType {
    Cockpit,
    Engine,
    FuelTank,
    Weapon,
    Shield,
    Cargo,
    LifeSupport,
    Sensor,
    Hull,
}

impl std::fmt::Display for ModuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Which module types a connection slot will take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotAccepts {
    Any,
    Only(ModuleType),
}

impl SlotAccepts {
    pub fn admits(self, module_type: ModuleType) -> bool {
        match self {
            SlotAccepts::Any => true,
            SlotAccepts::Only(accepted) => accepted == module_type,
        }
    }
}

/// Relative placement of a module against its parent. Stored, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub location: [f32; 3],
    pub rotation: [f32; 3],
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// Everything owned by one player entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub meta: MetaState,
    pub inventory: Inventory,
    pub crafting: CraftingEngine,
    pub research: ResearchEngine,
    pub assembly: ShipAssembly,
    /// Items made available by completed research.
    pub unlocked_items: BTreeSet<ItemId>,
    pub counters: Counters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    pub tick: u64,
    /// Sum of every `dt` passed to `tick`.
    pub elapsed_secs: f64,
    pub content_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_command_id: u64,
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: CommandId,
    pub issued_tick: u64,
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    StartCrafting {
        recipe_id: RecipeId,
    },
    CancelCrafting,
    StartResearch {
        node_id: NodeId,
    },
    CancelResearch,
    AddItem {
        item_id: ItemId,
        quantity: u32,
    },
    RemoveItem {
        item_id: ItemId,
        quantity: u32,
    },
    UnlockRecipe {
        recipe_id: RecipeId,
    },
    /// `parent: None` places the root module.
    AddModule {
        def_id: ModuleDefId,
        parent: Option<ModuleId>,
        slot_index: usize,
    },
    /// Attach to the lowest free slot on `parent` that takes the module's type.
    AttachModule {
        def_id: ModuleDefId,
        parent: ModuleId,
    },
    RemoveModule {
        module_id: ModuleId,
    },
    FinalizeShip,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    InventoryChanged,
    /// A credit or refund could not fit in the inventory and was lost.
    InventoryOverflow {
        item_id: ItemId,
        quantity: u32,
    },
    CraftingStarted {
        recipe_id: RecipeId,
    },
    CraftingCompleted {
        recipe_id: RecipeId,
    },
    CraftingCancelled {
        recipe_id: RecipeId,
    },
    ResearchStarted {
        node_id: NodeId,
    },
    ResearchCompleted {
        node_id: NodeId,
    },
    ResearchCancelled {
        node_id: NodeId,
    },
    RecipeUnlocked {
        recipe_id: RecipeId,
    },
    ItemUnlocked {
        item_id: ItemId,
    },
    ModuleAdded {
        module_id: ModuleId,
        module_type: ModuleType,
        parent: Option<ModuleId>,
    },
    ModuleRemoved {
        module_id: ModuleId,
    },
    ShipFinalized {
        total_mass: f32,
        power_balance: f32,
    },
    CommandRejected {
        command_id: CommandId,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContent {
    pub content_version: String,
    pub items: Vec<ItemDef>,
    pub recipes: Vec<Recipe>,
    pub research_nodes: Vec<ResearchNode>,
    pub module_defs: Vec<ModuleDef>,
    pub constants: Constants,
}

impl GameContent {
    pub fn module_def(&self, id: &ModuleDefId) -> Option<&ModuleDef> {
        self.module_defs.iter().find(|d| &d.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    #[serde(default = "default_max_stack_size")]
    pub max_stack_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub required_items: BTreeMap<ItemId, u32>,
    pub result_item: ItemId,
    #[serde(default = "default_result_quantity")]
    pub result_quantity: u32,
    pub crafting_secs: f32,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prereqs: Vec<NodeId>,
    /// Only charged when `Constants::research_consumes_resources` is set.
    #[serde(default)]
    pub required_resources: BTreeMap<ItemId, u32>,
    pub research_secs: f32,
    #[serde(default)]
    pub unlocks_recipes: Vec<RecipeId>,
    #[serde(default)]
    pub unlocks_items: Vec<ItemId>,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    pub id: ModuleDefId,
    pub name: String,
    pub module_type: ModuleType,
    pub mass_kg: f32,
    #[serde(default)]
    pub power_generation_kw: f32,
    #[serde(default)]
    pub power_consumption_kw: f32,
    #[serde(default)]
    pub crew_capacity: u32,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlotDef {
    #[serde(default)]
    pub placement: Placement,
    pub accepts: SlotAccepts,
}

/// Module types a ship must carry before it can fly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FlightRequirements {
    pub cockpit: bool,
    pub engine: bool,
    pub fuel_tank: bool,
}

impl Default for FlightRequirements {
    fn default() -> Self {
        Self {
            cockpit: true,
            engine: true,
            fuel_tank: true,
        }
    }
}

impl FlightRequirements {
    /// The required types, in a stable order.
    pub fn required_types(self) -> Vec<ModuleType> {
        [
            (self.cockpit, ModuleType::Cockpit),
            (self.engine, ModuleType::Engine),
            (self.fuel_tank, ModuleType::FuelTank),
        ]
        .into_iter()
        .filter_map(|(required, module_type)| required.then_some(module_type))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    /// Distinct item ids the inventory can hold (8x5 grid).
    #[serde(default = "default_inventory_max_slots")]
    pub inventory_max_slots: usize,
    /// Stack limit for items without an `ItemDef`.
    #[serde(default = "default_max_stack_size")]
    pub default_max_stack_size: u32,
    /// Charge `ResearchNode::required_resources` when research starts.
    #[serde(default)]
    pub research_consumes_resources: bool,
    #[serde(default)]
    pub flight_requirements: FlightRequirements,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            inventory_max_slots: default_inventory_max_slots(),
            default_max_stack_size: default_max_stack_size(),
            research_consumes_resources: false,
            flight_requirements: FlightRequirements::default(),
        }
    }
}

pub const DEFAULT_MAX_STACK_SIZE: u32 = 99;
pub const DEFAULT_INVENTORY_MAX_SLOTS: usize = 40;

fn default_max_stack_size() -> u32 {
    DEFAULT_MAX_STACK_SIZE
}

fn default_inventory_max_slots() -> usize {
    DEFAULT_INVENTORY_MAX_SLOTS
}

fn default_result_quantity() -> u32 {
    1
}
