//! Shared test fixtures for astro_core and downstream crates.
//!
//! `base_content()` is a small but complete content set: a couple of items, an
//! unlocked and a research-gated recipe, a three-node research chain and the
//! three modules a flyable ship needs. `minimal_content()` is empty apart from
//! constants, for content-validation tests.

use std::collections::BTreeMap;

use crate::{
    Constants, GameContent, GameState, ItemDef, ItemId, ModuleDef, ModuleDefId, ModuleType,
    NodeId, Placement, Recipe, RecipeId, ResearchNode, SlotAccepts, SlotDef,
};

pub fn item(id: &str) -> ItemId {
    ItemId::from(id)
}

/// iron x2 -> plate x1 in 3 s, unlocked from the start.
pub fn iron_plate_recipe() -> Recipe {
    Recipe {
        id: RecipeId::from("recipe_iron_plate"),
        name: "Iron Plate".to_string(),
        description: String::new(),
        required_items: BTreeMap::from([(item("iron"), 2)]),
        result_item: item("plate"),
        result_quantity: 1,
        crafting_secs: 3.0,
        unlocked: true,
    }
}

/// plate x2 -> hull_panel x1 in 4 s, locked until metallurgy is researched.
pub fn hull_panel_recipe() -> Recipe {
    Recipe {
        id: RecipeId::from("recipe_hull_panel"),
        name: "Hull Panel".to_string(),
        description: String::new(),
        required_items: BTreeMap::from([(item("plate"), 2)]),
        result_item: item("hull_panel"),
        result_quantity: 1,
        crafting_secs: 4.0,
        unlocked: false,
    }
}

pub fn node(id: &str, prereqs: &[&str], research_secs: f32) -> ResearchNode {
    ResearchNode {
        id: NodeId::from(id),
        name: id.to_string(),
        description: String::new(),
        prereqs: prereqs.iter().map(|p| NodeId::from(*p)).collect(),
        required_resources: BTreeMap::new(),
        research_secs,
        unlocks_recipes: Vec::new(),
        unlocks_items: Vec::new(),
        unlocked: false,
    }
}

/// metallurgy (5 s) -> propulsion (8 s) -> fuel_systems (6 s).
pub fn research_tree() -> Vec<ResearchNode> {
    let mut metallurgy = node("research_metallurgy", &[], 5.0);
    metallurgy.unlocks_recipes = vec![RecipeId::from("recipe_hull_panel")];
    metallurgy.unlocks_items = vec![item("hull_panel")];

    let mut propulsion = node("research_propulsion", &["research_metallurgy"], 8.0);
    propulsion.required_resources = BTreeMap::from([(item("plate"), 1)]);

    let fuel_systems = node("research_fuel_systems", &["research_propulsion"], 6.0);

    vec![metallurgy, propulsion, fuel_systems]
}

/// A 100 kg module with no power draw and one slot per entry in `accepts`.
pub fn module_def(id: &str, module_type: ModuleType, accepts: &[SlotAccepts]) -> ModuleDef {
    ModuleDef {
        id: ModuleDefId::from(id),
        name: id.to_string(),
        module_type,
        mass_kg: 100.0,
        power_generation_kw: 0.0,
        power_consumption_kw: 0.0,
        crew_capacity: 0,
        slots: accepts
            .iter()
            .enumerate()
            .map(|(index, accepts)| SlotDef {
                placement: Placement {
                    location: [index as f32, 0.0, 0.0],
                    rotation: [0.0; 3],
                },
                accepts: *accepts,
            })
            .collect(),
    }
}

/// 500 kg, +10/-2 kW, crew 2. Slots: engine, fuel tank, any, any.
pub fn cockpit_def() -> ModuleDef {
    let mut def = module_def(
        "module_cockpit",
        ModuleType::Cockpit,
        &[
            SlotAccepts::Only(ModuleType::Engine),
            SlotAccepts::Only(ModuleType::FuelTank),
            SlotAccepts::Any,
            SlotAccepts::Any,
        ],
    );
    def.mass_kg = 500.0;
    def.power_generation_kw = 10.0;
    def.power_consumption_kw = 2.0;
    def.crew_capacity = 2;
    def
}

/// 1200 kg, draws 5 kW.
pub fn engine_def() -> ModuleDef {
    let mut def = module_def("module_engine", ModuleType::Engine, &[]);
    def.mass_kg = 1200.0;
    def.power_consumption_kw = 5.0;
    def
}

/// 800 kg, passive.
pub fn fuel_tank_def() -> ModuleDef {
    let mut def = module_def("module_fuel_tank", ModuleType::FuelTank, &[]);
    def.mass_kg = 800.0;
    def
}

pub fn base_content() -> GameContent {
    GameContent {
        content_version: "test".to_string(),
        items: vec![
            ItemDef {
                id: item("iron"),
                name: "Iron Ore".to_string(),
                max_stack_size: 99,
            },
            ItemDef {
                id: item("plate"),
                name: "Iron Plate".to_string(),
                max_stack_size: 50,
            },
            ItemDef {
                id: item("hull_panel"),
                name: "Hull Panel".to_string(),
                max_stack_size: 10,
            },
        ],
        recipes: vec![iron_plate_recipe(), hull_panel_recipe()],
        research_nodes: research_tree(),
        module_defs: vec![cockpit_def(), engine_def(), fuel_tank_def()],
        constants: Constants::default(),
    }
}

pub fn minimal_content() -> GameContent {
    GameContent {
        content_version: "minimal".to_string(),
        items: Vec::new(),
        recipes: Vec::new(),
        research_nodes: Vec::new(),
        module_defs: Vec::new(),
        constants: Constants::default(),
    }
}

pub fn base_state(content: &GameContent) -> GameState {
    GameState::new(content, "Test Ship")
}
