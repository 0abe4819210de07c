use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::crafting::{credit, CraftingEngine, CraftingError};
use crate::events::EventLog;
use crate::inventory::{Inventory, InventoryError};
use crate::research::{ResearchEngine, ResearchError};
use crate::ship::{AssemblyError, ShipAssembly};
use crate::{
    Command, CommandEnvelope, CommandId, Counters, Event, EventEnvelope, GameContent, GameState,
    MetaState, NodeId, RecipeId,
};

/// Why a command was turned away. Rendered into `Event::CommandRejected`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Crafting(#[from] CraftingError),
    #[error(transparent)]
    Research(#[from] ResearchError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("unknown recipe '{0}'")]
    UnknownRecipe(RecipeId),
    #[error("not enough resources to research '{0}'")]
    ResearchResources(NodeId),
}

impl GameState {
    /// Fresh player state: empty ledger, content-defined recipe book and
    /// research graph, no ship modules.
    pub fn new(content: &GameContent, ship_name: impl Into<String>) -> Self {
        Self {
            meta: MetaState {
                tick: 0,
                elapsed_secs: 0.0,
                content_version: content.content_version.clone(),
            },
            inventory: Inventory::from_content(content),
            crafting: CraftingEngine::new(content.recipes.clone()),
            research: ResearchEngine::new(content.research_nodes.clone()),
            assembly: ShipAssembly::new(ship_name, content.constants.flight_requirements),
            unlocked_items: BTreeSet::new(),
            counters: Counters::default(),
        }
    }

    /// Wrap `command` with the next command id, stamped at the current tick.
    pub fn envelope(&mut self, command: Command) -> CommandEnvelope {
        let id = CommandId(format!("cmd_{:06}", self.counters.next_command_id));
        self.counters.next_command_id += 1;
        CommandEnvelope {
            id,
            issued_tick: self.meta.tick,
            command,
        }
    }
}

/// Advance the player state by `dt` seconds.
///
/// Order of operations:
/// 1. Apply commands, in order.
/// 2. Advance the running craft.
/// 3. Advance the running research and apply its unlocks.
/// 4. Increment the tick counter and elapsed time.
///
/// Returns all events produced this tick.
pub fn tick(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    content: &GameContent,
    dt: f32,
) -> Vec<EventEnvelope> {
    let mut events = EventLog::new(state.meta.tick, state.counters.next_event_id);

    apply_commands(state, commands, content, &mut events);
    state
        .crafting
        .advance(dt, &mut state.inventory, &mut events);
    advance_research(state, dt, &mut events);

    state.counters.next_event_id = events.next_event_id();
    state.meta.tick += 1;
    state.meta.elapsed_secs += f64::from(dt.max(0.0));
    events.into_envelopes()
}

fn apply_commands(
    state: &mut GameState,
    commands: &[CommandEnvelope],
    content: &GameContent,
    events: &mut EventLog,
) {
    for envelope in commands {
        if let Err(err) = apply_command(state, &envelope.command, content, events) {
            let reason = err.to_string();
            debug!(command_id = %envelope.id, %reason, "command rejected");
            events.emit(Event::CommandRejected {
                command_id: envelope.id.clone(),
                reason,
            });
        }
    }
}

fn apply_command(
    state: &mut GameState,
    command: &Command,
    content: &GameContent,
    events: &mut EventLog,
) -> Result<(), CommandError> {
    match command {
        Command::AddItem { item_id, quantity } => {
            state.inventory.add(item_id, *quantity, events)?;
        }
        Command::RemoveItem { item_id, quantity } => {
            state.inventory.remove(item_id, *quantity, events)?;
        }
        Command::StartCrafting { recipe_id } => {
            state
                .crafting
                .start(recipe_id, &mut state.inventory, events)?;
        }
        Command::CancelCrafting => {
            state.crafting.cancel(&mut state.inventory, events);
        }
        Command::UnlockRecipe { recipe_id } => {
            if state.crafting.recipe(recipe_id).is_none() {
                return Err(CommandError::UnknownRecipe(recipe_id.clone()));
            }
            if state.crafting.unlock_recipe(recipe_id) {
                events.emit(Event::RecipeUnlocked {
                    recipe_id: recipe_id.clone(),
                });
            }
        }
        Command::StartResearch { node_id } => {
            start_research(state, node_id, content, events)?;
        }
        Command::CancelResearch => {
            let Some(node_id) = state.research.cancel(events) else {
                return Ok(());
            };
            if content.constants.research_consumes_resources {
                if let Some(node) = state.research.node(&node_id) {
                    for (item_id, quantity) in &node.required_resources {
                        credit(&mut state.inventory, item_id, *quantity, events);
                    }
                }
            }
        }
        Command::AddModule {
            def_id,
            parent,
            slot_index,
        } => {
            let def = content
                .module_def(def_id)
                .ok_or_else(|| AssemblyError::UnknownModuleDef(def_id.clone()))?;
            state
                .assembly
                .add_module(def, *parent, *slot_index, events)?;
        }
        Command::AttachModule { def_id, parent } => {
            let def = content
                .module_def(def_id)
                .ok_or_else(|| AssemblyError::UnknownModuleDef(def_id.clone()))?;
            state.assembly.attach_module(def, *parent, events)?;
        }
        Command::RemoveModule { module_id } => {
            state.assembly.remove_module(*module_id, events)?;
        }
        Command::FinalizeShip => {
            state.assembly.finalize(events)?;
        }
    }
    Ok(())
}

/// Research resources are only charged when the content asks for it; the
/// research engine itself never looks at the ledger.
fn start_research(
    state: &mut GameState,
    node_id: &NodeId,
    content: &GameContent,
    events: &mut EventLog,
) -> Result<(), CommandError> {
    let consumes = content.constants.research_consumes_resources;
    if consumes {
        if let Some(node) = state.research.node(node_id) {
            if !state.inventory.has_all(&node.required_resources) {
                return Err(CommandError::ResearchResources(node_id.clone()));
            }
        }
    }

    state.research.start(node_id, events)?;

    if consumes {
        if let Some(node) = state.research.node(node_id) {
            for (item_id, quantity) in &node.required_resources {
                if let Err(err) = state.inventory.remove(item_id, *quantity, events) {
                    debug!(%node_id, %item_id, %err, "research debit failed after check");
                }
            }
        }
    }
    Ok(())
}

fn advance_research(state: &mut GameState, dt: f32, events: &mut EventLog) {
    let Some(finished) = state.research.advance(dt, events) else {
        return;
    };
    let Some(node) = state.research.node(&finished) else {
        return;
    };
    for recipe_id in &node.unlocks_recipes {
        if state.crafting.unlock_recipe(recipe_id) {
            events.emit(Event::RecipeUnlocked {
                recipe_id: recipe_id.clone(),
            });
        }
    }
    for item_id in &node.unlocks_items {
        if state.unlocked_items.insert(item_id.clone()) {
            events.emit(Event::ItemUnlocked {
                item_id: item_id.clone(),
            });
        }
    }
}
