//! `astro_core` — player progression and ship assembly.
//!
//! No IO, no clock. Everything moves through `tick(state, commands, content, dt)`
//! and reports back as events.

pub mod crafting;
mod engine;
pub mod events;
pub mod inventory;
pub mod progression;
pub mod research;
pub mod ship;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use crafting::{CraftingEngine, CraftingError};
pub use engine::{tick, CommandError};
pub use events::EventLog;
pub use inventory::{Inventory, InventoryError, ItemStack};
pub use progression::{ProgressState, Progression};
pub use research::{ResearchEngine, ResearchError};
pub use ship::{AssemblyError, AssemblySummary, ConnectionSlot, ShipAssembly, ShipModule};
pub use types::*;

#[cfg(test)]
mod tests;
