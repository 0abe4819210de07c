//! Timed crafting over the recipe book.
//!
//! Ingredients are debited when a craft starts and refunded on cancel; the
//! result is credited when the timer runs out.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::EventLog;
use crate::inventory::Inventory;
use crate::progression::Progression;
use crate::{Event, ItemId, Recipe, RecipeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CraftingError {
    #[error("a craft of '{0}' is already running")]
    AlreadyCrafting(RecipeId),
    #[error("unknown recipe '{0}'")]
    UnknownRecipe(RecipeId),
    #[error("recipe '{0}' is locked")]
    Locked(RecipeId),
    #[error("missing ingredients for '{0}'")]
    MissingIngredients(RecipeId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftingEngine {
    recipes: Vec<Recipe>,
    process: Progression<RecipeId>,
}

impl CraftingEngine {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes,
            process: Progression::default(),
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn recipe(&self, recipe_id: &RecipeId) -> Option<&Recipe> {
        self.recipes.iter().find(|r| &r.id == recipe_id)
    }

    pub fn is_crafting(&self) -> bool {
        self.process.is_active()
    }

    pub fn current_recipe(&self) -> Option<&RecipeId> {
        self.process.active_target()
    }

    pub fn progress(&self) -> f32 {
        self.process.progress()
    }

    pub fn is_recipe_unlocked(&self, recipe_id: &RecipeId) -> bool {
        self.recipe(recipe_id).is_some_and(|r| r.unlocked)
    }

    /// Returns `false` for unknown recipes and for recipes already unlocked.
    pub fn unlock_recipe(&mut self, recipe_id: &RecipeId) -> bool {
        match self.recipes.iter_mut().find(|r| &r.id == recipe_id) {
            Some(recipe) if !recipe.unlocked => {
                recipe.unlocked = true;
                true
            }
            _ => false,
        }
    }

    /// Unlocked recipes, in book order.
    pub fn available_recipes(&self) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.unlocked).collect()
    }

    pub fn can_start(&self, recipe_id: &RecipeId, inventory: &Inventory) -> bool {
        self.check_startable(recipe_id, inventory).is_ok()
    }

    fn check_startable(
        &self,
        recipe_id: &RecipeId,
        inventory: &Inventory,
    ) -> Result<&Recipe, CraftingError> {
        let recipe = self
            .recipe(recipe_id)
            .ok_or_else(|| CraftingError::UnknownRecipe(recipe_id.clone()))?;
        if !recipe.unlocked {
            return Err(CraftingError::Locked(recipe_id.clone()));
        }
        if !inventory.has_all(&recipe.required_items) {
            return Err(CraftingError::MissingIngredients(recipe_id.clone()));
        }
        Ok(recipe)
    }

    pub fn start(
        &mut self,
        recipe_id: &RecipeId,
        inventory: &mut Inventory,
        events: &mut EventLog,
    ) -> Result<(), CraftingError> {
        if let Some(current) = self.process.active_target() {
            return Err(CraftingError::AlreadyCrafting(current.clone()));
        }
        let recipe = self.check_startable(recipe_id, inventory)?;
        let duration = recipe.crafting_secs;

        // Every ingredient was checked above, so none of these can fail.
        for (item_id, quantity) in &recipe.required_items {
            if let Err(err) = inventory.remove(item_id, *quantity, events) {
                debug!(%recipe_id, %item_id, %err, "ingredient debit failed after check");
            }
        }

        self.process.begin(recipe_id.clone(), duration);
        events.emit(Event::CraftingStarted {
            recipe_id: recipe_id.clone(),
        });
        Ok(())
    }

    /// Advance the running craft; returns the recipe if it finished this call.
    pub fn advance(
        &mut self,
        dt: f32,
        inventory: &mut Inventory,
        events: &mut EventLog,
    ) -> Option<RecipeId> {
        let finished = self.process.advance(dt)?;
        if let Some(recipe) = self.recipe(&finished) {
            credit(inventory, &recipe.result_item, recipe.result_quantity, events);
        }
        events.emit(Event::CraftingCompleted {
            recipe_id: finished.clone(),
        });
        Some(finished)
    }

    /// Stop the running craft and hand the ingredients back. No-op while idle.
    pub fn cancel(&mut self, inventory: &mut Inventory, events: &mut EventLog) {
        let Some(cancelled) = self.process.cancel() else {
            return;
        };
        if let Some(recipe) = self.recipe(&cancelled) {
            for (item_id, quantity) in &recipe.required_items {
                credit(inventory, item_id, *quantity, events);
            }
        }
        events.emit(Event::CraftingCancelled {
            recipe_id: cancelled,
        });
    }
}

/// Best-effort deposit. Whatever fits is added; the remainder is reported as
/// `InventoryOverflow` and dropped.
pub(crate) fn credit(
    inventory: &mut Inventory,
    item_id: &ItemId,
    quantity: u32,
    events: &mut EventLog,
) {
    let mut kept = quantity.min(inventory.space_for(item_id));
    if kept > 0 {
        if let Err(err) = inventory.add(item_id, kept, events) {
            debug!(%item_id, kept, %err, "credit rejected after space check");
            kept = 0;
        }
    }
    let lost = quantity - kept;
    if lost > 0 {
        warn!(%item_id, kept, lost, "inventory could not take credited items");
        events.emit(Event::InventoryOverflow {
            item_id: item_id.clone(),
            quantity: lost,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{iron_plate_recipe, item};
    use std::collections::BTreeMap;

    fn engine() -> CraftingEngine {
        CraftingEngine::new(vec![iron_plate_recipe()])
    }

    fn plate() -> RecipeId {
        RecipeId::from("recipe_iron_plate")
    }

    fn stocked_inventory(iron: u32) -> Inventory {
        let mut inventory = Inventory::new(8);
        inventory
            .add(&item("iron"), iron, &mut EventLog::default())
            .unwrap();
        inventory
    }

    #[test]
    fn plate_walkthrough() {
        let mut crafting = engine();
        let mut inventory = stocked_inventory(5);
        let mut events = EventLog::default();

        assert!(crafting.can_start(&plate(), &inventory));
        crafting.start(&plate(), &mut inventory, &mut events).unwrap();
        assert_eq!(inventory.quantity_of(&item("iron")), 3);
        assert!(crafting.is_crafting());

        assert_eq!(crafting.advance(1.5, &mut inventory, &mut events), None);
        assert!((crafting.progress() - 0.5).abs() < 1e-6);
        assert!(crafting.is_crafting());

        assert_eq!(
            crafting.advance(1.5, &mut inventory, &mut events),
            Some(plate())
        );
        assert!(!crafting.is_crafting());
        assert_eq!(inventory.quantity_of(&item("plate")), 1);
        assert!(events.events().any(|e| matches!(e, Event::CraftingCompleted { .. })));
    }

    #[test]
    fn start_requires_unlock() {
        let mut recipe = iron_plate_recipe();
        recipe.unlocked = false;
        let mut crafting = CraftingEngine::new(vec![recipe]);
        let mut inventory = stocked_inventory(5);
        let mut events = EventLog::default();

        assert_eq!(
            crafting.start(&plate(), &mut inventory, &mut events),
            Err(CraftingError::Locked(plate()))
        );
        assert!(crafting.unlock_recipe(&plate()));
        assert!(!crafting.unlock_recipe(&plate()), "second unlock is a no-op");
        assert!(crafting.start(&plate(), &mut inventory, &mut events).is_ok());
    }

    #[test]
    fn start_requires_ingredients() {
        let mut crafting = engine();
        let mut inventory = stocked_inventory(1);
        let mut events = EventLog::default();

        assert!(!crafting.can_start(&plate(), &inventory));
        assert_eq!(
            crafting.start(&plate(), &mut inventory, &mut events),
            Err(CraftingError::MissingIngredients(plate()))
        );
        assert_eq!(inventory.quantity_of(&item("iron")), 1);
        assert_eq!(events.events().count(), 0);
    }

    #[test]
    fn unknown_recipe_is_rejected() {
        let mut crafting = engine();
        let mut inventory = stocked_inventory(5);
        let ghost = RecipeId::from("recipe_ghost");

        assert_eq!(
            crafting.start(&ghost, &mut inventory, &mut EventLog::default()),
            Err(CraftingError::UnknownRecipe(ghost))
        );
    }

    #[test]
    fn only_one_craft_at_a_time() {
        let mut crafting = engine();
        let mut inventory = stocked_inventory(10);
        let mut events = EventLog::default();
        crafting.start(&plate(), &mut inventory, &mut events).unwrap();

        assert_eq!(
            crafting.start(&plate(), &mut inventory, &mut events),
            Err(CraftingError::AlreadyCrafting(plate()))
        );
        assert_eq!(inventory.quantity_of(&item("iron")), 8, "second start debits nothing");
    }

    #[test]
    fn cancel_refunds_everything() {
        let mut recipe = iron_plate_recipe();
        recipe.required_items = BTreeMap::from([(item("iron"), 2), (item("carbon"), 1)]);
        let mut crafting = CraftingEngine::new(vec![recipe]);
        let mut inventory = stocked_inventory(4);
        let mut events = EventLog::default();
        inventory.add(&item("carbon"), 1, &mut events).unwrap();

        crafting.start(&plate(), &mut inventory, &mut events).unwrap();
        assert_eq!(inventory.quantity_of(&item("carbon")), 0);
        crafting.advance(1.0, &mut inventory, &mut events);
        crafting.cancel(&mut inventory, &mut events);

        assert!(!crafting.is_crafting());
        assert_eq!(inventory.quantity_of(&item("iron")), 4);
        assert_eq!(inventory.quantity_of(&item("carbon")), 1);
        assert!(events
            .events()
            .any(|e| matches!(e, Event::CraftingCancelled { .. })));
    }

    #[test]
    fn cancel_while_idle_is_silent() {
        let mut crafting = engine();
        let mut inventory = stocked_inventory(4);
        let mut events = EventLog::default();

        crafting.cancel(&mut inventory, &mut events);

        assert_eq!(events.events().count(), 0);
        assert_eq!(inventory.quantity_of(&item("iron")), 4);
    }

    #[test]
    fn completion_into_full_inventory_reports_overflow() {
        let mut crafting = engine();
        let mut inventory = Inventory::new(1);
        let mut events = EventLog::default();
        inventory.add(&item("iron"), 3, &mut events).unwrap();

        crafting.start(&plate(), &mut inventory, &mut events).unwrap();
        crafting.advance(3.0, &mut inventory, &mut events);

        assert!(!crafting.is_crafting(), "returns to idle regardless");
        assert_eq!(inventory.quantity_of(&item("plate")), 0);
        assert!(events.events().any(|e| matches!(
            e,
            Event::InventoryOverflow { item_id, quantity: 1 } if item_id.as_str() == "plate"
        )));
        assert!(events
            .events()
            .any(|e| matches!(e, Event::CraftingCompleted { .. })));
    }

    #[test]
    fn cancel_refunds_what_fits_and_reports_the_rest() {
        let mut crafting = engine();
        let mut inventory = Inventory::new(8).with_stack_limit("iron", 10);
        let mut events = EventLog::default();
        inventory.add(&item("iron"), 10, &mut events).unwrap();

        crafting.start(&plate(), &mut inventory, &mut events).unwrap();
        inventory.add(&item("iron"), 1, &mut events).unwrap();
        assert_eq!(inventory.space_for(&item("iron")), 1);
        crafting.cancel(&mut inventory, &mut events);

        assert!(!crafting.is_crafting());
        assert_eq!(inventory.quantity_of(&item("iron")), 10);
        assert!(events.events().any(|e| matches!(
            e,
            Event::InventoryOverflow { item_id, quantity: 1 } if item_id.as_str() == "iron"
        )));
    }

    #[test]
    fn cancel_into_full_ledger_drops_refund_and_goes_idle() {
        let mut crafting = engine();
        let mut inventory = Inventory::new(1);
        let mut events = EventLog::default();
        inventory.add(&item("iron"), 2, &mut events).unwrap();

        crafting.start(&plate(), &mut inventory, &mut events).unwrap();
        inventory.add(&item("carbon"), 1, &mut events).unwrap();
        crafting.cancel(&mut inventory, &mut events);

        assert!(!crafting.is_crafting());
        assert_eq!(inventory.quantity_of(&item("iron")), 0);
        assert_eq!(inventory.quantity_of(&item("carbon")), 1);
        assert!(events.events().any(|e| matches!(
            e,
            Event::InventoryOverflow { item_id, quantity: 2 } if item_id.as_str() == "iron"
        )));
        assert!(events
            .events()
            .any(|e| matches!(e, Event::CraftingCancelled { .. })));
    }

    #[test]
    fn available_recipes_lists_unlocked_only() {
        let mut locked = iron_plate_recipe();
        locked.id = RecipeId::from("recipe_locked");
        locked.unlocked = false;
        let mut crafting = CraftingEngine::new(vec![iron_plate_recipe(), locked]);

        let ids: Vec<&str> = crafting
            .available_recipes()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["recipe_iron_plate"]);

        crafting.unlock_recipe(&RecipeId::from("recipe_locked"));
        assert_eq!(crafting.available_recipes().len(), 2);
    }
}
