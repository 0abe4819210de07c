//! Resource ledger: one stack per item id, bounded by a slot count.
//!
//! Stacks never sit at zero; a stack drained by `remove` is deleted. An
//! `add` that would push a stack past its limit is rejected whole, so callers
//! can rely on every accepted unit being accounted for.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::EventLog;
use crate::{Event, GameContent, ItemId, DEFAULT_INVENTORY_MAX_SLOTS, DEFAULT_MAX_STACK_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub quantity: u32,
    pub max_stack_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("item id is empty")]
    EmptyItemId,
    #[error("quantity must be greater than zero")]
    ZeroQuantity,
    #[error("no '{0}' in inventory")]
    NotFound(ItemId),
    #[error("need {requested} '{item_id}' but only {held} held")]
    Insufficient {
        item_id: ItemId,
        held: u32,
        requested: u32,
    },
    #[error("'{item_id}' stack holds {held}/{max}, cannot take {requested} more")]
    StackFull {
        item_id: ItemId,
        held: u32,
        max: u32,
        requested: u32,
    },
    #[error("all {max_slots} inventory slots are in use")]
    NoFreeSlot { max_slots: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    max_slots: usize,
    default_max_stack_size: u32,
    /// Per-item overrides of `default_max_stack_size`.
    stack_limits: BTreeMap<ItemId, u32>,
    stacks: Vec<ItemStack>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_MAX_SLOTS)
    }
}

impl Inventory {
    pub fn new(max_slots: usize) -> Self {
        Self {
            max_slots,
            default_max_stack_size: DEFAULT_MAX_STACK_SIZE,
            stack_limits: BTreeMap::new(),
            stacks: Vec::new(),
        }
    }

    /// Empty inventory sized by `constants` with stack limits from the item table.
    pub fn from_content(content: &GameContent) -> Self {
        Self {
            max_slots: content.constants.inventory_max_slots,
            default_max_stack_size: content.constants.default_max_stack_size,
            stack_limits: content
                .items
                .iter()
                .map(|item| (item.id.clone(), item.max_stack_size))
                .collect(),
            stacks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_stack_limit(mut self, item_id: impl Into<ItemId>, max_stack_size: u32) -> Self {
        self.stack_limits.insert(item_id.into(), max_stack_size);
        self
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn free_slots(&self) -> usize {
        self.max_slots.saturating_sub(self.stacks.len())
    }

    /// Stacks in the order they were first created.
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Limit a freshly opened stack of `item_id` would get.
    pub fn stack_limit(&self, item_id: &ItemId) -> u32 {
        self.stack_limits
            .get(item_id)
            .copied()
            .unwrap_or(self.default_max_stack_size)
    }

    pub fn quantity_of(&self, item_id: &ItemId) -> u32 {
        self.find(item_id).map_or(0, |stack| stack.quantity)
    }

    pub fn has(&self, item_id: &ItemId, quantity: u32) -> bool {
        self.quantity_of(item_id) >= quantity
    }

    pub fn has_all(&self, requirements: &BTreeMap<ItemId, u32>) -> bool {
        requirements
            .iter()
            .all(|(item_id, quantity)| self.has(item_id, *quantity))
    }

    /// Largest quantity of `item_id` a single `add` would currently accept.
    pub fn space_for(&self, item_id: &ItemId) -> u32 {
        match self.find(item_id) {
            Some(stack) => stack.max_stack_size.saturating_sub(stack.quantity),
            None if self.stacks.len() < self.max_slots => self.stack_limit(item_id),
            None => 0,
        }
    }

    pub fn add(
        &mut self,
        item_id: &ItemId,
        quantity: u32,
        events: &mut EventLog,
    ) -> Result<(), InventoryError> {
        if item_id.is_empty() {
            return Err(InventoryError::EmptyItemId);
        }
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }

        if let Some(stack) = self.find_mut(item_id) {
            let room = stack.max_stack_size.saturating_sub(stack.quantity);
            if quantity > room {
                return Err(InventoryError::StackFull {
                    item_id: item_id.clone(),
                    held: stack.quantity,
                    max: stack.max_stack_size,
                    requested: quantity,
                });
            }
            stack.quantity += quantity;
        } else {
            if self.stacks.len() >= self.max_slots {
                return Err(InventoryError::NoFreeSlot {
                    max_slots: self.max_slots,
                });
            }
            let max_stack_size = self.stack_limit(item_id);
            if quantity > max_stack_size {
                return Err(InventoryError::StackFull {
                    item_id: item_id.clone(),
                    held: 0,
                    max: max_stack_size,
                    requested: quantity,
                });
            }
            self.stacks.push(ItemStack {
                item_id: item_id.clone(),
                quantity,
                max_stack_size,
            });
        }

        events.emit(Event::InventoryChanged);
        Ok(())
    }

    pub fn remove(
        &mut self,
        item_id: &ItemId,
        quantity: u32,
        events: &mut EventLog,
    ) -> Result<(), InventoryError> {
        if item_id.is_empty() {
            return Err(InventoryError::EmptyItemId);
        }
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let Some(pos) = self.stacks.iter().position(|s| &s.item_id == item_id) else {
            return Err(InventoryError::NotFound(item_id.clone()));
        };

        let stack = &mut self.stacks[pos];
        if stack.quantity < quantity {
            return Err(InventoryError::Insufficient {
                item_id: item_id.clone(),
                held: stack.quantity,
                requested: quantity,
            });
        }
        stack.quantity -= quantity;
        if stack.quantity == 0 {
            self.stacks.remove(pos);
        }

        events.emit(Event::InventoryChanged);
        Ok(())
    }

    pub fn clear(&mut self, events: &mut EventLog) {
        self.stacks.clear();
        events.emit(Event::InventoryChanged);
    }

    fn find(&self, item_id: &ItemId) -> Option<&ItemStack> {
        self.stacks.iter().find(|s| &s.item_id == item_id)
    }

    fn find_mut(&mut self, item_id: &ItemId) -> Option<&mut ItemStack> {
        self.stacks.iter_mut().find(|s| &s.item_id == item_id)
    }
}
