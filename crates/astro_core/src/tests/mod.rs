use super::*;
use crate::test_fixtures::{base_content, base_state, item};

mod integration;

// --- Shared test helpers ------------------------------------------------

fn test_content() -> GameContent {
    base_content()
}

fn test_state(content: &GameContent) -> GameState {
    base_state(content)
}

fn run(
    state: &mut GameState,
    content: &GameContent,
    commands: Vec<Command>,
    dt: f32,
) -> Vec<EventEnvelope> {
    let envelopes: Vec<CommandEnvelope> = commands.into_iter().map(|c| state.envelope(c)).collect();
    tick(state, &envelopes, content, dt)
}

fn add_item(id: &str, quantity: u32) -> Command {
    Command::AddItem {
        item_id: item(id),
        quantity,
    }
}

fn rejections(events: &[EventEnvelope]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match &e.event {
            Event::CommandRejected { reason, .. } => Some(reason.as_str()),
            _ => None,
        })
        .collect()
}

fn has_event(events: &[EventEnvelope], pred: impl Fn(&Event) -> bool) -> bool {
    events.iter().any(|e| pred(&e.event))
}
