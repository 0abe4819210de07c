//! Integration test: research unlocks a recipe, the recipe feeds the next
//! research, and the whole chain is driven only through `tick`.

use astro_core::test_fixtures::{base_content, base_state, item};
use astro_core::*;

fn envelopes(state: &mut GameState, commands: Vec<Command>) -> Vec<CommandEnvelope> {
    commands.into_iter().map(|c| state.envelope(c)).collect()
}

#[test]
fn research_chain_with_resource_costs() {
    let mut content = base_content();
    content.constants.research_consumes_resources = true;
    let mut state = base_state(&content);

    let cmds = envelopes(
        &mut state,
        vec![
            Command::AddItem {
                item_id: item("iron"),
                quantity: 2,
            },
            Command::StartCrafting {
                recipe_id: RecipeId::from("recipe_iron_plate"),
            },
            Command::StartResearch {
                node_id: NodeId::from("research_metallurgy"),
            },
        ],
    );
    // Both processes run side by side.
    tick(&mut state, &cmds, &content, 3.0);
    assert_eq!(state.inventory.quantity_of(&item("plate")), 1);
    assert!(state.research.is_researching());

    let events = tick(&mut state, &[], &content, 2.0);
    assert!(events.iter().any(|e| matches!(
        &e.event,
        Event::ResearchCompleted { node_id } if node_id.as_str() == "research_metallurgy"
    )));

    // Propulsion costs the plate.
    let cmds = envelopes(
        &mut state,
        vec![Command::StartResearch {
            node_id: NodeId::from("research_propulsion"),
        }],
    );
    tick(&mut state, &cmds, &content, 8.0);
    assert_eq!(state.inventory.quantity_of(&item("plate")), 0);
    assert!(state
        .research
        .is_node_unlocked(&NodeId::from("research_propulsion")));

    let available: Vec<&str> = state
        .research
        .available_nodes()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(available, vec!["research_fuel_systems"]);
}

#[test]
fn ticks_without_commands_are_quiet() {
    let content = base_content();
    let mut state = base_state(&content);

    for _ in 0..100 {
        assert!(tick(&mut state, &[], &content, 0.016).is_empty());
    }
    assert_eq!(state.meta.tick, 100);
}
