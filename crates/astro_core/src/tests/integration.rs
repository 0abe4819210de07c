//! End-to-end progression: gather, craft, research, craft the unlocked part,
//! assemble and finalize.

use super::*;

#[test]
fn test_full_progression_loop() {
    let content = test_content();
    let mut state = test_state(&content);

    // Two plates, one craft at a time.
    run(
        &mut state,
        &content,
        vec![
            add_item("iron", 4),
            Command::StartCrafting {
                recipe_id: RecipeId::from("recipe_iron_plate"),
            },
        ],
        3.0,
    );
    run(
        &mut state,
        &content,
        vec![Command::StartCrafting {
            recipe_id: RecipeId::from("recipe_iron_plate"),
        }],
        3.0,
    );
    assert_eq!(state.inventory.quantity_of(&item("plate")), 2);
    assert_eq!(state.inventory.quantity_of(&item("iron")), 0);

    // Metallurgy opens the hull panel recipe.
    run(
        &mut state,
        &content,
        vec![Command::StartResearch {
            node_id: NodeId::from("research_metallurgy"),
        }],
        5.0,
    );
    let events = run(
        &mut state,
        &content,
        vec![Command::StartCrafting {
            recipe_id: RecipeId::from("recipe_hull_panel"),
        }],
        4.0,
    );
    assert!(rejections(&events).is_empty());
    assert_eq!(state.inventory.quantity_of(&item("hull_panel")), 1);
    assert_eq!(state.inventory.quantity_of(&item("plate")), 0);

    // Assemble and launch.
    run(
        &mut state,
        &content,
        vec![Command::AddModule {
            def_id: ModuleDefId::from("module_cockpit"),
            parent: None,
            slot_index: 0,
        }],
        0.0,
    );
    let root = state.assembly.root().unwrap();
    let events = run(
        &mut state,
        &content,
        vec![
            Command::AddModule {
                def_id: ModuleDefId::from("module_engine"),
                parent: Some(root),
                slot_index: 0,
            },
            Command::AddModule {
                def_id: ModuleDefId::from("module_fuel_tank"),
                parent: Some(root),
                slot_index: 1,
            },
            Command::FinalizeShip,
        ],
        0.0,
    );

    assert!(rejections(&events).is_empty());
    assert!(state.assembly.is_complete());
    assert_eq!(state.meta.tick, 6);
    let summary = state.assembly.summary();
    assert_eq!(summary.module_count, 3);
    assert_eq!(summary.crew_capacity, 2);
}

#[test]
fn test_state_round_trips_through_json() {
    let content = test_content();
    let mut state = test_state(&content);
    run(
        &mut state,
        &content,
        vec![
            add_item("iron", 4),
            Command::StartCrafting {
                recipe_id: RecipeId::from("recipe_iron_plate"),
            },
            Command::AddModule {
                def_id: ModuleDefId::from("module_cockpit"),
                parent: None,
                slot_index: 0,
            },
        ],
        1.0,
    );

    let json = serde_json::to_string(&state).unwrap();
    let mut restored: GameState = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.meta.tick, state.meta.tick);
    assert_eq!(restored.inventory.stacks(), state.inventory.stacks());
    assert_eq!(restored.assembly.root(), state.assembly.root());

    // Both copies continue identically.
    let a = run(&mut state, &content, vec![], 2.0);
    let b = run(&mut restored, &content, vec![], 2.0);
    assert_eq!(
        a.iter().map(|e| &e.event).collect::<Vec<_>>(),
        b.iter().map(|e| &e.event).collect::<Vec<_>>()
    );
    assert_eq!(restored.inventory.quantity_of(&item("plate")), 1);
}
