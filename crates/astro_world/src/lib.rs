//! Content loading, validation and initial-state construction shared by
//! astro_cli and the test suites.

use anyhow::{bail, ensure, Context, Result};
use astro_core::{
    Constants, GameContent, GameState, ItemDef, ItemId, ModuleDef, NodeId, Recipe, ResearchNode,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Deserialize)]
struct ItemsFile {
    content_version: String,
    items: Vec<ItemDef>,
}

#[derive(Deserialize)]
struct RecipesFile {
    recipes: Vec<Recipe>,
}

#[derive(Deserialize)]
struct ResearchFile {
    nodes: Vec<ResearchNode>,
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let text = std::fs::read_to_string(dir.join(file)).with_context(|| format!("reading {file}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {file}"))
}

pub fn load_content(content_dir: &str) -> Result<GameContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = read_json(dir, "constants.json")?;
    let items_file: ItemsFile = read_json(dir, "items.json")?;
    let recipes_file: RecipesFile = read_json(dir, "recipes.json")?;
    let research_file: ResearchFile = read_json(dir, "research.json")?;
    let module_defs: Vec<ModuleDef> = read_json(dir, "module_defs.json")?;
    let content = GameContent {
        content_version: items_file.content_version,
        items: items_file.items,
        recipes: recipes_file.recipes,
        research_nodes: research_file.nodes,
        module_defs,
        constants,
    };
    validate_content(&content)
        .with_context(|| format!("validating content in {}", dir.display()))?;
    Ok(content)
}

/// Fresh player state for `content` with an empty ship called `ship_name`.
pub fn build_initial_state(content: &GameContent, ship_name: &str) -> GameState {
    GameState::new(content, ship_name)
}

/// Validates ranges and cross-references in loaded content.
///
/// Catches authoring mistakes like a recipe using an item nobody defined, a
/// research prereq that doesn't exist, a prerequisite cycle, or a zero
/// duration that would leave a process running forever.
pub fn validate_content(content: &GameContent) -> Result<()> {
    validate_constants(&content.constants)?;
    let item_ids = validate_items(&content.items)?;
    let recipe_ids = unique_ids("recipe", content.recipes.iter().map(|r| r.id.as_str()))?;
    for recipe in &content.recipes {
        validate_recipe(recipe, &item_ids, &content.items)?;
    }
    validate_research(&content.research_nodes, &item_ids, &recipe_ids)?;
    unique_ids("module def", content.module_defs.iter().map(|d| d.id.as_str()))?;
    for def in &content.module_defs {
        validate_module_def(def)?;
    }
    Ok(())
}

fn validate_constants(constants: &Constants) -> Result<()> {
    ensure!(
        constants.inventory_max_slots > 0,
        "constants: inventory_max_slots must be positive"
    );
    ensure!(
        constants.default_max_stack_size > 0,
        "constants: default_max_stack_size must be positive"
    );
    Ok(())
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        ensure!(!id.is_empty(), "{kind} has empty id");
        ensure!(seen.insert(id), "duplicate {kind} id '{id}'");
    }
    Ok(seen)
}

fn validate_items(items: &[ItemDef]) -> Result<HashSet<&str>> {
    let item_ids = unique_ids("item", items.iter().map(|i| i.id.as_str()))?;
    for item in items {
        ensure!(
            item.max_stack_size > 0,
            "item '{}' has zero max_stack_size",
            item.id
        );
    }
    Ok(item_ids)
}

fn validate_recipe(recipe: &Recipe, item_ids: &HashSet<&str>, items: &[ItemDef]) -> Result<()> {
    ensure!(
        recipe.crafting_secs.is_finite() && recipe.crafting_secs > 0.0,
        "recipe '{}' has non-positive crafting_secs: {}",
        recipe.id,
        recipe.crafting_secs
    );
    ensure!(
        recipe.result_quantity > 0,
        "recipe '{}' produces nothing",
        recipe.id
    );
    check_item_amounts(&format!("recipe '{}'", recipe.id), &recipe.required_items, item_ids)?;
    ensure!(
        item_ids.contains(recipe.result_item.as_str()),
        "recipe '{}' result '{}' is not a known item",
        recipe.id,
        recipe.result_item
    );
    if let Some(result) = items.iter().find(|i| i.id == recipe.result_item) {
        ensure!(
            recipe.result_quantity <= result.max_stack_size,
            "recipe '{}' yields {} '{}' but a stack holds {}",
            recipe.id,
            recipe.result_quantity,
            result.id,
            result.max_stack_size
        );
    }
    Ok(())
}

fn check_item_amounts<'a>(
    owner: &str,
    amounts: impl IntoIterator<Item = (&'a ItemId, &'a u32)>,
    item_ids: &HashSet<&str>,
) -> Result<()> {
    for (item_id, quantity) in amounts {
        ensure!(
            item_ids.contains(item_id.as_str()),
            "{owner} item '{item_id}' is not a known item"
        );
        ensure!(*quantity > 0, "{owner} asks for zero '{item_id}'");
    }
    Ok(())
}

fn validate_research(
    nodes: &[ResearchNode],
    item_ids: &HashSet<&str>,
    recipe_ids: &HashSet<&str>,
) -> Result<()> {
    let node_ids = unique_ids("research node", nodes.iter().map(|n| n.id.as_str()))?;
    for node in nodes {
        let owner = format!("research node '{}'", node.id);
        ensure!(
            node.research_secs.is_finite() && node.research_secs > 0.0,
            "{owner} has non-positive research_secs: {}",
            node.research_secs
        );
        for prereq in &node.prereqs {
            ensure!(
                node_ids.contains(prereq.as_str()),
                "{owner} prereq '{prereq}' is not a known research node"
            );
        }
        for recipe_id in &node.unlocks_recipes {
            ensure!(
                recipe_ids.contains(recipe_id.as_str()),
                "{owner} unlocks unknown recipe '{recipe_id}'"
            );
        }
        for item_id in &node.unlocks_items {
            ensure!(
                item_ids.contains(item_id.as_str()),
                "{owner} unlocks unknown item '{item_id}'"
            );
        }
        check_item_amounts(&owner, &node.required_resources, item_ids)?;
    }
    check_prereq_cycles(nodes)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first walk over prereq edges; a node met again while still on the
/// path closes a cycle.
fn check_prereq_cycles(nodes: &[ResearchNode]) -> Result<()> {
    let by_id: HashMap<&NodeId, &ResearchNode> = nodes.iter().map(|n| (&n.id, n)).collect();
    let mut marks: HashMap<&NodeId, Mark> = HashMap::new();
    let mut path = Vec::new();
    for node in nodes {
        visit(&node.id, &by_id, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit<'a>(
    id: &'a NodeId,
    by_id: &HashMap<&'a NodeId, &'a ResearchNode>,
    marks: &mut HashMap<&'a NodeId, Mark>,
    path: &mut Vec<&'a NodeId>,
) -> Result<()> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let cycle: Vec<&str> = path[start..]
                .iter()
                .map(|p| p.as_str())
                .chain(std::iter::once(id.as_str()))
                .collect();
            bail!("research prerequisite cycle: {}", cycle.join(" -> "));
        }
        None => {}
    }
    marks.insert(id, Mark::Visiting);
    path.push(id);
    if let Some(node) = by_id.get(id) {
        for prereq in &node.prereqs {
            visit(prereq, by_id, marks, path)?;
        }
    }
    path.pop();
    marks.insert(id, Mark::Done);
    Ok(())
}

fn validate_module_def(def: &ModuleDef) -> Result<()> {
    let stats = [
        ("mass_kg", def.mass_kg),
        ("power_generation_kw", def.power_generation_kw),
        ("power_consumption_kw", def.power_consumption_kw),
    ];
    for (name, value) in stats {
        ensure!(
            value.is_finite() && value >= 0.0,
            "module def '{}' has invalid {name}: {value}",
            def.id
        );
    }
    Ok(())
}
