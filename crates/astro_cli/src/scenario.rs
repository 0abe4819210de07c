use anyhow::{bail, Context, Result};
use astro_core::Command;
use serde::Deserialize;
use std::path::Path;

/// Scripted command schedule replayed by `astro_cli run --scenario`.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub ship_name: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioStep {
    pub at_tick: u64,
    pub commands: Vec<Command>,
}

impl Scenario {
    /// Commands scheduled for `tick`, in file order.
    pub fn commands_at(&self, tick: u64) -> impl Iterator<Item = &Command> {
        self.steps
            .iter()
            .filter(move |step| step.at_tick == tick)
            .flat_map(|step| step.commands.iter())
    }

    pub fn last_tick(&self) -> u64 {
        self.steps.iter().map(|s| s.at_tick).max().unwrap_or(0)
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&json)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    if scenario.name.is_empty() {
        bail!("scenario 'name' must not be empty");
    }
    if scenario.steps.is_empty() {
        bail!("scenario 'steps' must not be empty");
    }
    if let Some(step) = scenario.steps.iter().find(|s| s.commands.is_empty()) {
        bail!("scenario step at tick {} has no commands", step.at_tick);
    }
    Ok(scenario)
}
