mod scenario;

use anyhow::{bail, Context, Result};
use astro_core::{CommandEnvelope, Event, EventEnvelope, GameState};
use astro_world::{build_initial_state, load_content};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::{load_scenario, Scenario};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "astro_cli", about = "Astro Engineer progression and ship assembly CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the player state for a fixed number of ticks.
    Run {
        /// Ticks to run. Defaults to one past the scenario's last step.
        #[arg(long)]
        ticks: Option<u64>,
        /// Seconds of game time per tick.
        #[arg(long, default_value_t = 1.0)]
        dt: f32,
        /// Scripted command schedule (JSON).
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Load initial GameState from a JSON file instead of building a fresh one.
        #[arg(long = "state")]
        state_file: Option<PathBuf>,
        /// Write the final GameState to this JSON file.
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long, default_value = "./content")]
        content_dir: String,
        #[arg(long, default_value_t = 10)]
        print_every: u64,
        #[arg(long, default_value = "Kestrel")]
        ship_name: String,
    },
}

struct RunArgs {
    ticks: Option<u64>,
    dt: f32,
    scenario: Option<PathBuf>,
    state_file: Option<PathBuf>,
    save: Option<PathBuf>,
    content_dir: String,
    print_every: u64,
    ship_name: String,
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(args: &RunArgs) -> Result<()> {
    if !(args.dt.is_finite() && args.dt >= 0.0) {
        bail!("--dt must be a non-negative number, got {}", args.dt);
    }
    if args.print_every == 0 {
        bail!("--print-every must be > 0");
    }

    let content = load_content(&args.content_dir)?;
    let scenario = args.scenario.as_deref().map(load_scenario).transpose()?;
    let ticks = match (args.ticks, &scenario) {
        (Some(ticks), _) => ticks,
        (None, Some(scenario)) => scenario.last_tick() + 1,
        (None, None) => bail!("--ticks is required without --scenario"),
    };

    let mut state = if let Some(path) = &args.state_file {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading state file: {}", path.display()))?;
        serde_json::from_str::<GameState>(&json)
            .with_context(|| format!("parsing state file: {}", path.display()))?
    } else {
        let ship_name = scenario
            .as_ref()
            .and_then(|s| s.ship_name.as_deref())
            .unwrap_or(&args.ship_name);
        build_initial_state(&content, ship_name)
    };

    info!(
        ticks,
        dt = args.dt,
        content_version = %content.content_version,
        scenario = scenario.as_ref().map_or("none", |s| s.name.as_str()),
        "starting run"
    );
    println!("{}", "-".repeat(80));

    let start_tick = state.meta.tick;
    for _ in 0..ticks {
        let commands = scheduled_commands(&mut state, scenario.as_ref(), start_tick);
        let events = astro_core::tick(&mut state, &commands, &content, args.dt);

        for envelope in &events {
            print_notable(envelope);
        }
        if state.meta.tick % args.print_every == 0 {
            print_status(&state);
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state at tick {}:", state.meta.tick);
    print_status(&state);
    let summary = serde_json::to_string_pretty(&state.assembly.summary())
        .context("serializing ship summary")?;
    println!("{summary}");

    if let Some(path) = &args.save {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &state)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "final state saved");
    }
    Ok(())
}

/// Scenario ticks are relative to the tick the run started on.
fn scheduled_commands(
    state: &mut GameState,
    scenario: Option<&Scenario>,
    start_tick: u64,
) -> Vec<CommandEnvelope> {
    let Some(scenario) = scenario else {
        return Vec::new();
    };
    let relative_tick = state.meta.tick - start_tick;
    scenario
        .commands_at(relative_tick)
        .cloned()
        .map(|command| state.envelope(command))
        .collect()
}

fn print_notable(envelope: &EventEnvelope) {
    let tick = envelope.tick;
    match &envelope.event {
        Event::CraftingCompleted { recipe_id } => {
            println!("[tick={tick:04}] crafted {recipe_id}");
        }
        Event::ResearchCompleted { node_id } => {
            println!("*** RESEARCH COMPLETE: {node_id} at tick={tick:04} ***");
        }
        Event::RecipeUnlocked { recipe_id } => {
            println!("[tick={tick:04}] recipe unlocked: {recipe_id}");
        }
        Event::ItemUnlocked { item_id } => {
            println!("[tick={tick:04}] item unlocked: {item_id}");
        }
        Event::ModuleAdded {
            module_id,
            module_type,
            parent,
        } => {
            let parent = parent.map_or_else(|| "root".to_string(), |p| p.to_string());
            println!("[tick={tick:04}] {module_type} {module_id} attached to {parent}");
        }
        Event::ModuleRemoved { module_id } => {
            println!("[tick={tick:04}] {module_id} removed");
        }
        Event::ShipFinalized {
            total_mass,
            power_balance,
        } => {
            println!(
                "*** SHIP FINALIZED at tick={tick:04}: mass={total_mass:.0}kg \
                 power={power_balance:+.1}kW ***"
            );
        }
        Event::InventoryOverflow { item_id, quantity } => {
            warn!(%item_id, quantity, tick, "items lost to a full inventory");
        }
        Event::CommandRejected { command_id, reason } => {
            warn!(%command_id, tick, "rejected: {reason}");
        }
        _ => {}
    }
}

fn print_status(state: &GameState) {
    let crafting = state
        .crafting
        .current_recipe()
        .map_or_else(|| "idle".to_string(), |r| {
            format!("{r} {:.0}%", state.crafting.progress() * 100.0)
        });
    let research = state
        .research
        .current_node()
        .map_or_else(|| "idle".to_string(), |n| {
            format!("{n} {:.0}%", state.research.progress() * 100.0)
        });
    let stacks: Vec<String> = state
        .inventory
        .stacks()
        .iter()
        .map(|s| format!("{}x{}", s.item_id, s.quantity))
        .collect();

    println!(
        "[tick={tick:04}  t={secs:.1}s]  crafting={crafting}  research={research}  \
         modules={modules}  flyable={flyable}  free_slots={free}  inventory=[{stacks}]",
        tick = state.meta.tick,
        secs = state.meta.elapsed_secs,
        modules = state.assembly.len(),
        flyable = state.assembly.is_flyable(),
        free = state.inventory.free_slots(),
        stacks = stacks.join(", "),
    );
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            ticks,
            dt,
            scenario,
            state_file,
            save,
            content_dir,
            print_every,
            ship_name,
        } => run(&RunArgs {
            ticks,
            dt,
            scenario,
            state_file,
            save,
            content_dir,
            print_every,
            ship_name,
        }),
    }
}
