//! Hearthwood - Entry Point
//!
//! Runs the demo village headless for a fixed number of ticks and logs a
//! summary at the end of every simulated day.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use hearthwood::core::config::SimulationConfig;
use hearthwood::core::error::Result;
use hearthwood::llm::reasoner::{OfflineReasoner, ReasonerBackend};
use hearthwood::simulation::tick::Simulation;
use hearthwood::village;

/// Headless village simulation
#[derive(Parser, Debug)]
#[command(name = "hearthwood")]
#[command(about = "Run the Hearthwood village simulation without a frontend")]
struct Args {
    /// Simulation config (TOML). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of fixed-rate ticks to run
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,

    /// Never call the reasoning service, even if one is configured
    #[arg(long)]
    offline: bool,

    /// Sleep between ticks so one tick takes `1 / tick_rate_hz` seconds
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hearthwood=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let reasoner = if args.offline {
        config.use_ai = false;
        ReasonerBackend::Offline(OfflineReasoner)
    } else {
        ReasonerBackend::from_env()
    };
    tracing::info!(reasoner = reasoner.name(), use_ai = config.use_ai, "Hearthwood starting...");

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let dt = config.tick_dt();
    let roster = village::roster(&config);
    let mut sim = Simulation::new(reasoner, village::village_zones()?, config)?;
    for agent in roster {
        sim.add_agent(agent)?;
    }

    for _ in 0..args.ticks {
        let report = sim.tick(dt, None);
        if let Some(day) = report.finished_day {
            // Reflections for the finished day land before the next one starts
            rt.block_on(sim.settle());
            log_day(&sim, day);
        }
        if args.realtime {
            std::thread::sleep(Duration::from_secs_f32(dt));
        }
    }

    rt.block_on(sim.settle());
    tracing::info!(
        day = sim.calendar().current_day(),
        hour = sim.calendar().current_hour(),
        "Simulation finished"
    );
    Ok(())
}

fn log_day(sim: &Simulation<ReasonerBackend>, day: u32) {
    for agent in sim.agents() {
        tracing::info!(
            day,
            agent = %agent.label(),
            x = agent.position.x,
            y = agent.position.y,
            doing = %agent.plan.current_description(),
            hunger = agent.needs.hunger,
            energy = agent.needs.energy,
            memories = agent.memory.len(),
            "End of day"
        );
    }
}
