//! Headless driver for the defense game: autopilot runs, rulebook grading
//! and config dumps.

use clap::{Parser, Subcommand};
use sim_core::{ActionEnvelope, ActionId, PlayerId, Tick};
use sim_defense::{grade, DefenseAction, DefenseConfig, DefenseEvent, DefenseGame, RulesetKind};
use sim_host::MatchHost;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Cells the autopilot builds on, in order. They hug the enemy lanes.
const BUILD_PLAN: [(i32, i32); 10] = [
    (3, 5),
    (3, 4),
    (5, 6),
    (5, 3),
    (2, 7),
    (6, 4),
    (4, 5),
    (7, 6),
    (1, 3),
    (6, 7),
];

/// How often the autopilot looks at the board.
const DECISION_INTERVAL: Tick = 30;

/// Upgrades are bought once this much money sits unused and the plan is done.
const UPGRADE_RESERVE: i32 = 300;

#[derive(Parser, Debug)]
#[command(name = "headless-runner")]
#[command(about = "Run, grade and configure the defense simulation without a screen")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a match with the built-in autopilot
    Run {
        /// RNG seed for critical hits
        #[arg(long, default_value_t = 12345)]
        seed: u64,

        /// Stop after this many ticks if the match has not ended
        #[arg(long, default_value_t = 60 * 60 * 10)]
        ticks: Tick,

        /// JSON config file; missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the ruleset named in the config
        #[arg(long)]
        ruleset: Option<RulesetKind>,

        /// Override the simulation rate in ticks per second
        #[arg(long)]
        tick_hz: Option<u32>,

        /// End the match as a win once this wave is cleared
        #[arg(long)]
        victory_wave: Option<i32>,

        /// Pace ticks at the configured rate instead of running flat out
        #[arg(long, short)]
        realtime: bool,

        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Check a ruleset rule by rule
    Grade {
        #[arg(long, default_value = "reference")]
        ruleset: RulesetKind,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the default config as JSON
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Run {
            seed,
            ticks,
            config,
            ruleset,
            tick_hz,
            victory_wave,
            realtime,
            json,
        } => load_config(config, ruleset, tick_hz, victory_wave).map(|config| {
            run(config, seed, ticks, realtime, json);
            ExitCode::SUCCESS
        }),
        Command::Grade { ruleset, json } => Ok(run_grade(ruleset, json)),
        Command::Config => serde_json::to_string_pretty(&DefenseConfig::default())
            .map(|text| {
                println!("{text}");
                ExitCode::SUCCESS
            })
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(
    path: Option<PathBuf>,
    ruleset: Option<RulesetKind>,
    tick_hz: Option<u32>,
    victory_wave: Option<i32>,
) -> Result<DefenseConfig, String> {
    let mut config = match path {
        Some(path) => DefenseConfig::from_json_file(&path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => DefenseConfig::default(),
    };
    if let Some(ruleset) = ruleset {
        config.ruleset = ruleset;
    }
    if let Some(tick_hz) = tick_hz {
        config.tick_hz = tick_hz;
    }
    if victory_wave.is_some() {
        config.victory_wave = victory_wave;
    }
    // The autopilot never restarts, so a fallen base ends the run.
    config.end_on_loss = true;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn run_grade(ruleset: RulesetKind, json: bool) -> ExitCode {
    let rules = ruleset.build(None);
    let report = grade(rules.as_ref());

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{report}");
    }

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Decides what to build or upgrade from the current observation.
struct Autopilot {
    player: PlayerId,
    next_action_id: ActionId,
    next_build: usize,
}

impl Autopilot {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            next_action_id: 1,
            next_build: 0,
        }
    }

    fn decide(&mut self, host: &mut MatchHost<DefenseGame>) {
        let obs = host.observe(self.player);
        if obs.game_over || obs.paused {
            return;
        }

        let action = match BUILD_PLAN.get(self.next_build) {
            Some(&(x, y)) if obs.money >= obs.tower_cost => {
                self.next_build += 1;
                Some(DefenseAction::ClickCell { x, y })
            }
            None if obs.money >= UPGRADE_RESERVE && obs.auto_upgrade_solved => Some(DefenseAction::AutoUpgrade),
            _ => None,
        };

        if let Some(payload) = action {
            tracing::debug!(tick = host.current_tick(), ?payload, "autopilot action");
            host.submit(ActionEnvelope {
                player_id: self.player,
                action_id: self.next_action_id,
                intended_tick: host.current_tick() + 1,
                payload,
            });
            self.next_action_id += 1;
        }
    }
}

fn run(config: DefenseConfig, seed: u64, max_ticks: Tick, realtime: bool, json: bool) {
    let tick_hz = config.tick_hz;
    tracing::info!(seed, max_ticks, ruleset = ?config.ruleset, realtime, "starting headless match");

    let mut host = MatchHost::<DefenseGame>::new(config, seed, tick_hz);
    let mut pilot = Autopilot::new(host.join_player());
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1)));
    let mut last_status = Instant::now();
    let mut all_events = Vec::new();

    while host.current_tick() < max_ticks {
        let tick_start = Instant::now();

        if host.current_tick() % DECISION_INTERVAL == 0 {
            pilot.decide(&mut host);
        }

        let Some(events) = host.step_one_tick() else {
            break;
        };
        for event in &events {
            print_event(host.current_tick(), event, json);
        }
        all_events.extend(events);

        if realtime {
            if last_status.elapsed() >= Duration::from_secs(1) {
                print_status(&host);
                last_status = Instant::now();
            }
            let elapsed = tick_start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
        }
    }

    println!("=== Defense Simulation Complete ===");
    println!("Outcome: {:?}", host.is_terminal());
    println!("Final tick: {}", host.current_tick());
    print_status(&host);
    print_event_summary(&all_events);
}

fn print_event(tick: Tick, event: &DefenseEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{{\"tick\":{tick},\"event\":{line}}}"),
            Err(e) => tracing::warn!("failed to serialize event: {e}"),
        }
        return;
    }

    match event {
        DefenseEvent::TowerPlaced { slot, cell, kind, cost } => {
            println!("[{tick:>6}] Tower {slot} ({kind}) placed at ({}, {}) for ${cost}", cell.x, cell.y)
        }
        DefenseEvent::EnemyKilled { slot, tower, bounty } => {
            println!("[{tick:>6}] Enemy {slot} killed by tower {tower} (+${bounty})")
        }
        DefenseEvent::BaseBreached { damage, base_health, .. } => {
            println!("[{tick:>6}] Base breached! -{damage} HP ({base_health} left)")
        }
        DefenseEvent::WaveAdvanced { wave, bonus } => {
            println!("[{tick:>6}] === Wave {wave} incoming (+${bonus}) ===")
        }
        DefenseEvent::AutoUpgraded { upgrades, spent } => {
            println!("[{tick:>6}] Auto-upgrade: {upgrades} towers for ${spent}")
        }
        DefenseEvent::BuildRefused { cell, reason } => {
            println!("[{tick:>6}] Build at ({}, {}) refused: {reason:?}", cell.x, cell.y)
        }
        DefenseEvent::GameOver { wave, score } => {
            println!("[{tick:>6}] GAME OVER at wave {wave}, score {score}")
        }
        DefenseEvent::Victory { wave, score } => println!("[{tick:>6}] VICTORY at wave {wave}, score {score}"),
        // Per-shot and per-spawn events are too chatty for the text log.
        _ => {}
    }
}

fn print_status(host: &MatchHost<DefenseGame>) {
    let obs = host.observe(0);
    let time_secs = host.current_tick() as f64 / f64::from(host.tick_hz().max(1));
    println!(
        "  [{:>6.1}s] Wave {}, Enemies: {}, Towers: {}, Money: ${}, Base: {} HP, Score: {}, Kills: {}",
        time_secs,
        obs.wave,
        obs.enemies.len(),
        obs.towers.len(),
        obs.money,
        obs.base_health,
        obs.score,
        obs.total_kills,
    );
}

fn print_event_summary(events: &[DefenseEvent]) {
    let mut spawned = 0;
    let mut killed = 0;
    let mut breaches = 0;
    let mut shots = 0;
    let mut crits = 0;
    let mut towers = 0;
    let mut upgrades: usize = 0;

    for event in events {
        match event {
            DefenseEvent::EnemySpawned { .. } => spawned += 1,
            DefenseEvent::EnemyKilled { .. } => killed += 1,
            DefenseEvent::BaseBreached { .. } => breaches += 1,
            DefenseEvent::TowerFired { critical, .. } => {
                shots += 1;
                if *critical {
                    crits += 1;
                }
            }
            DefenseEvent::TowerPlaced { .. } => towers += 1,
            DefenseEvent::TowerUpgraded { .. } => upgrades += 1,
            DefenseEvent::AutoUpgraded { upgrades: n, .. } => upgrades += *n,
            _ => {}
        }
    }

    println!("\n=== Event Summary ===");
    println!("Enemies spawned: {spawned}");
    println!("Enemies killed: {killed}");
    println!("Base breaches: {breaches}");
    println!("Shots fired: {shots} ({crits} critical)");
    println!("Towers placed: {towers}");
    println!("Tower upgrades: {upgrades}");
}
