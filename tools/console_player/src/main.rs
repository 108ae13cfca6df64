//! Play the defense game in a terminal. The match ticks in real time on a
//! background task while commands are read from stdin.

use clap::Parser;
use sim_defense::{DefenseAction, DefenseConfig, DefenseEvent, DefenseGame, DefenseObservation, RulesetKind};
use sim_host::MatchHost;
use sim_server::{spawn_tick_loop, EventCursor, MatchHandle, ServerConfig, SessionToken, SubmitError};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  place <x> <y>     build a tower, or select the one already there
  upgrade           upgrade the selected tower
  upgrade <x> <y>   upgrade the tower at a cell
  auto              spend money on upgrades across all towers
  pause             pause or resume
  restart           start over with a fresh base
  deselect          clear the selection
  status            print the HUD
  help              show this text
  quit              leave";

#[derive(Parser, Debug)]
#[command(name = "console-player")]
#[command(about = "Play the defense game from the terminal")]
struct Args {
    /// RNG seed of the first match; each new match adds one
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// JSON config file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    ruleset: Option<RulesetKind>,

    /// Simulation rate in ticks per second
    #[arg(long)]
    tick_hz: Option<u32>,

    /// Name shown in the welcome message
    #[arg(long)]
    commander: Option<String>,

    /// Also print spawns and individual shots
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum Command {
    Play(DefenseAction),
    Status,
    Help,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ParseCommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    BadNumber(String),
}

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCommandError::Empty => write!(f, "empty command"),
            ParseCommandError::Unknown(word) => write!(f, "unknown command '{word}' (try 'help')"),
            ParseCommandError::MissingArgument(name) => write!(f, "missing argument <{name}>"),
            ParseCommandError::BadNumber(text) => write!(f, "'{text}' is not a cell coordinate"),
        }
    }
}

impl std::error::Error for ParseCommandError {}

fn parse_coord<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<i32, ParseCommandError> {
    let word = words.next().ok_or(ParseCommandError::MissingArgument(name))?;
    word.parse()
        .map_err(|_| ParseCommandError::BadNumber(word.to_string()))
}

fn parse_command(line: &str) -> Result<Command, ParseCommandError> {
    let mut words = line.split_whitespace();
    let head = words.next().ok_or(ParseCommandError::Empty)?;

    let command = match head.to_ascii_lowercase().as_str() {
        "place" | "p" => {
            let x = parse_coord(&mut words, "x")?;
            let y = parse_coord(&mut words, "y")?;
            Command::Play(DefenseAction::ClickCell { x, y })
        }
        "upgrade" | "u" => match words.next() {
            None => Command::Play(DefenseAction::UpgradeSelected),
            Some(first) => {
                let x = first
                    .parse()
                    .map_err(|_| ParseCommandError::BadNumber(first.to_string()))?;
                let y = parse_coord(&mut words, "y")?;
                Command::Play(DefenseAction::UpgradeAt { x, y })
            }
        },
        "auto" | "a" => Command::Play(DefenseAction::AutoUpgrade),
        "pause" | "space" => Command::Play(DefenseAction::TogglePause),
        "restart" | "r" => Command::Play(DefenseAction::Restart),
        "deselect" | "esc" => Command::Play(DefenseAction::Deselect),
        "status" | "s" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseCommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// One live match and the player's seat in it.
struct Session {
    handle: MatchHandle<DefenseGame>,
    token: SessionToken,
    cursor: EventCursor,
    seed: u64,
}

impl Session {
    async fn start(config: DefenseConfig, seed: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let tick_hz = config.tick_hz;
        let host = MatchHost::<DefenseGame>::new(config, seed, tick_hz);
        let handle = MatchHandle::new(host, &ServerConfig::default());
        let (token, _) = handle.join_player().await?;
        spawn_tick_loop(handle.clone());
        tracing::info!(seed, "match started");
        Ok(Self {
            handle,
            token,
            cursor: EventCursor::default(),
            seed,
        })
    }

    async fn drain_events(&mut self, verbose: bool) {
        match self.handle.poll_events(self.token, self.cursor).await {
            Ok((events, cursor)) => {
                self.cursor = cursor;
                for e in events {
                    print_event(e.tick, &e.event, verbose);
                }
            }
            Err(e) => tracing::warn!("failed to poll events: {e}"),
        }
    }
}

fn print_event(tick: u64, event: &DefenseEvent, verbose: bool) {
    let line = match event {
        DefenseEvent::EnemySpawned { slot, health } if verbose => format!("enemy {slot} spawned ({health} HP)"),
        DefenseEvent::TowerFired { tower, enemy, damage, critical } if verbose => {
            let crit = if *critical { " CRIT" } else { "" };
            format!("tower {tower} hit enemy {enemy} for {damage}{crit}")
        }
        DefenseEvent::EnemyKilled { slot, tower, bounty } => {
            format!("enemy {slot} destroyed by tower {tower} (+${bounty})")
        }
        DefenseEvent::BaseBreached { damage, base_health, .. } => {
            format!("BREACH -{damage} HP, base at {base_health}")
        }
        DefenseEvent::WaveAdvanced { wave, bonus } => format!("wave {wave} incoming, bonus ${bonus}"),
        DefenseEvent::TowerPlaced { slot, cell, kind, cost } => {
            format!("tower {slot} ({kind}) at ({}, {}) for ${cost}", cell.x, cell.y)
        }
        DefenseEvent::BuildRefused { cell, reason } => {
            format!("cannot build at ({}, {}): {reason:?}", cell.x, cell.y)
        }
        DefenseEvent::TowerSelected { slot } => format!("tower {slot} selected"),
        DefenseEvent::TowerUpgraded { slot, level, cost } => {
            format!("tower {slot} upgraded to level {level} for ${cost}")
        }
        DefenseEvent::UpgradeRefused { slot, reason } => format!("tower {slot} not upgraded: {reason:?}"),
        DefenseEvent::AutoUpgraded { upgrades, spent } => format!("auto-upgrade: {upgrades} towers, ${spent}"),
        DefenseEvent::PauseToggled { paused } => {
            if *paused {
                "paused".to_string()
            } else {
                "resumed".to_string()
            }
        }
        DefenseEvent::Restarted => "match restarted".to_string(),
        DefenseEvent::GameOver { wave, score } => {
            format!("GAME OVER at wave {wave}, score {score} (type 'restart' to play again)")
        }
        DefenseEvent::Victory { wave, score } => format!("VICTORY at wave {wave}, score {score}"),
        _ => return,
    };
    println!("[{tick:>6}] {line}");
}

fn print_status(obs: &DefenseObservation) {
    println!(
        "{} | wave {} | ${} | base {} HP | score {} | kills {}{}{}",
        obs.commander,
        obs.wave,
        obs.money,
        obs.base_health,
        obs.score,
        obs.total_kills,
        if obs.paused { " | PAUSED" } else { "" },
        if obs.base_in_danger { " | DANGER" } else { "" },
    );
    if let Some(message) = &obs.message {
        println!("  >> {message}");
    }
    println!(
        "  radar: {} enemies, {} close, {} HP total, nearest {}, strongest {}",
        obs.radar.total,
        obs.radar.close,
        obs.radar.total_health,
        obs.radar
            .nearest
            .map_or_else(|| "-".to_string(), |d| format!("{d:.1}")),
        obs.radar
            .strongest
            .map_or_else(|| "-".to_string(), |h| h.to_string()),
    );
    println!(
        "  shop: tower ${} | tier {} | discount {}%{}{}",
        obs.tower_cost,
        obs.shop.tier.label(),
        obs.shop.discount,
        if obs.shop.vip { " | VIP" } else { "" },
        if obs.shop.weekend { " | WEEKEND" } else { "" },
    );
    println!(
        "  command: rank {} | fleet dmg {} | daily bonus ${} | waves to mass attack {}",
        obs.command
            .rank
            .map_or_else(|| "-".to_string(), |r| r.to_string()),
        obs.command.fleet_damage,
        obs.command.daily_bonus,
        obs.command.waves_to_mass_attack,
    );
    for tower in &obs.towers {
        println!(
            "  tower {} {} at ({}, {}) lv{} kills {} range {:.1}",
            tower.slot, tower.kind, tower.cell.x, tower.cell.y, tower.level, tower.kills, tower.range
        );
    }
    if let Some(sel) = &obs.selection {
        let state = if sel.max_level {
            "MAX".to_string()
        } else {
            format!("next ${}{}", sel.upgrade_cost, if sel.can_upgrade { "" } else { " (can't)" })
        };
        println!("  selected: tower {} lv{} {state}", sel.slot, sel.level);
    }
}

fn load_config(args: &Args) -> Result<DefenseConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DefenseConfig::from_json_file(path)?,
        None => DefenseConfig::default(),
    };
    if let Some(ruleset) = args.ruleset {
        config.ruleset = ruleset;
    }
    if let Some(tick_hz) = args.tick_hz {
        config.tick_hz = tick_hz;
    }
    if args.commander.is_some() {
        config.commander = args.commander.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    println!("{HELP}\n");
    let mut session = Session::start(config.clone(), args.seed).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            _ = poll.tick() => {
                session.drain_events(args.verbose).await;
                if session.handle.status().await.is_over() {
                    if let Ok(obs) = session.handle.observe(session.token).await {
                        print_status(&obs);
                    }
                    println!("match over ({}), starting a new one", session.handle.status().await);
                    session = Session::start(config.clone(), session.seed + 1).await?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Play(action)) => match session.handle.submit_now(session.token, action).await {
                        Ok(_) => {}
                        Err(SubmitError::MatchOver(_)) => println!("match is over, a new one starts shortly"),
                        Err(e) => println!("error: {e}"),
                    },
                    Ok(Command::Status) => {
                        let obs = session.handle.observe(session.token).await?;
                        print_status(&obs);
                    }
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("error: {e}"),
                }
            }
        }
    }

    session.handle.terminate().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!(
            parse_command("place 3 4"),
            Ok(Command::Play(DefenseAction::ClickCell { x: 3, y: 4 }))
        );
        assert_eq!(parse_command("upgrade"), Ok(Command::Play(DefenseAction::UpgradeSelected)));
        assert_eq!(
            parse_command("  U 2 -1 "),
            Ok(Command::Play(DefenseAction::UpgradeAt { x: 2, y: -1 }))
        );
        assert_eq!(parse_command("auto"), Ok(Command::Play(DefenseAction::AutoUpgrade)));
        assert_eq!(parse_command("pause"), Ok(Command::Play(DefenseAction::TogglePause)));
        assert_eq!(parse_command("restart"), Ok(Command::Play(DefenseAction::Restart)));
        assert_eq!(parse_command("esc"), Ok(Command::Play(DefenseAction::Deselect)));
        assert_eq!(parse_command("status"), Ok(Command::Status));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(parse_command("   "), Err(ParseCommandError::Empty));
        assert_eq!(parse_command("build 1 2"), Err(ParseCommandError::Unknown("build".into())));
        assert_eq!(parse_command("place 1"), Err(ParseCommandError::MissingArgument("y")));
        assert_eq!(parse_command("place x 1"), Err(ParseCommandError::BadNumber("x".into())));
        assert_eq!(parse_command("upgrade 1 two"), Err(ParseCommandError::BadNumber("two".into())));
    }

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(
            ParseCommandError::MissingArgument("x").to_string(),
            "missing argument <x>"
        );
        assert!(ParseCommandError::Unknown("fly".into())
            .to_string()
            .contains("try 'help'"));
    }
}
