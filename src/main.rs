//! Skirmish - card battle client
//!
//! Terminal front end for the battle session.
//!
//! ## Usage
//!
//! ```text
//! skirmish replay <log.json> [--state <state.json>] [--no-delay]
//! skirmish play --battle <id> [--config <file>] [--record <file>]
//! ```
//!
//! `replay` plays a recorded result log without any service. `play` needs
//! the `http` feature and talks to a live battle service. Set `RUST_LOG`
//! for diagnostics.

use skirmish::{
    Animation, BattleLogEntry, BattleState, BattleStateStore, BattleView, CharacterId,
    LogAnimationPlayer, LogTarget, Notification, PlaybackConfig, PlaybackMode, Team,
};
use std::env;
use std::fs;

#[cfg(feature = "http")]
use skirmish::{
    ActionRequestClient, BattleId, BattleService, BattleSession, CardId, ClientError,
    HttpTransport, SessionConfig, SessionProgress, ThreadPacer, TurnAction,
};
#[cfg(feature = "http")]
use std::io::{self, BufRead, Write};

#[derive(Debug)]
enum Mode {
    Replay {
        log_file: String,
        state_file: Option<String>,
        no_delay: bool,
    },
    Play {
        battle: String,
        config_file: Option<String>,
        record_file: Option<String>,
    },
}

fn print_help() {
    println!("Usage:");
    println!("  skirmish replay <log.json> [--state <state.json>] [--no-delay]");
    println!("  skirmish play --battle <id> [--config <file>] [--record <file>]");
    println!();
    println!("Options:");
    println!("  --state <file>     Starting snapshot for the replay");
    println!("  --no-delay         Replay without pauses");
    println!("  --battle <id>      Battle to join");
    println!("  --config <file>    Session config (JSON)");
    println!("  --record <file>    Save every received log entry for later replay");
    println!("  --help, -h         Show this help message");
}

/// Value following the flag at `i`, or an error naming the flag.
fn flag_value(args: &[String], i: usize) -> Result<String, String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| format!("Error: {} requires a value", args[i]))
}

fn parse_args(args: &[String]) -> Result<Mode, String> {
    let Some(command) = args.get(1) else {
        return Err("Error: missing command (replay or play)".to_string());
    };

    let mut positional: Vec<String> = Vec::new();
    let mut state_file = None;
    let mut no_delay = false;
    let mut battle = None;
    let mut config_file = None;
    let mut record_file = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--state" => {
                state_file = Some(flag_value(args, i)?);
                i += 2;
            }
            "--no-delay" => {
                no_delay = true;
                i += 1;
            }
            "--battle" => {
                battle = Some(flag_value(args, i)?);
                i += 2;
            }
            "--config" => {
                config_file = Some(flag_value(args, i)?);
                i += 2;
            }
            "--record" => {
                record_file = Some(flag_value(args, i)?);
                i += 2;
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown argument: {}", other));
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    match command.as_str() {
        "replay" => {
            let log_file = positional
                .first()
                .cloned()
                .ok_or("Error: replay requires a log file")?;
            Ok(Mode::Replay {
                log_file,
                state_file,
                no_delay,
            })
        }
        "play" => Ok(Mode::Play {
            battle: battle.ok_or("Error: play requires --battle <id>")?,
            config_file,
            record_file,
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Prints animations and zone changes as text.
struct TerminalView {
    human: Team,
    last_hand: String,
    last_board: String,
}

impl TerminalView {
    fn new(human: Team) -> Self {
        Self {
            human,
            last_hand: String::new(),
            last_board: String::new(),
        }
    }
}

fn character_name(state: Option<&BattleState>, id: CharacterId) -> String {
    state
        .and_then(|s| s.find_character(id))
        .map(|(_, c)| c.name.clone())
        .unwrap_or_else(|| format!("#{}", id))
}

fn describe_targets(state: Option<&BattleState>, targets: &[LogTarget]) -> String {
    targets
        .iter()
        .map(|t| match t.after {
            Some(after) => format!("{} ({} hp)", character_name(state, t.id), after.hp),
            None => character_name(state, t.id),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn board_line(state: &BattleState) -> String {
    state
        .players
        .iter()
        .map(|p| {
            let units = p
                .characters
                .iter()
                .map(|c| format!("{} {}/{}", c.name, c.hp, c.max_hp))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", p.team, units)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn hand_line(state: &BattleState, team: Team) -> String {
    let deck = &state.player(team).deck;
    let cards = deck
        .hand_cards
        .iter()
        .map(|c| format!("[{}] {} ({})", c.id, c.card.name, c.card.cost))
        .collect::<Vec<_>>()
        .join("  ");
    format!(
        "hand: {}  | energy {} | deck {} | discard {}",
        if cards.is_empty() { "-".to_string() } else { cards },
        deck.current_energy,
        deck.deck_cards.len(),
        deck.discard_cards.len()
    )
}

impl BattleView for TerminalView {
    fn update_hand_zones(&mut self, state: &BattleState) {
        let line = hand_line(state, self.human);
        if line != self.last_hand {
            println!("  {}", line);
            self.last_hand = line;
        }
    }

    fn update_character_zones(&mut self, state: &BattleState) {
        let line = board_line(state);
        if line != self.last_board {
            println!("  {}", line);
            self.last_board = line;
        }
    }

    fn play(&mut self, animation: &Animation, state: Option<&BattleState>) {
        match animation {
            Animation::TurnBanner { team } => println!("=== {} turn ===", team),
            Animation::CardsDrawn { team, cards } => {
                println!("{} draws {} card(s)", team, cards.len())
            }
            Animation::CardStrike {
                team,
                source,
                card,
                targets,
                ..
            } => {
                let who = match source {
                    Some(id) => character_name(state, *id),
                    None => team.to_string(),
                };
                let what = card.as_ref().map_or("a card", |c| c.name.as_str());
                println!("{} plays {} -> {}", who, what, describe_targets(state, targets));
            }
            Animation::CardDiscarded { team, card } => {
                let what = card.as_ref().map_or("a card", |c| c.name.as_str());
                println!("{} discards {}", team, what);
            }
            Animation::DamageNumbers { targets } => {
                println!("  damage: {}", describe_targets(state, targets))
            }
            Animation::HealNumbers { targets } => {
                println!("  heal: {}", describe_targets(state, targets))
            }
            Animation::EffectPulse { card, targets, .. } => {
                let what = card.as_ref().map_or("effect", |c| c.name.as_str());
                println!("  {} triggers on {}", what, describe_targets(state, targets));
            }
            Animation::EnergyGauge { team } => {
                if let Some(state) = state {
                    println!("  {} energy {}", team, state.player(*team).deck.current_energy);
                }
            }
            Animation::TurnEnded { team } => println!("{} ends the turn", team),
            Animation::Victory => println!("*** battle end ***"),
            Animation::Callout { label } => println!("  ({})", label),
        }
    }

    fn notify(&mut self, notification: &Notification) {
        match notification {
            Notification::PhaseChanged(phase) => println!("-- {} --", phase),
            Notification::Error(err) => eprintln!("! {}", err),
            Notification::BattleOver(outcome) => match outcome.winner {
                Some(team) if team == self.human => println!("Victory! {} wins.", team),
                Some(team) => println!("Defeat. {} wins.", team),
                None => println!("The battle is over."),
            },
        }
    }
}

fn run_replay(log_file: &str, state_file: Option<&str>, no_delay: bool) -> Result<(), String> {
    let text = fs::read_to_string(log_file)
        .map_err(|e| format!("Failed to read {}: {}", log_file, e))?;
    let entries: Vec<BattleLogEntry> =
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse {}: {}", log_file, e))?;

    let mut store = match state_file {
        Some(path) => {
            let text =
                fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
            let state: BattleState =
                serde_json::from_str(&text).map_err(|e| format!("Failed to parse {}: {}", path, e))?;
            BattleStateStore::with_state(state).map_err(|e| format!("{}: {}", path, e))?
        }
        None => BattleStateStore::new(),
    };

    let human = store.get().map_or(Team::One, |s| s.current_player);
    let mut view = TerminalView::new(human);
    if let Some(state) = store.get() {
        view.update_all_zones(state);
    }

    let mut player = if no_delay {
        LogAnimationPlayer::immediate()
    } else {
        LogAnimationPlayer::paced(PlaybackConfig::default())
    };
    let report = player
        .process(&entries, &mut store, &mut view, PlaybackMode::Standard)
        .map_err(|e| e.to_string())?;

    println!(
        "\nReplayed {} of {} log entries.",
        report.applied,
        entries.len()
    );
    if let Some(outcome) = report.outcome {
        view.notify(&Notification::BattleOver(outcome));
    }
    Ok(())
}

/// Keeps a copy of every log entry the service returns.
#[cfg(feature = "http")]
struct Recorder<S> {
    inner: S,
    entries: Vec<BattleLogEntry>,
}

#[cfg(feature = "http")]
impl<S> Recorder<S> {
    fn keep(
        &mut self,
        result: Result<Vec<BattleLogEntry>, ClientError>,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        if let Ok(entries) = &result {
            self.entries.extend(entries.iter().cloned());
        }
        result
    }
}

#[cfg(feature = "http")]
impl<S: BattleService> BattleService for Recorder<S> {
    fn get_battle_state(&mut self, battle: &BattleId) -> Result<BattleState, ClientError> {
        self.inner.get_battle_state(battle)
    }

    fn start_turn(&mut self, battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError> {
        let result = self.inner.start_turn(battle);
        self.keep(result)
    }

    fn draw_cards(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        let result = self.inner.draw_cards(battle, action);
        self.keep(result)
    }

    fn play_card(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        let result = self.inner.play_card(battle, action);
        self.keep(result)
    }

    fn discard_card(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        let result = self.inner.discard_card(battle, action);
        self.keep(result)
    }

    fn end_turn(
        &mut self,
        battle: &BattleId,
        action: &TurnAction,
    ) -> Result<Vec<BattleLogEntry>, ClientError> {
        let result = self.inner.end_turn(battle, action);
        self.keep(result)
    }

    fn ai_turn(&mut self, battle: &BattleId) -> Result<Vec<BattleLogEntry>, ClientError> {
        let result = self.inner.ai_turn(battle);
        self.keep(result)
    }
}

#[cfg(feature = "http")]
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Hand,
    Play(CardId, CharacterId),
    Discard(CardId),
    End,
    Retry,
    Quit,
}

#[cfg(feature = "http")]
fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let number = |word: Option<&&str>, what: &str| -> Result<u32, String> {
        word.ok_or_else(|| format!("missing {}", what))?
            .parse::<u32>()
            .map_err(|_| format!("invalid {}", what))
    };
    match words.first().copied() {
        Some("hand") | Some("h") => Ok(Command::Hand),
        Some("play") | Some("p") => Ok(Command::Play(
            CardId(number(words.get(1), "card id")?),
            CharacterId(number(words.get(2), "character id")?),
        )),
        Some("discard") | Some("d") => Ok(Command::Discard(CardId(number(
            words.get(1),
            "card id",
        )?))),
        Some("end") | Some("e") => Ok(Command::End),
        Some("retry") | Some("r") => Ok(Command::Retry),
        Some("quit") | Some("q") => Ok(Command::Quit),
        Some(other) => Err(format!("unknown command: {}", other)),
        None => Err("commands: hand, play <card> <character>, discard <card>, end, retry, quit".to_string()),
    }
}

/// Service errors are already shown through the view; only local
/// rejections need printing here.
#[cfg(feature = "http")]
fn settle<T>(result: Result<T, ClientError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            if let ClientError::Validation(_) = err {
                eprintln!("! {}", err);
            }
            None
        }
    }
}

#[cfg(feature = "http")]
fn run_play(
    battle: &str,
    config_file: Option<&str>,
    record_file: Option<&str>,
) -> Result<(), String> {
    let config = match config_file {
        Some(path) => SessionConfig::load(path).map_err(|e| e.to_string())?,
        None => SessionConfig::default(),
    };
    log::info!("using battle service at {}", config.service.base_url);

    let client = ActionRequestClient::with_retry(
        HttpTransport::new(&config.service),
        config.retry.clone(),
        Box::new(ThreadPacer),
    );
    let service = Recorder {
        inner: client,
        entries: Vec::new(),
    };
    let view = TerminalView::new(config.human_team);
    let mut session = BattleSession::from_config(BattleId::new(battle), &config, service, view);

    if session.load().is_err() {
        return Err(format!("Could not load battle {}", battle));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut progress = settle(session.run());
    loop {
        if let Some(SessionProgress::BattleOver(_)) = progress {
            break;
        }

        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;
        let Some(line) = lines.next() else { break };
        let line = line.map_err(|e| e.to_string())?;

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        let next = match command {
            Command::Hand => {
                if let Some(state) = session.state() {
                    println!("{}", hand_line(state, session.human_team()));
                    println!("{}", board_line(state));
                }
                continue;
            }
            Command::Play(card, character) => {
                settle(session.play_card(card, character));
                session.run()
            }
            Command::Discard(card) => {
                settle(session.discard_card(card));
                session.run()
            }
            Command::End => {
                if !session.signal_end_turn() {
                    println!("You cannot end the turn right now.");
                }
                session.run()
            }
            Command::Retry => session.retry(),
            Command::Quit => break,
        };
        progress = settle(next);
    }

    if let Some(path) = record_file {
        let json = serde_json::to_string_pretty(&session.service().entries)
            .map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;
        println!("Recorded {} log entries to {}", session.service().entries.len(), path);
    }
    Ok(())
}

#[cfg(not(feature = "http"))]
fn run_play(
    _battle: &str,
    _config_file: Option<&str>,
    _record_file: Option<&str>,
) -> Result<(), String> {
    Err("play requires the `http` feature".to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let result = match parse_args(&args) {
        Ok(Mode::Replay {
            log_file,
            state_file,
            no_delay,
        }) => run_replay(&log_file, state_file.as_deref(), no_delay),
        Ok(Mode::Play {
            battle,
            config_file,
            record_file,
        }) => run_play(&battle, config_file.as_deref(), record_file.as_deref()),
        Err(message) => {
            eprintln!("{}", message);
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(message) = result {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}
