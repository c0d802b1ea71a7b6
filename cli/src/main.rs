use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use barb_engine::attack::{self, AttackMode, FollowUp};
use barb_engine::damage::{self, DamageOptions};
use barb_engine::oracle::confirm_or_decline;
use barb_engine::turn::{self, Turn, TurnExit};
use barb_engine::{content, store, CombatService, Dice, FileStore, Interrupted, Oracle};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn, Level};

#[derive(Copy, Clone, ValueEnum)]
enum Mode {
    Normal,
    Reckless,
    Brutal,
}

impl From<Mode> for AttackMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Normal => AttackMode::Normal,
            Mode::Reckless => AttackMode::Reckless,
            Mode::Brutal => AttackMode::BrutalStrike,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Menu-driven combat session (default)
    Interactive {
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Write a sample character, session and settings to the config directory
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Print the character and current session resources
    Status {
        /// Dump the session state as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Roll a die several times
    Roll {
        /// Faces on the die
        #[arg(long, default_value_t = 20)]
        sides: u32,
        /// Number of rolls
        #[arg(long, default_value_t = 5)]
        rolls: u32,
        /// Reroll a first result of 1 or 2 once
        #[arg(long)]
        reroll_low: bool,
        /// Force a d20 to come up 20
        #[arg(long)]
        force_max: bool,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Roll one attack without asking whether it hit
    Attack {
        /// Attack mode
        #[arg(long, value_enum, default_value_t = Mode::Normal)]
        mode: Mode,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Roll weapon damage
    Damage {
        /// Double the weapon dice
        #[arg(long)]
        critical: bool,
        /// Add the brutal strike die (if still available this turn)
        #[arg(long)]
        brutal: bool,
        /// Reroll the weapon dice and keep the higher (if still available)
        #[arg(long)]
        savage: bool,
        /// Accept a heroic inspiration reroll if one is offered
        #[arg(long)]
        heroic: bool,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// End the current turn and restore once-per-turn features
    EndTurn,
    /// Restore rages and heroic inspiration, then reset combat
    LongRest,
    /// Back to turn 1 with rage off; rages and inspiration are kept
    ResetCombat,
}

#[derive(Parser)]
#[command(name = "barb")]
#[command(about = "Barbarian combat assistant")]
struct Cli {
    /// Directory holding character-config, session-data and settings
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

fn dice_for(seed: Option<u64>) -> Dice {
    match seed {
        Some(s) => Dice::from_seed(s),
        None => Dice::from_entropy(),
    }
}

fn open_service(dir: &Path, seed: Option<u64>) -> anyhow::Result<CombatService> {
    let loaded = store::load(dir)
        .with_context(|| format!("failed to load configuration from {}", dir.display()))?;
    Ok(CombatService::from_loaded(
        loaded,
        dice_for(seed),
        Box::new(FileStore::new(dir)),
    ))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    let dir = cli.config_dir;
    match cli.cmd.unwrap_or(Cmd::Interactive { seed: None }) {
        Cmd::Interactive { seed } => {
            let mut service = open_service(&dir, seed)?;
            let stdin = io::stdin();
            let mut oracle = TerminalOracle::new(stdin.lock());
            interactive(&mut service, &mut oracle);
        }
        Cmd::Init { force } => {
            for path in content::write_sample_config(&dir, force)? {
                println!("wrote {}", path.display());
            }
        }
        Cmd::Status { json } => {
            let service = open_service(&dir, None)?;
            if json {
                println!("{}", serde_json::to_string_pretty(service.state())?);
            } else {
                print_status(&service);
            }
        }
        Cmd::Roll {
            sides,
            rolls,
            reroll_low,
            force_max,
            seed,
        } => {
            anyhow::ensure!(sides > 0, "--sides must be at least 1");
            let mut dice = dice_for(seed);
            for _ in 0..rolls {
                println!("{}", dice.roll(sides, reroll_low, force_max));
            }
        }
        Cmd::Attack { mode, seed } => {
            let mut service = open_service(&dir, seed)?;
            let modifier = service.character().attack_modifier();
            let force_max = service.settings().always_crit();
            let mut mode = AttackMode::from(mode);
            if mode == AttackMode::BrutalStrike && !service.brutal_strike_offered() {
                warn!("brutal strike not available; attacking normally");
                mode = AttackMode::Normal;
            }
            let roll = attack::roll_attack(service.dice(), mode, modifier, force_max);
            println!("{} = {}", roll.explanation, roll.total);
            if roll.critical {
                crit_banner(&service);
            } else if roll.fumble {
                println!("natural 1");
            }
        }
        Cmd::Damage {
            critical,
            brutal,
            savage,
            heroic,
            seed,
        } => {
            let mut service = open_service(&dir, seed)?;
            let opts = DamageOptions {
                critical,
                brutal,
                savage,
            };
            let mut oracle = FixedOracle(heroic);
            let result = damage::roll_damage(&mut service, &mut oracle, opts);
            for line in damage::describe_damage(&result, opts) {
                println!("{}", line);
            }
        }
        Cmd::EndTurn => {
            let mut service = open_service(&dir, None)?;
            service.advance_turn();
            println!("turn {}", service.state().current_turn);
        }
        Cmd::LongRest => {
            let mut service = open_service(&dir, None)?;
            service.long_rest();
            println!(
                "long rest: {} rages, heroic inspiration restored",
                service.state().rages_remaining
            );
        }
        Cmd::ResetCombat => {
            let mut service = open_service(&dir, None)?;
            service.reset_combat();
            println!("combat reset to turn {}", service.state().current_turn);
        }
    }
    Ok(())
}

/// Answers every yes/no the same way; used by non-interactive commands.
struct FixedOracle(bool);

impl Oracle for FixedOracle {
    fn confirm(&mut self, _question: &str, _default: bool) -> Result<bool, Interrupted> {
        Ok(self.0)
    }

    fn choose(&mut self, _question: &str, _options: &[String]) -> Result<usize, Interrupted> {
        Err(Interrupted)
    }
}

/// Reads answers from a line-oriented input. End of input is an interruption.
struct TerminalOracle<R> {
    input: R,
}

impl<R: BufRead> TerminalOracle<R> {
    fn new(input: R) -> Self {
        Self { input }
    }

    fn read_line(&mut self) -> Result<String, Interrupted> {
        let _ = io::stdout().flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Err(Interrupted),
            Ok(_) => Ok(line.trim().to_lowercase()),
        }
    }
}

impl<R: BufRead> Oracle for TerminalOracle<R> {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, Interrupted> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{} {} ", question, hint);
            match self.read_line()?.as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("please answer y or n"),
            }
        }
    }

    fn choose(&mut self, question: &str, options: &[String]) -> Result<usize, Interrupted> {
        loop {
            println!("{}", question);
            for (i, option) in options.iter().enumerate() {
                println!("  {}) {}", i + 1, option);
            }
            print!("> ");
            let answer = self.read_line()?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => println!("pick a number from 1 to {}", options.len()),
            }
        }
    }
}

fn crit_banner(service: &CombatService) {
    if service.settings().animations_enabled() {
        println!("*** CRITICAL HIT! ***");
    } else {
        println!("critical hit");
    }
}

fn print_status(service: &CombatService) {
    let c = service.character();
    let s = service.state();
    println!(
        "{} ({} {}), {} d{}",
        c.name,
        c.display_class(),
        c.level(),
        c.weapon.name,
        c.weapon.die
    );
    println!(
        "turn {} | rage {} | rages {}/{} | heroic inspiration {}",
        s.current_turn,
        if s.rage_active { "ACTIVE" } else { "off" },
        s.rages_remaining,
        c.max_rages(),
        if s.heroic_inspiration { "yes" } else { "no" }
    );
    if c.features.brutal_strike.enabled || c.features.savage_attacks.enabled {
        println!(
            "brutal strike {} | savage attacks {}",
            if service.brutal_strike_offered() { "ready" } else { "used" },
            if service.savage_attacks_offered() { "ready" } else { "used" }
        );
    }
    if let Some(surge) = service.current_surge() {
        println!("wild magic ({}): {}", surge.roll, surge.description);
    }
    if service.settings().testing_mode.is_some() {
        println!("testing mode ON (always crit: {})", service.settings().always_crit());
    }
}

#[derive(Clone, Copy)]
enum MainItem {
    StartTurn,
    QuickAttack,
    QuickDamage,
    History,
    ClearHistory,
    Settings,
    LongRest,
    ResetCombat,
    Exit,
}

static MAIN_MENU: [(&str, MainItem); 9] = [
    ("Start turn", MainItem::StartTurn),
    ("Quick attack", MainItem::QuickAttack),
    ("Quick damage", MainItem::QuickDamage),
    ("View turn history", MainItem::History),
    ("Clear turn history", MainItem::ClearHistory),
    ("Settings", MainItem::Settings),
    ("Long rest", MainItem::LongRest),
    ("Reset combat", MainItem::ResetCombat),
    ("Exit", MainItem::Exit),
];

fn interactive(service: &mut CombatService, oracle: &mut dyn Oracle) {
    let labels: Vec<String> = MAIN_MENU.iter().map(|(l, _)| l.to_string()).collect();
    let mut turn = Turn::new();
    loop {
        println!();
        print_status(service);
        let Some((label, item)) = oracle
            .choose("What now?", &labels)
            .ok()
            .and_then(|i| MAIN_MENU.get(i))
        else {
            break;
        };
        debug!(item = %label, "main menu");
        let flow = match item {
            MainItem::StartTurn => start_turn(service, &mut turn, oracle),
            MainItem::QuickAttack => quick_attack(service, oracle),
            MainItem::QuickDamage => {
                quick_damage(service, oracle);
                Ok(())
            }
            MainItem::History => {
                print_history(service);
                Ok(())
            }
            MainItem::ClearHistory => {
                service.clear_history();
                println!("history cleared");
                Ok(())
            }
            MainItem::Settings => settings_menu(service, oracle),
            MainItem::LongRest => {
                service.long_rest();
                turn = Turn::new();
                println!("long rest complete");
                Ok(())
            }
            MainItem::ResetCombat => {
                service.reset_combat();
                turn = Turn::new();
                println!("combat reset");
                Ok(())
            }
            MainItem::Exit => break,
        };
        if flow.is_err() {
            break;
        }
    }
    println!("Farewell, {}!", service.character().name);
}

fn start_turn(
    service: &mut CombatService,
    turn: &mut Turn,
    oracle: &mut dyn Oracle,
) -> Result<(), Interrupted> {
    let animate = service.settings().animations_enabled();
    let result = turn::run_turn(service, turn, oracle, |line| {
        if animate && line.contains("CRIT!") {
            println!("*** CRITICAL HIT! ***");
        }
        println!("{}", line);
    });
    match result {
        Ok(TurnExit::Ended) | Ok(TurnExit::Left) => Ok(()),
        Err(barb_engine::TurnError::Interrupted(i)) => Err(i),
        Err(e) => {
            println!("{}", e);
            Ok(())
        }
    }
}

fn quick_attack(service: &mut CombatService, oracle: &mut dyn Oracle) -> Result<(), Interrupted> {
    let mode = attack::choose_mode(service, oracle)?;
    let outcome = attack::resolve_attack(service, oracle, mode, FollowUp::LogOnly);
    if outcome.critical {
        crit_banner(service);
    }
    for line in turn::describe_attack(&outcome) {
        println!("{}", line);
    }
    Ok(())
}

fn quick_damage(service: &mut CombatService, oracle: &mut dyn Oracle) {
    let mut opts = DamageOptions {
        critical: confirm_or_decline(oracle, "Critical hit?", false),
        ..DamageOptions::default()
    };
    if service.brutal_strike_offered() {
        opts.brutal = confirm_or_decline(oracle, "Add Brutal Strike damage (+1d10)?", false);
    }
    if service.savage_attacks_offered() {
        opts.savage = confirm_or_decline(
            oracle,
            "Use Savage Attacks (reroll weapon dice, keep the higher)?",
            false,
        );
    }
    let result = damage::roll_damage(service, oracle, opts);
    for line in damage::describe_damage(&result, opts) {
        println!("{}", line);
    }
}

fn print_history(service: &CombatService) {
    let history = service.history();
    if history.count() == 0 && history.current().is_none() && history.outside_turns().is_empty() {
        println!("no history yet");
        return;
    }
    for t in history.turns().iter().chain(history.current()) {
        println!(
            "Turn {} ({}) - {} damage",
            t.turn_number, t.started_at, t.total_damage
        );
        for action in &t.actions {
            println!("  {} {}", action.timestamp, action);
        }
    }
    if !history.outside_turns().is_empty() {
        println!("Outside of turns");
        for action in history.outside_turns() {
            println!("  {} {}", action.timestamp, action);
        }
    }
}

fn settings_menu(service: &mut CombatService, oracle: &mut dyn Oracle) -> Result<(), Interrupted> {
    loop {
        let s = service.settings();
        let options = vec![
            format!("Crit animations: {}", on_off(s.animations_enabled())),
            format!("Testing mode: {}", on_off(s.testing_mode.is_some())),
            format!("Always crit: {}", on_off(s.always_crit())),
            format!("Force heroic inspiration: {}", on_off(s.force_heroic_inspiration())),
            format!(
                "Heroic inspiration: {}",
                on_off(service.state().heroic_inspiration)
            ),
            "Back".to_string(),
        ];
        match oracle.choose("Settings", &options)? {
            0 => service.toggle_crit_animations(),
            1 => service.toggle_testing_mode(),
            2 => {
                let on = service.settings().always_crit();
                service.set_always_crit(!on);
            }
            3 => {
                let on = service.settings().force_heroic_inspiration();
                service.set_force_heroic_inspiration(!on);
            }
            4 => service.toggle_heroic_inspiration(),
            _ => return Ok(()),
        }
    }
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}
