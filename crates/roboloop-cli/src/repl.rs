//! REPL – the operator console of the simulated robot host.
//!
//! Supported slash-commands:
//!   /help                  – show this list
//!   /disable /auto /teleop – request a mode change
//!   /brownout on|off       – simulate the power bus browning out
//!   /safety on|off         – operator toggle for the brownout interlock
//!   /drive <fwd> <turn>    – hold the driver's sticks at these values
//!   /status [json]         – mode, tick count, routine states and the dashboard
//!   /events                – recent lifecycle events
//!   /quit | /exit          – disable the robot and exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::SecondsFormat;
use roboloop_hal::sim::SimHardware;
use roboloop_runtime::RobotLifecycle;
use roboloop_types::{Mode, Motor, RoutineState, TelemetryValue, keys};

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Mode(Mode),
    Brownout(bool),
    Safety(bool),
    Drive { forward: f32, turn: f32 },
    Status { json: bool },
    Events,
    Quit,
}

impl Command {
    /// Parse one input line.  The error is the message to show the operator.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let cmd = match (head, args.as_slice()) {
            ("/help", []) => Command::Help,
            ("/disable", []) => Command::Mode(Mode::Disabled),
            ("/auto", []) => Command::Mode(Mode::Autonomous),
            ("/teleop", []) => Command::Mode(Mode::Teleop),
            ("/brownout", [arg]) => Command::Brownout(parse_switch(arg)?),
            ("/safety", [arg]) => Command::Safety(parse_switch(arg)?),
            ("/drive", [forward, turn]) => Command::Drive {
                forward: parse_axis(forward)?,
                turn: parse_axis(turn)?,
            },
            ("/status", []) => Command::Status { json: false },
            ("/status", ["json"]) => Command::Status { json: true },
            ("/events", []) => Command::Events,
            ("/quit" | "/exit", []) => Command::Quit,
            ("/brownout" | "/safety", _) => return Err(format!("usage: {head} on|off")),
            ("/drive", _) => return Err("usage: /drive <forward> <turn>".to_string()),
            _ => return Err(format!("Unknown command: '{}'", line.trim())),
        };
        Ok(cmd)
    }
}

fn parse_switch(arg: &str) -> Result<bool, String> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on|off, got '{other}'")),
    }
}

fn parse_axis(arg: &str) -> Result<f32, String> {
    let value: f32 = arg
        .parse()
        .map_err(|_| format!("'{arg}' is not a number"))?;
    if !value.is_finite() {
        return Err(format!("'{arg}' is not a finite number"));
    }
    Ok(value.clamp(-1.0, 1.0))
}

/// Everything a command handler can reach.
pub struct Console<'a> {
    pub robot: &'a Arc<Mutex<RobotLifecycle>>,
    pub sim: &'a SimHardware,
}

impl Console<'_> {
    fn robot(&self) -> Option<MutexGuard<'_, RobotLifecycle>> {
        match self.robot.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                println!("{}", "Robot state is poisoned; restart the host.".red());
                None
            }
        }
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(console: &Console<'_>, shutdown: &AtomicBool) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let mode = console.robot().map(|r| r.mode()).unwrap_or_default();
        print!("{} ", format!("roboloop[{mode}]>").bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Quit) => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(cmd) => dispatch(console, cmd),
            Err(msg) => println!(
                "{} Type {} for available commands.",
                msg.red(),
                "/help".bold()
            ),
        }
    }
}

fn dispatch(console: &Console<'_>, cmd: Command) {
    match cmd {
        Command::Help => cmd_help(),
        Command::Mode(next) => cmd_mode(console, next),
        Command::Brownout(on) => {
            console.sim.power.set_browned_out(on);
            println!("  Power bus: {}", if on { "browning out".red() } else { "healthy".green() });
        }
        Command::Safety(on) => {
            console.sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, on);
            println!("  Brownout interlock: {}", on_off(on));
        }
        Command::Drive { forward, turn } => {
            console.sim.operator.update(|c| {
                c.forward = forward;
                c.turn = turn;
            });
            println!("  Sticks held at forward {forward:+.2}, turn {turn:+.2}");
        }
        Command::Status { json } => cmd_status(console, json),
        Command::Events => cmd_events(console),
        Command::Quit => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Robot Console Commands".bold().underline());
    println!("  {}  – request a mode change", "/disable /auto /teleop".bold().cyan());
    println!("  {}        – simulate a power-bus brownout", "/brownout on|off".bold().cyan());
    println!("  {}          – operator toggle for the compressor interlock", "/safety on|off".bold().cyan());
    println!("  {}     – hold the driver sticks", "/drive <fwd> <turn>".bold().cyan());
    println!("  {}          – mode, ticks and routine states", "/status [json]".bold().cyan());
    println!("  {}                – recent lifecycle events", "/events".bold().cyan());
    println!("  {}           – disable the robot and exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_mode(console: &Console<'_>, next: Mode) {
    let Some(mut robot) = console.robot() else {
        return;
    };
    let prev = robot.mode();
    match robot.on_mode_change(prev, next) {
        Some((from, to)) => println!("  {} {} → {}", "✓".green(), from, to.to_string().bold()),
        None => println!("  Already {}.", next.to_string().yellow()),
    }
}

fn cmd_status(console: &Console<'_>, json: bool) {
    let Some(robot) = console.robot() else {
        return;
    };
    let status = robot.status();
    drop(robot);

    if json {
        match serde_json::to_string_pretty(&status) {
            Ok(text) => println!("{text}"),
            Err(e) => println!("{}: {}", "Serialization error".red(), e),
        }
        return;
    }

    let outputs = console.sim.gateway.snapshot();
    println!("{}", "Robot Status".bold().underline());
    println!("  Mode        : {}", status.mode.to_string().bold());
    println!("  Ticks       : {}", status.ticks);
    println!("  Compressor  : {}", on_off(outputs.compressor_enabled));
    println!(
        "  Drive       : left {:+.2}  right {:+.2}  ({:?})",
        outputs.motor(Motor::DriveLeft),
        outputs.motor(Motor::DriveRight),
        outputs.direction
    );
    for entry in &status.routines {
        let state = match entry.state {
            Some(RoutineState::Running) => "running".green(),
            Some(RoutineState::Cancelling) => "cancelling".yellow(),
            Some(RoutineState::Idle) => "idle".normal(),
            None => "not fitted".dimmed(),
        };
        println!("  {:<20}: {}", entry.id.name(), state);
    }

    println!("{}", "Dashboard".bold().underline());
    let board = console.sim.telemetry.entries();
    if board.is_empty() {
        println!("  {}", "No values published.".dimmed());
    }
    for (key, value) in &board {
        println!("  {:<28}: {}", key, show_value(value));
    }
}

fn show_value(value: &TelemetryValue) -> String {
    match value {
        TelemetryValue::Bool(b) => String::from(if *b { "on" } else { "off" }),
        TelemetryValue::Number(n) => format!("{n:.2}"),
        TelemetryValue::Text(s) => s.clone(),
    }
}

fn cmd_events(console: &Console<'_>) {
    let Some(robot) = console.robot() else {
        return;
    };
    let mut any = false;
    for event in robot.events() {
        any = true;
        let kind = serde_json::to_string(&event.kind).unwrap_or_else(|_| format!("{:?}", event.kind));
        println!(
            "  {}  {}",
            event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .dimmed(),
            kind
        );
    }
    if !any {
        println!("  {}", "No events recorded.".dimmed());
    }
}

fn on_off(on: bool) -> colored::ColoredString {
    if on { "on".green() } else { "off".yellow() }
}
