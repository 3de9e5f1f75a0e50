//! `roboloop` – simulated execution host for the robot control loop.
//!
//! This binary stands in for the real-time host on a robot controller.  It:
//!
//! 1. Loads `~/.roboloop/config.toml`, writing defaults on first run.
//! 2. Builds a simulated hardware context and boots the lifecycle.  A boot
//!    failure is fatal and exits with status 1.
//! 3. Runs the supervisory tick on a `tokio` interval at the configured
//!    period, while the operator console (slash-command REPL) runs on the
//!    main thread.  Both share one mutex so a mode change never lands
//!    mid-tick.
//! 4. On `/quit` or **Ctrl-C**, delivers a final transition to Disabled so
//!    every routine releases its actuators, flushes pending spans, then
//!    exits.

mod config;
mod repl;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use roboloop_hal::sim::SimHardware;
use roboloop_runtime::{RobotLifecycle, TracerProviderGuard, init_tracing};
use roboloop_types::Mode;

fn main() -> ExitCode {
    // Shared with the Ctrl-C handler, which exits without running destructors.
    let spans = Arc::new(Mutex::new(init_tracing("roboloop")));

    print_banner();

    let cfg = load_config();
    let lifecycle_cfg = cfg.to_lifecycle();
    let period = lifecycle_cfg.tick_period;

    let sim = SimHardware::new();
    let mut robot = RobotLifecycle::new(lifecycle_cfg, sim.build());
    if let Err(e) = robot.on_boot() {
        eprintln!("{} {}", "✗ Boot failed:".red().bold(), e);
        return ExitCode::FAILURE;
    }
    println!(
        "  {} Robot booted; ticking every {} ms.",
        "✓".green().bold(),
        period.as_millis()
    );

    let robot = Arc::new(Mutex::new(robot));
    let shutdown = Arc::new(AtomicBool::new(false));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // The REPL may be blocked on stdin, so the handler releases the robot
    // itself, flushes spans and exits.
    {
        let robot = Arc::clone(&robot);
        let shutdown = Arc::clone(&shutdown);
        let spans = Arc::clone(&spans);
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "⚠  Ctrl-C received – disabling robot …".yellow().bold());
            shutdown.store(true, Ordering::SeqCst);
            disable(&robot);
            flush_tracing(&spans);
            std::process::exit(0);
        }) {
            warn!(error = %e, "Failed to install Ctrl-C handler");
        }
    }

    // ── Fixed-rate host ───────────────────────────────────────────────────
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the tick runtime");
            disable(&robot);
            flush_tracing(&spans);
            return ExitCode::FAILURE;
        }
    };
    runtime.spawn(tick_loop(Arc::clone(&robot), period, Arc::clone(&shutdown)));

    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Operator console ──────────────────────────────────────────────────
    let console = repl::Console {
        robot: &robot,
        sim: &sim,
    };
    repl::run(&console, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    disable(&robot);
    runtime.shutdown_timeout(Duration::from_millis(200));
    // The handler's clone keeps the guard alive, so drop alone would not flush.
    flush_tracing(&spans);
    ExitCode::SUCCESS
}

/// Call `on_tick` once per `period` until `shutdown` is set.
async fn tick_loop(robot: Arc<Mutex<RobotLifecycle>>, period: Duration, shutdown: Arc<AtomicBool>) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while !shutdown.load(Ordering::SeqCst) {
        interval.tick().await;
        match robot.lock() {
            Ok(mut robot) => {
                robot.on_tick();
            }
            Err(_) => {
                error!("robot state poisoned; stopping the tick loop");
                break;
            }
        }
    }
    info!("tick loop stopped");
}

/// Deliver a final transition to Disabled.
fn disable(robot: &Mutex<RobotLifecycle>) {
    match robot.lock() {
        Ok(mut robot) => {
            let mode = robot.mode();
            robot.on_mode_change(mode, Mode::Disabled);
        }
        Err(_) => error!("robot state poisoned; could not disable"),
    }
}

/// Flush pending spans.  Safe to call more than once.
fn flush_tracing(guard: &Mutex<TracerProviderGuard>) {
    match guard.lock() {
        Ok(mut guard) => guard.shutdown(),
        Err(poisoned) => poisoned.into_inner().shutdown(),
    }
}

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  No configuration found; defaults written to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___       __        __              "#.bold().cyan());
    println!("{}", r#"  / _ \___  / /  ___  / /  ___  ___  ___ "#.bold().cyan());
    println!("{}", r#" / , _/ _ \/ _ \/ _ \/ /__/ _ \/ _ \/ _ \"#.bold().cyan());
    println!("{}", r#"/_/|_|\___/_.__/\___/____/\___/\___/ .__/"#.bold().cyan());
    println!("{}", r#"                                  /_/    "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "roboloop".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Robot mode arbitration and brownout interlock host");
    println!();
}
