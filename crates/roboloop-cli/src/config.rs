//! Configuration Vault – reads/writes `~/.roboloop/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roboloop_runtime::{DriveTuning, LifecycleConfig, RoutineToggles};

/// Which routines are fitted to this robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutinesSection {
    #[serde(default = "enabled")]
    pub teleop_drive: bool,
    #[serde(default = "enabled")]
    pub intake: bool,
    #[serde(default = "enabled")]
    pub elevator: bool,
    #[serde(default = "enabled")]
    pub compressor_shutoff: bool,
}

impl Default for RoutinesSection {
    fn default() -> Self {
        Self {
            teleop_drive: true,
            intake: true,
            elevator: true,
            compressor_shutoff: true,
        }
    }
}

/// Persisted host configuration stored in `~/.roboloop/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed tick period of the simulated host, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Seconds the compressor rests per brownout engagement.
    #[serde(default = "default_shutoff_secs")]
    pub shutoff_secs: f64,

    #[serde(default = "default_deadband")]
    pub deadband: f32,

    /// Seeded into the `Power Slider` telemetry key at boot.
    #[serde(default = "default_power_scale")]
    pub power_scale: f64,

    #[serde(default = "default_intake_speed")]
    pub intake_speed: f32,

    #[serde(default = "default_elevator_speed")]
    pub elevator_speed: f32,

    #[serde(default = "default_event_history")]
    pub event_history: usize,

    #[serde(default)]
    pub routines: RoutinesSection,
}

fn enabled() -> bool {
    true
}
fn default_tick_ms() -> u64 {
    20
}
fn default_shutoff_secs() -> f64 {
    6.0
}
fn default_deadband() -> f32 {
    0.05
}
fn default_power_scale() -> f64 {
    1.0
}
fn default_intake_speed() -> f32 {
    0.8
}
fn default_elevator_speed() -> f32 {
    0.6
}
fn default_event_history() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            shutoff_secs: default_shutoff_secs(),
            deadband: default_deadband(),
            power_scale: default_power_scale(),
            intake_speed: default_intake_speed(),
            elevator_speed: default_elevator_speed(),
            event_history: default_event_history(),
            routines: RoutinesSection::default(),
        }
    }
}

impl Config {
    /// Convert into the runtime's configuration, clamping values that would
    /// make the loop meaningless.
    pub fn to_lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            tick_period: Duration::from_millis(self.tick_ms.max(1)),
            shutoff_duration: Duration::try_from_secs_f64(self.shutoff_secs.max(0.0))
                .unwrap_or_else(|_| default_shutoff_duration()),
            routines: RoutineToggles {
                teleop_drive: self.routines.teleop_drive,
                intake: self.routines.intake,
                elevator: self.routines.elevator,
                compressor_shutoff: self.routines.compressor_shutoff,
            },
            drive: DriveTuning {
                deadband: self.deadband.clamp(0.0, 1.0),
                default_power_scale: self.power_scale.clamp(0.0, 1.0),
            },
            intake_speed: self.intake_speed,
            elevator_speed: self.elevator_speed,
            event_history: self.event_history,
        }
    }
}

fn default_shutoff_duration() -> Duration {
    LifecycleConfig::default().shutoff_duration
}

/// Return the path to `~/.roboloop/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".roboloop").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ROBOLOOP_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROBOLOOP_TICK_MS` | `tick_ms` |
/// | `ROBOLOOP_SHUTOFF_SECS` | `shutoff_secs` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(ms) = env_parse::<u64>("ROBOLOOP_TICK_MS") {
        cfg.tick_ms = ms;
    }
    if let Some(secs) = env_parse::<f64>("ROBOLOOP_SHUTOFF_SECS") {
        if secs.is_finite() && secs >= 0.0 {
            cfg.shutoff_secs = secs;
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Save the config to disk, creating `~/.roboloop/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
