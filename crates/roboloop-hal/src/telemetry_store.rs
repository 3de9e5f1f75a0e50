//! [`TelemetryStore`] – the operator-facing key/value board.
//!
//! The store is an asynchronous external input: operators may flip a value
//! between any two ticks, so readers re-read every time and never cache.
//!
//! The `*_or` helpers implement the fail-safe read policy used by the control
//! core: a failed or missing read yields the caller's default and is logged,
//! never propagated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use roboloop_types::{RobotError, TelemetryValue};
use tracing::warn;

/// An operator telemetry board addressed by stable string keys.
pub trait TelemetryStore: Send {
    /// Read `key`.  `Ok(None)` means the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::Telemetry`] when the board cannot be reached.
    fn get(&self, key: &str) -> Result<Option<TelemetryValue>, RobotError>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: TelemetryValue) -> Result<(), RobotError>;

    /// Read a boolean, substituting `default` on failure, absence or a value
    /// of the wrong type.
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Ok(Some(value)) => value.as_bool().unwrap_or_else(|| {
                warn!(key, ?value, "telemetry value is not a boolean; using default");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "telemetry read failed; using default");
                default
            }
        }
    }

    /// Read a number, substituting `default` on failure, absence or a value
    /// of the wrong type.
    fn get_number_or(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Ok(Some(value)) => value.as_number().unwrap_or(default),
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "telemetry read failed; using default");
                default
            }
        }
    }

    fn put_bool(&mut self, key: &str, value: bool) -> Result<(), RobotError> {
        self.put(key, TelemetryValue::Bool(value))
    }

    fn put_number(&mut self, key: &str, value: f64) -> Result<(), RobotError> {
        self.put(key, TelemetryValue::Number(value))
    }

    fn put_text(&mut self, key: &str, value: &str) -> Result<(), RobotError> {
        self.put(key, TelemetryValue::Text(value.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryTelemetry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Board {
    values: HashMap<String, TelemetryValue>,
    offline: bool,
}

/// In-process telemetry board.
///
/// Clones share the same underlying board, so an operator console (or a
/// test) can hold one handle while the control core owns another.
///
/// # Example
///
/// ```
/// use roboloop_hal::{MemoryTelemetry, TelemetryStore};
///
/// let mut board = MemoryTelemetry::new();
/// let operator = board.clone();
///
/// board.put_bool("Compressor Brownout Shutoff", false).unwrap();
/// operator.set_bool("Compressor Brownout Shutoff", true);
///
/// assert!(board.get_bool_or("Compressor Brownout Shutoff", false));
/// ```
#[derive(Clone, Default)]
pub struct MemoryTelemetry {
    board: Arc<Mutex<Board>>,
}

impl MemoryTelemetry {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator-side write that cannot fail.  The operator's widget is local,
    /// so the value lands even while the board is offline and becomes
    /// visible to the robot once the link is back.
    pub fn set_bool(&self, key: &str, value: bool) {
        if let Ok(mut board) = self.board.lock() {
            board
                .values
                .insert(key.to_string(), TelemetryValue::Bool(value));
        }
    }

    /// Simulate losing (or regaining) the link to the board.  While offline
    /// every [`TelemetryStore`] call returns [`RobotError::Telemetry`].
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut board) = self.board.lock() {
            board.offline = offline;
        }
    }

    /// Snapshot of every key currently on the board, sorted by key.
    pub fn entries(&self) -> Vec<(String, TelemetryValue)> {
        let mut entries: Vec<_> = match self.board.lock() {
            Ok(board) => board
                .values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Err(_) => Vec::new(),
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl TelemetryStore for MemoryTelemetry {
    fn get(&self, key: &str) -> Result<Option<TelemetryValue>, RobotError> {
        let board = self.board.lock().map_err(|_| unreachable_board(key))?;
        if board.offline {
            return Err(unreachable_board(key));
        }
        Ok(board.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: TelemetryValue) -> Result<(), RobotError> {
        let mut board = self.board.lock().map_err(|_| unreachable_board(key))?;
        if board.offline {
            return Err(unreachable_board(key));
        }
        board.values.insert(key.to_string(), value);
        Ok(())
    }
}

fn unreachable_board(key: &str) -> RobotError {
    RobotError::Telemetry {
        key: key.to_string(),
        details: "telemetry board unreachable".to_string(),
    }
}
