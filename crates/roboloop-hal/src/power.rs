//! Power-bus health collaborator.

/// Reports whether the power bus is currently browning out.
///
/// Sampled once per tick; the value is ephemeral and never cached by the
/// control core.
pub trait PowerMonitor: Send {
    fn is_browned_out(&self) -> bool;
}
