/*!
 * Signals Module
 * Pending-signal flags and default dispositions
 */

mod delivery;
pub mod traits;
pub mod types;

// Re-export public API
pub use delivery::SIGNAL_PROBE;
pub use traits::SignalDelivery;
pub use types::{Signal, SignalAction, SignalError, SignalResult};
