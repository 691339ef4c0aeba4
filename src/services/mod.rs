pub mod detector;
pub mod formatter;
pub mod poller;
pub mod registry;

pub use detector::is_new;
pub use formatter::MessageFormatter;
pub use poller::{CycleOutcome, Poller, PollerPhase, PollerStatus};
pub use registry::PollerRegistry;
