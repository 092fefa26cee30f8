mod poller;
mod task;

pub use poller::{Poller, TickOutcome};
pub use task::PollTask;
