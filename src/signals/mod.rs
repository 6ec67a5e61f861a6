//! Signal fusion: indicator and pattern output into trade proposals.

pub mod fusion;
pub mod volume;

pub use fusion::SignalFuser;
pub use volume::{average, median};
