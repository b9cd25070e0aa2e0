//! Filesystem side of a run: reading the source channel and writing the output

pub mod load;
pub mod publish;

pub use load::{LoadedChannel, load_channel};
pub use publish::{PublishTarget, publish};
