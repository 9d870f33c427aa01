pub mod frames;
pub mod muloop;
pub mod stats;

pub use frames::{FrameSource, ImageDirSource};
pub use muloop::LoopMode;
pub use stats::FrameStats;
