mod frame;
pub mod msg;
pub mod specs;

pub use frame::{FRAME_HEADER_SIZE, MAP_FRAME_KIND, MapFrame};
pub use msg::{Command, Reply};
