pub mod queue;
pub mod state;

pub use queue::{InputEvent, InputQueue};
pub use state::{keys, InputState};
