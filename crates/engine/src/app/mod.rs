mod input;
mod loop_runner;
mod rendering;
mod walker;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{PanelShake, Renderer};
pub use walker::{Facing, Walker, WALKER_HEIGHT, WALKER_WIDTH};
