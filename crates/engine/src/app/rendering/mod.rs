mod canvas;
mod frame;
mod renderer;
mod text;

pub use frame::PanelShake;
pub use renderer::Renderer;
