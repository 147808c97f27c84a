mod pixels_graphics;
mod silent;
mod winit_input;

pub use pixels_graphics::PixelsGraphics;
pub use silent::{BuiltinText, SilentSound};
pub use winit_input::WinitInput;
