use std::path::PathBuf;

use thiserror::Error;

use super::Key;

/// RGBA8 frame buffer for the current frame, row-major, `width * height * 4` bytes.
pub struct FrameTarget<'a> {
    pub pixels: &'a mut [u8],
    pub width: u32,
    pub height: u32,
}

impl FrameTarget<'_> {
    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }
}

#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("failed to create render surface: {0}")]
    Surface(#[source] pixels::Error),
    #[error("failed to present frame: {0}")]
    Present(#[source] pixels::Error),
    #[error("graphics backend is not initialized")]
    NotInitialized,
    #[error("failed to create screenshot directory {path}: {source}")]
    ScreenshotDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame buffer of {width}x{height} does not match its byte length")]
    ScreenshotBuffer { width: u32, height: u32 },
    #[error("failed to write screenshot {path}: {source}")]
    ScreenshotEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("no audio device available")]
    NoDevice,
    #[error("audio backend failed to start: {0}")]
    Backend(String),
}

/// Window, frame buffer and presentation.
pub trait Graphics {
    fn init(&mut self) -> Result<(), GraphicsError>;
    fn screen_size(&self) -> (u32, u32);
    fn window_active(&self) -> bool;

    /// `false` while a previous asynchronous present is still in flight.
    fn is_idle(&self) -> bool {
        true
    }

    fn frame(&mut self) -> FrameTarget<'_>;
    fn swap(&mut self) -> Result<(), GraphicsError>;

    /// Saves the last presented frame; `name` overrides the generated stem.
    fn take_screenshot(&mut self, name: Option<&str>) -> Result<PathBuf, GraphicsError>;

    fn window_screen(&self) -> Option<usize>;
    fn set_window_screen(&mut self, index: usize) -> bool;
    fn set_fullscreen(&mut self, fullscreen: bool) -> bool;
    fn set_window_bordered(&mut self, bordered: bool);
    fn set_vsync(&mut self, vsync: bool) -> bool;
    fn minimize(&mut self);
    fn shutdown(&mut self);
}

pub trait Input {
    fn init(&mut self);

    /// Drains pending OS events. Returns `true` when the OS asked the client to quit.
    fn update(&mut self) -> bool;

    fn key_is_pressed(&self, key: Key) -> bool;

    /// Pressed since the previous `update`.
    fn key_press(&self, key: Key) -> bool;

    fn cursor_delta(&self) -> (f32, f32);
    fn mouse_mode_relative(&mut self);
    fn mouse_mode_absolute(&mut self);
}

pub trait Sound {
    fn init(&mut self) -> Result<(), SoundError>;
    fn set_max_distance(&mut self, distance: f32);
    fn update(&mut self);
    fn shutdown(&mut self);
}

pub trait TextRender {
    fn init(&mut self);
    fn update(&mut self);
    fn shutdown(&mut self);
}

pub struct EditorContext<'a> {
    pub target: FrameTarget<'a>,
    pub input: &'a dyn Input,
    /// Seconds since the client started running.
    pub local_time: f64,
    pub render_frame_time: f64,
}

pub trait Editor {
    fn init(&mut self, screen_size: (u32, u32));
    fn update_and_render(&mut self, context: EditorContext<'_>);
}

/// Everything the client drives but does not own the implementation of.
pub struct Collaborators {
    pub graphics: Box<dyn Graphics>,
    pub input: Box<dyn Input>,
    pub sound: Box<dyn Sound>,
    pub text: Box<dyn TextRender>,
    pub editor: Box<dyn Editor>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_fills_every_pixel() {
        let mut pixels = vec![0u8; 3 * 2 * 4];
        let mut target = FrameTarget {
            pixels: &mut pixels,
            width: 3,
            height: 2,
        };
        target.clear([1, 2, 3, 4]);
        assert!(pixels.chunks_exact(4).all(|pixel| pixel == [1, 2, 3, 4]));
    }
}
