use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use image::RgbaImage;
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use tracing::{debug, info, warn};
use winit::window::{Fullscreen, Window};

use crate::app::{FrameTarget, Graphics, GraphicsError};
use crate::screenshots::screenshot_path;

/// Software frame buffer presented through `pixels`, sized to the window's
/// inner size.
pub struct PixelsGraphics {
    window: Arc<Window>,
    pixels: Option<Pixels<'static>>,
    surface_size: (u32, u32),
    vsync: bool,
    screenshots_dir: PathBuf,
    detached: Vec<u8>,
}

impl PixelsGraphics {
    pub fn new(window: Arc<Window>, vsync: bool, screenshots_dir: PathBuf) -> Self {
        Self {
            window,
            pixels: None,
            surface_size: (0, 0),
            vsync,
            screenshots_dir,
            detached: Vec::new(),
        }
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Pixels<'static>, pixels::Error> {
        let surface = SurfaceTexture::new(width, height, window);
        PixelsBuilder::new(width, height, surface)
            .enable_vsync(vsync)
            .build()
    }

    fn rebuild(&mut self, width: u32, height: u32, vsync: bool) -> Result<(), pixels::Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Some(Self::build_pixels(
            Arc::clone(&self.window),
            width,
            height,
            vsync,
        )?);
        self.surface_size = (width, height);
        Ok(())
    }

    fn follow_window_size(&mut self) {
        if self.pixels.is_none() {
            return;
        }
        let size = self.window.inner_size();
        if !surface_needs_rebuild(self.surface_size, (size.width, size.height)) {
            return;
        }
        match self.rebuild(size.width, size.height, self.vsync) {
            Ok(()) => debug!(width = size.width, height = size.height, "surface_resized"),
            Err(error) => warn!(error = %error, "surface_resize_failed"),
        }
    }
}

impl Graphics for PixelsGraphics {
    fn init(&mut self) -> Result<(), GraphicsError> {
        let size = self.window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        self.rebuild(width, height, self.vsync)
            .map_err(GraphicsError::Surface)?;
        info!(width, height, vsync = self.vsync, "graphics_ready");
        Ok(())
    }

    fn screen_size(&self) -> (u32, u32) {
        if self.pixels.is_some() {
            return self.surface_size;
        }
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn window_active(&self) -> bool {
        self.window.has_focus()
    }

    fn frame(&mut self) -> FrameTarget<'_> {
        self.follow_window_size();
        let (width, height) = self.surface_size;
        match self.pixels.as_mut() {
            Some(pixels) => FrameTarget {
                pixels: pixels.frame_mut(),
                width,
                height,
            },
            None => {
                self.detached.clear();
                FrameTarget {
                    pixels: &mut self.detached,
                    width: 0,
                    height: 0,
                }
            }
        }
    }

    fn swap(&mut self) -> Result<(), GraphicsError> {
        let pixels = self.pixels.as_ref().ok_or(GraphicsError::NotInitialized)?;
        pixels.render().map_err(GraphicsError::Present)
    }

    fn take_screenshot(&mut self, name: Option<&str>) -> Result<PathBuf, GraphicsError> {
        let pixels = self.pixels.as_ref().ok_or(GraphicsError::NotInitialized)?;
        let (width, height) = self.surface_size;
        let path = screenshot_path(&self.screenshots_dir, name, SystemTime::now());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| GraphicsError::ScreenshotDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let image = RgbaImage::from_raw(width, height, pixels.frame().to_vec())
            .ok_or(GraphicsError::ScreenshotBuffer { width, height })?;
        image
            .save(&path)
            .map_err(|source| GraphicsError::ScreenshotEncode {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn window_screen(&self) -> Option<usize> {
        let current = self.window.current_monitor()?;
        self.window
            .available_monitors()
            .position(|monitor| monitor == current)
    }

    fn set_window_screen(&mut self, index: usize) -> bool {
        let Some(monitor) = self.window.available_monitors().nth(index) else {
            return false;
        };
        if self.window.fullscreen().is_some() {
            self.window
                .set_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
        } else {
            self.window.set_outer_position(monitor.position());
        }
        true
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> bool {
        let mode = fullscreen.then(|| Fullscreen::Borderless(self.window.current_monitor()));
        self.window.set_fullscreen(mode);
        let applied = fullscreen_matches(fullscreen, self.window.fullscreen().as_ref());
        if !applied {
            warn!(fullscreen, "fullscreen_switch_failed");
        }
        applied
    }

    fn set_window_bordered(&mut self, bordered: bool) {
        self.window.set_decorations(bordered);
    }

    fn set_vsync(&mut self, vsync: bool) -> bool {
        if self.pixels.is_none() {
            self.vsync = vsync;
            return true;
        }
        let (width, height) = self.surface_size;
        match self.rebuild(width, height, vsync) {
            Ok(()) => {
                self.vsync = vsync;
                true
            }
            Err(error) => {
                warn!(vsync, error = %error, "vsync_switch_failed");
                false
            }
        }
    }

    fn minimize(&mut self) {
        self.window.set_minimized(true);
    }

    fn shutdown(&mut self) {
        self.pixels = None;
        self.surface_size = (0, 0);
        debug!("graphics_shutdown");
    }
}

/// A minimized window reports a zero inner size; the surface keeps its last
/// real size until the window comes back.
fn surface_needs_rebuild(surface: (u32, u32), window: (u32, u32)) -> bool {
    window.0 > 0 && window.1 > 0 && window != surface
}

fn fullscreen_matches(requested: bool, current: Option<&Fullscreen>) -> bool {
    current.is_some() == requested
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimized_window_keeps_surface() {
        assert!(!surface_needs_rebuild((1280, 720), (0, 0)));
        assert!(!surface_needs_rebuild((1280, 720), (1280, 0)));
        assert!(!surface_needs_rebuild((1280, 720), (1280, 720)));
    }

    #[test]
    fn restored_or_resized_window_rebuilds_surface() {
        assert!(surface_needs_rebuild((1280, 720), (1920, 1080)));
        assert!(surface_needs_rebuild((0, 0), (1280, 720)));
    }

    #[test]
    fn fullscreen_change_is_checked_against_window_state() {
        let borderless = Fullscreen::Borderless(None);
        assert!(fullscreen_matches(true, Some(&borderless)));
        assert!(fullscreen_matches(false, None));
        assert!(!fullscreen_matches(true, None));
        assert!(!fullscreen_matches(false, Some(&borderless)));
    }
}
