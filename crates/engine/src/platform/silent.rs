use tracing::debug;

use crate::app::{Sound, SoundError, TextRender};

/// Sound device that accepts every call and plays nothing.
#[derive(Debug, Default)]
pub struct SilentSound {
    max_distance: f32,
    updates: u64,
}

impl SilentSound {
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }
}

impl Sound for SilentSound {
    fn init(&mut self) -> Result<(), SoundError> {
        debug!("sound_ready");
        Ok(())
    }

    fn set_max_distance(&mut self, distance: f32) {
        self.max_distance = distance;
    }

    fn update(&mut self) {
        self.updates = self.updates.wrapping_add(1);
    }

    fn shutdown(&mut self) {
        debug!(updates = self.updates, "sound_shutdown");
    }
}

/// Text is drawn with the built-in bitmap font at render time, so there is
/// no glyph cache to maintain between frames.
#[derive(Debug, Default)]
pub struct BuiltinText;

impl TextRender for BuiltinText {
    fn init(&mut self) {}

    fn update(&mut self) {}

    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sound_remembers_max_distance() {
        let mut sound = SilentSound::default();
        sound.init().expect("init");
        sound.set_max_distance(960.0);
        sound.update();
        assert_eq!(sound.max_distance(), 960.0);
    }
}
