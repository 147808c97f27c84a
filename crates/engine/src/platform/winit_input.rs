use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, Window};

use crate::app::{Input, Key, KeyStates};

/// Keyboard and mouse input drained from a `winit` event loop once per
/// client iteration.
pub struct WinitInput {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    keys: KeyStates,
    cursor_delta: (f32, f32),
    relative: bool,
}

impl WinitInput {
    pub fn new(event_loop: EventLoop<()>, window: Arc<Window>) -> Self {
        Self {
            event_loop,
            window,
            keys: KeyStates::default(),
            cursor_delta: (0.0, 0.0),
            relative: false,
        }
    }
}

impl Input for WinitInput {
    fn init(&mut self) {
        self.window.request_redraw();
        info!(window_id = ?self.window.id(), "input_ready");
    }

    fn update(&mut self) -> bool {
        self.keys.clear_edges();
        self.cursor_delta = (0.0, 0.0);

        let Self {
            event_loop,
            window,
            keys,
            cursor_delta,
            ..
        } = self;
        let window_id = window.id();
        let mut quit_requested = false;

        let status = event_loop.pump_events(Some(Duration::ZERO), |event, _| match event {
            Event::WindowEvent {
                window_id: event_window,
                event,
            } if event_window == window_id => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    quit_requested = true;
                }
                WindowEvent::Focused(false) => keys.release_all(),
                WindowEvent::KeyboardInput { event, .. } => handle_key_event(keys, &event),
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(key) = key_for_mouse_button(button) {
                        keys.set(key, state == ElementState::Pressed);
                    }
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                cursor_delta.0 += delta.0 as f32;
                cursor_delta.1 += delta.1 as f32;
            }
            _ => {}
        });

        if let PumpStatus::Exit(code) = status {
            debug!(code, "event_loop_exited");
            quit_requested = true;
        }
        quit_requested
    }

    fn key_is_pressed(&self, key: Key) -> bool {
        self.keys.is_down(key)
    }

    fn key_press(&self, key: Key) -> bool {
        self.keys.was_pressed(key)
    }

    fn cursor_delta(&self) -> (f32, f32) {
        if self.relative {
            self.cursor_delta
        } else {
            (0.0, 0.0)
        }
    }

    fn mouse_mode_relative(&mut self) {
        if self.relative {
            return;
        }
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(error) = grabbed {
            warn!(error = %error, "cursor_grab_failed");
        }
        self.window.set_cursor_visible(false);
        self.relative = true;
        debug!(mode = "relative", "mouse_mode_changed");
    }

    fn mouse_mode_absolute(&mut self) {
        if !self.relative {
            return;
        }
        if let Err(error) = self.window.set_cursor_grab(CursorGrabMode::None) {
            warn!(error = %error, "cursor_release_failed");
        }
        self.window.set_cursor_visible(true);
        self.relative = false;
        debug!(mode = "absolute", "mouse_mode_changed");
    }
}

fn handle_key_event(keys: &mut KeyStates, event: &KeyEvent) {
    if let Some(key) = key_for_physical(event.physical_key) {
        keys.set(key, event.state == ElementState::Pressed);
    }
}

fn key_for_physical(key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let key = match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::ControlLeft => Key::LeftCtrl,
        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyQ => Key::Q,
        KeyCode::Space => Key::Space,
        _ => return None,
    };
    Some(key)
}

fn key_for_mouse_button(button: MouseButton) -> Option<Key> {
    match button {
        MouseButton::Left => Some(Key::MouseLeft),
        MouseButton::Right => Some(Key::MouseRight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_keys_map_to_left_variants_only() {
        assert_eq!(
            key_for_physical(PhysicalKey::Code(KeyCode::ControlLeft)),
            Some(Key::LeftCtrl)
        );
        assert_eq!(
            key_for_physical(PhysicalKey::Code(KeyCode::ShiftLeft)),
            Some(Key::LeftShift)
        );
        assert_eq!(key_for_physical(PhysicalKey::Code(KeyCode::ControlRight)), None);
        assert_eq!(key_for_physical(PhysicalKey::Code(KeyCode::ShiftRight)), None);
    }

    #[test]
    fn hotkey_letters_map() {
        for (code, key) in [
            (KeyCode::KeyQ, Key::Q),
            (KeyCode::KeyD, Key::D),
            (KeyCode::KeyG, Key::G),
            (KeyCode::Escape, Key::Escape),
        ] {
            assert_eq!(key_for_physical(PhysicalKey::Code(code)), Some(key));
        }
        assert_eq!(key_for_physical(PhysicalKey::Code(KeyCode::F3)), None);
    }

    #[test]
    fn mouse_buttons_map() {
        assert_eq!(key_for_mouse_button(MouseButton::Left), Some(Key::MouseLeft));
        assert_eq!(key_for_mouse_button(MouseButton::Right), Some(Key::MouseRight));
        assert_eq!(key_for_mouse_button(MouseButton::Middle), None);
    }
}
