#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    LeftCtrl,
    LeftShift,
    W,
    A,
    S,
    D,
    G,
    Q,
    Space,
    MouseLeft,
    MouseRight,
}

const KEY_COUNT: usize = 12;

impl Key {
    const fn index(self) -> usize {
        match self {
            Key::Escape => 0,
            Key::LeftCtrl => 1,
            Key::LeftShift => 2,
            Key::W => 3,
            Key::A => 4,
            Key::S => 5,
            Key::D => 6,
            Key::G => 7,
            Key::Q => 8,
            Key::Space => 9,
            Key::MouseLeft => 10,
            Key::MouseRight => 11,
        }
    }
}

/// Held keys plus the press edges seen since the last `clear_edges`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyStates {
    down: [bool; KEY_COUNT],
    pressed_edge: [bool; KEY_COUNT],
}

impl KeyStates {
    pub fn set(&mut self, key: Key, is_down: bool) {
        let index = key.index();
        if is_down && !self.down[index] {
            self.pressed_edge[index] = true;
        }
        self.down[index] = is_down;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed_edge[key.index()]
    }

    pub fn clear_edges(&mut self) {
        self.pressed_edge = [false; KEY_COUNT];
    }

    /// Drops held state without producing edges, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.down = [false; KEY_COUNT];
    }
}
