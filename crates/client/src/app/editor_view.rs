use lodestar_engine::{Editor, EditorContext, FrameTarget, Key};

const GRID_SPACING_PX: u32 = 32;
const CROSSHAIR_HALF_PX: i32 = 6;
const BACKGROUND: [u8; 4] = [18, 20, 26, 255];
const GRID_MINOR: [u8; 4] = [32, 36, 46, 255];
const GRID_MAJOR: [u8; 4] = [48, 54, 70, 255];
const CURSOR_IDLE: [u8; 4] = [230, 230, 230, 255];
const CURSOR_ACTIVE: [u8; 4] = [255, 196, 64, 255];

/// Grid canvas with a relative-mouse crosshair. `Space` recenters it.
pub(crate) struct EditorView {
    cursor: (f32, f32),
    screen: (u32, u32),
}

impl EditorView {
    pub(crate) fn new() -> Self {
        Self {
            cursor: (0.0, 0.0),
            screen: (0, 0),
        }
    }

    fn recenter(&mut self) {
        self.cursor = (self.screen.0 as f32 / 2.0, self.screen.1 as f32 / 2.0);
    }

    fn move_cursor(&mut self, (dx, dy): (f32, f32)) {
        let max_x = self.screen.0.saturating_sub(1) as f32;
        let max_y = self.screen.1.saturating_sub(1) as f32;
        self.cursor.0 = (self.cursor.0 + dx).clamp(0.0, max_x);
        self.cursor.1 = (self.cursor.1 + dy).clamp(0.0, max_y);
    }
}

impl Editor for EditorView {
    fn init(&mut self, screen_size: (u32, u32)) {
        self.screen = screen_size;
        self.recenter();
    }

    fn update_and_render(&mut self, mut context: EditorContext<'_>) {
        let size = (context.target.width, context.target.height);
        if size != self.screen {
            self.screen = size;
            self.move_cursor((0.0, 0.0));
        }
        if context.input.key_press(Key::Space) {
            self.recenter();
        }
        self.move_cursor(context.input.cursor_delta());

        context.target.clear(BACKGROUND);
        draw_grid(&mut context.target);

        let color = if context.input.key_is_pressed(Key::MouseLeft) {
            CURSOR_ACTIVE
        } else {
            CURSOR_IDLE
        };
        draw_crosshair(
            &mut context.target,
            self.cursor.0 as i32,
            self.cursor.1 as i32,
            color,
        );
    }
}

fn draw_grid(target: &mut FrameTarget<'_>) {
    for y in 0..target.height {
        for x in 0..target.width {
            let on_x = x % GRID_SPACING_PX == 0;
            let on_y = y % GRID_SPACING_PX == 0;
            if !on_x && !on_y {
                continue;
            }
            let major = (on_x && x % (GRID_SPACING_PX * 4) == 0)
                || (on_y && y % (GRID_SPACING_PX * 4) == 0);
            put_pixel(target, x as i32, y as i32, if major { GRID_MAJOR } else { GRID_MINOR });
        }
    }
}

fn draw_crosshair(target: &mut FrameTarget<'_>, cx: i32, cy: i32, color: [u8; 4]) {
    for offset in -CROSSHAIR_HALF_PX..=CROSSHAIR_HALF_PX {
        put_pixel(target, cx + offset, cy, color);
        put_pixel(target, cx, cy + offset, color);
    }
}

fn put_pixel(target: &mut FrameTarget<'_>, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= target.width as i32 || y >= target.height as i32 {
        return;
    }
    let index = (y as usize * target.width as usize + x as usize) * 4;
    if let Some(pixel) = target.pixels.get_mut(index..index + 4) {
        pixel.copy_from_slice(&color);
    }
}
