use super::tools::{
    draw_hline, draw_line_gradient, draw_text, fill_rect, rgba_from_unit, text_width_px,
    TEXT_HEIGHT,
};
use super::FrameTarget;

pub const GRAPH_CAPACITY: usize = 128;

const BACKGROUND_COLOR: [u8; 4] = [0, 0, 0, 191];
const MIDLINE_COLOR: [u8; 4] = [242, 242, 242, 255];
const QUARTER_LINE_COLOR: [u8; 4] = [128, 128, 128, 191];
const SAMPLE_ALPHA: f32 = 0.75;
const LABEL_COLOR: [u8; 4] = [255, 255, 255, 255];
const LABEL_INSET_PX: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Circular buffer of the last `GRAPH_CAPACITY` samples with an auto-widening
/// display range.
#[derive(Debug, Clone)]
pub struct RingGraph {
    values: [f32; GRAPH_CAPACITY],
    colors: [[f32; 3]; GRAPH_CAPACITY],
    index: usize,
    min: f32,
    max: f32,
    min_range: f32,
    max_range: f32,
}

impl Default for RingGraph {
    fn default() -> Self {
        Self {
            values: [0.0; GRAPH_CAPACITY],
            colors: [[0.0; 3]; GRAPH_CAPACITY],
            index: 0,
            min: 0.0,
            max: 0.0,
            min_range: 0.0,
            max_range: 0.0,
        }
    }
}

impl RingGraph {
    pub fn new(min: f32, max: f32) -> Self {
        let mut graph = Self::default();
        graph.init(min, max);
        graph
    }

    /// Sets the fixed range and rewinds the cursor. Stored samples are kept.
    pub fn init(&mut self, min: f32, max: f32) {
        self.min_range = min;
        self.min = min;
        self.max_range = max;
        self.max = max;
        self.index = 0;
    }

    pub fn add(&mut self, value: f32, r: f32, g: f32, b: f32) {
        self.index = (self.index + 1) % GRAPH_CAPACITY;
        self.values[self.index] = value;
        self.colors[self.index] = [r, g, b];
    }

    pub fn scale(&mut self) {
        self.min = self.min_range;
        self.max = self.max_range;
        for value in self.values {
            if value > self.max {
                self.max = value;
            }
            if value < self.min {
                self.min = value;
            }
        }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fixed_range(&self) -> (f32, f32) {
        (self.min_range, self.max_range)
    }

    pub fn latest(&self) -> f32 {
        self.values[self.index]
    }

    /// All slots from the one after the cursor through the most recent sample.
    pub fn samples_oldest_first(&self) -> impl Iterator<Item = (f32, [f32; 3])> + '_ {
        (1..=GRAPH_CAPACITY).map(move |offset| {
            let slot = (self.index + offset) % GRAPH_CAPACITY;
            (self.values[slot], self.colors[slot])
        })
    }

    /// Call `scale` first; the drawn range is whatever `min`/`max` hold.
    pub fn render(&self, target: &mut FrameTarget<'_>, rect: GraphRect, description: &str) {
        let x = rect.x.round() as i32;
        let y = rect.y.round() as i32;
        let w = rect.w.round() as i32;
        let h = rect.h.round() as i32;
        if w <= 1 || h <= 1 {
            return;
        }

        fill_rect(target, x, y, w, h, BACKGROUND_COLOR);
        draw_hline(target, x, x + w, y + h / 2, MIDLINE_COLOR);
        draw_hline(target, x, x + w, y + (h * 3) / 4, QUARTER_LINE_COLOR);
        draw_hline(target, x, x + w, y + h / 4, QUARTER_LINE_COLOR);

        let span = self.max - self.min;
        let normalize = |value: f32| {
            if span.abs() <= f32::EPSILON {
                0.0
            } else {
                (value - self.min) / span
            }
        };
        let point = |position: usize, value: f32| {
            let a = position as f32 / GRAPH_CAPACITY as f32;
            (
                (rect.x + a * rect.w).round() as i32,
                (rect.y + rect.h - normalize(value) * rect.h).round() as i32,
            )
        };

        let mut previous: Option<((i32, i32), [u8; 4])> = None;
        for (position, (value, rgb)) in self.samples_oldest_first().enumerate() {
            let current = (point(position, value), rgba_from_unit(rgb, SAMPLE_ALPHA));
            if let Some((from, from_color)) = previous {
                draw_line_gradient(target, from, current.0, from_color, current.1);
            }
            previous = Some(current);
        }

        draw_text(
            target,
            x + LABEL_INSET_PX,
            y + h - TEXT_HEIGHT - LABEL_INSET_PX,
            description,
            LABEL_COLOR,
        );
        let max_label = format!("{:.2}", self.max);
        draw_text(
            target,
            x + w - text_width_px(&max_label) - LABEL_INSET_PX * 4,
            y + LABEL_INSET_PX,
            &max_label,
            LABEL_COLOR,
        );
        let min_label = format!("{:.2}", self.min);
        draw_text(
            target,
            x + w - text_width_px(&min_label) - LABEL_INSET_PX * 4,
            y + h - TEXT_HEIGHT - LABEL_INSET_PX,
            &min_label,
            LABEL_COLOR,
        );
    }
}
