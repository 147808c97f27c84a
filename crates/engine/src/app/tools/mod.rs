mod overlay;

pub(crate) use overlay::{
    draw_hline, draw_line_gradient, draw_text, fill_rect, rgba_from_unit, text_width_px,
    TEXT_HEIGHT,
};
