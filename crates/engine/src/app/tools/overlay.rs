use crate::app::FrameTarget;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 3;
pub(crate) const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub(crate) const TEXT_HEIGHT: i32 = GLYPH_HEIGHT * TEXT_SCALE;

pub(crate) type Rgba = [u8; 4];

/// Linear RGB in `0.0..=1.0` plus alpha to an RGBA8 color.
pub(crate) fn rgba_from_unit(rgb: [f32; 3], alpha: f32) -> Rgba {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        channel(rgb[0]),
        channel(rgb[1]),
        channel(rgb[2]),
        channel(alpha),
    ]
}

pub(crate) fn text_width_px(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

pub(crate) fn draw_text(target: &mut FrameTarget<'_>, mut x: i32, y: i32, text: &str, color: Rgba) {
    for ch in text.chars() {
        if let Some(rows) = glyph_rows(ch) {
            draw_glyph(target, x, y, rows, color);
        }
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(target: &mut FrameTarget<'_>, x: i32, y: i32, rows: [u8; 5], color: Rgba) {
    for (row_index, row_bits) in rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * TEXT_SCALE;
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            let glyph_x = x + col * TEXT_SCALE;
            fill_rect(target, glyph_x, glyph_y, TEXT_SCALE, TEXT_SCALE, color);
        }
    }
}

/// Alpha-blended rectangle fill, clipped to the target.
pub(crate) fn fill_rect(
    target: &mut FrameTarget<'_>,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: Rgba,
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(target.width as i32);
    let end_y = y.saturating_add(rect_height).min(target.height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel(target, px, py, color);
        }
    }
}

pub(crate) fn draw_hline(target: &mut FrameTarget<'_>, x0: i32, x1: i32, y: i32, color: Rgba) {
    let (left, right) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    fill_rect(target, left, y, right - left + 1, 1, color);
}

/// Line segment whose color is interpolated from `from_color` to `to_color`.
pub(crate) fn draw_line_gradient(
    target: &mut FrameTarget<'_>,
    from: (i32, i32),
    to: (i32, i32),
    from_color: Rgba,
    to_color: Rgba,
) {
    let (mut x, mut y) = from;
    let dx = (to.0 - from.0).abs();
    let dy = -(to.1 - from.1).abs();
    let step_x = if from.0 < to.0 { 1 } else { -1 };
    let step_y = if from.1 < to.1 { 1 } else { -1 };
    let steps = dx.max(-dy).max(1) as f32;
    let mut error = dx + dy;
    let mut walked = 0.0f32;

    loop {
        let color = lerp_rgba(from_color, to_color, walked / steps);
        blend_pixel(target, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
        walked += 1.0;
    }
}

fn lerp_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for channel in 0..4 {
        let value = a[channel] as f32 + (b[channel] as f32 - a[channel] as f32) * t;
        out[channel] = value.round() as u8;
    }
    out
}

fn blend_pixel(target: &mut FrameTarget<'_>, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 || x >= target.width as i32 || y >= target.height as i32 {
        return;
    }
    let Some(offset) = (y as usize)
        .checked_mul(target.width as usize)
        .and_then(|row| row.checked_add(x as usize))
        .and_then(|pixel| pixel.checked_mul(4))
    else {
        return;
    };
    let Some(pixel) = target.pixels.get_mut(offset..offset + 4) else {
        return;
    };

    let alpha = color[3] as u32;
    if alpha == 255 {
        pixel.copy_from_slice(&color);
        return;
    }
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = pixel[channel] as u32;
        pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
    }
    pixel[3] = 255;
}

fn glyph_rows(ch: char) -> Option<[u8; 5]> {
    let rows = match ch.to_ascii_uppercase() {
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        _ => return None,
    };
    Some(rows)
}
