//! Pixel-level fills that `imageproc` does not cover: gradients, rotated ellipses and
//! rounded rectangles, all composited source-over.

use image::{Rgba, RgbaImage};

/// HSL (degrees, 0..1, 0..1) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Composite `color` with coverage `alpha` over the pixel at `(x, y)`.
pub fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: [u8; 3], alpha: f32) {
    let dst = img.get_pixel_mut(x, y);
    let sa = alpha.clamp(0.0, 1.0);
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = color[i] as f32;
        let dc = dst[i] as f32;
        out[i] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    *dst = Rgba(out);
}

/// Fill the whole surface with a linear gradient running from the top-left to the
/// bottom-right corner. Stops are `(rgb, alpha)`.
pub fn fill_diagonal_gradient(img: &mut RgbaImage, from: ([u8; 3], f32), to: ([u8; 3], f32)) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let length_sq = w * w + h * h;

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let t = ((x as f32 * w + y as f32 * h) / length_sq).clamp(0.0, 1.0);
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        *pixel = Rgba([
            lerp(from.0[0] as f32, to.0[0] as f32).round() as u8,
            lerp(from.0[1] as f32, to.0[1] as f32).round() as u8,
            lerp(from.0[2] as f32, to.0[2] as f32).round() as u8,
            (lerp(from.1, to.1) * 255.0).round() as u8,
        ]);
    }
}

/// Ellipse centred on `(cx, cy)` with radii `(rx, ry)`, rotated by `rotation` radians.
pub struct Ellipse {
    pub cx: f32,
    pub cy: f32,
    pub rx: f32,
    pub ry: f32,
    pub rotation: f32,
}

pub fn fill_ellipse(img: &mut RgbaImage, shape: &Ellipse, color: [u8; 3], alpha: f32) {
    let reach = shape.rx.max(shape.ry);
    let bounds = clip(
        img,
        shape.cx - reach,
        shape.cy - reach,
        shape.cx + reach,
        shape.cy + reach,
    );
    let Some((x0, y0, x1, y1)) = bounds else {
        return;
    };
    let (sin, cos) = shape.rotation.sin_cos();

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - shape.cx;
            let dy = y as f32 + 0.5 - shape.cy;
            let u = (dx * cos + dy * sin) / shape.rx;
            let v = (dy * cos - dx * sin) / shape.ry;
            if u * u + v * v <= 1.0 {
                blend_pixel(img, x, y, color, alpha);
            }
        }
    }
}

/// Rectangle at `(x, y)` of size `w`x`h` with corner radius `r`.
pub fn fill_round_rect(
    img: &mut RgbaImage,
    (x, y, w, h): (f32, f32, f32, f32),
    r: f32,
    color: [u8; 3],
    alpha: f32,
) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    let Some((x0, y0, x1, y1)) = clip(img, x, y, x + w, y + h) else {
        return;
    };

    for py in y0..y1 {
        for px in x0..x1 {
            let fx = px as f32 + 0.5;
            let fy = py as f32 + 0.5;
            let nx = fx.clamp(x + r, x + w - r);
            let ny = fy.clamp(y + r, y + h - r);
            let (dx, dy) = (fx - nx, fy - ny);
            if dx * dx + dy * dy <= r * r {
                blend_pixel(img, px, py, color, alpha);
            }
        }
    }
}

/// Intersect a float box with the surface; `None` when nothing is left.
fn clip(img: &RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(u32, u32, u32, u32)> {
    let x0 = x0.floor().max(0.0) as u32;
    let y0 = y0.floor().max(0.0) as u32;
    let x1 = (x1.ceil().max(0.0) as u32).min(img.width());
    let y1 = (y1.ceil().max(0.0) as u32).min(img.height());
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(42.0, 0.0, 1.0), [255, 255, 255]);
    }

    #[test]
    fn blending_over_opaque_keeps_it_opaque() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        blend_pixel(&mut img, 0, 0, [255, 255, 255], 0.5);
        let p = img.get_pixel(0, 0);
        assert_eq!(p[3], 255);
        assert!((127..=128).contains(&p[0]));
    }

    #[test]
    fn gradient_runs_corner_to_corner() {
        let mut img = RgbaImage::new(10, 10);
        fill_diagonal_gradient(&mut img, ([0, 0, 0], 1.0), ([255, 255, 255], 0.5));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(0, 0)[3], 255);
        assert!(img.get_pixel(9, 9)[0] > 200);
        assert!(img.get_pixel(9, 9)[3] < 150);
    }

    #[test]
    fn shapes_off_the_surface_are_ignored() {
        let mut img = RgbaImage::new(4, 4);
        let far = Ellipse {
            cx: -100.0,
            cy: -100.0,
            rx: 10.0,
            ry: 10.0,
            rotation: 0.3,
        };
        fill_ellipse(&mut img, &far, [255, 0, 0], 1.0);
        fill_round_rect(&mut img, (10.0, 10.0, 5.0, 5.0), 1.0, [255, 0, 0], 1.0);
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn round_rect_leaves_corners_clear() {
        let mut img = RgbaImage::new(20, 20);
        fill_round_rect(&mut img, (0.0, 0.0, 20.0, 20.0), 8.0, [255, 255, 255], 1.0);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(10, 10)[3], 255);
    }
}
