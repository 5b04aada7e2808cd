use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use chrono::{DateTime, SecondsFormat, Utc};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut, text_size, Blend};
use mintbox_core::RenderSettings;
use rand::Rng;

use super::font::load_font;
use super::shapes::{fill_diagonal_gradient, fill_ellipse, fill_round_rect, hsl_to_rgb, Ellipse};
use crate::error::RenderError;

/// Width the layout constants are expressed in; other widths scale proportionally.
const REFERENCE_WIDTH: f32 = 2048.0;

const BLOB_COUNT: usize = 6;
const CIRCLE_COUNT: usize = 20;
/// Layer alpha 0.35 times fill alpha 0.6
const CIRCLE_ALPHA: f32 = 0.35 * 0.6;
const PANEL_PADDING: f32 = 96.0;
const PANEL_RADIUS: f32 = 40.0;
const PANEL_ALPHA: f32 = 0.06 * 0.9;
const TITLE_SIZE: f32 = 56.0;
const FOOTER_SIZE: f32 = 20.0;

/// Draws the generated artwork: a hue gradient, translucent blobs and circles, a
/// glass panel, the title and a timestamp footer.
///
/// Every random choice is drawn from the caller's RNG, so a seeded RNG and a fixed
/// clock give identical pixels.
#[derive(Clone)]
pub struct NftRenderer {
    width: u32,
    height: u32,
    font: Option<Arc<FontVec>>,
}

impl fmt::Debug for NftRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NftRenderer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl NftRenderer {
    pub fn new(settings: &RenderSettings) -> Result<Self, RenderError> {
        let font = load_font(settings.font_path.as_deref())?;
        Ok(Self {
            width: settings.width,
            height: settings.height,
            font: font.map(Arc::new),
        })
    }

    /// Renderer that never draws text.
    pub fn without_font(settings: &RenderSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            font: None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn render<R: Rng + ?Sized>(
        &self,
        title: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<RgbaImage, RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::SurfaceUnavailable {
                width: self.width,
                height: self.height,
            });
        }

        let (w, h) = (self.width as f32, self.height as f32);
        let scale = w / REFERENCE_WIDTH;
        let mut img = RgbaImage::new(self.width, self.height);

        let hue = rng.random_range(0..360) as f32;
        fill_diagonal_gradient(
            &mut img,
            (hsl_to_rgb(hue, 0.7, 0.45), 1.0),
            (hsl_to_rgb(hue + 60.0, 0.7, 0.55), 0.9),
        );

        for i in 0..BLOB_COUNT {
            let alpha = 0.12 + rng.random::<f32>() * 0.25;
            let color = hsl_to_rgb(hue + i as f32 * 30.0, 0.8, 0.5);
            let blob = Ellipse {
                cx: rng.random::<f32>() * w,
                cy: rng.random::<f32>() * h,
                rx: (120.0 + rng.random::<f32>() * 520.0) * scale,
                ry: (120.0 + rng.random::<f32>() * 520.0) * scale,
                rotation: rng.random::<f32>() * PI,
            };
            fill_ellipse(&mut img, &blob, color, alpha);
        }

        let mut canvas = Blend(img);
        let circle_alpha = (CIRCLE_ALPHA * 255.0).round() as u8;
        for i in 0..CIRCLE_COUNT {
            let radius = (8.0 + rng.random::<f32>() * 120.0) * scale;
            let [r, g, b] = hsl_to_rgb(hue + i as f32 * 7.0, 0.6, 0.55);
            let center = (
                (rng.random::<f32>() * w) as i32,
                (rng.random::<f32>() * h) as i32,
            );
            draw_filled_circle_mut(
                &mut canvas,
                center,
                radius.round().max(1.0) as i32,
                Rgba([r, g, b, circle_alpha]),
            );
        }

        let pad = PANEL_PADDING * scale;
        fill_round_rect(
            &mut canvas.0,
            (pad, pad, w - 2.0 * pad, h - 2.0 * pad),
            PANEL_RADIUS * scale,
            [255, 255, 255],
            PANEL_ALPHA,
        );

        if let Some(font) = &self.font {
            draw_centered(
                &mut canvas,
                font,
                title,
                PxScale::from(TITLE_SIZE * scale),
                (w / 2.0, h * 0.85),
                Rgba([255, 255, 255, 255]),
            );

            let footer = format!(
                "by GitHub Pages \u{2022} {}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            );
            draw_centered(
                &mut canvas,
                font,
                &footer,
                PxScale::from(FOOTER_SIZE * scale),
                (w / 2.0, h * 0.9),
                Rgba([255, 255, 255, 217]),
            );
        }

        Ok(canvas.0)
    }
}

/// Draw `text` horizontally centred on `center_x` with its baseline at `baseline`.
fn draw_centered(
    canvas: &mut Blend<RgbaImage>,
    font: &FontVec,
    text: &str,
    scale: PxScale,
    (center_x, baseline): (f32, f32),
    color: Rgba<u8>,
) {
    if text.is_empty() {
        return;
    }
    let (text_width, text_height) = text_size(scale, font, text);
    let x = center_x - text_width as f32 / 2.0;
    let y = baseline - text_height as f32;
    draw_text_mut(canvas, color, x as i32, y as i32, scale, font, text);
}
