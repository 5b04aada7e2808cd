use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::RenderError;

/// Quality used by every lossy export format (0-100)
pub const EXPORT_QUALITY: u8 = 95;

/// Download formats offered for the current preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpg,
    Webp,
    Avif,
    /// PNG embedded as a data URI in an SVG document
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Png,
        ExportFormat::Jpg,
        ExportFormat::Webp,
        ExportFormat::Avif,
        ExportFormat::Svg,
    ];

    pub fn parse(s: &str) -> Result<Self, RenderError> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "webp" => Ok(ExportFormat::Webp),
            "avif" => Ok(ExportFormat::Avif),
            "svg" => Ok(ExportFormat::Svg),
            _ => Err(RenderError::UnsupportedFormat(s.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Webp => "webp",
            ExportFormat::Avif => "avif",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Avif => "image/avif",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encodes rendered surfaces for upload and download.
pub struct ImageExporter;

impl ImageExporter {
    /// Encode `img` as `format`.
    ///
    /// Returns the format actually produced: an AVIF encode failure falls back to PNG.
    pub fn encode(
        img: &RgbaImage,
        format: ExportFormat,
    ) -> Result<(Bytes, ExportFormat), RenderError> {
        let data = match format {
            ExportFormat::Png => Self::encode_png(img)?,
            ExportFormat::Jpg => Self::encode_jpeg(img)?,
            ExportFormat::Webp => Self::encode_webp(img),
            ExportFormat::Svg => Self::encode_svg(img)?,
            ExportFormat::Avif => match Self::encode_avif(img) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "AVIF encoding failed, exporting PNG instead");
                    return Ok((Self::encode_png(img)?, ExportFormat::Png));
                }
            },
        };

        tracing::debug!(
            format = %format,
            size_bytes = data.len(),
            width = img.width(),
            height = img.height(),
            "Image encoded"
        );

        Ok((data, format))
    }

    pub fn encode_png(img: &RgbaImage) -> Result<Bytes, RenderError> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(Bytes::from(buffer))
    }

    /// JPEG has no alpha channel; the surface is flattened to RGB first.
    fn encode_jpeg(img: &RgbaImage) -> Result<Bytes, RenderError> {
        let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
        let mut buffer = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, EXPORT_QUALITY))
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(Bytes::from(buffer))
    }

    fn encode_webp(img: &RgbaImage) -> Bytes {
        let encoder = webp::Encoder::from_rgba(img.as_raw(), img.width(), img.height());
        let webp_data = encoder.encode(EXPORT_QUALITY as f32);
        Bytes::copy_from_slice(&webp_data)
    }

    fn encode_avif(img: &RgbaImage) -> Result<Bytes, RenderError> {
        let pixels: Vec<rgb::RGBA8> = img
            .as_raw()
            .chunks_exact(4)
            .map(|p| rgb::RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        let buffer = ravif::Img::new(
            pixels.as_slice(),
            img.width() as usize,
            img.height() as usize,
        );

        let encoded = ravif::Encoder::new()
            .with_quality(EXPORT_QUALITY as f32)
            .with_alpha_quality(EXPORT_QUALITY as f32)
            .with_speed(6)
            .encode_rgba(buffer)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        Ok(Bytes::from(encoded.avif_file))
    }

    fn encode_svg(img: &RgbaImage) -> Result<Bytes, RenderError> {
        let png = encode_png_base64(img)?;
        let (w, h) = img.dimensions();
        let svg = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"
     width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <image width="{w}" height="{h}" xlink:href="data:image/png;base64,{png}"/>
</svg>"#
        );
        Ok(Bytes::from(svg))
    }
}

/// PNG bytes of `img`, base64 encoded for the contents API.
pub fn encode_png_base64(img: &RgbaImage) -> Result<String, RenderError> {
    let png = ImageExporter::encode_png(img)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&png))
}
