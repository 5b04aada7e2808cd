use ab_glyph::FontVec;

use crate::error::RenderError;

/// Bold sans-serif faces commonly installed on Linux, macOS and Windows.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

fn read_font(path: &str) -> Result<FontVec, RenderError> {
    let bytes = std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {}", path, e)))?;
    FontVec::try_from_vec(bytes).map_err(|e| RenderError::Font(format!("{}: {}", path, e)))
}

/// Load the title font.
///
/// An explicitly configured path must load. Otherwise the first readable system
/// candidate is used, and `None` means text is skipped.
pub fn load_font(configured: Option<&str>) -> Result<Option<FontVec>, RenderError> {
    if let Some(path) = configured {
        let font = read_font(path)?;
        tracing::debug!(path = %path, "Loaded configured font");
        return Ok(Some(font));
    }

    for path in SYSTEM_FONT_CANDIDATES {
        if let Ok(font) = read_font(path) {
            tracing::debug!(path = %path, "Loaded system font");
            return Ok(Some(font));
        }
    }

    tracing::warn!("No usable font found; set MINTBOX_FONT_PATH to draw title text");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configured_font_is_an_error() {
        let err = load_font(Some("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn invalid_font_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(load_font(Some(path.to_str().unwrap())).is_err());
    }
}
