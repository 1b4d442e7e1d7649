use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use plotters::style::{register_font, FontFamily, FontStyle};
use tracing::{debug, info, warn};

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Makes a sans-serif face available to the chart renderer.
///
/// An explicit font must load or the run fails. Without one, the common
/// system locations are tried and `None` is returned when nothing loads, in
/// which case charts are drawn without text or legend.
pub fn install(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        register_file(path).with_context(|| format!("failed to load font {}", path.display()))?;
        info!("Using chart font {}", path.display());
        return Ok(Some(path.to_path_buf()));
    }

    for candidate in SYSTEM_FONTS {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match register_file(path) {
            Ok(()) => {
                info!("Using chart font {}", path.display());
                return Ok(Some(path.to_path_buf()));
            }
            Err(err) => debug!("Skipping font {}: {:#}", path.display(), err),
        }
    }

    warn!("No usable font found; charts will be rendered without text (pass --font to fix)");
    Ok(None)
}

fn register_file(path: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;
    // The registry keeps the face for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    let family = FontFamily::SansSerif.as_str();
    for style in [FontStyle::Normal, FontStyle::Bold] {
        register_font(family, style, bytes).map_err(|_| anyhow!("invalid font data"))?;
    }
    Ok(())
}
