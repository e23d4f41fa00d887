use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{ImageFormat, RgbaImage, imageops};
use kasane_config::capture::CaptureConfig;
use kasane_types::{Rect, Region};

use crate::display::DisplayLayout;
use crate::error::CaptureError;
use crate::source::FrameSource;

/// Produces a capture artifact for a region and hands back its path.
///
/// The artifact belongs to the caller, who deletes it once consumed.
pub trait Capturer: Send + Sync {
    fn capture(&self, region: Region) -> Result<PathBuf, CaptureError>;
}

/// Grabs the display under a region, crops it and writes a PNG.
pub struct RegionCapture<S> {
    source: S,
    temp_dir: PathBuf,
    file_prefix: String,
}

impl<S: FrameSource> RegionCapture<S> {
    pub fn new(source: S, config: &CaptureConfig) -> Self {
        Self {
            source,
            temp_dir: config.temp_dir.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Capture `region` as an in-memory bitmap of exactly its size.
    ///
    /// Displays are enumerated fresh on every call since they may have been
    /// plugged or unplugged since the region was chosen.
    pub fn grab(&self, region: Region) -> Result<RgbaImage, CaptureError> {
        let layout = DisplayLayout::new(self.source.displays()?)
            .ok_or_else(|| CaptureError::NoSource("no displays enumerated".to_string()))?;
        let display = layout.display_for_region(&region.rect()).clone();

        let frame = self.source.capture_display(&display)?;

        let local = Rect::new(
            region.x() - display.bounds.x,
            region.y() - display.bounds.y,
            region.width(),
            region.height(),
        );
        let frame_rect = Rect::new(0, 0, frame.width(), frame.height());
        if !frame_rect.encloses(&local) {
            return Err(CaptureError::CropOutOfBounds {
                local,
                frame_width: frame.width(),
                frame_height: frame.height(),
                display_id: display.id,
            });
        }

        let display_id = display.id;
        tracing::debug!(
            display_id,
            x = local.x,
            y = local.y,
            width = local.width,
            height = local.height,
            "cropping frame"
        );

        Ok(imageops::crop_imm(&frame, local.x as u32, local.y as u32, local.width, local.height).to_image())
    }

    fn artifact_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.temp_dir
            .join(format!("{}-{}-{}.png", self.file_prefix, millis, uuid::Uuid::new_v4().simple()))
    }
}

fn write_png(image: &RgbaImage, path: &Path) -> Result<(), CaptureError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

impl<S: FrameSource> Capturer for RegionCapture<S> {
    fn capture(&self, region: Region) -> Result<PathBuf, CaptureError> {
        let image = self.grab(region)?;
        let path = self.artifact_path();
        write_png(&image, &path)?;
        tracing::debug!(path = %path.display(), "capture written");
        Ok(path)
    }
}
