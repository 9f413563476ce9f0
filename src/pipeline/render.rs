//! PDF rasterisation: one PNG temp file per page via pdfium.
//!
//! ## Why temp files?
//!
//! Each page image is written to its own [`NamedTempFile`] and owned by the
//! returned [`Page`]. The orchestrator closes it as soon as the page's CSV is
//! written; if anything returns early the file is still removed on drop.
//!
//! ## Scale
//!
//! pdfium renders one pixel per PDF point at scale 1.0 (72 DPI). The zoom
//! factor multiplies both axes, so 4.0 turns a 612 × 792 pt US-letter page
//! into a 2448 × 3168 px image.

use crate::error::ExtractError;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// One rendered page and its transient image artifact.
#[derive(Debug)]
pub struct Page {
    /// 1-indexed position in the document.
    pub index: usize,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// PNG on disk; deleted when closed or dropped.
    pub artifact: NamedTempFile,
}

impl Page {
    /// Path of the PNG artifact.
    pub fn artifact_path(&self) -> &Path {
        self.artifact.path()
    }

    /// Write `image` to a fresh temp PNG and wrap it as page `index`.
    pub fn from_image(index: usize, image: &DynamicImage) -> Result<Self, std::io::Error> {
        let artifact = tempfile::Builder::new()
            .prefix("vision-page-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(artifact.path(), ImageFormat::Png)
            .map_err(std::io::Error::other)?;
        Ok(Self {
            index,
            width: image.width(),
            height: image.height(),
            artifact,
        })
    }
}

/// Turns a document into an ordered sequence of page images.
///
/// Implementations are blocking; the orchestrator calls them from
/// `spawn_blocking`.
pub trait PageRenderer: Send + Sync {
    /// Render every page at `zoom_factor`, preserving document order.
    fn render(&self, pdf_path: &Path, zoom_factor: f32) -> Result<Vec<Page>, ExtractError>;
}

/// pdfium-backed renderer.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    lib_dir: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Bind to the library in `lib_dir` when given, else the default locations.
    pub fn new(lib_dir: Option<PathBuf>) -> Self {
        Self { lib_dir }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let bindings = match self.lib_dir {
            Some(ref dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ExtractError::PdfiumBinding(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf_path: &Path, zoom_factor: f32) -> Result<Vec<Page>, ExtractError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| ExtractError::DocumentOpen {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom_factor);

        let mut results = Vec::with_capacity(pages.len() as usize);
        for (i, page) in pages.iter().enumerate() {
            let index = i + 1;
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| ExtractError::DocumentOpen {
                    path: pdf_path.to_path_buf(),
                    detail: format!("page {index}: {:?}", e),
                })?;

            let image = bitmap.as_image();
            let rendered = Page::from_image(index, &image).map_err(|e| {
                ExtractError::Internal(format!("cannot write image for page {index}: {e}"))
            })?;

            debug!(
                "Rendered page {} → {}x{} px at {}",
                index,
                rendered.width,
                rendered.height,
                rendered.artifact_path().display()
            );
            results.push(rendered);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn page_from_image_records_size_and_cleans_up() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 20, Rgba([0, 0, 0, 255])));
        let page = Page::from_image(3, &img).expect("write temp png");
        assert_eq!(page.index, 3);
        assert_eq!((page.width, page.height), (30, 20));

        let path = page.artifact_path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        drop(page);
        assert!(!path.exists(), "artifact must be removed on drop");
    }
}
