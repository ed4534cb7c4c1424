//! Low-level PDF operations via MuPDF
//!
//! MuPDF documents are not thread-safe, so every operation opens a
//! fresh document from the raw bytes inside `spawn_blocking` and drops
//! it before returning. Nothing here retains document state.

use std::io::Cursor;

use mupdf::{Colorspace, Document, Matrix};

use super::ExtractError;

/// Scale factor for OCR rasterization (higher resolution helps OCR)
pub const RASTER_SCALE: f32 = 2.0;

/// Extract the structural text layer from every page of a PDF
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || {
        let doc = Document::from_bytes(&bytes, "application/pdf")
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        let page_count = doc.page_count().map_err(|e| ExtractError::Pdf(e.to_string()))?;

        let mut text = String::new();
        for index in 0..page_count {
            let page = doc
                .load_page(index)
                .map_err(|e| ExtractError::Pdf(e.to_string()))?;
            let page_text = page.to_text().map_err(|e| ExtractError::Pdf(e.to_string()))?;
            text.push_str(&page_text);
            text.push('\n');
        }

        Ok(text)
    })
    .await
    .map_err(|e| ExtractError::Task(e.to_string()))?
}

/// Rasterize only the first page of a PDF to a PNG buffer
pub async fn rasterize_first_page(bytes: Vec<u8>, scale: f32) -> Result<Vec<u8>, ExtractError> {
    tokio::task::spawn_blocking(move || {
        let doc = Document::from_bytes(&bytes, "application/pdf")
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        let page_count = doc.page_count().map_err(|e| ExtractError::Pdf(e.to_string()))?;

        if page_count == 0 {
            return Err(ExtractError::Pdf("document has no pages".to_string()));
        }

        let page = doc
            .load_page(0)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, true, false)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        encode_png(&pixmap)
    })
    .await
    .map_err(|e| ExtractError::Task(e.to_string()))?
}

fn encode_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, ExtractError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    // Repack samples as RGBA regardless of the pixmap's component count
    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = image::RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| ExtractError::Pdf("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(output)
}
