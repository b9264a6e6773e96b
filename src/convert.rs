use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{image_crate, Image, ImageTransform, Mm, PdfDocument};

use crate::error::{CardbatchError, Result};
use crate::models::ImageResolution;

const DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Default)]
pub struct ConversionSummary {
    pub converted: usize,
    pub copied: usize,
    pub failed: usize,
}

/// Render a raster receipt onto a single PDF page sized to the image at
/// 300 dpi. Palette and alpha images are flattened to RGB first.
pub fn convert_image_to_pdf(input: &Path, output: &Path) -> Result<()> {
    let decoded = image_crate::open(input)
        .map_err(|e| CardbatchError::Pdf(format!("{}: {e}", input.display())))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let page_w = Mm(width as f32 * MM_PER_INCH / DPI);
    let page_h = Mm(height as f32 * MM_PER_INCH / DPI);
    let (doc, page, layer) = PdfDocument::new("Receipt", page_w, page_h, "Layer 1");

    let image = Image::from_dynamic_image(&image_crate::DynamicImage::ImageRgb8(rgb));
    image.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(DPI),
            ..Default::default()
        },
    );

    let file = File::create(output)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| CardbatchError::Pdf(format!("{}: {e:?}", output.display())))?;
    Ok(())
}

/// Ensure every matched receipt has a PDF beside it in the image area:
/// rasters are converted, files already in PDF form pass through. Failures
/// are counted and reported, never fatal; the affected record keeps its
/// fallback file-spec.
pub fn process_images(
    resolutions: &mut BTreeMap<usize, ImageResolution>,
    images_dir: &Path,
) -> ConversionSummary {
    let mut summary = ConversionSummary::default();
    for res in resolutions.values_mut() {
        let Some(local) = res.local_path.clone() else {
            continue;
        };
        if !local.exists() {
            continue;
        }
        let Some(stem) = local.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let target = images_dir.join(format!("{stem}.pdf"));
        let is_pdf = local
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

        let outcome = if is_pdf {
            copy_pdf(&local, &target)
        } else {
            convert_image_to_pdf(&local, &target)
        };
        match outcome {
            Ok(()) => {
                if is_pdf {
                    summary.copied += 1;
                } else {
                    summary.converted += 1;
                }
                res.pdf_path = Some(target);
            }
            Err(e) => {
                eprintln!("warning: {e}");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Already a document. Relocated PDFs usually live at the target path, so
/// copying only happens when the source sits elsewhere.
fn copy_pdf(input: &Path, output: &Path) -> Result<()> {
    if input != output {
        std::fs::copy(input, output)?;
    }
    Ok(())
}
