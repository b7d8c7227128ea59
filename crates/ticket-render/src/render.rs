//! The rendering pipeline: background, QR code, text overlays.

use std::sync::Arc;

use ab_glyph::PxScale;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use qrcode::QrCode;
use tracing::debug;

use crate::assets::AssetSource;
use crate::error::{RenderError, Result};
use crate::fonts::FontLibrary;
use crate::template::{BackgroundSource, TicketData, TicketTemplate};
use crate::text::{aligned_x, truncate_to_width};

/// Outcome of one item in a batch render.
pub struct BatchItemReport {
    pub index: usize,
    pub ticket_number: String,
    pub result: Result<RgbaImage>,
}

/// Composes ticket images from templates and per-attendee data.
pub struct TicketRenderer {
    fonts: FontLibrary,
    assets: Arc<dyn AssetSource>,
}

impl TicketRenderer {
    pub fn new(fonts: FontLibrary, assets: Arc<dyn AssetSource>) -> Self {
        Self { fonts, assets }
    }

    /// Render a single ticket to a flattened RGBA image.
    ///
    /// Steps, in order: load the background, encode and composite the QR
    /// code, draw each overlay. Overlays whose optional source field is
    /// absent are skipped; an overlay naming an unloaded font is an error.
    pub fn render(&self, template: &TicketTemplate, data: &TicketData) -> Result<RgbaImage> {
        let mut canvas = self.load_background(&template.background)?;
        self.composite_qr(&mut canvas, template, data)?;
        for overlay in &template.overlays {
            let Some(text) = data.field(overlay.field) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let font = self
                .fonts
                .get(&overlay.font_family)
                .ok_or_else(|| RenderError::UnknownFont(overlay.font_family.clone()))?;
            let scale = PxScale::from(overlay.font_size);

            let text = match overlay.max_width {
                Some(max) => {
                    truncate_to_width(text, max, |candidate| text_size(scale, font, candidate).0)
                }
                None => text.to_string(),
            };
            let (width, _) = text_size(scale, font, &text);
            let x = aligned_x(overlay.x, width, overlay.align);
            draw_text_mut(
                &mut canvas,
                Rgba(overlay.color),
                x,
                overlay.y,
                scale,
                font,
                &text,
            );
        }
        debug!(ticket_number = %data.ticket_number, "Rendered ticket");
        Ok(canvas)
    }

    /// Render a single ticket and encode it as PNG bytes.
    pub fn render_png(&self, template: &TicketTemplate, data: &TicketData) -> Result<Vec<u8>> {
        let image = self.render(template, data)?;
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Render a list of tickets sequentially, reporting `(done, total)`
    /// after each item.
    ///
    /// A failed item is reported in its slot and does not abort the batch,
    /// mirroring the partial-failure policy of the bulk jobs that normally
    /// drive this call.
    pub fn render_batch(
        &self,
        template: &TicketTemplate,
        data: &[TicketData],
        mut on_progress: impl FnMut(usize, usize),
    ) -> Vec<BatchItemReport> {
        let total = data.len();
        let mut reports = Vec::with_capacity(total);
        for (index, item) in data.iter().enumerate() {
            let result = self.render(template, item);
            reports.push(BatchItemReport {
                index,
                ticket_number: item.ticket_number.clone(),
                result,
            });
            on_progress(index + 1, total);
        }
        reports
    }

    fn load_background(&self, background: &BackgroundSource) -> Result<RgbaImage> {
        match background {
            BackgroundSource::Asset { path } => Ok(self.assets.load_image(path)?.to_rgba8()),
            BackgroundSource::Solid {
                width,
                height,
                color,
            } => {
                if *width == 0 || *height == 0 {
                    return Err(RenderError::invalid_template(
                        "solid background must have non-zero dimensions",
                    ));
                }
                Ok(RgbaImage::from_pixel(*width, *height, Rgba(*color)))
            }
        }
    }

    fn composite_qr(
        &self,
        canvas: &mut RgbaImage,
        template: &TicketTemplate,
        data: &TicketData,
    ) -> Result<()> {
        let placement = &template.qr;
        if placement.size == 0 {
            return Err(RenderError::invalid_template("qr size must be non-zero"));
        }
        // Checked arithmetic: templates arrive over the wire, so x/y can
        // be anything up to u32::MAX.
        let right = placement.x.checked_add(placement.size);
        let bottom = placement.y.checked_add(placement.size);
        match (right, bottom) {
            (Some(right), Some(bottom))
                if right <= canvas.width() && bottom <= canvas.height() => {}
            _ => {
                return Err(RenderError::invalid_template(
                    "qr placement exceeds background bounds",
                ));
            }
        }

        let code = QrCode::with_error_correction_level(
            data.ticket_number.as_bytes(),
            placement.ec_level.into(),
        )?;
        let modules = code
            .render::<image::Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(4, 4)
            .build();
        // Nearest-neighbour keeps module edges crisp for scanners.
        let scaled = image::imageops::resize(
            &modules,
            placement.size,
            placement.size,
            FilterType::Nearest,
        );
        let rgba = DynamicImage::ImageLuma8(scaled).to_rgba8();
        image::imageops::overlay(canvas, &rgba, placement.x as i64, placement.y as i64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{EcLevel, QrPlacement};

    fn solid_template(size: u32) -> TicketTemplate {
        TicketTemplate {
            background: BackgroundSource::Solid {
                width: 600,
                height: 600,
                color: [255, 255, 255, 255],
            },
            qr: QrPlacement {
                x: 100,
                y: 100,
                size,
                ec_level: EcLevel::M,
            },
            overlays: vec![],
        }
    }

    fn data(ticket_number: &str) -> TicketData {
        TicketData {
            name: "Ada Lovelace".to_string(),
            ticket_number: ticket_number.to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        }
    }

    fn renderer() -> TicketRenderer {
        TicketRenderer::new(
            FontLibrary::empty(),
            Arc::new(crate::assets::MemoryAssetSource::new()),
        )
    }

    #[test]
    fn qr_region_decodes_back_to_ticket_number() {
        let image = renderer()
            .render(&solid_template(300), &data("TKT-2025-001"))
            .unwrap();

        let luma = DynamicImage::ImageRgba8(image).to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(luma);
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code in output");
        let (_, content) = grids[0].decode().unwrap();
        assert_eq!(content, "TKT-2025-001");
    }

    #[test]
    fn oversized_qr_placement_is_rejected() {
        let template = solid_template(700);
        let err = renderer().render(&template, &data("TKT-1")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTemplate(_)));
    }

    #[test]
    fn qr_placement_near_u32_max_is_rejected_not_wrapped() {
        let mut template = solid_template(200);
        template.qr.x = u32::MAX - 10;
        let err = renderer().render(&template, &data("TKT-1")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTemplate(_)));

        let mut template = solid_template(200);
        template.qr.y = u32::MAX;
        let err = renderer().render(&template, &data("TKT-1")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTemplate(_)));
    }

    #[test]
    fn unknown_font_is_an_error() {
        let mut template = solid_template(200);
        template.overlays.push(crate::template::TextOverlay {
            field: crate::template::TicketField::Name,
            x: 10,
            y: 10,
            font_size: 24.0,
            font_family: "NoSuchFont".to_string(),
            color: [0, 0, 0, 255],
            align: crate::template::Align::Left,
            max_width: None,
        });
        let err = renderer().render(&template, &data("TKT-1")).unwrap_err();
        assert!(matches!(err, RenderError::UnknownFont(_)));
    }

    #[test]
    fn batch_reports_per_item_failures_and_full_progress() {
        let good = solid_template(200);
        let mut progress = Vec::new();
        let items = vec![data("TKT-1"), data("TKT-2"), data("TKT-3")];
        let reports = renderer().render_batch(&good, &items, |done, total| {
            progress.push((done, total));
        });
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(reports.iter().all(|r| r.result.is_ok()));

        // Now a template whose background asset is missing: every item
        // fails, the batch still runs to completion.
        let bad = TicketTemplate {
            background: BackgroundSource::Asset {
                path: "missing.png".to_string(),
            },
            ..good
        };
        let mut progress = Vec::new();
        let reports = renderer().render_batch(&bad, &items, |done, total| {
            progress.push((done, total));
        });
        assert_eq!(progress.len(), 3);
        assert!(reports.iter().all(|r| r.result.is_err()));
    }
}
