use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Pt};

use crate::error::{IdeatorError, Result};
use crate::render::pdf::layout::{FontFace, PAGE_HEIGHT, PAGE_WIDTH, Page, PageModel};

const LAYER_NAME: &str = "Layer 1";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
            FontFace::Italic => &self.italic,
        }
    }
}

fn pdf_err(context: &str, err: impl std::fmt::Display) -> IdeatorError {
    IdeatorError::render(format!("{context}: {err}"))
}

/// Emit a laid-out page model as PDF bytes using the built-in Helvetica faces
pub fn write_pdf(title: &str, model: &PageModel) -> Result<Vec<u8>> {
    let width = Mm::from(Pt(PAGE_WIDTH));
    let height = Mm::from(Pt(PAGE_HEIGHT));
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, LAYER_NAME);

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_err("loading Helvetica", e))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_err("loading Helvetica-Bold", e))?,
        italic: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| pdf_err("loading Helvetica-Oblique", e))?,
    };

    for (idx, page) in model.pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(width, height, LAYER_NAME);
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        draw_page(&layer, page, &fonts);
    }

    tracing::debug!(pages = model.pages.len(), title, "Writing PDF");
    doc.save_to_bytes().map_err(|e| pdf_err("saving PDF", e))
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &Fonts) {
    for run in &page.runs {
        layer.use_text(
            run.text.clone(),
            run.size,
            Mm::from(Pt(run.x)),
            Mm::from(Pt(run.y)),
            fonts.get(run.face),
        );
    }
    if !page.rules.is_empty() {
        layer.set_outline_thickness(0.5);
    }
    for rule in &page.rules {
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm::from(Pt(rule.x1)), Mm::from(Pt(rule.y1))), false),
                (Point::new(Mm::from(Pt(rule.x2)), Mm::from(Pt(rule.y2))), false),
            ],
            is_closed: false,
        });
    }
}
