use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::bitmap::Bitmap;
use crate::error::ReportError;
use crate::layout::{Align, DrawOp, ReportLayout, Rgb, PAGE_HEIGHT, PAGE_WIDTH};
use crate::metrics::{text_width, Font, PT_TO_MM};

const IMAGE_RESOURCE: &str = "Im1";

fn pt(mm: f32) -> f32 {
    mm / PT_TO_MM
}

/// PDF y coordinate (points from the bottom) of a layout y (mm from the top).
fn flip(y_mm: f32) -> f32 {
    pt(PAGE_HEIGHT - y_mm)
}

fn color(c: Rgb) -> Vec<Object> {
    vec![
        (c.0 as f32 / 255.0).into(),
        (c.1 as f32 / 255.0).into(),
        (c.2 as f32 / 255.0).into(),
    ]
}

/// Map text onto WinAnsiEncoding. Latin-1 characters pass through, anything
/// else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn page_operations(ops: &[DrawOp], has_image: bool) -> Vec<Operation> {
    let mut out = Vec::new();
    for op in ops {
        match op {
            DrawOp::FillRect { x, y, width, height, color: fill } => {
                out.push(Operation::new("rg", color(*fill)));
                out.push(Operation::new(
                    "re",
                    vec![
                        pt(*x).into(),
                        flip(y + height).into(),
                        pt(*width).into(),
                        pt(*height).into(),
                    ],
                ));
                out.push(Operation::new("f", vec![]));
            }
            DrawOp::Text { x, y, text, font, size, color: fill, align } => {
                let left = match align {
                    Align::Left => *x,
                    Align::Center => x - text_width(text, *font, *size) / 2.0,
                };
                out.push(Operation::new("BT", vec![]));
                out.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.resource_name().as_bytes().to_vec()), (*size).into()],
                ));
                out.push(Operation::new("rg", color(*fill)));
                out.push(Operation::new("Td", vec![pt(left).into(), flip(*y).into()]));
                out.push(Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]));
                out.push(Operation::new("ET", vec![]));
            }
            DrawOp::Image { x, y, width, height } if has_image => {
                out.push(Operation::new("q", vec![]));
                out.push(Operation::new(
                    "cm",
                    vec![
                        pt(*width).into(),
                        0f32.into(),
                        0f32.into(),
                        pt(*height).into(),
                        pt(*x).into(),
                        flip(y + height).into(),
                    ],
                ));
                out.push(Operation::new(
                    "Do",
                    vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())],
                ));
                out.push(Operation::new("Q", vec![]));
            }
            DrawOp::Image { .. } => {}
        }
    }
    out
}

fn font_object(doc: &mut Document, font: Font) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Encode a laid-out report as a PDF document.
pub fn render_pdf(layout: &ReportLayout, image: Option<&Bitmap>) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = font_object(&mut doc, Font::Regular);
    let bold = font_object(&mut doc, Font::Bold);

    let mut resources = dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular,
            Font::Bold.resource_name() => bold,
        },
    };

    if let Some(bitmap) = image {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => bitmap.width as i64,
                "Height" => bitmap.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            bitmap.rgb.clone(),
        );
        let image_id = doc.add_object(stream);
        resources.set("XObject", dictionary! { IMAGE_RESOURCE => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(&page.ops, image.is_some()),
        };
        let encoded = content.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), pt(PAGE_WIDTH).into(), pt(PAGE_HEIGHT).into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    debug!(pages = page_count, bytes = bytes.len(), "Report encoded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageLayout;

    #[test]
    fn win_ansi_replaces_unmappable() {
        assert_eq!(encode_win_ansi("abc"), b"abc".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(encode_win_ansi("μm"), b"?m".to_vec());
    }

    #[test]
    fn coordinates_flip_to_bottom_left() {
        assert!((flip(PAGE_HEIGHT) - 0.0).abs() < 1e-3);
        assert!((pt(25.4) - 72.0).abs() < 1e-3);
    }

    #[test]
    fn renders_loadable_document() {
        let layout = ReportLayout {
            pages: vec![
                PageLayout {
                    ops: vec![DrawOp::Text {
                        x: 15.0,
                        y: 40.0,
                        text: "Hello (world)".into(),
                        font: Font::Regular,
                        size: 10.0,
                        color: Rgb(0, 0, 0),
                        align: Align::Left,
                    }],
                },
                PageLayout::default(),
            ],
            probabilities: crate::layout::CursorSpan { start: 0.0, end: 0.0 },
            final_cursor: 0.0,
        };
        let bytes = render_pdf(&layout, None).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
