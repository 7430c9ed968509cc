use base64::Engine;
use image::DynamicImage;

use crate::error::ReportError;

/// Upper bound on the embedded image, in pixels per side. The image is drawn
/// 80x60 mm, so anything beyond roughly 300 dpi only bloats the file.
const MAX_SIDE: u32 = 1024;

/// Decoded RGB pixels ready to go into an image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Decode PNG/JPEG bytes or a `data:image/...;base64,` URI into RGB pixels.
pub fn decode(source: &[u8]) -> Result<Bitmap, ReportError> {
    let raw;
    let bytes = if source.starts_with(b"data:") {
        raw = decode_data_uri(source)?;
        raw.as_slice()
    } else {
        source
    };

    let mut img = image::load_from_memory(bytes)?;
    if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        img = img.thumbnail(MAX_SIDE, MAX_SIDE);
    }
    Ok(to_bitmap(img))
}

fn to_bitmap(img: DynamicImage) -> Bitmap {
    let rgb = img.to_rgb8();
    Bitmap {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    }
}

fn decode_data_uri(uri: &[u8]) -> Result<Vec<u8>, ReportError> {
    let text = std::str::from_utf8(uri).map_err(|e| ReportError::DataUri(e.to_string()))?;
    let (meta, payload) = text
        .split_once(',')
        .ok_or_else(|| ReportError::DataUri("missing ',' separator".into()))?;
    if !meta.ends_with(";base64") {
        return Err(ReportError::DataUri(format!("unsupported encoding in '{}'", meta)));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ReportError::DataUri(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 90]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png() {
        let bitmap = decode(&png(4, 3)).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (4, 3));
        assert_eq!(bitmap.rgb.len(), 4 * 3 * 3);
        assert_eq!(&bitmap.rgb[..3], &[200, 120, 90]);
    }

    #[test]
    fn decodes_data_uri() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png(2, 2));
        let uri = format!("data:image/png;base64,{}", encoded);
        let bitmap = decode(uri.as_bytes()).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (2, 2));
    }

    #[test]
    fn large_images_are_downscaled() {
        let bitmap = decode(&png(2048, 1024)).unwrap();
        assert_eq!(bitmap.width, MAX_SIDE);
        assert_eq!(bitmap.height, 512);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(decode(b"definitely not an image"), Err(ReportError::Image(_))));
        assert!(matches!(decode(b"data:image/png,raw"), Err(ReportError::DataUri(_))));
    }
}
