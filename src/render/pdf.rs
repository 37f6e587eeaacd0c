// src/render/pdf.rs

use super::{Instruction, RenderedDocument};
use crate::error::RenderError;
use crate::logo::Logo;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{GenericImageView, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use std::io::Write;
use tracing::{debug, info};

const PT_PER_MM: f32 = 72.0 / 25.4;

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Frame header facts needed to embed a JPEG without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
    pub bits: u8,
}

/// Walk the JPEG marker segments up to the first start-of-frame.
pub fn sniff_jpeg(bytes: &[u8]) -> Result<JpegInfo, RenderError> {
    let corrupt = |msg: &str| RenderError::CorruptImage(msg.to_string());

    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(corrupt("missing JPEG start-of-image marker"));
    }

    let mut pos = 2;
    while pos < bytes.len() {
        if bytes[pos] != 0xFF {
            return Err(corrupt("expected marker"));
        }
        // skip fill bytes
        while pos < bytes.len() && bytes[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = bytes.get(pos) else {
            break;
        };
        pos += 1;

        match marker {
            0xD8 | 0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => break,
            _ => {}
        }

        let len = match bytes.get(pos..pos + 2) {
            Some(b) => usize::from(u16::from_be_bytes([b[0], b[1]])),
            None => break,
        };
        if len < 2 {
            return Err(corrupt("bad segment length"));
        }

        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            let seg = bytes
                .get(pos + 2..pos + 8)
                .ok_or_else(|| corrupt("truncated frame header"))?;
            let info = JpegInfo {
                bits: seg[0],
                height: u16::from_be_bytes([seg[1], seg[2]]),
                width: u16::from_be_bytes([seg[3], seg[4]]),
                components: seg[5],
            };
            if info.width == 0 || info.height == 0 {
                return Err(corrupt("zero image dimensions"));
            }
            return Ok(info);
        }

        pos += len;
    }

    Err(corrupt("no frame header found"))
}

/// Pick the embedding from the bytes themselves; the declared mime type
/// is only used in the error message.
fn image_xobject(pdf: &mut Document, logo: &Logo) -> Result<Stream, RenderError> {
    match image::guess_format(&logo.bytes) {
        Ok(ImageFormat::Jpeg) => jpeg_xobject(&logo.bytes),
        Ok(ImageFormat::Png) => png_xobject(pdf, &logo.bytes),
        _ => Err(RenderError::UnsupportedImage(logo.mime.clone())),
    }
}

fn jpeg_xobject(bytes: &[u8]) -> Result<Stream, RenderError> {
    let info = sniff_jpeg(bytes)?;
    let color_space = match info.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => {
            return Err(RenderError::CorruptImage(format!(
                "unsupported component count {n}"
            )));
        }
    };
    debug!(
        width = info.width,
        height = info.height,
        components = info.components,
        "Embedding JPEG logo"
    );

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(info.width),
        "Height" => i64::from(info.height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => i64::from(info.bits),
        "Filter" => "DCTDecode",
    };
    if info.components == 4 {
        // Adobe CMYK JPEGs are stored inverted
        dict.set(
            "Decode",
            [1, 0, 1, 0, 1, 0, 1, 0]
                .into_iter()
                .map(Object::Integer)
                .collect::<Vec<_>>(),
        );
    }
    Ok(Stream::new(dict, bytes.to_vec()).with_compression(false))
}

/// PNG pixels are decoded and re-encoded as FlateDecode samples. A
/// non-opaque alpha channel becomes a DeviceGray soft mask.
fn png_xobject(pdf: &mut Document, bytes: &[u8]) -> Result<Stream, RenderError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let (width, height) = decoded.dimensions();
    let rgba = decoded.to_rgba8();

    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(rgba.len() / 4);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    let has_alpha = alpha.iter().any(|&a| a != 255);
    debug!(width, height, has_alpha, "Embedding PNG logo");

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
        "Filter" => "FlateDecode",
    };
    if has_alpha {
        let mask = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        };
        let mask_id = pdf.add_object(Stream::new(mask, deflate(&alpha)?).with_compression(false));
        dict.set("SMask", mask_id);
    }
    Ok(Stream::new(dict, deflate(&rgb)?).with_compression(false))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// PDF text strings use WinAnsi; characters outside Latin-1 become `?`.
fn win_ansi(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// Interpret the layout into a single-page PDF.
pub fn encode(doc: &RenderedDocument) -> Result<Vec<u8>, RenderError> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let page_h = pt(doc.page_height);
    let mut operations = Vec::new();
    let mut xobjects = Dictionary::new();

    for ins in &doc.instructions {
        match ins {
            Instruction::Text { x, y, text } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec!["F1".into(), Object::Real(doc.font_size)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Real(pt(*x)), Object::Real(page_h - pt(*y))],
                ));
                operations.push(Operation::new("Tj", vec![win_ansi(text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            Instruction::Image {
                x,
                y,
                width,
                height,
                logo,
            } => {
                let name = format!("Im{}", xobjects.len() + 1);
                let image = image_xobject(&mut pdf, logo)?;
                let image_id = pdf.add_object(image);
                xobjects.set(name.as_bytes().to_vec(), image_id);

                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        Object::Real(pt(*width)),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(pt(*height)),
                        Object::Real(pt(*x)),
                        Object::Real(page_h - pt(*y + *height)),
                    ],
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }

    let mut resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };
    if !xobjects.is_empty() {
        resources.set("XObject", xobjects);
    }
    let resources_id = pdf.add_object(resources);

    let content = Content { operations };
    let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(pt(doc.page_width)),
            Object::Real(page_h),
        ],
    };
    pdf.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    pdf.save_to(&mut out)?;
    info!(bytes = out.len(), "PDF encoded");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceState, LineItem};
    use crate::render::{Layout, Snapshot, render};

    /// SOI + SOF0 (64x32, 3 components) + EOI. Enough for embedding.
    fn tiny_jpeg() -> Vec<u8> {
        let mut b = vec![0xFF, 0xD8];
        // APP0 segment that must be skipped
        b.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x4A, 0x46]);
        b.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x20, 0x00, 0x40, 0x03]);
        b.extend_from_slice(&[1, 0x11, 0, 2, 0x11, 0, 3, 0x11, 0]);
        b.extend_from_slice(&[0xFF, 0xD9]);
        b
    }

    fn state() -> InvoiceState {
        InvoiceState {
            customer_name: "Alice".to_string(),
            customer_address: "1 Main St".to_string(),
            items: vec![LineItem {
                product: "Pen".to_string(),
                unit_price: 2.0,
                quantity: 3,
            }],
            discount_percent: 10.0,
            ..Default::default()
        }
    }

    fn page_operations(bytes: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    #[test]
    fn test_sniff_jpeg() {
        let info = sniff_jpeg(&tiny_jpeg()).unwrap();
        assert_eq!(
            info,
            JpegInfo {
                width: 64,
                height: 32,
                components: 3,
                bits: 8
            }
        );
    }

    #[test]
    fn test_sniff_garbage() {
        assert!(matches!(
            sniff_jpeg(b"this is not a jpeg"),
            Err(RenderError::CorruptImage(_))
        ));
        assert!(sniff_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9]).is_err());
    }

    #[test]
    fn test_encode_text_page() {
        let doc = render(&Snapshot::of(&state()), &Layout::default());
        let bytes = encode(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let shown: Vec<Vec<u8>> = page_operations(&bytes)
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(s, _)) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(shown.first().map(Vec::as_slice), Some(&b"INVOICE"[..]));
        assert!(shown.iter().any(|s| s == b"Total Amount: 5.4"));
        assert_eq!(shown.len(), doc.texts().count());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let doc = render(&Snapshot::of(&state()), &Layout::default());
        assert_eq!(encode(&doc).unwrap(), encode(&doc).unwrap());
    }

    #[test]
    fn test_encode_with_logo() {
        let mut s = state();
        s.logo = Some(Logo::new(tiny_jpeg(), "image/jpeg"));
        let doc = render(&Snapshot::of(&s), &Layout::default());
        let bytes = encode(&doc).unwrap();

        let ops = page_operations(&bytes);
        assert!(ops.iter().any(|op| op.operator == "Do"));
    }

    fn png(pixels: &[[u8; 4]], width: u32) -> Vec<u8> {
        let height = pixels.len() as u32 / width;
        let raw: Vec<u8> = pixels.iter().flatten().copied().collect();
        let img = image::RgbaImage::from_raw(width, height, raw).unwrap();
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn name<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
        dict.get(key).and_then(Object::as_name).ok()
    }

    /// The colour image XObject (not its soft mask).
    fn logo_xobject(bytes: &[u8]) -> (Document, Dictionary) {
        let doc = Document::load_mem(bytes).unwrap();
        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .map(|s| &s.dict)
            .find(|d| {
                name(d, b"Subtype") == Some(&b"Image"[..])
                    && name(d, b"ColorSpace") == Some(&b"DeviceRGB"[..])
            })
            .cloned()
            .unwrap();
        (doc, image)
    }

    #[test]
    fn test_encode_with_png_logo() {
        let opaque = png(
            &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [9, 9, 9, 255]],
            2,
        );
        let mut s = state();
        s.logo = Some(Logo::new(opaque, "image/png"));
        let doc = render(&Snapshot::of(&s), &Layout::default());
        let bytes = encode(&doc).unwrap();

        assert!(page_operations(&bytes).iter().any(|op| op.operator == "Do"));
        let (_, image) = logo_xobject(&bytes);
        assert_eq!(image.get(b"Width").unwrap().as_i64().unwrap(), 2);
        assert_eq!(name(&image, b"Filter"), Some(&b"FlateDecode"[..]));
        assert!(!image.has(b"SMask"));
    }

    #[test]
    fn test_png_alpha_becomes_soft_mask() {
        let translucent = png(&[[255, 0, 0, 128], [0, 0, 0, 0]], 2);
        let mut s = state();
        s.logo = Some(Logo::new(translucent, "image/png"));
        let bytes = encode(&render(&Snapshot::of(&s), &Layout::default())).unwrap();

        let (pdf, image) = logo_xobject(&bytes);
        let mask_id = image.get(b"SMask").unwrap().as_reference().unwrap();
        let mask = pdf.get_object(mask_id).unwrap().as_stream().unwrap();
        assert_eq!(name(&mask.dict, b"ColorSpace"), Some(&b"DeviceGray"[..]));
    }

    #[test]
    fn test_format_comes_from_bytes_not_mime() {
        let mut s = state();
        s.logo = Some(Logo::new(tiny_jpeg(), "image/png"));
        let doc = render(&Snapshot::of(&s), &Layout::default());
        let ops = page_operations(&encode(&doc).unwrap());
        assert!(ops.iter().any(|op| op.operator == "Do"));
    }

    #[test]
    fn test_unknown_logo_format() {
        let mut s = state();
        s.logo = Some(Logo::new(b"not an image".to_vec(), "image/webp"));
        let doc = render(&Snapshot::of(&s), &Layout::default());
        assert!(matches!(
            encode(&doc),
            Err(RenderError::UnsupportedImage(m)) if m == "image/webp"
        ));
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let mut s = state();
        let mut bytes = png(&[[1, 2, 3, 255]], 1);
        bytes.truncate(20);
        s.logo = Some(Logo::new(bytes, "image/png"));
        let doc = render(&Snapshot::of(&s), &Layout::default());
        assert!(matches!(encode(&doc), Err(RenderError::Decode(_))));
    }

    #[test]
    fn test_win_ansi_fallback() {
        let Object::String(bytes, _) = win_ansi("Zoë→") else {
            panic!("expected a string object");
        };
        assert_eq!(bytes, vec![b'Z', b'o', 0xEB, b'?']);
    }
}
