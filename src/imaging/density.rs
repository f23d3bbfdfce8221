//! Minimal pixel-density reader for JPEG and PNG.
//!
//! The `image` crate decodes pixels but does not surface the resolution an
//! image was tagged with. This reads it directly:
//! - JPEG: JFIF APP0 segment (units + X/Y density)
//! - PNG: `pHYs` chunk (pixels per unit, unit 1 = metre)
//!
//! Anything else, or an image without a usable density, reports `None` and
//! callers fall back to [`DEFAULT_DPI`].

/// Resolution assumed when an image does not carry one.
pub const DEFAULT_DPI: f64 = 96.0;

const JFIF_IDENTIFIER: &[u8] = b"JFIF\0";
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const INCHES_PER_METRE: f64 = 0.0254;
const CM_PER_INCH: f64 = 2.54;

/// Read the horizontal and vertical DPI an image was tagged with.
pub fn read_density(data: &[u8]) -> Option<(f64, f64)> {
    if data.starts_with(&[0xFF, 0xD8]) {
        read_jfif_density(data)
    } else if data.starts_with(PNG_SIGNATURE) {
        read_png_density(data)
    } else {
        None
    }
}

/// Like [`read_density`], falling back to [`DEFAULT_DPI`] on both axes.
pub fn density_or_default(data: &[u8]) -> (f64, f64) {
    read_density(data).unwrap_or((DEFAULT_DPI, DEFAULT_DPI))
}

// ---------------------------------------------------------------------------
// JPEG: JFIF APP0
// ---------------------------------------------------------------------------

/// APP0 payload layout after the "JFIF\0" identifier:
///   Bytes 0-1: version
///   Byte 2:    units (0 = aspect ratio only, 1 = dots/inch, 2 = dots/cm)
///   Bytes 3-4: X density (big-endian u16)
///   Bytes 5-6: Y density (big-endian u16)
fn read_jfif_density(data: &[u8]) -> Option<(f64, f64)> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS — image data starts, no more header segments
        if marker == 0xDA {
            return None;
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 {
            return None;
        }
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());

        if marker == 0xE0 {
            let segment = data.get(seg_start..seg_end).unwrap_or_default();
            if let Some(payload) = segment
                .strip_prefix(JFIF_IDENTIFIER)
                .filter(|payload| payload.len() >= 7)
            {
                let units = payload[2];
                let x = u16::from_be_bytes([payload[3], payload[4]]) as f64;
                let y = u16::from_be_bytes([payload[5], payload[6]]) as f64;
                if x == 0.0 || y == 0.0 {
                    return None;
                }
                return match units {
                    1 => Some((x, y)),
                    2 => Some((x * CM_PER_INCH, y * CM_PER_INCH)),
                    _ => None,
                };
            }
        }

        pos += 2 + seg_len;
    }
    None
}

// ---------------------------------------------------------------------------
// PNG: pHYs chunk
// ---------------------------------------------------------------------------

/// Chunk layout: length (4) + type (4) + data (length) + CRC (4).
/// pHYs data: X pixels per unit (4) + Y pixels per unit (4) + unit (1).
fn read_png_density(data: &[u8]) -> Option<(f64, f64)> {
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= data.len() {
        let len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let chunk_type = &data[pos + 4..pos + 8];
        let body_start = pos + 8;
        let body_end = body_start.checked_add(len)?;
        if body_end > data.len() {
            return None;
        }

        match chunk_type {
            b"pHYs" if len >= 9 => {
                let body = &data[body_start..body_end];
                let x = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f64;
                let y = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as f64;
                if body[8] != 1 || x == 0.0 || y == 0.0 {
                    return None;
                }
                return Some((x * INCHES_PER_METRE, y * INCHES_PER_METRE));
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }

        pos = body_end + 4;
    }
    None
}
