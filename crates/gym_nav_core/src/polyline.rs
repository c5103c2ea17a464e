//! Encoded polyline codec (precision 1e5).
//!
//! Each coordinate is stored as the signed delta from the previous one,
//! zig-zag folded, split into 5-bit chunks (low chunk first, bit 0x20 marks
//! continuation) and offset by 63 into printable ASCII.

use thiserror::Error;

use crate::model::LatLng;

const PRECISION: f64 = 1e5;
const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const ASCII_OFFSET: u8 = 63;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolylineError {
    #[error("invalid character {ch:?} at byte {index}")]
    InvalidCharacter { ch: char, index: usize },

    #[error("truncated value at byte {index}")]
    Truncated { index: usize },

    #[error("value too long at byte {index}")]
    Overflow { index: usize },

    #[error("coordinate out of range at byte {index}")]
    OutOfRange { index: usize },
}

pub fn decode(encoded: &str) -> Result<Vec<LatLng>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut idx = 0usize;
    let mut lat = 0i64;
    let mut lng = 0i64;
    let mut out = Vec::with_capacity(bytes.len() / 4);

    while idx < bytes.len() {
        lat += next_value(bytes, &mut idx)?;
        lng += next_value(bytes, &mut idx)?;

        let point = LatLng::new(lat as f64 / PRECISION, lng as f64 / PRECISION);
        if !point.is_valid() {
            return Err(PolylineError::OutOfRange { index: idx });
        }
        out.push(point);
    }

    Ok(out)
}

fn next_value(bytes: &[u8], idx: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let Some(&b) = bytes.get(*idx) else {
            return Err(PolylineError::Truncated { index: *idx });
        };
        if !(ASCII_OFFSET..=126).contains(&b) {
            return Err(PolylineError::InvalidCharacter {
                ch: b as char,
                index: *idx,
            });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow { index: *idx });
        }

        let chunk = i64::from(b - ASCII_OFFSET);
        *idx += 1;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

pub fn encode(points: &[LatLng]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for p in points {
        let lat = (p.latitude * PRECISION).round() as i64;
        let lng = (p.longitude * PRECISION).round() as i64;
        push_value(lat - prev_lat, &mut out);
        push_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(v: i64, out: &mut String) {
    let mut v = if v < 0 { !(v << 1) } else { v << 1 };
    while v >= CONTINUATION {
        out.push(((CONTINUATION | (v & CHUNK_MASK)) as u8 + ASCII_OFFSET) as char);
        v >>= CHUNK_BITS;
    }
    out.push((v as u8 + ASCII_OFFSET) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn assert_close(actual: &[LatLng], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, (lat, lng)) in actual.iter().zip(expected) {
            assert!((a.latitude - lat).abs() < 1e-5, "{a:?} vs {lat}");
            assert!((a.longitude - lng).abs() < 1e-5, "{a:?} vs {lng}");
        }
    }

    #[test]
    fn decodes_reference_polyline() {
        let points = decode(REFERENCE).expect("reference polyline decodes");
        assert_close(
            &points,
            &[(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)],
        );
    }

    #[test]
    fn encodes_reference_polyline() {
        let points = [
            LatLng::new(38.5, -120.2),
            LatLng::new(40.7, -120.95),
            LatLng::new(43.252, -126.453),
        ];
        assert_eq!(encode(&points), REFERENCE);
    }

    #[test]
    fn empty_input_is_empty_path() {
        assert_eq!(decode("").unwrap(), Vec::new());
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn dangling_latitude_is_truncated() {
        // "_p~iF" is a complete latitude with no longitude after it
        assert_eq!(decode("_p~iF"), Err(PolylineError::Truncated { index: 5 }));
    }

    #[test]
    fn unfinished_chunk_is_truncated() {
        // '_' has the continuation bit set
        assert!(matches!(
            decode("_p~"),
            Err(PolylineError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_characters_below_offset() {
        assert_eq!(
            decode("_p~iF ps|U"),
            Err(PolylineError::InvalidCharacter { ch: ' ', index: 5 })
        );
    }
}
