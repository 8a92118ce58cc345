//! Polyline representation for route geometries.
//!
//! Routes travel through the engine as decoded coordinate sequences.
//! The compact encoded form (Google encoded polyline algorithm, used by
//! OpenRouteService) only exists at the provider boundary.

use serde::{Deserialize, Serialize};

use crate::error::PolylineError;
use crate::model::Coordinate;

/// Precision used by OpenRouteService for 2D geometries.
pub const DEFAULT_PRECISION: u32 = 5;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline with `precision` decimal digits.
    ///
    /// Points come out in encode order.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut offset = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;
        let mut points = Vec::new();

        while offset < bytes.len() {
            let start = offset;
            lat = lat
                .checked_add(next_value(bytes, &mut offset)?)
                .ok_or(PolylineError::Overflow { offset: start })?;
            let start = offset;
            lng = lng
                .checked_add(next_value(bytes, &mut offset)?)
                .ok_or(PolylineError::Overflow { offset: start })?;
            points.push(Coordinate::new(lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    /// Encodes the points with `precision` decimal digits.
    pub fn encode(&self, precision: u32) -> String {
        let factor = 10f64.powi(precision as i32);
        let mut out = String::new();
        let mut prev_lat: i64 = 0;
        let mut prev_lng: i64 = 0;

        for point in &self.points {
            let lat = (point.latitude * factor).round() as i64;
            let lng = (point.longitude * factor).round() as i64;
            push_value(lat - prev_lat, &mut out);
            push_value(lng - prev_lng, &mut out);
            prev_lat = lat;
            prev_lng = lng;
        }

        out
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn next_value(bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes
            .get(*offset)
            .ok_or(PolylineError::Truncated { offset: *offset })?;
        if !(63..127).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                byte,
                offset: *offset,
            });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow { offset: *offset });
        }
        *offset += 1;

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn push_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push(char::from((0x20 | (v & 0x1f)) as u8 + 63));
        v >>= 5;
    }
    out.push(char::from(v as u8 + 63));
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn reference_points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(38.5, -120.2),
            Coordinate::new(40.7, -120.95),
            Coordinate::new(43.252, -126.453),
        ]
    }

    fn assert_close(actual: &[Coordinate], expected: &[Coordinate]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.latitude - e.latitude).abs() < 1e-9, "{:?} != {:?}", a, e);
            assert!((a.longitude - e.longitude).abs() < 1e-9, "{:?} != {:?}", a, e);
        }
    }

    #[test]
    fn test_decode_reference_polyline() {
        let polyline = Polyline::decode(REFERENCE, 5).unwrap();
        assert_close(polyline.points(), &reference_points());
    }

    #[test]
    fn test_encode_reference_polyline() {
        let polyline = Polyline::new(reference_points());
        assert_eq!(polyline.encode(5), REFERENCE);
    }

    #[test]
    fn test_precision_six() {
        let points = vec![Coordinate::new(5.068912, -75.517438), Coordinate::new(5.070001, -75.513)];
        let encoded = Polyline::new(points.clone()).encode(6);
        let decoded = Polyline::decode(&encoded, 6).unwrap();
        assert_close(decoded.points(), &points);
    }

    #[test]
    fn test_decode_empty() {
        let polyline = Polyline::decode("", DEFAULT_PRECISION).unwrap();
        assert!(polyline.is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        // Drop the final longitude chunk
        let err = Polyline::decode(&REFERENCE[..REFERENCE.len() - 3], 5).unwrap_err();
        assert!(matches!(err, PolylineError::Truncated { .. }), "got {:?}", err);
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = Polyline::decode("_p~iF ps|U", 5).unwrap_err();
        assert_eq!(err, PolylineError::InvalidCharacter { byte: b' ', offset: 5 });
    }

    #[test]
    fn test_decode_accumulated_overflow() {
        // Each copy adds a ~4e18 latitude delta; the third one exceeds i64
        let single = Polyline::new(vec![Coordinate::new(4.0e13, 0.0)]).encode(5);
        let err = Polyline::decode(&single.repeat(3), 5).unwrap_err();
        assert!(matches!(err, PolylineError::Overflow { .. }), "got {:?}", err);
    }

    #[test]
    fn test_into_points() {
        let polyline = Polyline::new(reference_points());
        assert_eq!(polyline.len(), 3);
        assert_eq!(polyline.into_points(), reference_points());
    }
}
