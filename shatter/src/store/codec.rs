//! WKT encoding and decoding of store geometries.

use geo_types::{Geometry, MultiPolygon, Polygon};
use std::str::FromStr;
use wkt::ToWkt;

use super::error::StoreError;

/// Parse WKT text into a geometry.
pub fn parse_geometry(text: &str) -> Result<Geometry<f64>, StoreError> {
    wkt::Wkt::from_str(text)
        .map_err(|e| StoreError::Wkt(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| StoreError::Wkt(format!("{:?}", e)))
        })
}

/// Parse a grid cell geometry. A multipolygon with a single member is
/// accepted as that member.
pub fn parse_polygon(text: &str) -> Result<Polygon<f64>, StoreError> {
    match parse_geometry(text)? {
        Geometry::Polygon(polygon) => Ok(polygon),
        Geometry::MultiPolygon(mut multi) if multi.0.len() == 1 => Ok(multi.0.remove(0)),
        other => Err(StoreError::UnexpectedGeometry {
            expected: "Polygon",
            found: geometry_name(&other).to_string(),
        }),
    }
}

/// Parse a candidate geometry. Single polygons are wrapped.
pub fn parse_multipolygon(text: &str) -> Result<MultiPolygon<f64>, StoreError> {
    match parse_geometry(text)? {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Ok(multi),
        other => Err(StoreError::UnexpectedGeometry {
            expected: "MultiPolygon",
            found: geometry_name(&other).to_string(),
        }),
    }
}

pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    polygon.wkt_string()
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        #[allow(unreachable_patterns)]
        _ => "Geometry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn test_parse_polygon() {
        let polygon = parse_polygon("POLYGON((0 0, 2 0, 2 1, 0 1, 0 0))").unwrap();
        assert_eq!(polygon.unsigned_area(), 2.0);
    }

    #[test]
    fn test_parse_single_member_multipolygon_as_polygon() {
        let polygon = parse_polygon("MULTIPOLYGON(((0 0, 1 0, 1 1, 0 1, 0 0)))").unwrap();
        assert_eq!(polygon.unsigned_area(), 1.0);
    }

    #[test]
    fn test_parse_polygon_rejects_points() {
        assert!(matches!(
            parse_polygon("POINT(1 2)"),
            Err(StoreError::UnexpectedGeometry { found, .. }) if found == "Point"
        ));
    }

    #[test]
    fn test_parse_multipolygon_wraps_polygon() {
        let multi = parse_multipolygon("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        assert_eq!(multi.0.len(), 1);
    }

    #[test]
    fn test_invalid_wkt() {
        assert!(matches!(parse_geometry("POLYGON((0 0,"), Err(StoreError::Wkt(_))));
    }

    #[test]
    fn test_polygon_wkt_round_trip() {
        let polygon = parse_polygon("POLYGON((0 0, 3 0, 3 3, 0 0))").unwrap();
        let text = polygon_to_wkt(&polygon);
        assert!(text.starts_with("POLYGON"));
        assert_eq!(parse_polygon(&text).unwrap(), polygon);
    }
}
