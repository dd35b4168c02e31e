//! Static district boundaries and their centroids

use geo_types::{Geometry, LineString, Polygon};
use geojson::{feature::Id, FeatureCollection, GeoJson};
use shared::Coordinate;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read district file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid district GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("district file must be a FeatureCollection")]
    NotACollection,

    #[error("district {index} has no usable geometry")]
    MissingGeometry { index: usize },

    #[error("district {index} has non-numeric id {id}")]
    InvalidId { index: usize, id: String },

    #[error("district {index} is out of range (1..={total})")]
    OutOfRange { index: u32, total: usize },
}

/// One administrative district. `id` is always a canonical decimal number so
/// the cached document can be addressed by a numeric `districtID`.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub id: String,
    pub name: String,
    pub centroid: Coordinate,
}

/// Ordered list of districts, addressed by 1-based position
#[derive(Debug, Clone, Default)]
pub struct DistrictCatalog {
    districts: Vec<District>,
}

impl DistrictCatalog {
    pub fn load(path: impl AsRef<Path>, name_property: &str) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_geojson_str(&raw, name_property)?;
        tracing::info!(
            "Loaded {} districts from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_geojson_str(raw: &str, name_property: &str) -> Result<Self, CatalogError> {
        let collection = match raw.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection,
            _ => return Err(CatalogError::NotACollection),
        };
        Self::from_collection(collection, name_property)
    }

    pub fn from_collection(
        collection: FeatureCollection,
        name_property: &str,
    ) -> Result<Self, CatalogError> {
        let districts = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(i, feature)| {
                let index = i + 1;
                let id = district_id(feature.id.as_ref(), index)?;
                let name = feature
                    .property(name_property)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let centroid = feature
                    .geometry
                    .and_then(|g| Geometry::<f64>::try_from(g).ok())
                    .and_then(|g| vertex_centroid(&g))
                    .ok_or(CatalogError::MissingGeometry { index })?;

                Ok(District { id, name, centroid })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(Self { districts })
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// District at a 1-based position
    pub fn district(&self, index: u32) -> Result<&District, CatalogError> {
        (index as usize)
            .checked_sub(1)
            .and_then(|i| self.districts.get(i))
            .ok_or(CatalogError::OutOfRange {
                index,
                total: self.districts.len(),
            })
    }
}

/// Feature id as a canonical number, falling back to the 1-based position.
/// Ids follow the `districtID` query parameter's range.
fn district_id(id: Option<&Id>, index: usize) -> Result<String, CatalogError> {
    let (raw, parsed) = match id {
        None => return Ok(index.to_string()),
        Some(Id::Number(n)) => (
            n.to_string(),
            n.as_u64().and_then(|v| u32::try_from(v).ok()),
        ),
        Some(Id::String(s)) => (s.clone(), s.trim().parse::<u32>().ok()),
    };
    parsed
        .map(|n| n.to_string())
        .ok_or(CatalogError::InvalidId { index, id: raw })
}

/// Mean of every vertex of the geometry. Polygon rings are closed, so each
/// ring's repeated closing vertex is left out.
pub fn vertex_centroid(geometry: &Geometry<f64>) -> Option<Coordinate> {
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut count = 0usize;
    accumulate(geometry, &mut |x, y| {
        sum_x += x;
        sum_y += y;
        count += 1;
    });

    (count > 0).then(|| Coordinate::new(sum_y / count as f64, sum_x / count as f64))
}

fn accumulate(geometry: &Geometry<f64>, visit: &mut impl FnMut(f64, f64)) {
    match geometry {
        Geometry::Point(p) => visit(p.x(), p.y()),
        Geometry::MultiPoint(mp) => mp.iter().for_each(|p| visit(p.x(), p.y())),
        Geometry::Line(l) => {
            visit(l.start.x, l.start.y);
            visit(l.end.x, l.end.y);
        }
        Geometry::LineString(ls) => ls.coords().for_each(|c| visit(c.x, c.y)),
        Geometry::MultiLineString(mls) => mls
            .iter()
            .flat_map(|ls| ls.coords())
            .for_each(|c| visit(c.x, c.y)),
        Geometry::Polygon(polygon) => accumulate_polygon(polygon, visit),
        Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| accumulate_polygon(p, visit)),
        Geometry::Rect(rect) => accumulate_polygon(&rect.to_polygon(), visit),
        Geometry::Triangle(tri) => accumulate_polygon(&tri.to_polygon(), visit),
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| accumulate(g, visit)),
    }
}

fn accumulate_polygon(polygon: &Polygon<f64>, visit: &mut impl FnMut(f64, f64)) {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .for_each(|ring| accumulate_ring(ring, visit));
}

fn accumulate_ring(ring: &LineString<f64>, visit: &mut impl FnMut(f64, f64)) {
    let coords = &ring.0;
    let open_len = if ring.is_closed() && coords.len() > 1 {
        coords.len() - 1
    } else {
        coords.len()
    };
    coords[..open_len].iter().for_each(|c| visit(c.x, c.y));
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 1,
                "properties": { "dtname": "Square" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[76.0, 28.0], [78.0, 28.0], [78.0, 30.0], [76.0, 30.0], [76.0, 28.0]]]
                }
            },
            {
                "type": "Feature",
                "id": "0712",
                "properties": { "dtname": "Islands" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]],
                        [[[10.0, 10.0], [12.0, 10.0], [12.0, 12.0], [10.0, 10.0]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [80.5, 12.25] }
            }
        ]
    }"#;

    #[test]
    fn test_load_collection() {
        let catalog = DistrictCatalog::from_geojson_str(DISTRICTS, "dtname").unwrap();
        assert_eq!(catalog.len(), 3);

        let square = catalog.district(1).unwrap();
        assert_eq!(square.id, "1");
        assert_eq!(square.name, "Square");
        assert_eq!(square.centroid, Coordinate::new(29.0, 77.0));
    }

    #[test]
    fn test_multipolygon_vertex_mean() {
        let catalog = DistrictCatalog::from_geojson_str(DISTRICTS, "dtname").unwrap();
        let islands = catalog.district(2).unwrap();
        assert_eq!(islands.id, "712");
        // six open-ring vertices: x = 0,2,2,10,12,12  y = 0,0,2,10,10,12
        assert!((islands.centroid.longitude - 38.0 / 6.0).abs() < 1e-12);
        assert!((islands.centroid.latitude - 34.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_id_falls_back_to_position() {
        let catalog = DistrictCatalog::from_geojson_str(DISTRICTS, "dtname").unwrap();
        let third = catalog.district(3).unwrap();
        assert_eq!(third.id, "3");
        assert_eq!(third.name, "");
        assert_eq!(third.centroid, Coordinate::new(12.25, 80.5));
    }

    #[test]
    fn test_out_of_range() {
        let catalog = DistrictCatalog::from_geojson_str(DISTRICTS, "dtname").unwrap();
        assert!(matches!(
            catalog.district(0),
            Err(CatalogError::OutOfRange { index: 0, total: 3 })
        ));
        assert!(catalog.district(4).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": "D-2",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            }]
        }"#;
        assert!(matches!(
            DistrictCatalog::from_geojson_str(raw, "dtname"),
            Err(CatalogError::InvalidId { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_non_collection() {
        let single = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        assert!(matches!(
            DistrictCatalog::from_geojson_str(single, "dtname"),
            Err(CatalogError::NotACollection)
        ));
    }
}
