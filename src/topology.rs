use crate::error::VizError;
use geo::MultiPolygon;
use geojson::feature::Id;
use std::convert::TryInto;
use topojson::TopoJson;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Feature {
    pub id: Option<String>,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

pub fn decode_features(json: &str, object: &str) -> Result<Vec<Feature>, VizError> {
    let topology = match json.parse::<TopoJson>() {
        Ok(TopoJson::Topology(topology)) => topology,
        Ok(_) => return Err(VizError::Topology("expected a Topology document".to_string())),
        Err(e) => return Err(VizError::Topology(format!("{:?}", e))),
    };
    if !topology.objects.iter().any(|o| o.name == object) {
        return Err(VizError::Topology(format!("object '{}' not found", object)));
    }

    let collection = topojson::to_geojson(&topology, &object.to_string())
        .map_err(|e| VizError::Topology(format!("{:?}", e)))?;

    let mut features = Vec::new();
    for feature in collection.features {
        let id = feature.id.as_ref().map(|id| match id {
            Id::String(s) => s.clone(),
            Id::Number(n) => n.to_string(),
        });
        let name = feature
            .property("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        // geojson Value -> geo types -> MultiPolygon
        let geometry = match feature.geometry {
            Some(geometry) => {
                let shape: geo::Geometry<f64> = match geometry.value.try_into() {
                    Ok(shape) => shape,
                    Err(e) => {
                        warn!("Skipping feature {:?}: {:?}", id, e);
                        continue;
                    }
                };
                match shape {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // Skip points/lines
                }
            }
            None => continue,
        };

        features.push(Feature { id, name, geometry });
    }
    Ok(features)
}
