use crate::error::VizError;
use crate::topology::{self, Feature};
use geo::MultiPolygon;
use tracing::info;

pub const FALLBACK_MESSAGE: &str =
    "Unable to load map data. Please check the network connection or data source.";

#[derive(Debug, Clone)]
pub struct BaseMap {
    pub countries: Vec<Feature>,
}

impl BaseMap {
    pub fn from_topojson(json: &str, object: &str) -> Result<Self, VizError> {
        let countries = topology::decode_features(json, object)?;
        Ok(Self { countries })
    }

    pub fn shapes(&self) -> Vec<&MultiPolygon<f64>> {
        self.countries.iter().map(|c| &c.geometry).collect()
    }
}

pub async fn fetch_base_map(url: &str, object: &str) -> Result<BaseMap, VizError> {
    info!("Fetching base map from {}", url);
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| VizError::BaseMap(e.to_string()))?;
    let body = response
        .text()
        .await
        .map_err(|e| VizError::BaseMap(e.to_string()))?;
    let map = BaseMap::from_topojson(&body, object)
        .map_err(|e| VizError::BaseMap(e.to_string()))?;
    info!("Base map loaded with {} countries", map.countries.len());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::TWO_SQUARES;

    #[test]
    fn builds_from_inline_topology() {
        let map = BaseMap::from_topojson(TWO_SQUARES, "countries").unwrap();
        assert_eq!(map.shapes().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_url_is_a_base_map_error() {
        let err = fetch_base_map("http://127.0.0.1:9/countries.json", "countries")
            .await
            .unwrap_err();
        assert!(matches!(err, VizError::BaseMap(_)));
    }
}
