use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("container '#{0}' not found in page")]
    MissingContainer(String),

    #[error("failed to load base map: {0}")]
    BaseMap(String),

    #[error("invalid topology: {0}")]
    Topology(String),

    #[error("missing coordinates for '{0}'")]
    MissingCoordinates(String),

    #[error("unknown graph node '{0}'")]
    UnknownNode(String),

    #[error("unknown chart '{0}'")]
    UnknownChart(String),
}
