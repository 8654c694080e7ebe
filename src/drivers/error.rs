use thiserror::Error;
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("row has {actual} values but the table has {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },
    #[error("missing `{0}` column in header")]
    MissingTimeColumn(&'static str),
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
    #[error("malformed csv: {0}")]
    Csv(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for DashboardError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        DashboardError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for DashboardError {
    fn from(value: image::ImageError) -> Self {
        DashboardError::Plot(value.to_string())
    }
}
