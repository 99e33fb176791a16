use thiserror::Error;
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("channel `{id}` has an unusable range {min}..{max}: need finite min below max")]
    DivisionDegenerate { id: String, min: f32, max: f32 },
    #[error("unknown channel `{0}`")]
    UnknownChannel(String),
    #[error("no current reading for channel `{0}`")]
    MissingReading(String),
    #[error("channel `{0}` is declared more than once")]
    DuplicateChannel(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for TelemetryError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        TelemetryError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for TelemetryError {
    fn from(value: image::ImageError) -> Self {
        TelemetryError::Plot(value.to_string())
    }
}
