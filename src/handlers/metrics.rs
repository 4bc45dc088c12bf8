use crate::error::{AppError, Result};
use crate::metrics::render;

pub async fn metrics_handler() -> Result<String> {
    render().map_err(AppError::Metrics)
}
