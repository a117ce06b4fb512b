//! Filters for the historical logs endpoint.

use crate::date::{DateParseError, format_date_bound};

/// Query parameters for [`LogsClient::get_logs_range`].
///
/// All filters are optional. Empty strings count as absent.
///
/// [`LogsClient::get_logs_range`]: crate::client::LogsClient::get_logs_range
///
/// # Example
///
/// ```
/// use facespace_logs::range::RangeQuery;
///
/// let query = RangeQuery::new().start("2024-01-05 08:00").camera_id("cam-3");
/// let params = query.to_params().unwrap();
/// assert_eq!(params[0], ("start_time", "08:00 05/01/24".to_string()));
/// assert_eq!(params[1], ("camera_id", "cam-3".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeQuery {
    /// Lower bound of the range
    pub start: Option<String>,
    /// Upper bound of the range
    pub end: Option<String>,
    /// Camera to filter by
    pub camera_id: Option<String>,
}

impl RangeQuery {
    /// Creates an unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lower bound.
    #[must_use]
    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Sets the camera filter.
    #[must_use]
    pub fn camera_id(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }

    /// Builds the query string pairs, formatting date bounds.
    ///
    /// # Errors
    ///
    /// Returns [`DateParseError`] if a bound is not a recognizable date.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, DateParseError> {
        let mut params = Vec::with_capacity(3);

        if let Some(start) = present(self.start.as_deref()) {
            params.push(("start_time", format_date_bound(start)?));
        }
        if let Some(end) = present(self.end.as_deref()) {
            params.push(("end_time", format_date_bound(end)?));
        }
        if let Some(camera_id) = present(self.camera_id.as_deref()) {
            params.push(("camera_id", camera_id.to_string()));
        }

        Ok(params)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
