use crate::utils::error::{LocalityError, Result};

pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
    "https://maps.mail.ru/osm/tools/overpass/api/interpreter",
];

/// Interchangeable upstream endpoints, tried round-robin by attempt number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPool {
    endpoints: Vec<String>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<String>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(LocalityError::ConfigValidationError {
                field: "upstream.endpoints".to_string(),
                message: "at least one endpoint is required".to_string(),
            });
        }
        Ok(Self { endpoints })
    }

    /// Endpoint for a zero-based attempt number.
    pub fn for_attempt(&self, attempt: u32) -> &str {
        &self.endpoints[attempt as usize % self.endpoints.len()]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for EndpointPool {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}
