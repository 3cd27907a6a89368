pub mod v1;

/// Mount point of the versioned API.
pub const API_PREFIX: &str = "/api/v1";
