use serde::{Deserialize, Serialize};

/// Request body for link creation.
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "shortUrl")]
    pub short_url: String,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub status: &'static str,
    pub url: String,
    #[serde(rename = "shortUrl")]
    pub short_url: String,
}
