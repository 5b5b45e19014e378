use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user ID
    #[serde(rename = "gen")]
    pub generation: i32, // session generation at signing time
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
