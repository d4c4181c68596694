use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Credentials sent to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login: the bearer token and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Identity,
}
