//! Admin gate for the export endpoints.
//!
//! One shared static bearer token, injected through configuration rather
//! than baked in as a constant. There are no sessions or per-user
//! identities behind it; rotation means redeploying with a new value.
use axum::http::{HeaderMap, header::AUTHORIZATION};
use tracing::{error, warn};

use crate::{config::Config, error::AppError};

pub fn verify_admin(config: &Config, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(token) = config.admin_token.as_deref() else {
        error!("EXPORT_ADMIN_TOKEN is not configured, refusing export request");
        return Err(AppError::Misconfigured);
    };

    let supplied = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match supplied {
        Some(header) if header.strip_prefix("Bearer ") == Some(token) => Ok(()),
        _ => {
            warn!("Unauthorized attempt to access admin export endpoint");
            Err(AppError::Unauthorized)
        }
    }
}
