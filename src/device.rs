use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;

pub const DEVICE_HEADER: &str = "x-device-id";

/// The device identifier accompanying a request, if any. An opaque
/// client-held token used to scope data visibility; it is not a credential.
#[derive(Debug, Clone, Default)]
pub struct DeviceScope(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for DeviceScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(DEVICE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(Self(id))
    }
}

impl DeviceScope {
    pub fn existing(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Reads with no device see an empty world, so a direct lookup without a
    /// device id resolves to "not found" rather than an error.
    pub fn require(&self) -> Result<&str, AppError> {
        self.existing().ok_or(AppError::NotFound)
    }

    /// For writes that create new top-level state: use the supplied id, or
    /// mint one that the client is expected to persist. The caller must echo
    /// a minted id back via the `X-Device-Id` response header.
    pub fn resolve_or_mint(&self) -> ResolvedDevice {
        match self.existing() {
            Some(id) => ResolvedDevice {
                id: id.to_string(),
                minted: false,
            },
            None => ResolvedDevice {
                id: Uuid::new_v4().to_string(),
                minted: true,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedDevice {
    pub id: String,
    pub minted: bool,
}

/// Device ids never reach a log sink raw; log fields carry this truncated
/// digest instead.
pub fn redact(device_id: &str) -> String {
    let digest = Sha256::digest(device_id.as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("device:{}", &hex[..12])
}
