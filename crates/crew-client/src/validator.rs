use async_trait::async_trait;
use crew_core::credential::{KeyValidator, ValidatorUnavailable};

use crate::api::ApiClient;

#[async_trait]
impl KeyValidator for ApiClient {
    async fn validate_key(&self, key: &str) -> Result<bool, ValidatorUnavailable> {
        match self.check_key(key).await {
            Ok(resp) => {
                if let Some(message) = &resp.message {
                    tracing::debug!(valid = resp.valid, message = %message, "validator answered");
                }
                Ok(resp.valid)
            }
            Err(e) => Err(ValidatorUnavailable(e.to_string())),
        }
    }
}
