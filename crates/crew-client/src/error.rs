use crew_core::config::ConfigError;
use crew_core::store::StoreError;
use crew_core::wizard::WizardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to the crew backend at {url}. Is it running?\n  (hint: check --api-url or api.base_url in config.toml)")]
    Connect { url: String },

    #[error("request to {url} timed out; the backend may be overloaded")]
    Timeout { url: String },

    #[error("{method} {url} failed (HTTP {status}){}", detail_suffix(.body))]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn detail_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

/// Map reqwest errors to messages a user can act on.
pub fn friendly(err: reqwest::Error, url: &str) -> ClientError {
    let url = url.to_string();
    if err.is_connect() {
        ClientError::Connect { url }
    } else if err.is_timeout() {
        ClientError::Timeout { url }
    } else if err.is_decode() {
        ClientError::Decode {
            url,
            reason: err.to_string(),
        }
    } else {
        ClientError::Http {
            url,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_includes_body_only_when_present() {
        let err = ClientError::Status {
            method: "POST",
            url: "http://x/api/sessions/1/start".into(),
            status: 404,
            body: "{\"detail\":\"Session not found\"}".into(),
        };
        let text = err.to_string();
        assert!(text.contains("HTTP 404"));
        assert!(text.contains("Session not found"));

        let err = ClientError::Status {
            method: "GET",
            url: "http://x".into(),
            status: 500,
            body: "  ".into(),
        };
        assert!(err.to_string().ends_with("(HTTP 500)"));
    }

    #[test]
    fn wizard_errors_pass_through() {
        let err: ClientError = WizardError::NoAgents.into();
        assert_eq!(err.to_string(), WizardError::NoAgents.to_string());
    }
}
