pub mod catalog;
pub mod run;
pub mod session;
pub mod settings;

use crew_client::ApiClient;
use crew_core::config::Config;
use crew_core::credential::CredentialStore;
use crew_core::settings::SettingsManager;

/// Everything a subcommand needs: resolved config and where the key lives.
pub struct Context {
    pub config: Config,
    pub settings: SettingsManager,
}

impl Context {
    pub fn new(config: Config, settings: SettingsManager) -> Self {
        Self { config, settings }
    }

    pub fn api(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::from_config(&self.config.api)?)
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::load(self.settings.clone())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use axum::Router;

    use super::*;

    pub fn tmp_settings_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("crew-cli-test-{}", uuid::Uuid::new_v4()))
            .join("settings.toml")
    }

    pub fn cleanup(path: &PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    /// Context pointing at `base` (which must include `/api`) with a fresh
    /// settings file.
    pub fn context(base: &str) -> Context {
        let mut config = Config::default();
        config.api.base_url = base.to_string();
        Context::new(config, SettingsManager::new(tmp_settings_path()))
    }

    /// Serve `app` on an ephemeral port and return `http://addr/api`.
    pub async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }
}
