use crew_core::credential::ValidationOutcome;
use crew_core::settings::mask;

use super::Context;

/// Run `settings show`.
pub fn show(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.credentials();
    let prefs = store.preferences();

    println!("Settings  ({})", ctx.settings.path().display());
    println!("{}", "-".repeat(40));
    println!("API key:   {}", mask(store.credential()));
    println!("Validated: {}", if store.is_validated() { "yes" } else { "no" });
    println!("Theme:     {}", prefs.theme);
    println!("Language:  {}", prefs.language);
    println!("Backend:   {}", ctx.config.api.rest_base());

    Ok(())
}

/// Run `settings set-key`: store without validating.
pub fn set_key(ctx: &Context, key: &str) -> anyhow::Result<()> {
    let mut store = ctx.credentials();
    store.set_credential(key.trim());
    println!("Stored key {}. Run `crew settings validate` before starting a crew.", mask(store.credential()));
    Ok(())
}

/// Run `settings validate [key]`. Without an argument the stored key is
/// re-checked.
pub async fn validate(ctx: &Context, key: Option<&str>) -> anyhow::Result<()> {
    let mut store = ctx.credentials();
    let key = match key {
        Some(key) => key.to_string(),
        None if !store.credential().is_empty() => store.credential().to_string(),
        None => anyhow::bail!("No key given and none stored. Usage: crew settings validate <key>"),
    };

    let api = ctx.api()?;
    let outcome = store.validate(&key, &api).await;
    match outcome {
        ValidationOutcome::TooShort => {
            anyhow::bail!("Key is too short to be a valid API key.")
        }
        ValidationOutcome::Confirmed(true) => println!("Key is valid and has been saved."),
        ValidationOutcome::Confirmed(false) => anyhow::bail!("The backend rejected this key."),
        ValidationOutcome::Degraded(true) => println!(
            "Validator unreachable; key accepted on format alone and saved."
        ),
        ValidationOutcome::Degraded(false) => {
            anyhow::bail!("Validator unreachable and the key does not look like a valid API key.")
        }
    }
    Ok(())
}

/// Run `settings clear`.
pub fn clear(ctx: &Context) -> anyhow::Result<()> {
    let mut store = ctx.credentials();
    store.clear();
    println!("Stored key removed.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::super::test_support::{cleanup, context, serve};
    use super::*;

    async fn validator_backend() -> String {
        let app = Router::new().route(
            "/api/settings/validate-key",
            post(|Json(body): Json<Value>| async move {
                let ok = body["api_key"].as_str().unwrap_or("").starts_with("AIza");
                Json(json!({"valid": ok}))
            }),
        );
        serve(app).await
    }

    #[tokio::test]
    async fn validate_stores_an_accepted_key() {
        let base = validator_backend().await;
        let ctx = context(&base);

        validate(&ctx, Some("AIzaSyD-0123456789abcdef")).await.unwrap();

        let store = ctx.credentials();
        assert!(store.has_valid_credential());
        assert!(show(&ctx).is_ok());
        cleanup(ctx.settings.path());
    }

    #[tokio::test]
    async fn validate_rejects_short_and_refused_keys() {
        let base = validator_backend().await;
        let ctx = context(&base);

        assert!(validate(&ctx, Some("short")).await.is_err());
        assert!(validate(&ctx, Some("sk-definitely-not-valid-here")).await.is_err());
        assert!(!ctx.credentials().has_valid_credential());
        cleanup(ctx.settings.path());
    }

    #[tokio::test]
    async fn validate_without_any_key_fails() {
        let ctx = context("http://127.0.0.1:9/api");
        assert!(validate(&ctx, None).await.is_err());
    }

    #[tokio::test]
    async fn stored_key_is_revalidated_in_degraded_mode() {
        let ctx = context("http://127.0.0.1:9/api");
        set_key(&ctx, &"x".repeat(30)).unwrap();
        assert!(!ctx.credentials().is_validated());

        validate(&ctx, None).await.unwrap();
        assert!(ctx.credentials().has_valid_credential());

        clear(&ctx).unwrap();
        assert!(!ctx.credentials().has_credential());
        cleanup(ctx.settings.path());
    }
}
