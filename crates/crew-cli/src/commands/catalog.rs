use crew_api_types::{ModelInfo, ToolInfo};
use crew_core::types::DEFAULT_MODEL;

use super::Context;

/// Run `models`.
pub async fn models(ctx: &Context) -> anyhow::Result<()> {
    let models = ctx.api()?.list_models().await?;
    print!("{}", format_models(&models));
    Ok(())
}

/// Run `tools`.
pub async fn tools(ctx: &Context) -> anyhow::Result<()> {
    let tools = ctx.api()?.list_tools().await?;
    print!("{}", format_tools(&tools));
    Ok(())
}

fn format_models(models: &[ModelInfo]) -> String {
    if models.is_empty() {
        return "No models available.\n".into();
    }
    let width = models.iter().map(|m| m.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for model in models {
        let marker = if model.id == DEFAULT_MODEL { "*" } else { " " };
        let badge = model
            .badge
            .as_deref()
            .map(|b| format!(" [{b}]"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{marker} {:<width$}  {}{badge}\n",
            model.id, model.name
        ));
        if !model.description.is_empty() {
            out.push_str(&format!("  {:<width$}  {}\n", "", model.description));
        }
    }
    out
}

fn format_tools(tools: &[ToolInfo]) -> String {
    if tools.is_empty() {
        return "No tools available.\n".into();
    }
    let width = tools.iter().map(|t| t.id.len()).max().unwrap_or(0);
    tools
        .iter()
        .map(|t| format!("{:<width$}  {}\n", t.id, t.description))
        .collect()
}

#[cfg(test)]
mod tests {
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    use super::super::test_support::{context, serve};
    use super::*;

    fn model(id: &str, badge: Option<&str>) -> ModelInfo {
        ModelInfo {
            id: id.into(),
            name: id.to_uppercase(),
            description: String::new(),
            badge: badge.map(str::to_string),
        }
    }

    #[test]
    fn default_model_is_marked() {
        let out = format_models(&[model(DEFAULT_MODEL, Some("new")), model("other", None)]);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with('*'));
        assert!(lines[0].ends_with("[new]"));
        assert!(lines[1].starts_with(' '));
    }

    #[test]
    fn empty_catalogs_say_so() {
        assert_eq!(format_models(&[]), "No models available.\n");
        assert_eq!(format_tools(&[]), "No tools available.\n");
    }

    #[tokio::test]
    async fn listing_against_backend() {
        let app = Router::new()
            .route(
                "/api/models",
                get(|| async { Json(json!({"models": [{"id": "m1", "name": "M1"}]})) }),
            )
            .route(
                "/api/tools",
                get(|| async { Json(json!({"tools": []})) }),
            );
        let ctx = context(&serve(app).await);

        assert!(models(&ctx).await.is_ok());
        assert!(tools(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn backend_error_is_reported() {
        let app = Router::new().route(
            "/api/models",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let ctx = context(&serve(app).await);

        let err = models(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
