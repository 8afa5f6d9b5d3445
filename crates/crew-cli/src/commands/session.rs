use crew_api_types::{ResultResponse, SessionSnapshot};

use super::Context;

/// Run `result <id>`.
pub async fn result(ctx: &Context, session_id: &str) -> anyhow::Result<()> {
    let api = ctx.api()?;
    let resp = api.fetch_result(session_id).await?;
    // The snapshot only adds the crew summary line.
    let snapshot = match api.get_session(session_id).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::debug!(session = %session_id, error = %e, "session snapshot unavailable");
            None
        }
    };

    print!("{}", format_result(session_id, &resp, snapshot.as_ref()));
    Ok(())
}

fn format_result(
    session_id: &str,
    resp: &ResultResponse,
    snapshot: Option<&SessionSnapshot>,
) -> String {
    let mut out = format!("Session {session_id}  ({})\n", resp.status);
    if let Some(snap) = snapshot {
        let model = if snap.model.is_empty() { "?" } else { &snap.model };
        out.push_str(&format!(
            "Crew:      {} agents, {} tasks on {model}\n",
            snap.agents.len(),
            snap.tasks.len()
        ));
    }
    if let Some(started) = &resp.started_at {
        out.push_str(&format!("Started:   {started}\n"));
    }
    if let Some(completed) = &resp.completed_at {
        out.push_str(&format!("Completed: {completed}\n"));
    }
    out.push_str(&"-".repeat(40));
    out.push('\n');
    out.push_str(resp.result.as_deref().unwrap_or("(no result yet)"));
    out.push('\n');
    out
}

/// Run `stats <id>`.
pub async fn stats(ctx: &Context, session_id: &str) -> anyhow::Result<()> {
    let stats = ctx.api()?.fetch_stats(session_id).await?;

    println!("Session {}  ({})", stats.session_id, stats.status);
    println!("{}", "-".repeat(40));
    println!("Agents:      {}", stats.total_agents);
    println!("Tasks:       {}", stats.total_tasks);
    println!("Log entries: {}", stats.total_logs);
    for agent in &stats.agent_stats {
        println!(
            "  {:<16} tasks={:<3} messages={}  ({})",
            agent.name, agent.tasks_completed, agent.messages_sent, agent.role
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    use super::super::test_support::{context, serve};
    use super::*;

    fn finished() -> ResultResponse {
        serde_json::from_value(json!({
            "result": "Five sources.",
            "status": "completed",
            "started_at": "2025-05-01T09:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn result_includes_crew_summary_from_snapshot() {
        let snapshot: SessionSnapshot = serde_json::from_value(json!({
            "id": "s1",
            "model": "gemini-2.0-flash",
            "agents": [{"name": "A", "role": "r", "goal": "g", "backstory": "b"}],
            "tasks": []
        }))
        .unwrap();

        let out = format_result("s1", &finished(), Some(&snapshot));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Session s1  (completed)");
        assert_eq!(lines[1], "Crew:      1 agents, 0 tasks on gemini-2.0-flash");
        assert_eq!(lines[2], "Started:   2025-05-01T09:00:00Z");
        assert_eq!(lines.last(), Some(&"Five sources."));
    }

    #[test]
    fn result_without_snapshot_skips_crew_line() {
        let out = format_result("s1", &finished(), None);
        assert!(!out.contains("Crew:"));
        assert!(out.ends_with("Five sources.\n"));
    }

    #[tokio::test]
    async fn result_and_stats_print() {
        let app = Router::new()
            .route(
                "/api/sessions/{id}",
                get(|| async { Json(json!({"id": "s1", "status": "running", "model": "m"})) }),
            )
            .route(
                "/api/sessions/{id}/result",
                get(|| async { Json(json!({"result": null, "status": "running"})) }),
            )
            .route(
                "/api/sessions/{id}/stats",
                get(|| async {
                    Json(json!({
                        "session_id": "s1",
                        "status": "running",
                        "agent_stats": [{"name": "Writer", "role": "w"}]
                    }))
                }),
            );
        let ctx = context(&serve(app).await);

        assert!(result(&ctx, "s1").await.is_ok());
        assert!(stats(&ctx, "s1").await.is_ok());
    }

    #[tokio::test]
    async fn result_survives_missing_snapshot_route() {
        let app = Router::new().route(
            "/api/sessions/{id}/result",
            get(|| async { Json(json!({"result": "done", "status": "completed"})) }),
        );
        let ctx = context(&serve(app).await);

        assert!(result(&ctx, "s1").await.is_ok());
    }

    #[tokio::test]
    async fn missing_session_is_an_error() {
        let app = Router::new();
        let ctx = context(&serve(app).await);

        let err = result(&ctx, "nope").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
