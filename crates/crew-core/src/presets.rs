use crate::types::AgentDraft;

/// Tool id the backend maps to its DuckDuckGo search tool.
pub const INTERNET_SEARCH: &str = "internet_search";

/// Research -> write -> edit crew offered as a starting point.
pub fn default_agents() -> Vec<AgentDraft> {
    vec![
        AgentDraft::new(
            "Researcher",
            "Senior Technology Researcher",
            "Find the most recent developments on the topic online",
            "An experienced researcher who follows technology trends and digs up accurate sources.",
        )
        .with_tools([INTERNET_SEARCH]),
        AgentDraft::new(
            "Writer",
            "Technology Blog Writer",
            "Turn the research notes into a readable blog post",
            "Explains complex technical subjects in plain, fluent language.",
        ),
        AgentDraft::new(
            "Editor",
            "Chief Editor",
            "Polish the post for grammar and structure",
            "A professional editor with an eye for spelling, flow and consistency.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_researcher_searches() {
        let agents = default_agents();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0].tools, vec![INTERNET_SEARCH.to_string()]);
        assert!(agents[1..].iter().all(|a| a.tools.is_empty()));
    }

    #[test]
    fn each_call_yields_fresh_ids() {
        let a = default_agents();
        let b = default_agents();
        assert_ne!(a[0].id, b[0].id);
    }
}
