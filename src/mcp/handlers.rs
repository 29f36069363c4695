//! Tool call handlers: parameter mapping from tool arguments onto the
//! REST API's query parameters, plus result formatting.

use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{ApiClient, UpstreamOutcome};
use super::protocol::ToolCallResult;

pub struct ToolHandlers {
    client: ApiClient,
}

#[derive(Debug, Default, Deserialize)]
struct SearchLandsArgs {
    name: Option<String>,
    category: Option<String>,
    state: Option<String>,
    state_code: Option<String>,
    municipality: Option<String>,
    biome: Option<String>,
    community: Option<String>,
    page: Option<u32>,
    ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LandIdArgs {
    land_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchCommunitiesArgs {
    name: Option<String>,
    lands_count_min: Option<i64>,
    lands_count_max: Option<i64>,
    page: Option<u32>,
    ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommunityIdArgs {
    community_id: String,
}

impl ToolHandlers {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Dispatch a tool call by name.
    pub async fn handle(&self, name: &str, arguments: Value) -> ToolCallResult {
        match name {
            "search_lands" => self.search_lands(arguments).await,
            "get_land_details" => self.get_land_details(arguments).await,
            "search_communities" => self.search_communities(arguments).await,
            "get_community_details" => self.get_community_details(arguments).await,
            "get_api_stats" => self.get_api_stats().await,
            _ => ToolCallResult::error(format!("Unknown tool: {name}")),
        }
    }

    async fn search_lands(&self, arguments: Value) -> ToolCallResult {
        let args: SearchLandsArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        let mut params: Vec<(&str, String)> = Vec::new();
        push_param(&mut params, "name", args.name);
        push_param(&mut params, "category", args.category);
        push_param(&mut params, "state", args.state);
        push_param(&mut params, "state_code", args.state_code);
        push_param(&mut params, "municipality", args.municipality);
        push_param(&mut params, "biome", args.biome);
        push_param(&mut params, "community", args.community);
        push_param(&mut params, "page", args.page.map(|p| p.to_string()));
        push_param(&mut params, "ordering", args.ordering);

        match self.client.get("/lands/", &params).await {
            UpstreamOutcome::Success(data) => {
                let results = data["results"].as_array().cloned().unwrap_or_default();
                let summary = json!({
                    "total_count": data["count"],
                    "page_results": results.len(),
                    "lands": format_land_results(&results),
                    "next_page": !data["next"].is_null(),
                });
                ToolCallResult::json(&summary)
            }
            outcome => outcome_error(outcome),
        }
    }

    async fn get_land_details(&self, arguments: Value) -> ToolCallResult {
        let args: LandIdArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        match self
            .client
            .get(&format!("/lands/{}/", args.land_id), &[])
            .await
        {
            UpstreamOutcome::Success(data) => ToolCallResult::json(&data),
            UpstreamOutcome::NotFound => {
                ToolCallResult::error(format!("Land not found: {}", args.land_id))
            }
            outcome => outcome_error(outcome),
        }
    }

    async fn search_communities(&self, arguments: Value) -> ToolCallResult {
        let args: SearchCommunitiesArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        let mut params: Vec<(&str, String)> = Vec::new();
        push_param(&mut params, "name", args.name);
        push_param(
            &mut params,
            "lands_count_min",
            args.lands_count_min.map(|v| v.to_string()),
        );
        push_param(
            &mut params,
            "lands_count_max",
            args.lands_count_max.map(|v| v.to_string()),
        );
        push_param(&mut params, "page", args.page.map(|p| p.to_string()));
        push_param(&mut params, "ordering", args.ordering);

        match self.client.get("/communities/", &params).await {
            UpstreamOutcome::Success(data) => {
                let results = data["results"].as_array().cloned().unwrap_or_default();
                let summary = json!({
                    "total_count": data["count"],
                    "page_results": results.len(),
                    "communities": results,
                    "next_page": !data["next"].is_null(),
                });
                ToolCallResult::json(&summary)
            }
            outcome => outcome_error(outcome),
        }
    }

    async fn get_community_details(&self, arguments: Value) -> ToolCallResult {
        let args: CommunityIdArgs = match serde_json::from_value(arguments) {
            Ok(a) => a,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
        };

        match self
            .client
            .get(&format!("/communities/{}/", args.community_id), &[])
            .await
        {
            UpstreamOutcome::Success(data) => ToolCallResult::json(&data),
            UpstreamOutcome::NotFound => {
                ToolCallResult::error(format!("Community not found: {}", args.community_id))
            }
            outcome => outcome_error(outcome),
        }
    }

    /// Total land and community counts, read off the two list endpoints.
    async fn get_api_stats(&self) -> ToolCallResult {
        let page_one = [("page", "1".to_string()), ("page_size", "1".to_string())];

        let lands = match self.client.get("/lands/", &page_one).await {
            UpstreamOutcome::Success(data) => data,
            outcome => return outcome_error(outcome),
        };
        let communities = match self.client.get("/communities/", &page_one).await {
            UpstreamOutcome::Success(data) => data,
            outcome => return outcome_error(outcome),
        };

        ToolCallResult::json(&json!({
            "total_lands": lands["count"],
            "total_communities": communities["count"],
            "api_base_url": self.client.base_url(),
            "api_status": "connected",
        }))
    }
}

fn push_param(params: &mut Vec<(&str, String)>, key: &'static str, value: Option<String>) {
    if let Some(value) = value {
        params.push((key, value));
    }
}

/// Compact land summaries for assistant consumption.
fn format_land_results(results: &[Value]) -> Vec<Value> {
    results
        .iter()
        .map(|land| {
            json!({
                "id": land["id"],
                "name": land["name"],
                "category": land["category_display"],
                "location": land["location"],
                "biome": land["biome"]["name"],
                "communities_count": land["communities_count"],
                "communities": land["communities"]
                    .as_array()
                    .map(|cs| cs.iter().map(|c| c["name"].clone()).collect::<Vec<_>>())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Map a non-success outcome to a tool error, keeping the distinction
/// between not-found, upstream failure, and unreachable.
fn outcome_error(outcome: UpstreamOutcome) -> ToolCallResult {
    match outcome {
        UpstreamOutcome::Success(_) => unreachable!("success handled by callers"),
        UpstreamOutcome::NotFound => ToolCallResult::error("Not found"),
        UpstreamOutcome::Upstream { status, body } => {
            ToolCallResult::error(format!("API Error {status}: {body}"))
        }
        UpstreamOutcome::Unreachable(reason) => {
            ToolCallResult::error(format!("Upstream API unreachable: {reason}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_land_results_compacts_fields() {
        let results = vec![json!({
            "id": "abc",
            "name": "Terra Exemplo",
            "category": "TI",
            "category_display": "Terra Indígena",
            "location": {"municipality": "Rio Branco", "state": "Acre"},
            "biome": {"id": "b1", "name": "Amazônia"},
            "communities_count": 1,
            "communities": [{"id": "c1", "name": "Povo X", "slug": "povo-x"}],
            "source_link": null
        })];

        let formatted = format_land_results(&results);
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0]["category"], "Terra Indígena");
        assert_eq!(formatted[0]["biome"], "Amazônia");
        assert_eq!(formatted[0]["communities"], json!(["Povo X"]));
    }

    #[test]
    fn test_outcome_error_distinguishes_kinds() {
        let err = outcome_error(UpstreamOutcome::Unreachable("connection refused".into()));
        assert_eq!(err.is_error, Some(true));
        assert!(err.content[0].text.contains("unreachable"));

        let err = outcome_error(UpstreamOutcome::Upstream {
            status: 500,
            body: "boom".into(),
        });
        assert!(err.content[0].text.contains("API Error 500"));
    }
}
