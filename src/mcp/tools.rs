//! Tool definitions for the catalog MCP server.

use serde_json::json;

use super::protocol::Tool;

/// All tools the server advertises on `tools/list`.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "search_lands".into(),
            description: "Search for indigenous lands in Brazil. Supports filtering by name, \
                          category, state, municipality, biome, and community."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Filter by land name (partial match)"
                    },
                    "category": {
                        "type": "string",
                        "enum": ["DI", "PI", "RI", "TI"],
                        "description": "Land category: DI (Dominial Indígena), PI (Parque Indígena), RI (Reserva Indígena), TI (Terra Indígena)"
                    },
                    "state": {
                        "type": "string",
                        "description": "Filter by Brazilian state name"
                    },
                    "state_code": {
                        "type": "string",
                        "description": "Filter by state code (e.g. 'AM', 'PA')"
                    },
                    "municipality": {
                        "type": "string",
                        "description": "Filter by municipality name"
                    },
                    "biome": {
                        "type": "string",
                        "description": "Filter by biome (e.g. 'Amazônia', 'Cerrado')"
                    },
                    "community": {
                        "type": "string",
                        "description": "Filter by indigenous community name"
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number (default: 1)"
                    },
                    "ordering": {
                        "type": "string",
                        "description": "Sort key; prefix with '-' for descending"
                    }
                }
            }),
        },
        Tool {
            name: "get_land_details".into(),
            description: "Retrieve detailed information about a specific indigenous land by id."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "land_id": {
                        "type": "string",
                        "description": "UUID of the land to retrieve"
                    }
                },
                "required": ["land_id"]
            }),
        },
        Tool {
            name: "search_communities".into(),
            description: "Search for indigenous communities in Brazil. Supports filtering by \
                          name and number of associated lands."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Filter by community name (partial match)"
                    },
                    "lands_count_min": {
                        "type": "integer",
                        "description": "Minimum number of associated lands"
                    },
                    "lands_count_max": {
                        "type": "integer",
                        "description": "Maximum number of associated lands"
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number (default: 1)"
                    },
                    "ordering": {
                        "type": "string",
                        "description": "Sort key; prefix with '-' for descending"
                    }
                }
            }),
        },
        Tool {
            name: "get_community_details".into(),
            description: "Retrieve detailed information about a specific indigenous community by id."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "community_id": {
                        "type": "string",
                        "description": "UUID of the community to retrieve"
                    }
                },
                "required": ["community_id"]
            }),
        },
        Tool {
            name: "get_api_stats".into(),
            description: "Get summary statistics: total counts of lands and communities.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_five_tools_advertised() {
        let tools = get_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "search_lands",
                "get_land_details",
                "search_communities",
                "get_community_details",
                "get_api_stats"
            ]
        );
    }

    #[test]
    fn test_detail_tools_require_id() {
        let tools = get_tools();
        let land = tools.iter().find(|t| t.name == "get_land_details").unwrap();
        assert_eq!(land.input_schema["required"][0], "land_id");
        let community = tools
            .iter()
            .find(|t| t.name == "get_community_details")
            .unwrap();
        assert_eq!(community.input_schema["required"][0], "community_id");
    }
}
