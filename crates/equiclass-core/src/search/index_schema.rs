//! Index definition for the golf ball catalog

use crate::config::SearchServiceConfig;
use serde_json::{json, Value};

/// Fields returned with every hit
pub const SELECT_FIELDS: &str = "id,manufacturer,usga_lot_num,pole_marking,colour,constCode,\
ballSpecs,dimples,spin,pole_2,seam_marking,imageUrl";

const SEARCHABLE_FILTERABLE: &[&str] = &[
    "usga_lot_num",
    "pole_marking",
    "colour",
    "constCode",
    "ballSpecs",
    "spin",
    "pole_2",
    "seam_marking",
];

/// Full index definition for `PUT /indexes/{name}`
pub fn index_definition(config: &SearchServiceConfig) -> Value {
    let vector = &config.vector;

    let mut fields = vec![
        json!({ "name": "id", "type": "Edm.String", "key": true, "filterable": true }),
        json!({
            "name": "manufacturer",
            "type": "Edm.String",
            "searchable": true,
            "filterable": true,
            "sortable": true
        }),
    ];
    fields.extend(SEARCHABLE_FILTERABLE.iter().map(|name| {
        json!({ "name": name, "type": "Edm.String", "searchable": true, "filterable": true })
    }));
    fields.push(json!({
        "name": "dimples",
        "type": "Edm.Int32",
        "filterable": true,
        "sortable": true
    }));
    fields.push(json!({
        "name": "imageUrl",
        "type": "Edm.String",
        "searchable": false,
        "filterable": false
    }));
    fields.push(json!({
        "name": "vectorContent",
        "type": "Collection(Edm.Single)",
        "searchable": true,
        "retrievable": false,
        "dimensions": vector.dimensions,
        "vectorSearchProfile": vector.profile
    }));

    let mut profile = json!({ "name": vector.profile, "algorithm": vector.algorithm });
    let mut vectorizers = Vec::new();
    if let Some(resource_uri) = &vector.vectorizer_resource_uri {
        profile["vectorizer"] = json!(vector.vectorizer);
        vectorizers.push(json!({
            "name": vector.vectorizer,
            "kind": "azureOpenAI",
            "azureOpenAIParameters": {
                "resourceUri": resource_uri,
                "deploymentId": vector.vectorizer_deployment,
                "apiKey": vector.vectorizer_api_key,
                "modelName": vector.vectorizer_deployment
            }
        }));
    }

    json!({
        "name": config.index_name,
        "fields": fields,
        "vectorSearch": {
            "profiles": [profile],
            "algorithms": [{
                "name": vector.algorithm,
                "kind": "hnsw",
                "hnswParameters": {
                    "m": vector.m,
                    "efConstruction": vector.ef_construction,
                    "efSearch": vector.ef_search,
                    "metric": vector.metric
                }
            }],
            "vectorizers": vectorizers
        },
        "semantic": {
            "configurations": [{
                "name": config.semantic_configuration,
                "prioritizedFields": {
                    "titleField": { "fieldName": "manufacturer" },
                    "prioritizedContentFields": [
                        { "fieldName": "pole_marking" },
                        { "fieldName": "seam_marking" }
                    ]
                }
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorIndexConfig;

    fn config(vectorizer: Option<&str>) -> SearchServiceConfig {
        SearchServiceConfig {
            endpoint: "https://golf.search.windows.net".into(),
            admin_key: Some("key".into()),
            index_name: "golf-balls".into(),
            api_version: "2024-07-01".into(),
            semantic_configuration: "golf-semantic-config".into(),
            vector: VectorIndexConfig {
                dimensions: 1536,
                vectorizer_resource_uri: vectorizer.map(String::from),
                vectorizer_deployment: Some("text-embedding-3-small".into()),
                ..VectorIndexConfig::default()
            },
        }
    }

    #[test]
    fn test_fields() {
        let definition = index_definition(&config(None));
        let fields = definition["fields"].as_array().unwrap();
        let names: Vec<&str> = fields.iter().filter_map(|f| f["name"].as_str()).collect();
        assert_eq!(names[0], "id");
        assert!(names.contains(&"colour"));
        assert!(names.contains(&"seam_marking"));

        let key = &fields[0];
        assert_eq!(key["key"], true);

        let vector = fields.iter().find(|f| f["name"] == "vectorContent").unwrap();
        assert_eq!(vector["dimensions"], 1536);
        assert_eq!(vector["vectorSearchProfile"], "golf-vector-profile");
    }

    #[test]
    fn test_hnsw_parameters() {
        let definition = index_definition(&config(None));
        let params = &definition["vectorSearch"]["algorithms"][0]["hnswParameters"];
        assert_eq!(params["m"], 4);
        assert_eq!(params["efConstruction"], 400);
        assert_eq!(params["efSearch"], 500);
        assert_eq!(params["metric"], "cosine");
    }

    #[test]
    fn test_vectorizer_only_when_configured() {
        let without = index_definition(&config(None));
        assert!(without["vectorSearch"]["vectorizers"]
            .as_array()
            .unwrap()
            .is_empty());
        assert!(without["vectorSearch"]["profiles"][0].get("vectorizer").is_none());

        let with = index_definition(&config(Some("https://golf.openai.azure.com")));
        assert_eq!(
            with["vectorSearch"]["profiles"][0]["vectorizer"],
            "golfOpenAIVectorizer"
        );
        assert_eq!(
            with["vectorSearch"]["vectorizers"][0]["azureOpenAIParameters"]["resourceUri"],
            "https://golf.openai.azure.com"
        );
    }

    #[test]
    fn test_semantic_configuration() {
        let definition = index_definition(&config(None));
        let semantic = &definition["semantic"]["configurations"][0];
        assert_eq!(semantic["name"], "golf-semantic-config");
        assert_eq!(
            semantic["prioritizedFields"]["titleField"]["fieldName"],
            "manufacturer"
        );
    }
}
