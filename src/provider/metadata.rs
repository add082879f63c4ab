//! Model metadata queried from Ollama's local API.

use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::ModelInfo;

/// Ask `{base_url}/api/show` about `model`.
pub(super) async fn ollama_model_info(base_url: &str, model: &str) -> Result<ModelInfo> {
    let url = format!("{}/api/show", base_url.trim_end_matches('/'));
    let resp: Value = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "model": model }))
        .send()
        .await
        .with_context(|| format!("Failed to reach Ollama at {url}"))?
        .error_for_status()?
        .json()
        .await
        .context("Invalid response from Ollama")?;

    Ok(parse_show_response(model, &resp))
}

fn parse_show_response(model: &str, resp: &Value) -> ModelInfo {
    let detail = |key: &str| {
        resp["details"][key]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from)
    };
    ModelInfo {
        name: model.to_string(),
        parameter_size: detail("parameter_size"),
        quantization_level: detail("quantization_level"),
        capabilities: resp["capabilities"]
            .as_array()
            .map(|caps| {
                caps.iter()
                    .filter_map(|c| c.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
    }
}
