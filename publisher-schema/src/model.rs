use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Source,
    Notebook,
}

/// Model entry as listed for a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub package_name: String,
    /// Path relative to the package directory.
    pub path: String,
    #[serde(rename = "type")]
    pub r#type: ModelType,
}

/// Compiled model definition: declared sources, named queries and, for notebooks, cells.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledModel {
    pub package_name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub r#type: ModelType,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub queries: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notebook_cells: Vec<NotebookCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Query {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookCell {
    #[serde(rename = "type")]
    pub r#type: CellType,
    pub text: String,
    /// Name of the query declared by a code cell, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_entry_uses_type_field() {
        let model = Model {
            package_name: "demo".to_string(),
            path: "a.malloy".to_string(),
            r#type: ModelType::Source,
        };
        assert_eq!(
            serde_json::to_value(&model).unwrap(),
            json!({"packageName": "demo", "path": "a.malloy", "type": "source"})
        );
    }

    #[test]
    fn source_model_omits_notebook_cells() {
        let compiled = CompiledModel {
            package_name: "demo".to_string(),
            path: "a.malloy".to_string(),
            r#type: ModelType::Source,
            sources: vec![Source {
                name: "flights".to_string(),
                ..Default::default()
            }],
            queries: Vec::new(),
            notebook_cells: Vec::new(),
        };

        let out = serde_json::to_value(&compiled).unwrap();
        assert!(out.get("notebookCells").is_none());
        assert_eq!(out["sources"][0]["name"], "flights");
    }
}
