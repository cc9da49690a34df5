// Run Result - normalized output of the external computation

use serde::{Deserialize, Serialize};

/// One result row; key order is preserved and drives the CSV header
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Domain-specific summary metrics
pub type Metrics = serde_json::Map<String, serde_json::Value>;

/// Uniform shape every computation outcome is normalized into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub metrics: Metrics,
}

impl RunResult {
    pub fn succeeded(rows: Vec<Row>, metrics: Metrics) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            rows,
            metrics,
        }
    }

    /// Failed run with a single diagnostic and no rows
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            rows: Vec::new(),
            metrics: Metrics::new(),
        }
    }

    /// Metrics document: domain metrics plus `run_successful` and `error_messages`.
    ///
    /// The two orchestrator keys always reflect this result, overriding any
    /// same-named domain metric.
    pub fn metrics_document(&self) -> serde_json::Value {
        let mut doc = Metrics::new();
        doc.insert("run_successful".to_string(), self.success.into());
        doc.insert(
            "error_messages".to_string(),
            serde_json::Value::from(self.errors.clone()),
        );
        for (key, value) in &self.metrics {
            if !doc.contains_key(key) {
                doc.insert(key.clone(), value.clone());
            }
        }
        serde_json::Value::Object(doc)
    }
}
