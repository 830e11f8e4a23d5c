//! Datasources and data keys
//!
//! A datasource names one device and the telemetry/attribute keys a
//! widget reads from it.

use serde::{Deserialize, Serialize};

/// What a datasource points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceKind {
    #[default]
    Device,
}

/// Fetch category of a single data key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataKeyType {
    /// Historical/rolling series of timestamped values
    #[default]
    Timeseries,
    /// Point-in-time attribute, synthesized as a single-point series
    Attribute,
}

impl std::fmt::Display for DataKeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKeyType::Timeseries => write!(f, "timeseries"),
            DataKeyType::Attribute => write!(f, "attribute"),
        }
    }
}

/// One telemetry/attribute key plus its display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataKey {
    pub name: String,

    #[serde(rename = "type", default)]
    pub key_type: DataKeyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DataKey {
    pub fn timeseries(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_type: DataKeyType::Timeseries,
            label: None,
        }
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_type: DataKeyType::Attribute,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Display label, falling back to the key name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A named source of live values: one device's selected keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    #[serde(rename = "type", default)]
    pub kind: DatasourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub data_keys: Vec<DataKey>,
}

impl Datasource {
    pub fn device(device_id: impl Into<String>, keys: Vec<DataKey>) -> Self {
        Self {
            kind: DatasourceKind::Device,
            device_id: Some(device_id.into()),
            name: None,
            data_keys: keys,
        }
    }

    /// Fetch strategy for the whole datasource.
    ///
    /// Determined by the type of the FIRST declared key; keys of the
    /// other type in the same datasource are routed the same way. This
    /// is intentional, if surprising — do not "fix" it.
    pub fn fetch_kind(&self) -> DataKeyType {
        self.data_keys
            .first()
            .map(|k| k.key_type)
            .unwrap_or_default()
    }

    /// Comma-joined key names, the wire format of the read APIs
    pub fn joined_keys(&self) -> String {
        self.data_keys
            .iter()
            .map(|k| k.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
