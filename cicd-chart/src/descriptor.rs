//! Chart descriptor (`Chart.yaml`) and values (`values.yaml`) parsing.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{io_err, ChartError};

/// Descriptor file name inside a chart directory.
pub const DESCRIPTOR_FILE: &str = "Chart.yaml";
/// Values file name inside a chart directory.
pub const VALUES_FILE: &str = "values.yaml";
/// Templates directory name inside a chart directory.
pub const TEMPLATES_DIR: &str = "templates";

/// Parsed `Chart.yaml`.
///
/// Scalars are kept as text: `appVersion: 1.16` stays `"1.16"` rather than
/// failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    #[serde(default, deserialize_with = "scalar_text")]
    pub api_version: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub app_version: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: String,
}

/// Raw file contents alongside the parsed form.
#[derive(Debug, Clone)]
pub(crate) struct Parsed<T> {
    pub raw: String,
    pub value: T,
}

/// Read and parse the descriptor at `path`.
pub(crate) fn read_descriptor(path: &Path) -> Result<Parsed<ChartDescriptor>, ChartError> {
    let raw = read_text(path)?;
    let value = serde_yaml::from_str::<Option<ChartDescriptor>>(&raw)
        .map_err(|source| ChartError::MalformedInput {
            path: path.to_path_buf(),
            source,
        })?
        .unwrap_or_default();
    Ok(Parsed { raw, value })
}

/// Read `values.yaml` and check it is well-formed YAML. The content itself
/// is carried through opaquely.
pub(crate) fn read_values(path: &Path) -> Result<Parsed<serde_yaml::Value>, ChartError> {
    let raw = read_text(path)?;
    let value = serde_yaml::from_str::<serde_yaml::Value>(&raw).map_err(|source| {
        ChartError::MalformedInput {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(Parsed { raw, value })
}

/// Read `path` as UTF-8 text. Bytes that are not UTF-8 make the file
/// malformed rather than unreadable.
fn read_text(path: &Path) -> Result<String, ChartError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    String::from_utf8(bytes).map_err(|e| ChartError::MalformedInput {
        path: path.to_path_buf(),
        source: serde::de::Error::custom(e),
    })
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar, found {other:?}"
        ))),
    }
}
