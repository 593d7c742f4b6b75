use serde::de::DeserializeOwned;

use crate::error::ParseError;
use crate::types::{Instance, OperatorVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument<T> {
    pub document: T,
    pub format: DocumentFormat,
}

/// Either kind of document the store holds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Document {
    OperatorVersion(OperatorVersion),
    Instance(Instance),
}

pub fn parse_document_str<T: DeserializeOwned>(
    input: &str,
    format: DocumentFormat,
) -> Result<ParsedDocument<T>, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedDocument {
            document: serde_json::from_str::<T>(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedDocument {
            document: serde_yaml::from_str::<T>(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_document_auto(input),
    }
}

pub fn parse_operator_version(input: &str) -> Result<OperatorVersion, ParseError> {
    parse_document_str(input, DocumentFormat::Auto).map(|p| p.document)
}

pub fn parse_instance(input: &str) -> Result<Instance, ParseError> {
    parse_document_str(input, DocumentFormat::Auto).map(|p| p.document)
}

fn parse_document_auto<T: DeserializeOwned>(input: &str) -> Result<ParsedDocument<T>, ParseError> {
    // JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<T>(input) {
            Ok(doc) => Ok(ParsedDocument {
                document: doc,
                format: DocumentFormat::Json,
            }),
            // JSON is a YAML subset, so retry as YAML but report the JSON error.
            Err(e) => match serde_yaml::from_str::<T>(input) {
                Ok(doc) => Ok(ParsedDocument {
                    document: doc,
                    format: DocumentFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    match serde_yaml::from_str::<T>(input) {
        Ok(doc) => Ok(ParsedDocument {
            document: doc,
            format: DocumentFormat::Yaml,
        }),
        Err(e) => {
            if let Ok(doc) = serde_json::from_str::<T>(input) {
                return Ok(ParsedDocument {
                    document: doc,
                    format: DocumentFormat::Json,
                });
            }
            Err(ParseError::Yaml(e))
        }
    }
}
