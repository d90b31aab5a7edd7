//! Catalog of API errors documented alongside shapes.
//!
//! Every error renders as a reusable response component whose body uses the
//! `{"errors": {...}}` envelope. The errors listed as common are also summarized in a
//! markdown block meant for the API description.

use crate::error::{Error, Result};
use crate::schema::SchemaNode;
use crate::settings::Settings;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Errors documented on every resource unless configured otherwise.
pub const DEFAULT_COMMON_ERRORS: &[&str] = &["NotFound", "ValidationError", "APIException"];

const COMMON_ERRORS_HEADING: &str = "###  Common API Errors \n";

/// One documented error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSpec {
    pub name: String,
    pub status: u16,
    pub detail: String,
    /// Body properties replacing the default `detail`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Value>>,
}

impl ErrorSpec {
    pub fn new(name: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
            properties: None,
        }
    }

    /// Example response body.
    pub fn body(&self) -> Value {
        match &self.properties {
            Some(properties) => json!({ "errors": properties }),
            None => json!({ "errors": { "detail": self.detail } }),
        }
    }

    pub fn response(&self) -> ErrorResponse {
        let body = self.body();
        let mut schema = infer_schema(&body);
        schema.example = Some(body);

        let mut content = IndexMap::new();
        content.insert("application/json".to_string(), MediaType { schema });
        ErrorResponse {
            description: self.detail.clone(),
            content,
        }
    }
}

/// A response component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub description: String,
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaNode,
}

/// Status code → response reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSection {
    pub responses: IndexMap<String, SchemaNode>,
}

impl ErrorSection {
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn get(&self, status: u16) -> Option<&SchemaNode> {
        self.responses.get(&status.to_string())
    }
}

/// The known errors, in lookup order.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCatalog {
    specs: Vec<ErrorSpec>,
    common: Vec<String>,
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ErrorCatalog {
    /// The standard REST framework errors with the default common set.
    pub fn standard() -> Self {
        let specs = vec![
            ErrorSpec::new("ValidationError", 400, "Invalid input."),
            ErrorSpec::new("ParseError", 400, "Malformed request."),
            ErrorSpec::new("NotAuthenticated", 401, "Authentication credentials were not provided."),
            ErrorSpec::new("AuthenticationFailed", 401, "Incorrect authentication credentials."),
            ErrorSpec::new("PermissionDenied", 403, "You do not have permission to perform this action."),
            ErrorSpec::new("NotFound", 404, "Not found."),
            ErrorSpec::new("MethodNotAllowed", 405, "Method not allowed."),
            ErrorSpec::new("NotAcceptable", 406, "Could not satisfy the request Accept header."),
            ErrorSpec::new("UnsupportedMediaType", 415, "Unsupported media type in request."),
            ErrorSpec::new("Throttled", 429, "Request was throttled."),
            ErrorSpec::new("APIException", 500, "A server error occurred."),
        ];
        Self {
            specs,
            common: DEFAULT_COMMON_ERRORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Standard catalog extended with the configured errors and common set.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut catalog = Self::standard();
        for spec in &settings.errors {
            catalog.add(spec.clone());
        }
        if let Some(common) = &settings.common_errors {
            catalog.set_common(common.clone())?;
        }
        Ok(catalog)
    }

    /// Adds an error, replacing one with the same name. New errors take precedence
    /// over standard ones sharing their status.
    pub fn add(&mut self, spec: ErrorSpec) {
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => {
                debug!("Registering error {} ({})", spec.name, spec.status);
                self.specs.insert(0, spec);
            }
        }
    }

    pub fn set_common(&mut self, names: Vec<String>) -> Result<()> {
        for name in &names {
            self.lookup(name)?;
        }
        self.common = names;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ErrorSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[ErrorSpec] {
        &self.specs
    }

    pub fn common(&self) -> impl Iterator<Item = &ErrorSpec> {
        self.common.iter().filter_map(|name| self.get(name))
    }

    pub fn common_statuses(&self) -> Vec<u16> {
        self.common().map(|s| s.status).collect()
    }

    /// Markdown summary of the common errors.
    pub fn description(&self) -> Result<String> {
        let mut out = String::from(COMMON_ERRORS_HEADING);
        for spec in self.common() {
            out.push_str(&format!(
                "Status Code: `{}` \n\n``` \n {} \n ``` \n\n",
                spec.status,
                pretty_json(&spec.body())?
            ));
        }
        Ok(out)
    }

    /// Every error as a response component keyed by name.
    pub fn components(&self) -> IndexMap<String, ErrorResponse> {
        self.specs
            .iter()
            .map(|spec| (spec.name.clone(), spec.response()))
            .collect()
    }

    /// References for each distinct status, in ascending status order.
    pub fn section_for(&self, statuses: &[u16]) -> ErrorSection {
        self.build_section(statuses, &[])
    }

    /// Like [`section_for`](Self::section_for), adding the named errors. A named error
    /// is referenced for its status even when another error shares it; unknown names
    /// are rejected.
    pub fn section_with(&self, statuses: &[u16], names: &[String]) -> Result<ErrorSection> {
        let named = names
            .iter()
            .map(|name| self.lookup(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.build_section(statuses, &named))
    }

    fn build_section(&self, statuses: &[u16], named: &[&ErrorSpec]) -> ErrorSection {
        let mut statuses: Vec<u16> = statuses.iter().copied().chain(named.iter().map(|s| s.status)).collect();
        statuses.sort_unstable();
        statuses.dedup();

        let mut section = ErrorSection::default();
        for status in statuses {
            let spec = named
                .iter()
                .copied()
                .find(|s| s.status == status)
                .or_else(|| self.specs.iter().find(|s| s.status == status));
            match spec {
                Some(spec) => {
                    section.responses.insert(
                        status.to_string(),
                        SchemaNode::reference(format!("#/components/responses/{}", spec.name)),
                    );
                }
                None => warn!("No documented error for status {}", status),
            }
        }
        section
    }

    fn lookup(&self, name: &str) -> Result<&ErrorSpec> {
        self.get(name)
            .ok_or_else(|| Error::InvalidDeclaration(format!("unknown error `{}`", name)))
    }
}

fn pretty_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
}

fn infer_schema(value: &Value) -> SchemaNode {
    match value {
        Value::Object(map) => {
            let mut node = SchemaNode::object();
            node.properties = Some(map.iter().map(|(k, v)| (k.clone(), infer_schema(v))).collect());
            node
        }
        Value::Array(items) => SchemaNode::array(items.first().map(infer_schema).unwrap_or_default()),
        Value::String(_) => SchemaNode::typed("string"),
        Value::Bool(_) => SchemaNode::typed("boolean"),
        Value::Number(n) if n.is_f64() => SchemaNode::typed("number"),
        Value::Number(_) => SchemaNode::typed("integer"),
        Value::Null => SchemaNode {
            nullable: Some(true),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_common_description_format() {
        let mut catalog = ErrorCatalog::standard();
        catalog.set_common(vec!["NotFound".to_string()]).unwrap();

        let expected = "###  Common API Errors \nStatus Code: `404` \n\n``` \n {\n    \"errors\": {\n        \"detail\": \"Not found.\"\n    }\n} \n ``` \n\n";
        assert_eq!(catalog.description().unwrap(), expected);
    }

    #[test]
    fn test_default_common_errors() {
        assert_eq!(ErrorCatalog::standard().common_statuses(), vec![404, 400, 500]);
    }

    #[test]
    fn test_unknown_common_error_rejected() {
        let mut catalog = ErrorCatalog::standard();
        assert!(catalog.set_common(vec!["Teapot".to_string()]).is_err());
    }

    #[test]
    fn test_section_for_dedups_and_sorts() {
        let section = ErrorCatalog::standard().section_for(&[404, 400, 404, 599]);
        let keys: Vec<&String> = section.responses.keys().collect();
        assert_eq!(keys, vec!["400", "404"]);
        assert_eq!(
            section.get(400).and_then(|n| n.reference.as_deref()),
            Some("#/components/responses/ValidationError")
        );
    }

    #[test]
    fn test_custom_error_takes_precedence() {
        let mut settings = Settings::default();
        settings.errors.push(ErrorSpec::new("Conflict", 409, "Conflict."));
        settings.errors.push(ErrorSpec::new("BadPayload", 400, "Bad payload."));
        let catalog = ErrorCatalog::from_settings(&settings).unwrap();

        let section = catalog.section_for(&[400, 409]);
        assert_eq!(
            section.get(400).and_then(|n| n.reference.clone()),
            Some("#/components/responses/BadPayload".to_string())
        );
    }

    #[test]
    fn test_named_errors_win_their_status() {
        let mut catalog = ErrorCatalog::standard();
        catalog.add(ErrorSpec {
            properties: Some(IndexMap::from([("vin".to_string(), json!(["Unknown VIN."]))])),
            ..ErrorSpec::new("InvalidVin", 422, "Invalid VIN.")
        });

        let names = vec!["ParseError".to_string(), "InvalidVin".to_string()];
        let section = catalog.section_with(&[400, 404], &names).unwrap();
        let keys: Vec<&String> = section.responses.keys().collect();
        assert_eq!(keys, vec!["400", "404", "422"]);
        assert_eq!(
            section.get(400).and_then(|n| n.reference.as_deref()),
            Some("#/components/responses/ParseError")
        );

        let body = catalog.get("InvalidVin").unwrap().body();
        assert_eq!(body, json!({"errors": {"vin": ["Unknown VIN."]}}));

        assert!(catalog.section_with(&[], &["Teapot".to_string()]).is_err());
    }

    #[test]
    fn test_response_component_body() {
        let response = ErrorCatalog::standard().get("NotFound").unwrap().response();
        let schema = &response.content["application/json"].schema;
        assert_eq!(schema.example, Some(json!({"errors": {"detail": "Not found."}})));
        assert_eq!(
            schema.property("errors").and_then(|e| e.property("detail")).and_then(|d| d.schema_type.clone()),
            Some("string".to_string())
        );
    }
}
