//! Tool catalog
//!
//! Every operation exposed to MCP clients: its name, the plugin endpoint it
//! maps to, the description and input schema advertised by `tools/list`, and
//! the parser that turns raw arguments into a typed [`ToolCall`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::ToolError;
use crate::mcp::protocol::Tool;

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetFileTree(FileTreeArgs),
    GetFileContent(PathArgs),
    SearchFiles(SearchFilesArgs),
    GetFileProperties(PathArgs),
    GetPlaceInfo,
    GetServices(ServicesArgs),
    GetSelection,
    SearchObjects(SearchObjectsArgs),
    GetInstanceProperties(InstanceArgs),
    GetInstanceChildren(InstanceArgs),
    SearchByProperty(PropertyMatchArgs),
    GetClassInfo(ClassArgs),
    GetProjectStructure,
    GetDependencies(DependenciesArgs),
    ValidateReferences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileTreeArgs {
    /// Start of the hierarchy; empty means the workspace root
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSearchType {
    #[default]
    Name,
    Type,
    Content,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilesArgs {
    pub query: String,
    pub search_type: FileSearchType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectSearchType {
    #[default]
    Name,
    Class,
    Property,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchObjectsArgs {
    pub query: String,
    pub search_type: ObjectSearchType,
    /// Only meaningful with [`ObjectSearchType::Property`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceArgs {
    pub instance_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMatchArgs {
    pub property_name: String,
    pub property_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassArgs {
    pub class_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependenciesArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
}

impl ToolCall {
    /// Parse raw MCP arguments for the named tool
    pub fn parse(name: &str, args: &Value) -> Result<Self, ToolError> {
        let op = find(name).ok_or_else(|| ToolError::UnknownOperation(name.to_string()))?;
        (op.parse)(&Args::new(op.name, args)?)
    }

    /// Registered tool name
    pub fn name(&self) -> &'static str {
        self.operation().name
    }

    /// Plugin-side route this call is delivered to
    pub fn endpoint(&self) -> &'static str {
        self.operation().endpoint
    }

    /// Normalized payload handed to the plugin
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            ToolCall::GetFileTree(args) => serde_json::to_value(args),
            ToolCall::GetFileContent(args) | ToolCall::GetFileProperties(args) => {
                serde_json::to_value(args)
            }
            ToolCall::SearchFiles(args) => serde_json::to_value(args),
            ToolCall::GetServices(args) => serde_json::to_value(args),
            ToolCall::SearchObjects(args) => serde_json::to_value(args),
            ToolCall::GetInstanceProperties(args) | ToolCall::GetInstanceChildren(args) => {
                serde_json::to_value(args)
            }
            ToolCall::SearchByProperty(args) => serde_json::to_value(args),
            ToolCall::GetClassInfo(args) => serde_json::to_value(args),
            ToolCall::GetDependencies(args) => serde_json::to_value(args),
            ToolCall::GetPlaceInfo
            | ToolCall::GetSelection
            | ToolCall::GetProjectStructure
            | ToolCall::ValidateReferences => Ok(json!({})),
        }
    }

    fn operation(&self) -> &'static Operation {
        let name = match self {
            ToolCall::GetFileTree(_) => "get_file_tree",
            ToolCall::GetFileContent(_) => "get_file_content",
            ToolCall::SearchFiles(_) => "search_files",
            ToolCall::GetFileProperties(_) => "get_file_properties",
            ToolCall::GetPlaceInfo => "get_place_info",
            ToolCall::GetServices(_) => "get_services",
            ToolCall::GetSelection => "get_selection",
            ToolCall::SearchObjects(_) => "search_objects",
            ToolCall::GetInstanceProperties(_) => "get_instance_properties",
            ToolCall::GetInstanceChildren(_) => "get_instance_children",
            ToolCall::SearchByProperty(_) => "search_by_property",
            ToolCall::GetClassInfo(_) => "get_class_info",
            ToolCall::GetProjectStructure => "get_project_structure",
            ToolCall::GetDependencies(_) => "get_dependencies",
            ToolCall::ValidateReferences => "validate_references",
        };
        OPERATIONS
            .iter()
            .find(|op| op.name == name)
            .unwrap_or(&OPERATIONS[0])
    }
}

/// One registry entry
pub struct Operation {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub description: &'static str,
    schema: fn() -> Value,
    parse: fn(&Args<'_>) -> Result<ToolCall, ToolError>,
}

impl Operation {
    /// Definition advertised to MCP clients
    pub fn definition(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: self.description.into(),
            input_schema: (self.schema)(),
        }
    }
}

/// Look up an operation by tool name
pub fn find(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// All tool definitions, in catalog order
pub fn get_tool_definitions() -> Vec<Tool> {
    OPERATIONS.iter().map(Operation::definition).collect()
}

/// Raw arguments of one call, with the tool name for error messages
pub struct Args<'a> {
    tool: &'static str,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(tool: &'static str, args: &'a Value) -> Result<Self, ToolError> {
        match args {
            Value::Object(map) => Ok(Self {
                tool,
                map: Some(map),
            }),
            Value::Null => Ok(Self { tool, map: None }),
            _ => Err(ToolError::InvalidArgument(format!(
                "arguments for {} must be an object",
                tool
            ))),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map
            .and_then(|map| map.get(field))
            .filter(|v| !v.is_null())
    }

    fn required(&self, field: &str) -> Result<String, ToolError> {
        match self.get(field).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(ToolError::missing(self.tool, field)),
        }
    }

    fn optional(&self, field: &str) -> Result<Option<String>, ToolError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ToolError::InvalidArgument(format!(
                "{} must be a string",
                field
            ))),
        }
    }

    fn search_type<T>(&self, allowed: &str) -> Result<T, ToolError>
    where
        T: Default + for<'de> Deserialize<'de>,
    {
        match self.get("searchType") {
            None => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                ToolError::InvalidArgument(format!("searchType must be one of {}", allowed))
            }),
        }
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn no_arguments() -> Value {
    object_schema(json!({}), &[])
}

fn script_path_schema() -> Value {
    object_schema(
        json!({
            "path": { "type": "string", "description": "Path to the script file" }
        }),
        &["path"],
    )
}

/// The fixed tool registry
pub static OPERATIONS: &[Operation] = &[
    // File system
    Operation {
        name: "get_file_tree",
        endpoint: "/api/file-tree",
        description: "Get complete hierarchy of the Roblox Studio project with script types, models, and folders",
        schema: || {
            object_schema(
                json!({
                    "path": {
                        "type": "string",
                        "description": "Optional path to start from (defaults to workspace root)",
                        "default": ""
                    }
                }),
                &[],
            )
        },
        parse: |args| {
            Ok(ToolCall::GetFileTree(FileTreeArgs {
                path: args.optional("path")?.unwrap_or_default(),
            }))
        },
    },
    Operation {
        name: "get_file_content",
        endpoint: "/api/file-content",
        description: "Retrieve script source code from a specific file",
        schema: script_path_schema,
        parse: |args| {
            Ok(ToolCall::GetFileContent(PathArgs {
                path: args.required("path")?,
            }))
        },
    },
    Operation {
        name: "search_files",
        endpoint: "/api/search-files",
        description: "Find files by name, type, or content patterns",
        schema: || {
            object_schema(
                json!({
                    "query": {
                        "type": "string",
                        "description": "Search query (name, type, or content pattern)"
                    },
                    "searchType": {
                        "type": "string",
                        "enum": ["name", "type", "content"],
                        "description": "Type of search to perform",
                        "default": "name"
                    }
                }),
                &["query"],
            )
        },
        parse: |args| {
            Ok(ToolCall::SearchFiles(SearchFilesArgs {
                query: args.required("query")?,
                search_type: args.search_type("name, type, content")?,
            }))
        },
    },
    Operation {
        name: "get_file_properties",
        endpoint: "/api/file-properties",
        description: "Get script properties and parent/child relationships",
        schema: script_path_schema,
        parse: |args| {
            Ok(ToolCall::GetFileProperties(PathArgs {
                path: args.required("path")?,
            }))
        },
    },
    // Studio context
    Operation {
        name: "get_place_info",
        endpoint: "/api/place-info",
        description: "Get place ID, name, and game settings",
        schema: no_arguments,
        parse: |_| Ok(ToolCall::GetPlaceInfo),
    },
    Operation {
        name: "get_services",
        endpoint: "/api/services",
        description: "Get available Roblox services and their children",
        schema: || {
            object_schema(
                json!({
                    "serviceName": {
                        "type": "string",
                        "description": "Optional specific service name to query"
                    }
                }),
                &[],
            )
        },
        parse: |args| {
            Ok(ToolCall::GetServices(ServicesArgs {
                service_name: args.optional("serviceName")?,
            }))
        },
    },
    Operation {
        name: "get_selection",
        endpoint: "/api/selection",
        description: "Get currently selected objects in Studio",
        schema: no_arguments,
        parse: |_| Ok(ToolCall::GetSelection),
    },
    Operation {
        name: "search_objects",
        endpoint: "/api/search-objects",
        description: "Find instances by name, class, or properties",
        schema: || {
            object_schema(
                json!({
                    "query": { "type": "string", "description": "Search query" },
                    "searchType": {
                        "type": "string",
                        "enum": ["name", "class", "property"],
                        "description": "Type of search to perform",
                        "default": "name"
                    },
                    "propertyName": {
                        "type": "string",
                        "description": "Property name when searchType is \"property\""
                    }
                }),
                &["query"],
            )
        },
        parse: |args| {
            Ok(ToolCall::SearchObjects(SearchObjectsArgs {
                query: args.required("query")?,
                search_type: args.search_type("name, class, property")?,
                property_name: args.optional("propertyName")?,
            }))
        },
    },
    // Properties and instances
    Operation {
        name: "get_instance_properties",
        endpoint: "/api/instance-properties",
        description: "Get all properties of a specific instance",
        schema: || {
            object_schema(
                json!({
                    "instancePath": { "type": "string", "description": "Path to the instance" }
                }),
                &["instancePath"],
            )
        },
        parse: |args| {
            Ok(ToolCall::GetInstanceProperties(InstanceArgs {
                instance_path: args.required("instancePath")?,
            }))
        },
    },
    Operation {
        name: "get_instance_children",
        endpoint: "/api/instance-children",
        description: "Get child objects and their types",
        schema: || {
            object_schema(
                json!({
                    "instancePath": {
                        "type": "string",
                        "description": "Path to the parent instance"
                    }
                }),
                &["instancePath"],
            )
        },
        parse: |args| {
            Ok(ToolCall::GetInstanceChildren(InstanceArgs {
                instance_path: args.required("instancePath")?,
            }))
        },
    },
    Operation {
        name: "search_by_property",
        endpoint: "/api/search-by-property",
        description: "Find objects with specific property values",
        schema: || {
            object_schema(
                json!({
                    "propertyName": {
                        "type": "string",
                        "description": "Name of the property to search"
                    },
                    "propertyValue": { "type": "string", "description": "Value to search for" }
                }),
                &["propertyName", "propertyValue"],
            )
        },
        parse: |args| {
            Ok(ToolCall::SearchByProperty(PropertyMatchArgs {
                property_name: args.required("propertyName")?,
                property_value: args.required("propertyValue")?,
            }))
        },
    },
    Operation {
        name: "get_class_info",
        endpoint: "/api/class-info",
        description: "Get available properties/methods for Roblox classes",
        schema: || {
            object_schema(
                json!({
                    "className": { "type": "string", "description": "Roblox class name" }
                }),
                &["className"],
            )
        },
        parse: |args| {
            Ok(ToolCall::GetClassInfo(ClassArgs {
                class_name: args.required("className")?,
            }))
        },
    },
    // Project
    Operation {
        name: "get_project_structure",
        endpoint: "/api/project-structure",
        description: "Get complete game hierarchy",
        schema: no_arguments,
        parse: |_| Ok(ToolCall::GetProjectStructure),
    },
    Operation {
        name: "get_dependencies",
        endpoint: "/api/dependencies",
        description: "Get module dependencies and relationships",
        schema: || {
            object_schema(
                json!({
                    "modulePath": {
                        "type": "string",
                        "description": "Optional specific module path to analyze"
                    }
                }),
                &[],
            )
        },
        parse: |args| {
            Ok(ToolCall::GetDependencies(DependenciesArgs {
                module_path: args.optional("modulePath")?,
            }))
        },
    },
    Operation {
        name: "validate_references",
        endpoint: "/api/validate-references",
        description: "Check for broken script references",
        schema: no_arguments,
        parse: |_| Ok(ToolCall::ValidateReferences),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_definitions_complete() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 15);

        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 15);
        for expected in ["get_file_tree", "search_objects", "validate_references"] {
            assert!(names.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_all_tools_have_valid_schemas() {
        for tool in get_tool_definitions() {
            assert!(!tool.description.is_empty(), "{} has no description", tool.name);
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"].is_object(), "{}", tool.name);
        }
    }

    #[test]
    fn test_endpoints_unique_and_prefixed() {
        let endpoints: HashSet<_> = OPERATIONS.iter().map(|op| op.endpoint).collect();
        assert_eq!(endpoints.len(), OPERATIONS.len());
        assert!(endpoints.iter().all(|e| e.starts_with("/api/")));
    }

    #[test]
    fn test_required_fields_match_schema() {
        let schema = find("search_by_property").unwrap().definition().input_schema;
        assert_eq!(schema["required"], json!(["propertyName", "propertyValue"]));

        let schema = find("get_place_info").unwrap().definition().input_schema;
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_parse_round_trips_name_and_endpoint() {
        let call = ToolCall::parse("get_instance_children", &json!({"instancePath": "game.Workspace"}))
            .unwrap();
        assert_eq!(call.name(), "get_instance_children");
        assert_eq!(call.endpoint(), "/api/instance-children");
        assert_eq!(call.payload().unwrap(), json!({"instancePath": "game.Workspace"}));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = ToolCall::parse("get_file_content", &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
        assert!(err.to_string().contains("path is required for get_file_content"));
    }

    #[test]
    fn test_empty_or_mistyped_required_argument() {
        assert!(ToolCall::parse("get_class_info", &json!({"className": ""})).is_err());
        assert!(ToolCall::parse("get_class_info", &json!({"className": 5})).is_err());
        assert!(ToolCall::parse("get_class_info", &json!({"className": null})).is_err());
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolCall::parse("delete_everything", &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::UnknownOperation(name) if name == "delete_everything"));
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let err = ToolCall::parse("get_place_info", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[test]
    fn test_null_arguments_mean_none() {
        let call = ToolCall::parse("get_file_tree", &Value::Null).unwrap();
        assert_eq!(call, ToolCall::GetFileTree(FileTreeArgs::default()));
        assert_eq!(call.payload().unwrap(), json!({"path": ""}));
    }

    #[test]
    fn test_search_type_defaults_and_validation() {
        let call = ToolCall::parse("search_files", &json!({"query": "Main"})).unwrap();
        assert_eq!(call.payload().unwrap(), json!({"query": "Main", "searchType": "name"}));

        let call = ToolCall::parse(
            "search_objects",
            &json!({"query": "Part", "searchType": "property", "propertyName": "Anchored"}),
        )
        .unwrap();
        assert_eq!(
            call.payload().unwrap(),
            json!({"query": "Part", "searchType": "property", "propertyName": "Anchored"})
        );

        let err = ToolCall::parse("search_files", &json!({"query": "x", "searchType": "class"}))
            .unwrap_err();
        assert!(err.to_string().contains("name, type, content"));
    }

    #[test]
    fn test_optional_arguments_omitted() {
        let call = ToolCall::parse("get_services", &json!({})).unwrap();
        assert_eq!(call.payload().unwrap(), json!({}));

        let call = ToolCall::parse("get_dependencies", &json!({"modulePath": "ReplicatedStorage.Util"}))
            .unwrap();
        assert_eq!(call.payload().unwrap(), json!({"modulePath": "ReplicatedStorage.Util"}));
    }

    #[test]
    fn test_argument_free_tools_send_empty_object() {
        for name in ["get_place_info", "get_selection", "get_project_structure", "validate_references"] {
            let call = ToolCall::parse(name, &json!({"ignored": true})).unwrap();
            assert_eq!(call.payload().unwrap(), json!({}), "{}", name);
        }
    }
}
