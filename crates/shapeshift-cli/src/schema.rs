//! Model files
//!
//! A model file describes the types the CLI maps between and the options of
//! each pair. JSON and YAML are both accepted:
//!
//! ```yaml
//! settings:
//!   projection_max_depth: 3
//! enums:
//!   CustomerLevel: { Bronze: 1, Silver: 2, Gold: 3 }
//! classes:
//!   Customer:
//!     members:
//!       - Id: i32
//!       - Name: string
//!       - { name: Version, type: i32, read_only: true }
//! pairs:
//!   - from: Customer
//!     to: CustomerDto
//!     ignore: [Password]
//!     map_from:
//!       AddressCity: Address.City
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use shapeshift_core::model::{ClassDescriptor, EnumDescriptor, TypeRef};
use shapeshift_core::projection::{Expr, Lambda};
use shapeshift_core::{Mapper, MapperSettings};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Parameter name of lambdas built from dotted paths
const PATH_PARAM: &str = "src";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Model {
    #[serde(default)]
    pub settings: Option<MapperSettings>,
    #[serde(default)]
    pub enums: BTreeMap<String, EnumSpec>,
    #[serde(default)]
    pub classes: BTreeMap<String, ClassSpec>,
    #[serde(default)]
    pub pairs: Vec<PairSpec>,
}

/// Enumerants either by name (numbered from zero) or with explicit codes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumSpec {
    Names(Vec<String>),
    Coded(BTreeMap<String, i64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSpec {
    #[serde(default)]
    pub members: Vec<MemberSpec>,
    #[serde(default = "default_true")]
    pub constructible: bool,
}

/// `- Name: type` or `- { name, type, read_only }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberSpec {
    Full {
        name: String,
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        read_only: bool,
    },
    Short(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub ignore_null_values: Option<bool>,
    #[serde(default)]
    pub force_new_instance_for_identical_types: Option<bool>,
    /// Destination member to source path or expression
    #[serde(default)]
    pub map_from: BTreeMap<String, MapFromSpec>,
}

/// A dotted source path, or a full expression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapFromSpec {
    Path(String),
    Expression(Lambda),
}

fn default_true() -> bool {
    true
}

impl Model {
    /// Read a model file, choosing the parser by extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        debug!("Read model file {} ({} bytes)", path.display(), content.len());

        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s == "yaml" || s == "yml")
            .unwrap_or(false);

        if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| {
                debug!("YAML parse error: {}", e);
                Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "YAML".to_string(),
                }
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                debug!("JSON parse error: {}", e);
                Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "JSON".to_string(),
                }
            })
        }
    }

    /// Register every type and pair option with `mapper`
    pub fn apply(&self, mapper: &Mapper) -> Result<()> {
        if let Some(settings) = &self.settings {
            mapper.configs().set_settings(settings.clone());
        }

        let registry = mapper.registry();
        for (name, spec) in &self.enums {
            let descriptor = match spec {
                EnumSpec::Names(names) => EnumDescriptor::from_names(name.as_str(), names.iter().cloned()),
                EnumSpec::Coded(codes) => {
                    let mut variants: Vec<(String, i64)> =
                        codes.iter().map(|(n, c)| (n.clone(), *c)).collect();
                    variants.sort_by_key(|(_, code)| *code);
                    EnumDescriptor::new(name.as_str(), variants)
                }
            };
            registry.register_enum(descriptor);
        }

        for (name, spec) in &self.classes {
            registry.register_class(build_class(name, spec)?);
        }

        for pair in &self.pairs {
            apply_pair(mapper, pair)?;
        }

        info!(
            "Loaded {} classes, {} enums, {} pairs",
            self.classes.len(),
            self.enums.len(),
            self.pairs.len()
        );
        Ok(())
    }
}

fn parse_type(text: &str, context: &str) -> Result<TypeRef> {
    text.parse()
        .map_err(|e| Error::schema(format!("{}: {}", context, e)))
}

fn build_class(name: &str, spec: &ClassSpec) -> Result<ClassDescriptor> {
    let mut builder = ClassDescriptor::builder(name).constructible(spec.constructible);
    for member in &spec.members {
        let (member_name, ty, read_only) = match member {
            MemberSpec::Full { name, ty, read_only } => (name.as_str(), ty.as_str(), *read_only),
            MemberSpec::Short(entry) => {
                let mut entries = entry.iter();
                match (entries.next(), entries.next()) {
                    (Some((n, t)), None) => (n.as_str(), t.as_str(), false),
                    _ => {
                        return Err(Error::schema(format!(
                            "class {}: each member entry must name exactly one member",
                            name
                        )))
                    }
                }
            }
        };
        let ty = parse_type(ty, &format!("{}.{}", name, member_name))?;
        builder = builder.member_with_access(member_name, ty, true, !read_only);
    }
    Ok(builder.build())
}

fn apply_pair(mapper: &Mapper, pair: &PairSpec) -> Result<()> {
    let source = parse_type(&pair.from, "pair source")?;
    let context = format!("{} -> {}", pair.from, pair.to);

    let mut configurator = mapper.configure(&pair.from, &pair.to)?;
    for member in &pair.ignore {
        configurator = configurator.ignore_member(member.as_str());
    }
    if let Some(depth) = pair.max_depth {
        if depth == 0 {
            return Err(Error::schema(format!("{}: max_depth must be at least 1", context)));
        }
        configurator = configurator.max_depth(depth);
    }
    if let Some(ignore) = pair.ignore_null_values {
        configurator = configurator.ignore_null_values(ignore);
    }
    if let Some(force) = pair.force_new_instance_for_identical_types {
        configurator = configurator.force_new_instance_for_identical_types(force);
    }
    for (member, spec) in &pair.map_from {
        let lambda = match spec {
            MapFromSpec::Path(path) => path_lambda(&source, path)
                .ok_or_else(|| Error::schema(format!("{}: empty path for {}", context, member)))?,
            MapFromSpec::Expression(lambda) => lambda.clone(),
        };
        debug!("{}: {} <- {}", context, member, lambda);
        configurator = configurator.map_from_expr(member.as_str(), lambda);
    }
    Ok(())
}

/// Lambda reading a dotted member path, yielding null when any
/// intermediate object is null
pub fn path_lambda(source: &TypeRef, path: &str) -> Option<Lambda> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let mut prefixes = Vec::with_capacity(segments.len());
    let mut current = Expr::param(PATH_PARAM);
    for segment in &segments {
        current = current.member(*segment);
        prefixes.push(current.clone());
    }

    // Innermost first: the full path, then a guard per intermediate prefix
    let mut body = prefixes.pop()?;
    while let Some(prefix) = prefixes.pop() {
        body = Expr::condition(Expr::is_null(prefix), Expr::null(), body);
    }
    Some(Lambda::new(PATH_PARAM, source.clone(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeshift_core::Value;
    use std::io::Write;

    const MODEL: &str = r#"
settings:
  projection_max_depth: 4
enums:
  Level: { Bronze: 1, Silver: 2, Gold: 3 }
  Color: [Red, Green]
classes:
  Address:
    members:
      - City: string
  AddressDto:
    members:
      - City: string
  Customer:
    members:
      - Id: i32
      - Name: string
      - Password: string
      - Level: i32
      - Address: Address
  CustomerDto:
    members:
      - Id: string
      - Name: string
      - Password: string
      - Level: Level
      - City: string
      - { name: Version, type: i32, read_only: true }
  Frozen:
    constructible: false
pairs:
  - from: Customer
    to: CustomerDto
    ignore: [Password]
    map_from:
      City: Address.City
"#;

    fn write_model(content: &str, extension: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn loaded_mapper() -> Mapper {
        let file = write_model(MODEL, ".yaml");
        let model = Model::load(file.path()).unwrap();
        let mapper = Mapper::new();
        model.apply(&mapper).unwrap();
        mapper
    }

    #[test]
    fn test_load_registers_types_and_settings() {
        let mapper = loaded_mapper();
        assert_eq!(mapper.settings().projection_max_depth, 4);

        let dto = mapper.registry().class("CustomerDto").unwrap();
        let version = dto.member("Version").unwrap();
        assert!(!version.writable);
        assert!(!mapper.registry().class("Frozen").unwrap().is_constructible());

        let level = mapper.registry().enum_type("Level").unwrap();
        assert_eq!(level.by_code(3).unwrap().variant, "Gold");
        let color = mapper.registry().enum_type("Color").unwrap();
        assert_eq!(color.by_code(1).unwrap().variant, "Green");
    }

    #[test]
    fn test_pair_options_drive_mapping() {
        let mapper = loaded_mapper();
        let json = serde_json::json!({
            "Id": 5,
            "Name": "Ada",
            "Password": "secret",
            "Level": 2,
            "Address": { "City": "Paris" }
        });
        let source = mapper
            .registry()
            .value_from_json(&"Customer".parse().unwrap(), &json)
            .unwrap();
        let dto = mapper.adapt(&source, "CustomerDto").unwrap();
        let dto = dto.as_object().unwrap();

        assert_eq!(dto.get("Id").unwrap(), Value::from("5"));
        assert_eq!(dto.get("Password").unwrap(), Value::Null);
        assert_eq!(dto.get("City").unwrap(), Value::from("Paris"));
        assert_eq!(dto.get("Level").unwrap().as_enum().unwrap().variant, "Silver");
    }

    #[test]
    fn test_path_through_null_yields_null() {
        let mapper = loaded_mapper();
        let json = serde_json::json!({ "Id": 1, "Name": "Bob", "Level": 1 });
        let source = mapper
            .registry()
            .value_from_json(&"Customer".parse().unwrap(), &json)
            .unwrap();
        let dto = mapper.adapt(&source, "CustomerDto").unwrap();
        assert_eq!(dto.as_object().unwrap().get("City").unwrap(), Value::Null);
    }

    #[test]
    fn test_path_lambda_text() {
        let lambda = path_lambda(&"Customer".parse().unwrap(), "Address.City").unwrap();
        assert_eq!(
            lambda.to_string(),
            "src => ((src.Address == null) ? null : src.Address.City)"
        );
        assert!(path_lambda(&"Customer".parse().unwrap(), "Address..City").is_none());
    }

    #[test]
    fn test_json_model() {
        let file = write_model(
            r#"{"classes": {"Point": {"members": [{"X": "i32"}, {"Y": "i32"}]}}}"#,
            ".json",
        );
        let model = Model::load(file.path()).unwrap();
        let mapper = Mapper::new();
        model.apply(&mapper).unwrap();
        let point = mapper.registry().class("Point").unwrap();
        let names: Vec<&str> = point.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[test]
    fn test_load_errors() {
        let missing = Model::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(missing, Error::FileNotFound { .. }));

        let file = write_model("classes: [not, a, map", ".yaml");
        let invalid = Model::load(file.path()).unwrap_err();
        assert!(matches!(invalid, Error::InvalidFormat { .. }));
    }

    #[test]
    fn test_bad_member_type_is_schema_error() {
        let file = write_model("classes:\n  A:\n    members:\n      - X: List<\n", ".yml");
        let model = Model::load(file.path()).unwrap();
        let err = model.apply(&Mapper::new()).unwrap_err();
        assert!(matches!(err, Error::Schema(ref message) if message.contains("A.X")));
    }

    #[test]
    fn test_zero_max_depth_rejected() {
        let model: Model = serde_yaml::from_str(
            "classes:\n  A: {}\npairs:\n  - { from: A, to: A, max_depth: 0 }\n",
        )
        .unwrap();
        assert!(matches!(model.apply(&Mapper::new()), Err(Error::Schema(_))));
    }
}
