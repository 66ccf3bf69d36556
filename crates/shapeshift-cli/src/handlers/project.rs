//! `shapeshift project`

use super::read_json_input;
use crate::cli::ProjectArgs;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde::Serialize;
use shapeshift_core::model::TypeRef;
use shapeshift_core::projection::Lambda;
use shapeshift_core::{Mapper, Value};
use tracing::{debug, instrument};

#[derive(Serialize)]
struct ProjectionReport<'a> {
    expression: String,
    tree: &'a Lambda,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<serde_json::Value>>,
}

#[instrument(skip(mapper, output), fields(from = %args.pair.from, to = %args.pair.to))]
pub fn handle_project(args: ProjectArgs, mapper: &Mapper, output: &mut OutputWriter) -> Result<()> {
    let lambda = mapper.projection(&args.pair.from, &args.pair.to)?;

    let results = match &args.input {
        Some(path) => Some(evaluate(mapper, &args.pair.from, &args.pair.to, path)?),
        None => None,
    };

    if !output.is_human() {
        return output.data(&ProjectionReport {
            expression: lambda.to_string(),
            tree: &lambda,
            results,
        });
    }

    output.section("Projection")?;
    output.writeln(&lambda.to_string())?;
    if let Some(results) = results {
        output.section(&format!("Results ({})", results.len()))?;
        output.data(&results)?;
    }
    Ok(())
}

/// Project every element of a JSON array in memory
fn evaluate(
    mapper: &Mapper,
    from: &str,
    to: &str,
    path: &std::path::Path,
) -> Result<Vec<serde_json::Value>> {
    let element_type: TypeRef = from.parse()?;
    let json = read_json_input(Some(path))?;
    let serde_json::Value::Array(items) = json else {
        return Err(Error::invalid_args(format!(
            "projection input must be a JSON array of {}",
            from
        )));
    };

    let items = items
        .iter()
        .map(|item| mapper.registry().value_from_json(&element_type, item))
        .collect::<shapeshift_core::Result<Vec<_>>>()?;
    debug!("Projecting {} items", items.len());

    let query = mapper.query(from, items)?;
    let projected = mapper
        .project(query)
        .to(to)?
        .collect::<shapeshift_core::Result<Vec<Value>>>()?;
    Ok(projected.iter().map(Value::to_json).collect())
}
