//! `shapeshift map`

use super::read_json_input;
use crate::cli::MapArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use shapeshift_core::model::TypeRef;
use shapeshift_core::Mapper;
use tracing::{info, instrument};

#[instrument(skip(mapper, output), fields(from = %args.pair.from, to = %args.pair.to))]
pub fn handle_map(args: MapArgs, mapper: &Mapper, output: &mut OutputWriter) -> Result<()> {
    let source_type: TypeRef = args.pair.from.parse()?;
    let json = read_json_input(args.input.as_deref())?;
    let source = mapper.registry().value_from_json(&source_type, &json)?;

    let result = mapper.adapt_untyped(&source, &args.pair.from, &args.pair.to)?;
    info!("Mapped {} -> {}", args.pair.from, args.pair.to);

    output.section(&format!("{} -> {}", args.pair.from, args.pair.to))?;
    output.data(&result.to_json())
}
