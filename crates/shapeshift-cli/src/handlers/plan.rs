//! `shapeshift plan`

use crate::cli::PairArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use shapeshift_core::Mapper;
use tracing::instrument;

#[instrument(skip(mapper, output), fields(from = %args.from, to = %args.to))]
pub fn handle_plan(args: PairArgs, mapper: &Mapper, output: &mut OutputWriter) -> Result<()> {
    let plan = mapper.plan(&args.from, &args.to)?;
    let description = plan.describe();

    if !output.is_human() {
        return output.data(&description);
    }

    output.section(&format!("{} -> {}", description.source, description.dest))?;
    if let Some(depth) = description.max_depth {
        output.info(&format!("max depth {}", depth))?;
    }
    if description.ignore_null_values == Some(true) {
        output.info("null source values are ignored")?;
    }
    let rows = description
        .rules
        .iter()
        .map(|r| vec![r.member.clone(), r.rule.clone(), r.detail.clone()])
        .collect();
    output.table(&["Member", "Rule", "Detail"], rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::handlers::test_support::mapper;
    use crate::output::tests::writer;

    fn pair() -> PairArgs {
        PairArgs {
            from: "Person".to_string(),
            to: "PersonDto".to_string(),
        }
    }

    #[test]
    fn test_plan_json() {
        let (mut output, buffer) = writer(OutputFormat::Json);
        handle_plan(pair(), &mapper(), &mut output).unwrap();

        let printed: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(printed["source"], "Person");
        assert_eq!(printed["dest"], "PersonDto");
        let rules: Vec<(&str, &str)> = printed["rules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| (r["member"].as_str().unwrap(), r["rule"].as_str().unwrap()))
            .collect();
        assert_eq!(
            rules,
            vec![
                ("Name", "direct"),
                ("Age", "direct"),
                ("AddressCity", "flatten_path"),
                ("Friends", "collection"),
            ]
        );
    }

    #[test]
    fn test_plan_human_table() {
        let mapper = mapper();
        mapper.configure("Person", "PersonDto").unwrap().max_depth(2);
        let (mut output, buffer) = writer(OutputFormat::Human);
        handle_plan(pair(), &mapper, &mut output).unwrap();

        let text = buffer.contents();
        assert!(text.contains("=== Person -> PersonDto ==="));
        assert!(text.contains("INFO: max depth 2"));
        assert!(text.contains("AddressCity │ flatten_path │ Address.City"));
    }

    #[test]
    fn test_plan_requires_classes() {
        let (mut output, _) = writer(OutputFormat::Json);
        let args = PairArgs {
            from: "i32".to_string(),
            to: "string".to_string(),
        };
        let err = handle_plan(args, &mapper(), &mut output).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
