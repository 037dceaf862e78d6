//! Extract command handler

use serde::Serialize;

use crate::classify::{Classifier, RouteDecision};
use crate::cli::{ExtractArgs, OutputFormat};
use crate::commands::CommandContext;
use crate::error::Result;
use crate::extractor::SourceExtractor;
use crate::schema::EnumDefinition;

#[derive(Serialize)]
struct ExtractedEnum<'a> {
    #[serde(flatten)]
    definition: &'a EnumDefinition,
    route: RouteDecision,
}

/// Run the extract command
pub fn run_extract(args: &ExtractArgs, ctx: &CommandContext) -> Result<String> {
    let mut config = ctx.config.extraction.clone();
    if args.all {
        config.retained_enums.clear();
    }

    let mut extractor = SourceExtractor::new(&config)?;
    let catalog = extractor.extract_all(&args.dir)?;
    let classifier = Classifier::new(ctx.config.target.push_boundary);
    let grouped = classifier.classify(&catalog);

    let enums: Vec<ExtractedEnum> = catalog
        .iter()
        .map(|definition| ExtractedEnum {
            definition,
            route: classifier.route(definition),
        })
        .collect();

    if ctx.format == OutputFormat::Json {
        let stats = extractor.stats();
        return super::to_json(&serde_json::json!({
            "_type": "extract",
            "root": args.dir.display().to_string(),
            "files_scanned": stats.files_scanned,
            "files_skipped": stats.files_skipped,
            "enums": enums,
            "routed_cases": grouped.total(),
            "dropped_duplicates": grouped.dropped_duplicates,
        }));
    }

    let mut out = String::new();
    out.push_str("═══════════════════════════════════════════\n");
    out.push_str(&format!("  EXTRACTED ENUMS: {}\n", args.dir.display()));
    out.push_str("═══════════════════════════════════════════\n\n");

    if enums.is_empty() {
        out.push_str("No enum definitions found.\n");
        return Ok(out);
    }

    for entry in &enums {
        let def = entry.definition;
        let groups: Vec<String> = entry.route.groups.iter().map(|g| g.to_string()).collect();
        out.push_str(&format!(
            "{} ({} cases) in {}\n",
            def.name,
            def.cases.len(),
            def.source_file.display()
        ));
        out.push_str(&format!(
            "  rule: {} -> {}\n",
            entry.route.rule,
            if groups.is_empty() {
                "(none)".to_string()
            } else {
                groups.join(", ")
            }
        ));
        if ctx.verbose {
            for case in &def.cases {
                out.push_str(&format!(
                    "    {} = {}  ({}:{})\n",
                    case.original_name,
                    case.value,
                    case.file_name(),
                    case.location.line
                ));
            }
        }
    }

    let stats = extractor.stats();
    out.push('\n');
    out.push_str(&format!("files_scanned: {}\n", stats.files_scanned));
    out.push_str(&format!("files_skipped: {}\n", stats.files_skipped));
    out.push_str(&format!("routed_cases: {}\n", grouped.total()));
    if grouped.dropped_duplicates > 0 {
        out.push_str(&format!("dropped_duplicates: {}\n", grouped.dropped_duplicates));
    }
    Ok(out)
}
