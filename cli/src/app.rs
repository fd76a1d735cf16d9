//! Command handlers: load input, wire services from config, run the engine.
use std::io::{Read, Write};
use std::sync::Arc;

use pitchforge_core::api::{
    AnalysisEngine, AppConfig, CliError, Component, ExecutionMode, ProgressMonitor, ProjectInput,
};
use pitchforge_plugins::factory;

use crate::commands::cli::{AnalyzeArgs, PlanArgs, ValidateInputArgs};

/// Read project input from a JSON file, or stdin for `-`.
pub fn read_input(source: &str) -> Result<ProjectInput, CliError> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)
            .map_err(|e| CliError::Input(format!("read {source} failed: {e}")))?
    };
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::Input(format!("{source} is not valid JSON: {e}")))?;
    let input = ProjectInput::from_value(value)?;
    input.validate()?;
    Ok(input)
}

pub fn write_report(report: &serde_json::Value, output: Option<&str>) -> Result<(), CliError> {
    let body = serde_json::to_string_pretty(report).map_err(anyhow::Error::from)?;
    match output {
        Some(path) => {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, body)?;
            tracing::info!(path = %path, "report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{body}")?;
        }
    }
    Ok(())
}

fn engine_for(
    cfg: &AppConfig,
    mode: Option<ExecutionMode>,
) -> Result<AnalysisEngine, CliError> {
    let mut analysis = cfg.analysis.clone();
    if let Some(mode) = mode {
        analysis.execution_mode = mode;
    }
    let services = factory::build_services(cfg).map_err(|e| CliError::Config(e.to_string()))?;
    Ok(AnalysisEngine::new(analysis, services))
}

#[tracing::instrument(name = "cli.analyze", skip(args, cfg), fields(input = %args.input))]
pub async fn run_analyze(args: AnalyzeArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let input = read_input(&args.input)?;
    let mut engine = engine_for(cfg, args.mode)?;
    if args.progress {
        let enabled = atty::is(atty::Stream::Stderr);
        engine = engine.with_observer(Arc::new(ProgressMonitor::new(enabled)));
    }

    let outcome = engine.generate(&input).await?;
    tracing::info!(
        run_id = %outcome.run.run_id,
        successful = outcome.run.stats.successful_count,
        failed = outcome.run.stats.failed_count,
        quality_score = outcome.quality_score,
        "analysis finished"
    );
    write_report(&outcome.report, args.output.as_deref())?;
    Ok(0)
}

/// One line per component: position, name, requirement and dependencies.
pub fn format_plan(order: &[String]) -> Vec<String> {
    order
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let Some(component) = Component::from_name(name) else {
                return format!("{:>2}. {name}", i + 1);
            };
            let kind = if component.is_required() { "required" } else { "optional" };
            let deps: Vec<&str> = component.dependencies().iter().map(|d| d.name()).collect();
            if deps.is_empty() {
                format!("{:>2}. {name} ({kind})", i + 1)
            } else {
                format!("{:>2}. {name} ({kind}) <- {}", i + 1, deps.join(", "))
            }
        })
        .collect()
}

pub fn run_plan(args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let engine = engine_for(cfg, args.mode)?;
    let order = engine.plan()?;
    println!("mode: {}", engine.config().execution_mode);
    for line in format_plan(&order) {
        println!("{line}");
    }
    Ok(0)
}

pub fn run_validate_input(args: ValidateInputArgs) -> Result<i32, CliError> {
    let input = read_input(&args.input)?;
    println!("ok: segment '{}'", input.segment.trim());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_read_input_accepts_localized_keys() {
        let f = input_file(r#"{"segmento": "pet shops", "preco": 49.9}"#);
        let input = read_input(f.path().to_str().unwrap()).unwrap();
        assert_eq!(input.segment, "pet shops");
        assert_eq!(input.price.as_deref(), Some("49.9"));
    }

    #[test]
    fn test_read_input_errors() {
        let bad_json = input_file("{not json");
        let err = read_input(bad_json.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, CliError::Input(_)), "{err}");

        let short = input_file(r#"{"segment": "ab"}"#);
        let err = read_input(short.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, CliError::Analysis(_)), "{err}");

        let err = read_input("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CliError::Input(_)), "{err}");
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = serde_json::json!({"project": {"segment": "pet shops"}});
        write_report(&report, path.to_str()).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }

    #[test]
    fn test_format_plan_lists_dependencies() {
        let lines = format_plan(&["web_research".to_string(), "market_analysis".to_string()]);
        assert_eq!(lines[0], " 1. web_research (required)");
        assert_eq!(lines[1], " 2. market_analysis (required) <- web_research");
    }

    #[test]
    fn test_plan_with_default_config() {
        let cfg = AppConfig::default();
        let engine = engine_for(&cfg, Some(ExecutionMode::Topological)).unwrap();
        let order = engine.plan().unwrap();
        assert_eq!(order.len(), Component::ALL.len());
        assert_eq!(order[0], "web_research");
    }
}
