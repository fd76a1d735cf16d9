use clap::{Args as ClapArgs, Parser, Subcommand};
use pitchforge_core::api::ExecutionMode;

#[derive(Parser, Debug)]
#[command(name = "pitchforge", version, about = "Market research and pitch analysis pipeline")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of ~/.pitchforge/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Project input as a JSON file, or `-` for stdin.
    #[arg(long)]
    pub input: String,

    /// Where to write the report; stdout when omitted.
    #[arg(long)]
    pub output: Option<String>,

    /// Override the configured execution mode.
    /// - topological: dependencies run first regardless of registration
    /// - registration: registration order, unmet dependencies are skipped
    #[arg(long)]
    pub mode: Option<ExecutionMode>,

    /// Show per-component progress bars on stderr.
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub mode: Option<ExecutionMode>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateInputArgs {
    #[arg(long)]
    pub input: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline and write the JSON report.
    Analyze(AnalyzeArgs),
    /// Print the component visiting order and check the dependency graph.
    Plan(PlanArgs),
    /// Check a project input file without running anything.
    ValidateInput(ValidateInputArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let args = Args::parse_from([
            "pitchforge",
            "analyze",
            "--input",
            "project.json",
            "--mode",
            "registration",
            "--progress",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(args.config.as_deref(), Some("custom.toml"));
        match args.command {
            Commands::Analyze(a) => {
                assert_eq!(a.input, "project.json");
                assert_eq!(a.mode, Some(ExecutionMode::RegistrationOrder));
                assert!(a.progress);
                assert!(a.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_plan_and_validate() {
        let args = Args::parse_from(["pitchforge", "plan", "--mode", "topological"]);
        assert!(matches!(
            args.command,
            Commands::Plan(PlanArgs {
                mode: Some(ExecutionMode::Topological)
            })
        ));

        let args = Args::parse_from(["pitchforge", "validate-input", "--input", "-"]);
        assert!(matches!(args.command, Commands::ValidateInput(v) if v.input == "-"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["pitchforge", "plan", "--mode", "random"]).is_err());
    }
}
