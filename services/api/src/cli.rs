use crate::catalog::{run_calculate, run_scores_list, run_scores_show, CalculateArgs, CatalogArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use medcalc::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "medcalc-api",
    about = "Serve and query clinical risk-score calculators",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Browse the score metadata catalogue
    Scores {
        #[command(subcommand)]
        command: ScoresCommand,
    },
    /// Run a single calculation and print the result as JSON
    Calculate(CalculateArgs),
}

#[derive(Subcommand, Debug)]
enum ScoresCommand {
    /// List catalogued scores, optionally filtered
    List {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Only scores in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        /// Only scores whose title or description contains this term
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the full metadata record of one score
    Show {
        #[command(flatten)]
        catalog: CatalogArgs,
        score_id: String,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the directory holding score metadata files
    #[arg(long)]
    pub(crate) scores_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Scores {
            command:
                ScoresCommand::List {
                    catalog,
                    category,
                    search,
                },
        } => run_scores_list(catalog, category, search),
        Command::Scores {
            command: ScoresCommand::Show { catalog, score_id },
        } => run_scores_show(catalog, &score_id),
        Command::Calculate(args) => run_calculate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["medcalc-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "medcalc-api",
            "serve",
            "--port",
            "8080",
            "--scores-dir",
            "/tmp/scores",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.scores_dir, Some(PathBuf::from("/tmp/scores")));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn scores_list_takes_filters() {
        let cli = Cli::try_parse_from([
            "medcalc-api",
            "scores",
            "list",
            "--category",
            "cardiology",
            "--search",
            "stroke",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Scores {
                command: ScoresCommand::List {
                    category, search, ..
                },
            }) => {
                assert_eq!(category.as_deref(), Some("cardiology"));
                assert_eq!(search.as_deref(), Some("stroke"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn calculate_requires_params() {
        assert!(Cli::try_parse_from(["medcalc-api", "calculate", "bmi_calculator"]).is_err());
        let cli = Cli::try_parse_from([
            "medcalc-api",
            "calculate",
            "bmi_calculator",
            "--params",
            r#"{"weight":70,"height":175}"#,
        ])
        .expect("parses");
        assert!(matches!(cli.command, Some(Command::Calculate(_))));
    }
}
