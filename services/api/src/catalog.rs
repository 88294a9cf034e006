use clap::Args;
use medcalc::config::ScoresConfig;
use medcalc::error::AppError;
use medcalc::{ScoreService, ServiceError};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Directory holding score metadata files (defaults to APP_SCORES_DIR or ./scores)
    #[arg(long)]
    pub(crate) scores_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Score identifier, e.g. `ckd_epi_2021`
    pub(crate) score_id: String,
    /// Calculation parameters as a JSON object
    #[arg(long)]
    pub(crate) params: String,
}

pub(crate) fn run_scores_list(
    args: CatalogArgs,
    category: Option<String>,
    search: Option<String>,
) -> Result<(), AppError> {
    let service = open_service(args)?;
    let scores = service.list(category.as_deref(), search.as_deref());
    print_json(&json!({ "total": scores.len(), "scores": scores }))
}

pub(crate) fn run_scores_show(args: CatalogArgs, score_id: &str) -> Result<(), AppError> {
    let service = open_service(args)?;
    let metadata = service.metadata(score_id)?;
    print_json(&metadata)
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let CalculateArgs {
        catalog,
        score_id,
        params,
    } = args;
    let params = parse_params(&params)?;
    let service = open_service(catalog)?;
    let result = service.calculate(&score_id, params)?;
    print_json(&result)
}

fn open_service(args: CatalogArgs) -> Result<ScoreService, AppError> {
    let directory = match args.scores_dir {
        Some(directory) => ScoresConfig::new(directory)?.directory,
        None => crate::infra::configured_scores_dir()?,
    };
    Ok(ScoreService::open(directory)?)
}

pub(crate) fn parse_params(raw: &str) -> Result<Value, ServiceError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ServiceError::MalformedBody(
            "expected a JSON object of parameters".to_string(),
        )),
        Err(err) => Err(ServiceError::MalformedBody(err.to_string())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => {
            println!("{rendered}");
            Ok(())
        }
        Err(err) => Err(AppError::Io(err.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_must_be_a_json_object() {
        assert!(parse_params(r#"{"weight": 70}"#).is_ok());
        assert!(matches!(
            parse_params("[1, 2]"),
            Err(ServiceError::MalformedBody(reason)) if reason.contains("JSON object")
        ));
        assert!(matches!(
            parse_params("{weight"),
            Err(ServiceError::MalformedBody(_))
        ));
    }

    #[test]
    fn missing_scores_directory_is_reported() {
        let error = open_service(CatalogArgs {
            scores_dir: Some(PathBuf::from("/definitely/not/a/scores/dir")),
        })
        .err()
        .expect("directory missing");
        assert!(matches!(error, AppError::Metadata(_)));
    }
}
