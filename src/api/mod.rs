use axum::{
    Router,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    AnnualNetIncomeSummary, AnnualSummary, DEFAULT_DEFICIT_MIN_MONTHS, DeficitPeriod,
    FinancialSummary, MonthlyProjection, NetIncomeProjection, PortfolioGrowth, ProjectionError,
    ProjectionReport, ProjectionSummary, QuickSummary, Scenario, TaxSummary,
    identify_deficit_periods, run_scenario,
};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    version,
    about = "Month-by-month household retirement projection with US income tax"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON projection API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project a scenario file and print the result as JSON on stdout.
    Project {
        #[arg(long, help = "Path to a scenario JSON file")]
        scenario: PathBuf,
        #[arg(long, help = "Print only the headline summary")]
        quick: bool,
        #[arg(long)]
        pretty: bool,
        #[arg(
            long,
            default_value_t = DEFAULT_DEFICIT_MIN_MONTHS,
            help = "Shortest run of deficit months to report"
        )]
        deficit_min_months: usize,
    },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("projection task failed: {0}")]
    Task(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::Projection(_) => StatusCode::BAD_REQUEST,
            ApiError::Io { .. } | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ProjectionPayload {
    scenario: Scenario,
    #[serde(default = "default_true")]
    include_monthly: bool,
    #[serde(default = "default_true")]
    include_annual: bool,
    #[serde(default = "default_true")]
    include_tax_summary: bool,
    #[serde(default = "default_true")]
    include_net_income: bool,
    #[serde(default = "default_deficit_min_months")]
    deficit_min_months: usize,
}

fn default_true() -> bool {
    true
}

fn default_deficit_min_months() -> usize {
    DEFAULT_DEFICIT_MIN_MONTHS
}

#[derive(Debug, Serialize)]
struct ProjectionResponse {
    scenario_id: String,
    scenario_name: String,
    calculation_time_ms: f64,
    financial_summary: FinancialSummary,
    portfolio_growth: PortfolioGrowth,
    projection_summary: Option<ProjectionSummary>,
    deficit_periods: Vec<DeficitPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly_projections: Option<Vec<MonthlyProjection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annual_summaries: Option<Vec<AnnualSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_summaries: Option<Vec<TaxSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    net_income_projections: Option<Vec<NetIncomeProjection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annual_net_income: Option<Vec<AnnualNetIncomeSummary>>,
}

impl ProjectionResponse {
    fn from_report(report: ProjectionReport, payload: &ProjectionPayload) -> Self {
        let deficit_periods = if payload.deficit_min_months == DEFAULT_DEFICIT_MIN_MONTHS {
            report.deficit_periods
        } else {
            identify_deficit_periods(&report.net_income_projections, payload.deficit_min_months)
        };
        Self {
            scenario_id: report.scenario_id,
            scenario_name: report.scenario_name,
            calculation_time_ms: report.calculation_time_ms,
            financial_summary: report.financial_summary,
            portfolio_growth: report.portfolio_growth,
            projection_summary: report.projection_summary,
            deficit_periods,
            monthly_projections: payload.include_monthly.then_some(report.monthly_projections),
            annual_summaries: payload.include_annual.then_some(report.annual_summaries),
            tax_summaries: payload.include_tax_summary.then_some(report.tax_summaries),
            annual_net_income: payload.include_net_income.then_some(report.annual_net_income),
            net_income_projections: payload
                .include_net_income
                .then_some(report.net_income_projections),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), ApiError> {
    match cli.command {
        Command::Serve { port } => run_http_server(port).await.map_err(|source| ApiError::Io {
            path: format!("0.0.0.0:{port}"),
            source,
        }),
        Command::Project {
            scenario,
            quick,
            pretty,
            deficit_min_months,
        } => {
            let output = project_scenario_file(&scenario, quick, pretty, deficit_min_months)?;
            println!("{output}");
            Ok(())
        }
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/projection", post(projection_handler))
        .route("/api/projection/quick", post(quick_projection_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "projection API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_handler(body: String) -> Response {
    match run_blocking(move || projection_from_json(&body)).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

async fn quick_projection_handler(body: String) -> Response {
    match run_blocking(move || quick_projection_from_json(&body)).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
}

fn projection_from_json(json: &str) -> Result<ProjectionResponse, ApiError> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)?;
    let report = run_scenario(&payload.scenario).inspect_err(|e| {
        tracing::warn!(error = %e, "projection request rejected");
    })?;
    Ok(ProjectionResponse::from_report(report, &payload))
}

fn quick_projection_from_json(json: &str) -> Result<QuickSummary, ApiError> {
    let scenario = serde_json::from_str::<Scenario>(json)?;
    let report = run_scenario(&scenario)?;
    Ok(QuickSummary::from(&report))
}

fn project_scenario_file(
    path: &Path,
    quick: bool,
    pretty: bool,
    deficit_min_months: usize,
) -> Result<String, ApiError> {
    let json = std::fs::read_to_string(path).map_err(|source| ApiError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let scenario = serde_json::from_str::<Scenario>(&json)?;
    let report = run_scenario(&scenario)?;

    let output = if quick {
        to_json(&QuickSummary::from(&report), pretty)?
    } else {
        let payload = ProjectionPayload {
            scenario,
            include_monthly: true,
            include_annual: true,
            include_tax_summary: true,
            include_net_income: true,
            deficit_min_months,
        };
        to_json(&ProjectionResponse::from_report(report, &payload), pretty)?
    };
    Ok(output)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, axum::Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn scenario_json() -> Value {
        json!({
            "scenario_id": "couple",
            "scenario_name": "Couple retiring in 2026",
            "global_settings": {
                "projection_start_month": "2026-01",
                "projection_end_year": 2027,
                "residence_state": "ca"
            },
            "people": [
                { "person_id": "p1", "name": "Alex", "birth_date": "1960-04-12", "life_expectancy_years": 90 },
                { "person_id": "p2", "name": "Sam", "birth_date": "1962-09-30" }
            ],
            "income_streams": [
                {
                    "stream_id": "pension",
                    "type": "pension",
                    "owner_person_id": "p1",
                    "start_month": "2026-01",
                    "monthly_amount_at_start": 5000.0,
                    "cola_percent_annual": 0.02
                }
            ],
            "accounts": [
                {
                    "account_id": "ira",
                    "name": "Traditional IRA",
                    "tax_bucket": "tax_deferred",
                    "starting_balance": 100000.0,
                    "annual_return_rate": 0.06,
                    "receives_surplus": true
                }
            ],
            "budget": {
                "categories": [
                    { "category_name": "housing", "category_type": "fixed", "monthly_amount": 2500.0 }
                ]
            },
            "tax_settings": { "filing_status": "married_filing_jointly" }
        })
    }

    #[test]
    fn payload_defaults_include_every_section() {
        let body = json!({ "scenario": scenario_json() }).to_string();
        let payload = serde_json::from_str::<ProjectionPayload>(&body).expect("valid payload");

        assert!(payload.include_monthly);
        assert!(payload.include_annual);
        assert!(payload.include_tax_summary);
        assert!(payload.include_net_income);
        assert_eq!(payload.deficit_min_months, DEFAULT_DEFICIT_MIN_MONTHS);
        assert_eq!(payload.scenario.income_streams[0].cola_month, 1);
        assert!(payload.scenario.budget_settings.categories[0].include);
        assert_approx(payload.scenario.budget_settings.inflation_annual_percent, 0.025);
    }

    #[test]
    fn projection_response_honors_include_flags() {
        let body = json!({
            "scenario": scenario_json(),
            "include_monthly": false,
            "include_net_income": false
        })
        .to_string();
        let response = projection_from_json(&body).expect("valid request");
        let value = serde_json::to_value(&response).expect("serialize");

        assert!(value.get("monthly_projections").is_none());
        assert!(value.get("net_income_projections").is_none());
        assert_eq!(value["annual_summaries"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["tax_summaries"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["financial_summary"]["total_months"], json!(24));
        assert_eq!(value["scenario_id"], json!("couple"));
    }

    #[test]
    fn monthly_rows_serialize_month_keys_and_buckets() {
        let body = json!({ "scenario": scenario_json() }).to_string();
        let response = projection_from_json(&body).expect("valid request");
        let value = serde_json::to_value(&response).expect("serialize");

        let first = &value["monthly_projections"][0];
        assert_eq!(first["month"], json!("2026-01"));
        assert_eq!(first["filing_status"], json!("married_filing_jointly"));
        assert!(first["balances_by_tax_bucket"].get("tax_deferred").is_some());
        let pension = first["income_by_stream"]["pension"].as_f64().expect("number");
        assert_approx(pension, 5_100.0);
    }

    #[test]
    fn invalid_json_is_a_bad_request() {
        let err = projection_from_json("{not json").expect_err("must reject");
        assert!(matches!(err, ApiError::InvalidJson(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("invalid JSON payload"));
    }

    #[test]
    fn malformed_month_is_rejected_during_parsing() {
        let mut scenario = scenario_json();
        scenario["global_settings"]["projection_start_month"] = json!("2026-1");
        let err = quick_projection_from_json(&scenario.to_string()).expect_err("must reject");
        assert!(matches!(err, ApiError::InvalidJson(_)));
    }

    #[test]
    fn invalid_scenario_reports_fields() {
        let mut scenario = scenario_json();
        scenario["accounts"][0]["starting_balance"] = json!(-10.0);
        scenario["income_streams"][0]["owner_person_id"] = json!("nobody");
        let body = json!({ "scenario": scenario }).to_string();

        let err = projection_from_json(&body).expect_err("must reject");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let message = err.to_string();
        assert!(message.contains("accounts[0].starting_balance"));
        assert!(message.contains("income_streams[0].owner_person_id"));
    }

    #[test]
    fn quick_projection_reports_portfolio_change() {
        let quick = quick_projection_from_json(&scenario_json().to_string()).expect("valid request");
        assert_eq!(quick.total_months, 24);
        assert_approx(quick.portfolio_growth, quick.ending_portfolio - quick.starting_portfolio);
        assert_eq!(quick.financial_summary.total_months, 24);
    }

    #[test]
    fn custom_deficit_threshold_recomputes_periods() {
        let mut scenario = scenario_json();
        scenario["budget"]["categories"][0]["monthly_amount"] = json!(9000.0);
        let body = json!({ "scenario": scenario, "deficit_min_months": 30 }).to_string();
        let response = projection_from_json(&body).expect("valid request");
        assert!(response.deficit_periods.is_empty());

        let body = json!({ "scenario": scenario, "deficit_min_months": 1 }).to_string();
        let response = projection_from_json(&body).expect("valid request");
        assert_eq!(response.deficit_periods.len(), 1);
        assert_eq!(response.deficit_periods[0].months, 24);
    }

    #[test]
    fn cli_parses_project_subcommand() {
        let cli = Cli::try_parse_from([
            "nestegg",
            "project",
            "--scenario",
            "plan.json",
            "--quick",
            "--deficit-min-months",
            "6",
        ])
        .expect("valid args");
        match cli.command {
            Command::Project {
                scenario,
                quick,
                pretty,
                deficit_min_months,
            } => {
                assert_eq!(scenario, PathBuf::from("plan.json"));
                assert!(quick);
                assert!(!pretty);
                assert_eq!(deficit_min_months, 6);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let serve = Cli::try_parse_from(["nestegg", "serve"]).expect("valid args");
        assert!(matches!(serve.command, Command::Serve { port: 8080 }));
    }

    #[test]
    fn project_reads_scenario_file() {
        let path = std::env::temp_dir().join(format!("nestegg-scenario-{}.json", std::process::id()));
        std::fs::write(&path, scenario_json().to_string()).expect("write scenario");

        let output = project_scenario_file(&path, true, false, DEFAULT_DEFICIT_MIN_MONTHS).expect("projects");
        let value: Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(value["total_months"], json!(24));

        let full = project_scenario_file(&path, false, true, DEFAULT_DEFICIT_MIN_MONTHS).expect("projects");
        assert!(full.contains("\n  \"scenario_id\""));
        std::fs::remove_file(&path).ok();

        let missing = project_scenario_file(Path::new("/nonexistent/plan.json"), true, false, 3);
        assert!(matches!(missing, Err(ApiError::Io { .. })));
    }
}
