use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::config::ServeConfig;
use crate::core::{Advisory, AssumptionSet, Preset, ResultSet, advisories, compute};
use crate::error::Error;
use crate::estimate::{RentEstimate, estimate};
use crate::export::{
    guess_mapping, parse_csv, portfolio_csv, report_csv, scenarios_from_table, text_report,
};
use crate::scenario::{
    CompareSelection, ComparisonColumn, PortfolioRow, Scenario, ScenarioStore, SortDirection,
    SortKey, compare, portfolio,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPreset {
    Optimistic,
    Base,
    Conservative,
}

impl From<CliPreset> for Preset {
    fn from(value: CliPreset) -> Self {
        match value {
            CliPreset::Optimistic => Preset::Optimistic,
            CliPreset::Base => Preset::Base,
            CliPreset::Conservative => Preset::Conservative,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPreset {
    #[serde(alias = "Optimistic")]
    Optimistic,
    #[serde(alias = "Base", alias = "baseline")]
    Base,
    #[serde(alias = "Conservative")]
    Conservative,
}

impl From<ApiPreset> for CliPreset {
    fn from(value: ApiPreset) -> Self {
        match value {
            ApiPreset::Optimistic => CliPreset::Optimistic,
            ApiPreset::Base => CliPreset::Base,
            ApiPreset::Conservative => CliPreset::Conservative,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ApiSortKey {
    CreatedAt,
    Name,
    Address,
    Rent,
    #[serde(alias = "cf")]
    CashFlow,
    Noi,
    #[serde(alias = "cap")]
    CapRate,
    Dscr,
    #[serde(alias = "coc")]
    CashOnCash,
}

impl From<ApiSortKey> for SortKey {
    fn from(value: ApiSortKey) -> Self {
        match value {
            ApiSortKey::CreatedAt => SortKey::CreatedAt,
            ApiSortKey::Name => SortKey::Name,
            ApiSortKey::Address => SortKey::Address,
            ApiSortKey::Rent => SortKey::Rent,
            ApiSortKey::CashFlow => SortKey::CashFlow,
            ApiSortKey::Noi => SortKey::Noi,
            ApiSortKey::CapRate => SortKey::CapRate,
            ApiSortKey::Dscr => SortKey::Dscr,
            ApiSortKey::CashOnCash => SortKey::CashOnCash,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiSortDirection {
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

impl From<ApiSortDirection> for SortDirection {
    fn from(value: ApiSortDirection) -> Self {
        match value {
            ApiSortDirection::Asc => SortDirection::Ascending,
            ApiSortDirection::Desc => SortDirection::Descending,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "rentmax",
    about = "Rental property cash-flow calculator (rent band, costs, NOI, cap rate, DSCR, cash-on-cash)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API and bundled page
    Serve(ServeConfig),
    /// Compute one property from flags and print the result
    Calc(CalcArgs),
}

/// Every value is taken as typed and coerced permissively; unset flags keep
/// the form defaults. Use `--flag=-5` for negative entries.
#[derive(Args, Debug, Default)]
pub struct CalcArgs {
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub beds: Option<String>,
    #[arg(long)]
    pub baths: Option<String>,
    #[arg(long)]
    pub sqft: Option<String>,
    #[arg(long, help = "Monthly asking rent")]
    pub target_rent: Option<String>,
    #[arg(long, help = "Vacancy rate in percent, clamped to 0-100")]
    pub vacancy_rate_pct: Option<String>,
    #[arg(long, help = "Management fee in percent of rent, clamped to 0-100")]
    pub mgmt_fee_pct: Option<String>,
    #[arg(long, help = "Monthly insurance")]
    pub insurance: Option<String>,
    #[arg(long, help = "Monthly HOA dues")]
    pub hoa: Option<String>,
    #[arg(long, help = "Monthly maintenance")]
    pub maintenance: Option<String>,
    #[arg(long = "mortgage-pi", help = "Manual monthly P&I, used when --use-loan=0")]
    pub mortgage_pi: Option<String>,
    #[arg(long, help = "Annual property tax")]
    pub property_tax_annual: Option<String>,
    #[arg(long)]
    pub purchase_price: Option<String>,
    #[arg(long, help = "Down payment in percent of price")]
    pub down_pct: Option<String>,
    #[arg(long, help = "Annual interest rate in percent")]
    pub rate_pct: Option<String>,
    #[arg(long)]
    pub term_years: Option<String>,
    #[arg(long, help = "Annual PMI in percent of loan, charged below 20% down")]
    pub pmi_annual_pct: Option<String>,
    #[arg(long, help = "Closing costs in percent of price")]
    pub closing_cost_pct: Option<String>,
    #[arg(long, help = "1 to amortize the loan, 0 to use --mortgage-pi")]
    pub use_loan: Option<String>,
    #[arg(long, help = "Annual CapEx reserve (excluded from NOI)")]
    pub capex_annual: Option<String>,
    #[arg(long, value_enum, help = "Overwrite vacancy, management and maintenance")]
    pub preset: Option<CliPreset>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

fn build_assumptions(args: &CalcArgs) -> AssumptionSet {
    let mut a = AssumptionSet::form_defaults();

    if let Some(preset) = args.preset {
        a.apply_preset(preset.into());
    }
    if let Some(v) = &args.address {
        a.address = v.clone();
    }
    if let Some(v) = &args.beds {
        a.beds = v.as_str().into();
    }
    if let Some(v) = &args.baths {
        a.baths = v.as_str().into();
    }
    if let Some(v) = &args.sqft {
        a.sqft = v.as_str().into();
    }
    if let Some(v) = &args.target_rent {
        a.target_rent = v.as_str().into();
    }
    if let Some(v) = &args.vacancy_rate_pct {
        a.vacancy_rate_pct = v.as_str().into();
    }
    if let Some(v) = &args.mgmt_fee_pct {
        a.mgmt_fee_pct = v.as_str().into();
    }
    if let Some(v) = &args.insurance {
        a.insurance = v.as_str().into();
    }
    if let Some(v) = &args.hoa {
        a.hoa = v.as_str().into();
    }
    if let Some(v) = &args.maintenance {
        a.maintenance = v.as_str().into();
    }
    if let Some(v) = &args.mortgage_pi {
        a.mortgage_pi = v.as_str().into();
    }
    if let Some(v) = &args.property_tax_annual {
        a.property_tax_annual = v.as_str().into();
    }
    if let Some(v) = &args.purchase_price {
        a.purchase_price = v.as_str().into();
    }
    if let Some(v) = &args.down_pct {
        a.down_pct = v.as_str().into();
    }
    if let Some(v) = &args.rate_pct {
        a.rate_pct = v.as_str().into();
    }
    if let Some(v) = &args.term_years {
        a.term_years = v.as_str().into();
    }
    if let Some(v) = &args.pmi_annual_pct {
        a.pmi_annual_pct = v.as_str().into();
    }
    if let Some(v) = &args.closing_cost_pct {
        a.closing_cost_pct = v.as_str().into();
    }
    if let Some(v) = &args.use_loan {
        a.use_loan = v.as_str().into();
    }
    if let Some(v) = &args.capex_annual {
        a.capex_annual = v.as_str().into();
    }
    a
}

/// Renders the one-shot `calc` command output.
pub fn run_calc(args: &CalcArgs) -> crate::Result<String> {
    let assumptions = build_assumptions(args);
    let results = compute(&assumptions);
    let notes = advisories(&assumptions, &results);
    Ok(match args.format {
        OutputFormat::Text => text_report(&assumptions, &results, &notes),
        OutputFormat::Csv => report_csv(&assumptions, &results),
        OutputFormat::Json => {
            let body = CalcResponse {
                results,
                advisories: notes,
            };
            format!("{}\n", serde_json::to_string_pretty(&body)?)
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct CalcPayload {
    #[serde(flatten)]
    assumptions: AssumptionSet,
    #[serde(default)]
    preset: Option<ApiPreset>,
}

impl CalcPayload {
    fn into_assumptions(self) -> AssumptionSet {
        let mut a = self.assumptions;
        if let Some(preset) = self.preset {
            a.apply_preset(CliPreset::from(preset).into());
        }
        a
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalcResponse {
    results: ResultSet,
    advisories: Vec<Advisory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EstimateQuery {
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePayload {
    #[serde(default)]
    name: String,
    #[serde(default = "AssumptionSet::form_defaults")]
    values: AssumptionSet,
}

#[derive(Debug, Deserialize)]
struct RenamePayload {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuickAddPayload {
    #[serde(default = "AssumptionSet::form_defaults")]
    base: AssumptionSet,
    #[serde(default)]
    address: String,
    #[serde(default)]
    target_rent: String,
}

#[derive(Debug, Deserialize)]
struct CsvImportPayload {
    csv: String,
    #[serde(default)]
    mapping: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mapping: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PortfolioQuery {
    filter: String,
    sort: Option<ApiSortKey>,
    dir: Option<ApiSortDirection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompareQuery {
    ids: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<ScenarioStore>>,
}

impl AppState {
    fn new(store: ScenarioStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> MutexGuard<'_, ScenarioStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        error_response(status, &self.to_string())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/calc", get(calc_get_handler).post(calc_post_handler))
        .route("/api/estimates", get(estimates_handler))
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(save_scenario_handler),
        )
        .route("/api/scenarios/export", get(export_scenarios_handler))
        .route("/api/scenarios/import", post(import_scenarios_handler))
        .route("/api/scenarios/import-csv", post(import_csv_handler))
        .route("/api/scenarios/quick-add", post(quick_add_handler))
        .route(
            "/api/scenarios/:id",
            get(get_scenario_handler).delete(delete_scenario_handler),
        )
        .route("/api/scenarios/:id/rename", post(rename_scenario_handler))
        .route(
            "/api/scenarios/:id/duplicate",
            post(duplicate_scenario_handler),
        )
        .route("/api/portfolio", get(portfolio_handler))
        .route("/api/portfolio.csv", get(portfolio_csv_handler))
        .route("/api/compare", get(compare_handler))
        .route("/api/export/csv", post(export_csv_handler))
        .route("/api/report", post(report_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServeConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(ScenarioStore::open(&config.store_path));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, store = %config.store_path.display(), "RentMax HTTP API listening");
    tracing::info!("Local access: http://127.0.0.1:{}/", config.port);

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calc_get_handler(Query(payload): Query<CalcPayload>) -> Response {
    calc_handler_impl(payload)
}

async fn calc_post_handler(Json(payload): Json<CalcPayload>) -> Response {
    calc_handler_impl(payload)
}

fn calc_handler_impl(payload: CalcPayload) -> Response {
    let assumptions = payload.into_assumptions();
    let results = compute(&assumptions);
    let advisories = advisories(&assumptions, &results);
    json_response(
        StatusCode::OK,
        CalcResponse {
            results,
            advisories,
        },
    )
}

async fn estimates_handler(Query(query): Query<EstimateQuery>) -> Response {
    let body: RentEstimate = estimate(&query.address);
    json_response(StatusCode::OK, body)
}

async fn list_scenarios_handler(State(state): State<AppState>) -> Response {
    let scenarios: Vec<Scenario> = state.store().list().to_vec();
    json_response(StatusCode::OK, scenarios)
}

async fn save_scenario_handler(
    State(state): State<AppState>,
    Json(payload): Json<SavePayload>,
) -> Result<Response, Error> {
    let saved = state.store().save(&payload.name, payload.values)?;
    Ok(json_response(StatusCode::CREATED, saved))
}

async fn get_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let scenario = state.store().get(&id)?.clone();
    Ok(json_response(StatusCode::OK, scenario))
}

async fn delete_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let removed = state.store().delete(&id)?;
    Ok(json_response(StatusCode::OK, removed))
}

async fn rename_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RenamePayload>,
) -> Result<Response, Error> {
    let renamed = state.store().rename(&id, &payload.name)?;
    Ok(json_response(StatusCode::OK, renamed))
}

async fn duplicate_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let copy = state.store().duplicate(&id)?;
    Ok(json_response(StatusCode::CREATED, copy))
}

async fn quick_add_handler(
    State(state): State<AppState>,
    Json(payload): Json<QuickAddPayload>,
) -> Result<Response, Error> {
    let saved = state
        .store()
        .quick_add(&payload.base, &payload.address, &payload.target_rent)?;
    Ok(json_response(StatusCode::CREATED, saved))
}

async fn export_scenarios_handler(State(state): State<AppState>) -> Result<Response, Error> {
    let json = state.store().export_json()?;
    Ok(download_response(
        "application/json",
        "rentmax_scenarios.json",
        json,
    ))
}

async fn import_scenarios_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, Error> {
    let count = state.store().import_json(&body)?;
    tracing::info!(count, "scenarios imported from JSON");
    Ok(json_response(
        StatusCode::OK,
        ImportResponse {
            count,
            mapping: None,
        },
    ))
}

async fn import_csv_handler(
    State(state): State<AppState>,
    Json(payload): Json<CsvImportPayload>,
) -> Result<Response, Error> {
    let table = parse_csv(&payload.csv);
    if table.headers.is_empty() {
        return Err(Error::BadRequest("CSV has no header row".to_string()));
    }
    let mapping = payload
        .mapping
        .unwrap_or_else(|| guess_mapping(&table.headers));
    let scenarios = scenarios_from_table(&table, &mapping);
    let count = scenarios.len();
    state.store().extend_front(scenarios)?;
    tracing::info!(count, "scenarios imported from CSV");
    Ok(json_response(
        StatusCode::OK,
        ImportResponse {
            count,
            mapping: Some(mapping),
        },
    ))
}

fn portfolio_rows(state: &AppState, query: PortfolioQuery) -> Vec<PortfolioRow> {
    let key = query.sort.map(SortKey::from).unwrap_or_default();
    let dir = query.dir.map(SortDirection::from).unwrap_or_default();
    portfolio(state.store().list(), &query.filter, key, dir)
}

async fn portfolio_handler(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Response {
    json_response(StatusCode::OK, portfolio_rows(&state, query))
}

async fn portfolio_csv_handler(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Response {
    let rows = portfolio_rows(&state, query);
    download_response(
        "text/csv; charset=utf-8",
        "rentmax_portfolio.csv",
        portfolio_csv(&rows),
    )
}

async fn compare_handler(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Response {
    let mut selection = CompareSelection::default();
    for id in query.ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !selection.ids().iter().any(|x| x == id) {
            selection.toggle(id);
        }
    }
    let columns: Vec<ComparisonColumn> = compare(state.store().list(), selection.ids());
    json_response(StatusCode::OK, columns)
}

async fn export_csv_handler(Json(payload): Json<CalcPayload>) -> Response {
    let assumptions = payload.into_assumptions();
    let results = compute(&assumptions);
    download_response(
        "text/csv; charset=utf-8",
        "rentmax_export.csv",
        report_csv(&assumptions, &results),
    )
}

async fn report_handler(Json(payload): Json<CalcPayload>) -> Response {
    let assumptions = payload.into_assumptions();
    let results = compute(&assumptions);
    let notes = advisories(&assumptions, &results);
    with_cache_control((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text_report(&assumptions, &results, &notes),
    ))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn download_response(content_type: &'static str, filename: &str, body: String) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    with_cache_control((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
