use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    CommissionEstimate, EstimateResult, LeadField, LeadLedger, LeadRecord, LeadSubmission,
    ResidualProjection, SavingsMode, Variant, VariantConfig, commission_estimate, estimate,
    project_residuals,
};
use crate::error::{ApiError, ApiResult, InputError};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_MONTHLY_VOLUME: f64 = 50_000.0;
const DEFAULT_CURRENT_RATE: f64 = 3.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliVariant {
    Pocket,
    Tiered,
    Interchange,
    Residual,
}

impl From<CliVariant> for Variant {
    fn from(value: CliVariant) -> Self {
        match value {
            CliVariant::Pocket => Variant::Pocket,
            CliVariant::Tiered => Variant::Tiered,
            CliVariant::Interchange => Variant::Interchange,
            CliVariant::Residual => Variant::Residual,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliSavingsMode {
    Conservative,
    Moderate,
    Aggressive,
}

impl From<CliSavingsMode> for SavingsMode {
    fn from(value: CliSavingsMode) -> Self {
        match value {
            CliSavingsMode::Conservative => SavingsMode::Conservative,
            CliSavingsMode::Moderate => SavingsMode::Moderate,
            CliSavingsMode::Aggressive => SavingsMode::Aggressive,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiVariant {
    #[serde(alias = "basic")]
    Pocket,
    #[serde(alias = "tiers")]
    Tiered,
    #[serde(alias = "interchangeBreakdown", alias = "interchange-breakdown")]
    Interchange,
    #[serde(alias = "residuals")]
    Residual,
}

impl From<ApiVariant> for CliVariant {
    fn from(value: ApiVariant) -> Self {
        match value {
            ApiVariant::Pocket => CliVariant::Pocket,
            ApiVariant::Tiered => CliVariant::Tiered,
            ApiVariant::Interchange => CliVariant::Interchange,
            ApiVariant::Residual => CliVariant::Residual,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiSavingsMode {
    #[serde(alias = "30")]
    Conservative,
    #[serde(alias = "40")]
    Moderate,
    #[serde(alias = "50")]
    Aggressive,
}

impl From<ApiSavingsMode> for CliSavingsMode {
    fn from(value: ApiSavingsMode) -> Self {
        match value {
            ApiSavingsMode::Conservative => CliSavingsMode::Conservative,
            ApiSavingsMode::Moderate => CliSavingsMode::Moderate,
            ApiSavingsMode::Aggressive => CliSavingsMode::Aggressive,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pocket-analyst",
    about = "Merchant fee savings calculator and lead capture for payments sales reps"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator UI and JSON API
    Serve(ServeArgs),
    /// Print a fee estimate with the rep's commission as JSON
    Estimate(EstimateArgs),
    /// Print a 36-month residual income projection as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on; overrides the port in POCKET_LISTEN_ADDR")]
    pub port: Option<u16>,
    #[arg(long, value_enum, help = "Calculator variant; defaults to POCKET_VARIANT")]
    pub variant: Option<CliVariant>,
}

impl ServeArgs {
    pub fn listen_addr(&self, configured: SocketAddr) -> SocketAddr {
        match self.port {
            Some(port) => SocketAddr::new(configured.ip(), port),
            None => configured,
        }
    }

    pub fn resolve_variant(&self, configured: Variant) -> Variant {
        resolve_variant(self.variant, configured)
    }
}

#[derive(Args, Debug, Clone)]
pub struct EstimateArgs {
    #[arg(long, value_enum, help = "Calculator variant; defaults to POCKET_VARIANT")]
    pub variant: Option<CliVariant>,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_VOLUME,
        help = "Monthly card processing volume in dollars"
    )]
    pub monthly_volume: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_CURRENT_RATE,
        help = "Current effective rate in percent (total fees / volume)"
    )]
    pub current_rate: f64,
    #[arg(
        long,
        value_enum,
        help = "Savings assumption; defaults to the variant's default"
    )]
    pub savings_mode: Option<CliSavingsMode>,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub estimate: EstimateArgs,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "New merchants signed per month; clamped to the variant's range"
    )]
    pub deals_per_month: Option<i64>,
    #[arg(
        long,
        help = "Monthly residual per merchant; defaults to the estimate's residual"
    )]
    pub residual_per_merchant: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateReport {
    pub variant: Variant,
    pub savings_mode: SavingsMode,
    pub monthly_volume: f64,
    pub current_rate: f64,
    pub estimate: EstimateResult,
    pub commission: CommissionEstimate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    pub variant: Variant,
    pub horizon_months: u32,
    pub estimate: EstimateReport,
    pub projection: ResidualProjection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EstimatePayload {
    variant: Option<ApiVariant>,
    monthly_volume: Option<f64>,
    current_rate: Option<f64>,
    savings_mode: Option<ApiSavingsMode>,
}

// Query strings cannot go through #[serde(flatten)], so the estimate keys are
// repeated here.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResidualPayload {
    variant: Option<ApiVariant>,
    monthly_volume: Option<f64>,
    current_rate: Option<f64>,
    savings_mode: Option<ApiSavingsMode>,
    deals_per_month: Option<i64>,
    residual_per_merchant: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LeadPayload {
    business_name: Option<String>,
    owner_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    monthly_volume: Option<f64>,
    current_rate: Option<f64>,
    notes: Option<String>,
    statement_attached: Option<bool>,
    statement_file_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadsResponse {
    count: usize,
    total_pipeline: f64,
    total_monthly_volume: f64,
    leads: Vec<LeadRecord>,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    cleared: usize,
}

/// Per-process state shared by all handlers. The ledger is the only mutable
/// piece.
#[derive(Clone)]
pub struct AppState {
    variant: Variant,
    ledger: Arc<Mutex<LeadLedger>>,
}

impl AppState {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            ledger: Arc::new(Mutex::new(LeadLedger::new())),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn ledger(&self) -> MutexGuard<'_, LeadLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve_variant(requested: Option<CliVariant>, configured: Variant) -> Variant {
    requested.map(Variant::from).unwrap_or(configured)
}

pub fn estimate_report(
    args: &EstimateArgs,
    default_variant: Variant,
) -> Result<EstimateReport, InputError> {
    let config = resolve_variant(args.variant, default_variant).config();
    let savings_mode = args
        .savings_mode
        .map(SavingsMode::from)
        .unwrap_or(config.default_savings_mode);
    let input = config.estimate_input(args.monthly_volume, args.current_rate, Some(savings_mode))?;
    let result = estimate(&input);
    let commission = commission_estimate(&result, config.commission_fraction);

    Ok(EstimateReport {
        variant: config.variant,
        savings_mode,
        monthly_volume: input.monthly_volume,
        current_rate: input.current_rate_percent,
        estimate: result,
        commission,
    })
}

pub fn projection_report(
    args: &ProjectArgs,
    default_variant: Variant,
) -> Result<ProjectionReport, InputError> {
    let report = estimate_report(&args.estimate, default_variant)?;
    let config = report.variant.config();
    let residual_per_merchant = args
        .residual_per_merchant
        .unwrap_or(report.commission.monthly_residual);
    let input = config.residual_input(args.deals_per_month, residual_per_merchant)?;

    Ok(ProjectionReport {
        variant: config.variant,
        horizon_months: input.horizon_months,
        projection: project_residuals(&input),
        estimate: report,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/variant", get(variant_handler))
        .route(
            "/api/estimate",
            get(estimate_get_handler).post(estimate_post_handler),
        )
        .route(
            "/api/residuals",
            get(residuals_get_handler).post(residuals_post_handler),
        )
        .route(
            "/api/leads",
            get(leads_list_handler)
                .post(leads_create_handler)
                .delete(leads_reset_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, variant: Variant) -> std::io::Result<()> {
    let app = router(AppState::new(variant));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, %variant, "pocket analyst listening");
    tracing::info!("Local access: http://127.0.0.1:{}/", addr.port());

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

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn variant_handler(State(state): State<AppState>) -> Response {
    let config: VariantConfig = state.variant().config();
    json_response(StatusCode::OK, config)
}

async fn estimate_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<EstimatePayload>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(payload) = payload?;
    estimate_handler_impl(&state, payload)
}

async fn estimate_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<EstimatePayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    estimate_handler_impl(&state, payload)
}

fn estimate_handler_impl(state: &AppState, payload: EstimatePayload) -> ApiResult<Response> {
    let args = estimate_args_from_payload(payload);
    let report = estimate_report(&args, state.variant())?;
    tracing::debug!(
        variant = %report.variant,
        monthly_volume = report.monthly_volume,
        current_rate = report.current_rate,
        "estimate computed"
    );
    Ok(json_response(StatusCode::OK, report))
}

async fn residuals_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<ResidualPayload>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(payload) = payload?;
    residuals_handler_impl(&state, payload)
}

async fn residuals_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResidualPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    residuals_handler_impl(&state, payload)
}

fn residuals_handler_impl(state: &AppState, payload: ResidualPayload) -> ApiResult<Response> {
    let args = project_args_from_payload(payload);
    let report = projection_report(&args, state.variant())?;
    tracing::debug!(
        variant = %report.variant,
        deals_per_month = report.projection.deals_per_month,
        "residual projection computed"
    );
    Ok(json_response(StatusCode::OK, report))
}

async fn leads_list_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, leads_snapshot(&state))
}

async fn leads_create_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeadPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let record = submit_lead(&state, payload)?;
    Ok(json_response(StatusCode::CREATED, record))
}

async fn leads_reset_handler(State(state): State<AppState>) -> Response {
    let cleared = state.ledger().reset();
    tracing::info!(cleared, "lead ledger reset");
    json_response(StatusCode::OK, ResetResponse { cleared })
}

fn leads_snapshot(state: &AppState) -> LeadsResponse {
    let ledger = state.ledger();
    LeadsResponse {
        count: ledger.len(),
        total_pipeline: ledger.total(LeadField::EstimatedSavings),
        total_monthly_volume: ledger.total(LeadField::MonthlyVolume),
        leads: ledger.all().to_vec(),
    }
}

fn submit_lead(state: &AppState, payload: LeadPayload) -> ApiResult<LeadRecord> {
    let submission = lead_submission_from_payload(payload);
    let config = state.variant().config();
    let mut ledger = state.ledger();
    let record = match ledger.submit(submission, &config, Utc::now()) {
        Ok(record) => record.clone(),
        Err(err) => {
            tracing::warn!(error = %err, "lead submission rejected");
            return Err(err.into());
        }
    };
    tracing::info!(
        business = %record.business_name,
        estimated_savings = record.estimated_savings,
        statement_attached = record.statement_attached,
        leads = ledger.len(),
        "lead captured"
    );
    Ok(record)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn default_estimate_args() -> EstimateArgs {
    EstimateArgs {
        variant: None,
        monthly_volume: DEFAULT_MONTHLY_VOLUME,
        current_rate: DEFAULT_CURRENT_RATE,
        savings_mode: None,
    }
}

fn estimate_args_from_payload(payload: EstimatePayload) -> EstimateArgs {
    let mut args = default_estimate_args();
    if let Some(v) = payload.variant {
        args.variant = Some(v.into());
    }
    if let Some(v) = payload.monthly_volume {
        args.monthly_volume = v;
    }
    if let Some(v) = payload.current_rate {
        args.current_rate = v;
    }
    if let Some(v) = payload.savings_mode {
        args.savings_mode = Some(v.into());
    }
    args
}

fn project_args_from_payload(payload: ResidualPayload) -> ProjectArgs {
    let estimate = estimate_args_from_payload(EstimatePayload {
        variant: payload.variant,
        monthly_volume: payload.monthly_volume,
        current_rate: payload.current_rate,
        savings_mode: payload.savings_mode,
    });
    ProjectArgs {
        estimate,
        deals_per_month: payload.deals_per_month,
        residual_per_merchant: payload.residual_per_merchant,
    }
}

fn lead_submission_from_payload(payload: LeadPayload) -> LeadSubmission {
    let has_file = payload
        .statement_file_name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    LeadSubmission {
        business_name: payload.business_name.unwrap_or_default(),
        owner_name: payload.owner_name.unwrap_or_default(),
        phone: payload.phone,
        email: payload.email,
        monthly_volume: payload.monthly_volume.unwrap_or(DEFAULT_MONTHLY_VOLUME),
        current_rate_percent: payload.current_rate.unwrap_or(DEFAULT_CURRENT_RATE),
        notes: payload.notes,
        statement_attached: payload.statement_attached.unwrap_or(false) || has_file,
    }
}
