//! # REST API
//!
//! Builds the axum router that exposes the reserve over HTTP. Every handler
//! takes the single reserve lock for the whole operation, so requests are
//! applied one at a time and never observe a half-applied deposit or
//! withdrawal.
//!
//! Amounts travel as strings of raw 18-decimal units (decimal or `0x` hex);
//! responses carry them as `0x` hex.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                             |
//! |--------|------------------------|-----------------------------------------|
//! | GET    | `/health`              | Liveness probe                          |
//! | GET    | `/status`              | Reserve snapshot                        |
//! | GET    | `/price`               | POD price                               |
//! | GET    | `/vault/:user`         | Holder's principal and withdrawable     |
//! | GET    | `/events`              | Audit log                               |
//! | POST   | `/deposit`             | Deposit pipeline                        |
//! | POST   | `/withdraw`            | Exact withdrawal                        |
//! | POST   | `/withdraw-percentage` | Percentage withdrawal                   |
//! | POST   | `/admin/deposit-status`| Toggle deposits                         |
//! | POST   | `/admin/fee`           | Change withdrawal fee                   |
//! | POST   | `/admin/strategy`      | Switch strategy asset                   |
//! | POST   | `/admin/ownership`     | Transfer or renounce ownership          |
//! | POST   | `/faucet`              | Devnet: credit DRC and approve reserve  |

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::{Address, U256};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dr_contracts::{
    DepositRecord, DigitalReserve, ReserveConfig, ReserveError, ReserveEvent, SetTokenRecord,
    StrategyPair, VaultValue, WithdrawRecord, WithdrawalFee,
};
use dr_protocol::config::DEFAULT_DEADLINE_WINDOW_SECS;
use dr_protocol::devnet;
use dr_protocol::market::{AssetLedger, Clock, SimulatedMarket};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// The reserve the node hosts.
pub type Reserve = DigitalReserve<SimulatedMarket>;

/// The reserve behind the one lock every handler takes.
pub type SharedReserve = Arc<Mutex<Reserve>>;

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    pub reserve: SharedReserve,
    pub metrics: SharedMetrics,
}

/// Deployment parameters for a devnet reserve.
#[derive(Debug, Clone)]
pub struct DevnetParams {
    pub owner: Address,
    pub fee: WithdrawalFee,
    pub deposits_enabled: bool,
    pub strategy: Address,
    pub now: u64,
}

/// Seeds the devnet market and deploys a reserve over it with the initial
/// strategy already set.
pub fn devnet_reserve(params: &DevnetParams) -> anyhow::Result<Reserve> {
    let market = devnet::devnet_market(params.now).context("failed to seed devnet market")?;
    let mut config = ReserveConfig::devnet(params.owner);
    config.fee = params.fee;
    config.deposit_enabled = params.deposits_enabled;

    let mut reserve = DigitalReserve::new(config, market).context("invalid reserve configuration")?;
    reserve
        .set_token_address(params.owner, params.strategy, params.now + DEFAULT_DEADLINE_WINDOW_SECS)
        .context("failed to set initial strategy")?;
    Ok(reserve)
}

/// Resolves a devnet symbol (`USDC`) or a hex address.
pub fn resolve_token(token: &str) -> Option<Address> {
    devnet::token_by_symbol(token).or_else(|| Address::from_str(token).ok())
}

/// Wall-clock unix seconds.
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/price", get(price_handler))
        .route("/vault/:user", get(vault_handler))
        .route("/events", get(events_handler))
        .route("/deposit", post(deposit_handler))
        .route("/withdraw", post(withdraw_handler))
        .route("/withdraw-percentage", post(withdraw_percentage_handler))
        .route("/admin/deposit-status", post(deposit_status_handler))
        .route("/admin/fee", post(fee_handler))
        .route("/admin/strategy", post(strategy_handler))
        .route("/admin/ownership", post(ownership_handler))
        .route("/faucet", post(faucet_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub user: Address,
    pub amount: String,
    pub deadline: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub user: Address,
    pub amount: String,
    pub deadline: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawPercentageRequest {
    pub user: Address,
    pub percentage: u8,
    pub deadline: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DepositStatusRequest {
    pub caller: Address,
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeeRequest {
    pub caller: Address,
    pub fraction: u64,
    pub base: u64,
}

#[derive(Debug, Deserialize)]
pub struct StrategyRequest {
    pub caller: Address,
    /// Devnet symbol or address.
    pub token: String,
    pub deadline: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct OwnershipRequest {
    pub caller: Address,
    /// `None` renounces ownership.
    pub new_owner: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    pub account: Address,
    /// Whole DRC to credit.
    pub amount: u64,
}

/// `/status` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: String,
    pub now: u64,
    pub deposit_asset: Address,
    pub routing_asset: Option<Address>,
    pub strategy: Option<StrategyPair>,
    pub deposit_enabled: bool,
    pub owner: Option<Address>,
    pub withdrawal_fee: WithdrawalFee,
    pub pod_total_supply: U256,
    pub tokens_stored: U256,
    pub net_asset_value: U256,
    pub pod_price: U256,
    pub price_decimals: u8,
    pub retained_fees: U256,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub price: U256,
    pub price_decimals: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub user: Address,
    pub pod_balance: U256,
    #[serde(flatten)]
    pub value: VaultValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetResponse {
    pub account: Address,
    pub credited: U256,
    pub balance: U256,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    Reserve(ReserveError),
    BadRequest(String),
}

impl From<ReserveError> for ApiError {
    fn from(err: ReserveError) -> Self {
        ApiError::Reserve(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Reserve(err) => match err {
                ReserveError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
                ReserveError::DepositDisabled => StatusCode::CONFLICT,
                ReserveError::SwapFailed { .. } => StatusCode::BAD_GATEWAY,
                ReserveError::Arithmetic(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Reserve(err) => err.to_string(),
            ApiError::BadRequest(msg) => msg,
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn parse_amount(raw: &str) -> Result<U256, ApiError> {
    U256::from_str(raw.trim()).map_err(|e| ApiError::BadRequest(format!("invalid amount {raw:?}: {e}")))
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Moves the market clock up to wall-clock time. Never backwards.
fn sync_clock(reserve: &mut Reserve) -> u64 {
    let now = unix_now().max(reserve.market().now());
    reserve.market_mut().set_now(now);
    now
}

/// Runs `op` under the reserve lock with the clock synced, recording
/// latency, gauges and failures.
fn execute<T>(
    state: &AppState,
    operation: &'static str,
    op: impl FnOnce(&mut Reserve, u64) -> Result<T, ReserveError>,
) -> Result<T, ApiError> {
    let started = Instant::now();
    let mut reserve = state.reserve.lock();
    let now = sync_clock(&mut reserve);
    let result = op(&mut reserve, now);
    state
        .metrics
        .operation_latency_seconds
        .observe(started.elapsed().as_secs_f64());

    match &result {
        Ok(_) => state.metrics.observe(&*reserve),
        Err(e) => {
            state.metrics.record_failure(operation);
            tracing::warn!(operation, error = %e, "request rejected");
        }
    }
    result.map_err(ApiError::from)
}

fn snapshot(version: &str, reserve: &Reserve) -> Result<StatusResponse, ReserveError> {
    Ok(StatusResponse {
        version: version.to_string(),
        now: reserve.market().now(),
        deposit_asset: reserve.deposit_asset(),
        routing_asset: reserve.routing_asset(),
        strategy: reserve.strategy(),
        deposit_enabled: reserve.is_deposit_enabled(),
        owner: reserve.owner(),
        withdrawal_fee: reserve.withdrawal_fee(),
        pod_total_supply: reserve.total_supply(),
        tokens_stored: reserve.total_token_stored(),
        net_asset_value: reserve.net_asset_value()?,
        pod_price: reserve.get_proof_of_deposit_price()?,
        price_decimals: reserve.price_decimals(),
        retained_fees: reserve.retained_fees(),
    })
}

fn deadline_or_default(deadline: Option<u64>, now: u64) -> u64 {
    deadline.unwrap_or(now + DEFAULT_DEADLINE_WINDOW_SECS)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — reserve snapshot.
async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let reserve = state.reserve.lock();
    Ok(Json(snapshot(&state.version, &reserve)?))
}

/// `GET /price` — current POD price.
async fn price_handler(State(state): State<AppState>) -> Result<Json<PriceResponse>, ApiError> {
    let reserve = state.reserve.lock();
    Ok(Json(PriceResponse {
        price: reserve.get_proof_of_deposit_price()?,
        price_decimals: reserve.price_decimals(),
    }))
}

/// `GET /vault/:user` — a holder's principal and withdrawable value.
async fn vault_handler(
    Path(user): Path<Address>,
    State(state): State<AppState>,
) -> Result<Json<VaultResponse>, ApiError> {
    let reserve = state.reserve.lock();
    Ok(Json(VaultResponse {
        user,
        pod_balance: reserve.balance_of(user),
        value: reserve.get_user_vault_in_drc(user)?,
    }))
}

/// `GET /events` — the audit log, oldest first.
async fn events_handler(State(state): State<AppState>) -> Json<Vec<ReserveEvent>> {
    Json(state.reserve.lock().events().to_vec())
}

/// `POST /deposit`
async fn deposit_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<DepositRecord>, ApiError> {
    let amount = parse_amount(&req.amount)?;
    let record = execute(&state, "deposit", |reserve, now| {
        reserve.deposit_drc(req.user, amount, deadline_or_default(req.deadline, now))
    })?;
    state.metrics.deposits_total.inc();
    Ok(Json(record))
}

/// `POST /withdraw`
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawRecord>, ApiError> {
    let amount = parse_amount(&req.amount)?;
    let record = execute(&state, "withdraw", |reserve, now| {
        reserve.withdraw_drc(req.user, amount, deadline_or_default(req.deadline, now))
    })?;
    state.metrics.withdrawals_total.inc();
    Ok(Json(record))
}

/// `POST /withdraw-percentage`
async fn withdraw_percentage_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawPercentageRequest>,
) -> Result<Json<WithdrawRecord>, ApiError> {
    let record = execute(&state, "withdraw_percentage", |reserve, now| {
        reserve.withdraw_percentage(req.user, req.percentage, deadline_or_default(req.deadline, now))
    })?;
    state.metrics.withdrawals_total.inc();
    Ok(Json(record))
}

/// `POST /admin/deposit-status`
async fn deposit_status_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositStatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = execute(&state, "change_deposit_status", |reserve, _| {
        reserve.change_deposit_status(req.caller, req.enabled)?;
        snapshot(&state.version, reserve)
    })?;
    Ok(Json(status))
}

/// `POST /admin/fee`
async fn fee_handler(
    State(state): State<AppState>,
    Json(req): Json<FeeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = execute(&state, "change_fee", |reserve, _| {
        reserve.change_fee(req.caller, req.fraction, req.base)?;
        snapshot(&state.version, reserve)
    })?;
    Ok(Json(status))
}

/// `POST /admin/strategy`
async fn strategy_handler(
    State(state): State<AppState>,
    Json(req): Json<StrategyRequest>,
) -> Result<Json<SetTokenRecord>, ApiError> {
    let token = resolve_token(&req.token)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown token {:?}", req.token)))?;
    let record = execute(&state, "set_token_address", |reserve, now| {
        reserve.set_token_address(req.caller, token, deadline_or_default(req.deadline, now))
    })?;
    state.metrics.strategy_switches_total.inc();
    Ok(Json(record))
}

/// `POST /admin/ownership`
async fn ownership_handler(
    State(state): State<AppState>,
    Json(req): Json<OwnershipRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = execute(&state, "ownership", |reserve, _| {
        match req.new_owner {
            Some(new_owner) => reserve.transfer_ownership(req.caller, new_owner)?,
            None => reserve.renounce_ownership(req.caller)?,
        }
        snapshot(&state.version, reserve)
    })?;
    Ok(Json(status))
}

/// `POST /faucet` — credits whole DRC to an account and approves the
/// reserve to pull it.
async fn faucet_handler(
    State(state): State<AppState>,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<FaucetResponse>, ApiError> {
    let mut reserve = state.reserve.lock();
    let spender = reserve.address();
    let market = reserve.market_mut();
    let credited = devnet::faucet(market, req.account, req.amount)
        .and_then(|credited| {
            market.approve(devnet::DRC, req.account, spender, U256::MAX)?;
            Ok(credited)
        })
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let balance = market.balance_of(devnet::DRC, req.account);
    tracing::info!(account = %req.account, %credited, "faucet credited");
    Ok(Json(FaucetResponse {
        account: req.account,
        credited,
        balance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ReserveMetrics;
    use axum::body::Body;
    use axum::http::Request;
    use dr_protocol::config::units;
    use dr_protocol::devnet::DEPLOYER;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const ALICE: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";

    fn test_app_state() -> AppState {
        let reserve = devnet_reserve(&DevnetParams {
            owner: DEPLOYER,
            fee: WithdrawalFee::default(),
            deposits_enabled: true,
            strategy: devnet::USDC,
            now: unix_now(),
        })
        .unwrap();
        AppState {
            version: "0.1.0-test".into(),
            reserve: Arc::new(Mutex::new(reserve)),
            metrics: Arc::new(ReserveMetrics::new().unwrap()),
        }
    }

    /// Sends a GET request and returns the (status, body_json).
    async fn get(router: &Router, path: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    /// Sends a POST request with JSON body and returns (status, body_json).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    fn amount(json: &serde_json::Value) -> U256 {
        U256::from_str(json.as_str().unwrap()).unwrap()
    }

    async fn fund_and_deposit(router: &Router, whole: u64) -> serde_json::Value {
        let (status, _) =
            post_json(router, "/faucet", serde_json::json!({ "account": ALICE, "amount": whole })).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post_json(
            router,
            "/deposit",
            serde_json::json!({ "user": ALICE, "amount": units(whole).to_string() }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_fresh_reserve() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["depositEnabled"], true);
        assert_eq!(amount(&body["podTotalSupply"]), U256::ZERO);
        assert_eq!(amount(&body["podPrice"]), U256::ZERO);
        assert_eq!(body["priceDecimals"], 18);
        assert_eq!(body["withdrawalFee"]["fraction"], 1);
        assert_eq!(body["withdrawalFee"]["base"], 100);
        assert!(body["strategy"].is_object());
    }

    #[tokio::test]
    async fn deposit_then_full_withdrawal() {
        let router = create_router(test_app_state());
        let record = fund_and_deposit(&router, 1_000).await;
        assert_eq!(amount(&record["podMinted"]), units(1_000));

        let (status, price) = get(&router, "/price").await;
        assert_eq!(status, StatusCode::OK);
        assert!(amount(&price["price"]) > U256::ZERO);

        let (status, vault) = get(&router, &format!("/vault/{ALICE}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount(&vault["podBalance"]), units(1_000));
        assert!(amount(&vault["withdrawable"]) < amount(&vault["principal"]));

        let (status, exit) = post_json(
            &router,
            "/withdraw-percentage",
            serde_json::json!({ "user": ALICE, "percentage": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{exit}");
        assert_eq!(amount(&exit["podTotalSupply"]), U256::ZERO);
        assert_eq!(amount(&exit["tokensStored"]), U256::ZERO);

        let (_, events) = get(&router, "/events").await;
        let names: Vec<_> = events
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["OwnershipTransferred", "SetToken", "Deposit", "Withdraw"]);
    }

    #[tokio::test]
    async fn partial_withdrawal_pays_requested_amount() {
        let router = create_router(test_app_state());
        fund_and_deposit(&router, 5_000).await;

        let (status, record) = post_json(
            &router,
            "/withdraw",
            serde_json::json!({ "user": ALICE, "amount": units(1_000).to_string() }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{record}");
        assert_eq!(amount(&record["amount"]), units(1_000));
        assert!(amount(&record["fees"]) > U256::ZERO);
    }

    #[tokio::test]
    async fn deposit_without_funds_is_unprocessable() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/deposit",
            serde_json::json!({ "user": ALICE, "amount": "1000" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn malformed_amount_is_bad_request() {
        let router = create_router(test_app_state());
        let (status, _) = post_json(
            &router,
            "/deposit",
            serde_json::json!({ "user": ALICE, "amount": "lots" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_routes_are_owner_only() {
        let router = create_router(test_app_state());
        let (status, _) = post_json(
            &router,
            "/admin/deposit-status",
            serde_json::json!({ "caller": ALICE, "enabled": false }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_json(
            &router,
            "/admin/strategy",
            serde_json::json!({ "caller": ALICE, "token": "DAI" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn disabled_deposits_conflict() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/admin/deposit-status",
            serde_json::json!({ "caller": DEPLOYER, "enabled": false }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["depositEnabled"], false);

        post_json(&router, "/faucet", serde_json::json!({ "account": ALICE, "amount": 10 })).await;
        let (status, _) = post_json(
            &router,
            "/deposit",
            serde_json::json!({ "user": ALICE, "amount": units(10).to_string() }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn fee_and_strategy_changes() {
        let router = create_router(test_app_state());
        fund_and_deposit(&router, 2_000).await;

        let (status, body) = post_json(
            &router,
            "/admin/fee",
            serde_json::json!({ "caller": DEPLOYER, "fraction": 2, "base": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["withdrawalFee"]["fraction"], 2);

        let (status, _) = post_json(
            &router,
            "/admin/fee",
            serde_json::json!({ "caller": DEPLOYER, "fraction": 3, "base": 0 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, record) = post_json(
            &router,
            "/admin/strategy",
            serde_json::json!({ "caller": DEPLOYER, "token": "dai" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{record}");
        assert!(amount(&record["tokensStored"]) > U256::ZERO);
    }

    #[tokio::test]
    async fn ownership_can_be_renounced() {
        let router = create_router(test_app_state());
        let (status, body) = post_json(
            &router,
            "/admin/ownership",
            serde_json::json!({ "caller": DEPLOYER, "new_owner": null }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["owner"].is_null());

        let (status, _) = post_json(
            &router,
            "/admin/fee",
            serde_json::json!({ "caller": DEPLOYER, "fraction": 2, "base": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn tokens_resolve_by_symbol_or_address() {
        assert_eq!(resolve_token("usdc"), Some(devnet::USDC));
        assert_eq!(
            resolve_token("0x6B175474E89094C44Da98b954EedeAC495271d0F"),
            Some(devnet::DAI)
        );
        assert_eq!(resolve_token("nope"), None);
    }
}
