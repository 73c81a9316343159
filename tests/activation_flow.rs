//! End-to-end activation scenarios over trait-injected fakes: a scripted
//! wallet provider, a fixed balance indexer, and a recording backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value;

use oneclick_server::backend::{
    BackendApi, BackendError, CreatedStrategy, StrategyCreatePayload,
};
use oneclick_server::balance::{BalanceIndexer, BalanceOracle, BalanceSnapshot, IndexerError};
use oneclick_server::cache::{Environment, QueryCacheCoordinator, QueryKey, Refetcher};
use oneclick_server::errors::ActivationError;
use oneclick_server::grant::GrantService;
use oneclick_server::orchestrator::{
    ActivationOrchestrator, ActivationPhase, Frequency, RiskLevel, StrategyActivationRequest,
    StrategyKind,
};
use oneclick_server::wallet::{
    InMemorySessionStore, ProviderKind, TxResponse, WalletConnector, WalletProvider,
    translate_evm_address,
};

const STABLE_DENOM: &str = "uusdt";
const HRP: &str = "inj";
const OPERATOR: &str = "inj1p3ucd3ptpw902fluyjzhq3ffgq4ntddau9sxrm";
const EVM_RAW: &str = "0xAF79152AC5dF276D9A8e1E2E22822f9713474902";
const FEE_RATE_MILLIS: i64 = 3; // 0.003
const EXPIRY_SECONDS: i64 = 2_592_000;

fn native_address() -> String {
    translate_evm_address(EVM_RAW, HRP).unwrap()
}

// --- fakes -----------------------------------------------------------------

struct FakeProvider {
    kind: ProviderKind,
    accounts: Vec<String>,
    broadcasts: Mutex<Vec<Vec<Value>>>,
    broadcast_count: AtomicUsize,
}

impl FakeProvider {
    fn new(kind: ProviderKind, accounts: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            accounts,
            broadcasts: Mutex::new(Vec::new()),
            broadcast_count: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn enable(&self, _chain_id: &str) -> Result<(), ActivationError> {
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<String>, ActivationError> {
        Ok(self.accounts.clone())
    }

    async fn sign_and_broadcast(
        &self,
        _signer: &str,
        msgs: Vec<Value>,
        simulate: bool,
    ) -> Result<TxResponse, ActivationError> {
        assert!(simulate, "grant batches must be simulated before signing");
        self.broadcast_count.fetch_add(1, Ordering::SeqCst);
        self.broadcasts.lock().push(msgs);
        Ok(TxResponse {
            tx_hash: "ABCD1234".to_string(),
            height: Some(42),
        })
    }
}

/// Provider that parks inside the wallet prompt: `sign_and_broadcast`
/// signals `entered` and then waits for a permit on `release`.
struct GatedProvider {
    accounts: Vec<String>,
    entered: tokio::sync::mpsc::Sender<()>,
    release: Arc<tokio::sync::Semaphore>,
    broadcast_count: AtomicUsize,
}

#[async_trait]
impl WalletProvider for GatedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Keplr
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn enable(&self, _chain_id: &str) -> Result<(), ActivationError> {
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<String>, ActivationError> {
        Ok(self.accounts.clone())
    }

    async fn sign_and_broadcast(
        &self,
        _signer: &str,
        _msgs: Vec<Value>,
        _simulate: bool,
    ) -> Result<TxResponse, ActivationError> {
        self.broadcast_count.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered.send(()).await;
        let _permit = self
            .release
            .acquire()
            .await
            .map_err(|_| ActivationError::UserRejected)?;
        Ok(TxResponse {
            tx_hash: "ABCD1234".to_string(),
            height: Some(42),
        })
    }
}

struct FixedIndexer {
    records: Vec<BalanceSnapshot>,
}

#[async_trait]
impl BalanceIndexer for FixedIndexer {
    async fn fetch_account_balances(
        &self,
        _address: &str,
    ) -> Result<Vec<BalanceSnapshot>, IndexerError> {
        Ok(self.records.clone())
    }
}

/// Indexer reporting `stable_units` whole stable units for any address.
fn indexer_with_stable(stable_units: i64) -> Arc<FixedIndexer> {
    Arc::new(FixedIndexer {
        records: vec![BalanceSnapshot {
            denom: STABLE_DENOM.to_string(),
            symbol: Some("USDT".to_string()),
            amount: (stable_units * 1_000_000).to_string(),
        }],
    })
}

#[derive(Default)]
struct RecordingBackend {
    fail_register: bool,
    registered: Mutex<Vec<String>>,
    created: Mutex<Vec<StrategyCreatePayload>>,
}

#[async_trait]
impl BackendApi for RecordingBackend {
    async fn register_address(&self, address: &str) -> Result<(), BackendError> {
        if self.fail_register {
            return Err(BackendError::Status {
                status: 500,
                body: "registration unavailable".to_string(),
            });
        }
        self.registered.lock().push(address.to_string());
        Ok(())
    }

    async fn create_strategy(
        &self,
        payload: &StrategyCreatePayload,
    ) -> Result<CreatedStrategy, BackendError> {
        self.created.lock().push(payload.clone());
        Ok(CreatedStrategy {
            plan_id: format!("plan-{}", self.created.lock().len()),
            status: Some("active".to_string()),
        })
    }
}

struct StubRefetcher;

#[async_trait]
impl Refetcher for StubRefetcher {
    async fn refetch(&self, _key: QueryKey) -> Option<Value> {
        Some(serde_json::json!({ "refetched": true }))
    }
}

// --- harness ---------------------------------------------------------------

struct Harness {
    orchestrator: ActivationOrchestrator,
    provider: Arc<FakeProvider>,
    backend: Arc<RecordingBackend>,
    cache: Arc<QueryCacheCoordinator>,
}

fn harness_with(
    provider: Arc<FakeProvider>,
    indexer: Arc<FixedIndexer>,
    backend: Arc<RecordingBackend>,
) -> Harness {
    let oracle = Arc::new(BalanceOracle::new(indexer, STABLE_DENOM, "INJ"));
    let connector = Arc::new(WalletConnector::new(
        vec![provider.clone() as Arc<dyn WalletProvider>],
        "injective-888",
        HRP,
        Duration::from_secs(30),
        Arc::new(InMemorySessionStore::default()),
    ));
    let grants = Arc::new(GrantService::new(
        oracle,
        backend.clone() as Arc<dyn BackendApi>,
        OPERATOR,
        EXPIRY_SECONDS,
        Decimal::new(FEE_RATE_MILLIS, 3),
    ));
    let cache = Arc::new(QueryCacheCoordinator::new(Arc::new(StubRefetcher)));
    let orchestrator = ActivationOrchestrator::new(
        connector,
        grants,
        backend.clone() as Arc<dyn BackendApi>,
        cache.clone(),
        HRP,
    );
    Harness {
        orchestrator,
        provider,
        backend,
        cache,
    }
}

fn harness(stable_units: i64) -> Harness {
    harness_with(
        FakeProvider::new(ProviderKind::Keplr, vec![native_address()]),
        indexer_with_stable(stable_units),
        Arc::new(RecordingBackend::default()),
    )
}

fn sdca_request(amount: i64) -> StrategyActivationRequest {
    serde_json::from_value(serde_json::json!({
        "amount": amount.to_string(),
        "frequency": "daily",
        "riskLevel": "medium",
        "tokenSymbol": "BTC",
        "strategyKind": "SDCA",
        "chain": "injective",
        "useOwnAddress": true,
    }))
    .expect("request fixture must deserialize")
}

// --- scenarios ---------------------------------------------------------------

#[tokio::test]
async fn happy_path_activates_with_one_creation_call() {
    let h = harness(200);
    let request = sdca_request(50);

    let activated = h
        .orchestrator
        .activate(request, ProviderKind::Keplr)
        .await
        .expect("activation should succeed");

    assert_eq!(activated.phase, ActivationPhase::Active);
    assert_eq!(activated.wallet_address, native_address());

    // Exactly one broadcast, one registration, one creation, in order.
    assert_eq!(h.provider.broadcast_count.load(Ordering::SeqCst), 1);
    assert_eq!(h.backend.registered.lock().as_slice(), &[native_address()]);

    let created = h.backend.created.lock();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].amount, Decimal::from(50));
    assert_eq!(created[0].user_wallet_address, native_address());
    assert_eq!(created[0].recipient_address, native_address());
    assert_eq!(created[0].strategy_kind, StrategyKind::Sdca);
}

#[tokio::test]
async fn insufficient_funds_fails_before_any_broadcast() {
    let h = harness(10);
    let request = sdca_request(1000);

    let err = h
        .orchestrator
        .activate(request, ProviderKind::Keplr)
        .await
        .unwrap_err();

    match err {
        ActivationError::InsufficientFunds {
            required,
            available,
        } => {
            assert_eq!(required, Decimal::from(1003));
            assert_eq!(available, Decimal::from(10));
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }

    assert_eq!(h.provider.broadcast_count.load(Ordering::SeqCst), 0);
    assert!(h.backend.created.lock().is_empty());
}

#[tokio::test]
async fn second_activation_while_one_is_pending_is_rejected() {
    let (entered_tx, mut entered_rx) = tokio::sync::mpsc::channel(1);
    let release = Arc::new(tokio::sync::Semaphore::new(0));
    let provider = Arc::new(GatedProvider {
        accounts: vec![native_address()],
        entered: entered_tx,
        release: release.clone(),
        broadcast_count: AtomicUsize::new(0),
    });

    let oracle = Arc::new(BalanceOracle::new(
        indexer_with_stable(200),
        STABLE_DENOM,
        "INJ",
    ));
    let backend = Arc::new(RecordingBackend::default());
    let connector = Arc::new(WalletConnector::new(
        vec![provider.clone() as Arc<dyn WalletProvider>],
        "injective-888",
        HRP,
        Duration::from_secs(30),
        Arc::new(InMemorySessionStore::default()),
    ));
    let grants = Arc::new(GrantService::new(
        oracle,
        backend.clone() as Arc<dyn BackendApi>,
        OPERATOR,
        EXPIRY_SECONDS,
        Decimal::new(FEE_RATE_MILLIS, 3),
    ));
    let cache = Arc::new(QueryCacheCoordinator::new(Arc::new(StubRefetcher)));
    let orchestrator = Arc::new(ActivationOrchestrator::new(
        connector,
        grants,
        backend.clone() as Arc<dyn BackendApi>,
        cache,
        HRP,
    ));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .activate(sdca_request(50), ProviderKind::Keplr)
                .await
        }
    });

    // Wait until the first attempt is parked inside the wallet prompt.
    entered_rx
        .recv()
        .await
        .expect("first activation must reach the broadcast");

    let err = orchestrator
        .activate(sdca_request(50), ProviderKind::Keplr)
        .await
        .unwrap_err();
    assert!(matches!(err, ActivationError::ActivationInProgress));
    assert_eq!(provider.broadcast_count.load(Ordering::SeqCst), 1);

    // Release the first attempt; it must still complete normally.
    release.add_permits(1);
    first
        .await
        .expect("first activation task must not panic")
        .expect("first activation should succeed");
    assert_eq!(provider.broadcast_count.load(Ordering::SeqCst), 1);
    assert_eq!(backend.created.lock().len(), 1);
}

#[tokio::test]
async fn missing_stable_record_is_distinct_from_zero_balance() {
    let indexer = Arc::new(FixedIndexer {
        records: vec![BalanceSnapshot {
            denom: "inj".to_string(),
            symbol: Some("INJ".to_string()),
            amount: "1000000000000000000".to_string(),
        }],
    });
    let h = harness_with(
        FakeProvider::new(ProviderKind::Keplr, vec![native_address()]),
        indexer,
        Arc::new(RecordingBackend::default()),
    );

    let err = h
        .orchestrator
        .activate(sdca_request(50), ProviderKind::Keplr)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ActivationError::BalanceNotFound { ref denom } if denom == STABLE_DENOM
    ));
    assert_eq!(h.provider.broadcast_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn evm_wallet_grants_use_the_translated_address_everywhere() {
    let h = harness_with(
        FakeProvider::new(ProviderKind::Metamask, vec![EVM_RAW.to_string()]),
        indexer_with_stable(200),
        Arc::new(RecordingBackend::default()),
    );

    let activated = h
        .orchestrator
        .activate(sdca_request(50), ProviderKind::Metamask)
        .await
        .expect("EVM activation should succeed");

    let translated = native_address();
    assert_eq!(activated.wallet_address, translated);

    // Both grant messages in the broadcast batch carry the translated
    // granter, never the raw 0x form.
    let broadcasts = h.provider.broadcasts.lock();
    assert_eq!(broadcasts.len(), 1);
    let batch = &broadcasts[0];
    assert_eq!(batch.len(), 2);
    for msg in batch {
        assert_eq!(msg["value"]["granter"], translated.as_str());
        assert_eq!(msg["value"]["grantee"], OPERATOR);
    }

    // Both grants share one expiry, 30 days out.
    let exp_a = batch[0]["value"]["grant"]["expiration"]["seconds"]
        .as_i64()
        .unwrap();
    let exp_b = batch[1]["value"]["grant"]["expiration"]["seconds"]
        .as_i64()
        .unwrap();
    assert_eq!(exp_a, exp_b);
    let now = chrono::Utc::now().timestamp();
    assert!((exp_a - now - EXPIRY_SECONDS).abs() <= 5);

    assert_eq!(h.backend.registered.lock().as_slice(), &[translated]);
}

#[tokio::test]
async fn registration_failure_after_broadcast_is_partial_success() {
    let backend = Arc::new(RecordingBackend {
        fail_register: true,
        ..RecordingBackend::default()
    });
    let h = harness_with(
        FakeProvider::new(ProviderKind::Keplr, vec![native_address()]),
        indexer_with_stable(200),
        backend,
    );

    let err = h
        .orchestrator
        .activate(sdca_request(50), ProviderKind::Keplr)
        .await
        .unwrap_err();

    assert!(matches!(err, ActivationError::AddressRegistration(_)));
    assert!(err.is_partial_success());
    // The grant did go out; only bookkeeping failed, and no plan was made.
    assert_eq!(h.provider.broadcast_count.load(Ordering::SeqCst), 1);
    assert!(h.backend.created.lock().is_empty());
}

#[tokio::test]
async fn validation_failures_never_touch_the_network() {
    let h = harness(200);

    let mut zero_amount = sdca_request(50);
    zero_amount.amount = Decimal::ZERO;
    let err = h
        .orchestrator
        .activate(zero_amount, ProviderKind::Keplr)
        .await
        .unwrap_err();
    assert!(matches!(err, ActivationError::Validation(_)));

    let mut bad_recipient = sdca_request(50);
    bad_recipient.use_own_address = false;
    bad_recipient.recipient_address = Some("not-an-address".to_string());
    let err = h
        .orchestrator
        .activate(bad_recipient, ProviderKind::Keplr)
        .await
        .unwrap_err();
    assert!(matches!(err, ActivationError::Validation(_)));

    let mut missing_recipient = sdca_request(50);
    missing_recipient.use_own_address = false;
    missing_recipient.recipient_address = None;
    let err = h
        .orchestrator
        .activate(missing_recipient, ProviderKind::Keplr)
        .await
        .unwrap_err();
    assert!(matches!(err, ActivationError::Validation(_)));

    assert_eq!(h.provider.broadcast_count.load(Ordering::SeqCst), 0);
    assert!(h.backend.registered.lock().is_empty());
    assert!(h.backend.created.lock().is_empty());
}

#[tokio::test]
async fn explicit_recipient_is_passed_through_for_sdca() {
    let h = harness(200);
    let recipient = translate_evm_address("0x00000000000000000000000000000000DeaDBeef", HRP)
        .unwrap();

    let mut request = sdca_request(50);
    request.use_own_address = false;
    request.recipient_address = Some(recipient.clone());

    h.orchestrator
        .activate(request, ProviderKind::Keplr)
        .await
        .expect("activation should succeed");

    let created = h.backend.created.lock();
    assert_eq!(created[0].recipient_address, recipient);
    assert_eq!(created[0].user_wallet_address, native_address());
}

#[tokio::test]
async fn chain_alias_is_normalized_before_submission() {
    let h = harness(200);
    let mut request = sdca_request(50);
    request.chain = "injective-evm".to_string();

    h.orchestrator
        .activate(request, ProviderKind::Keplr)
        .await
        .expect("activation should succeed");

    assert_eq!(h.backend.created.lock()[0].chain_id, "injective");
}

#[tokio::test]
async fn successful_activation_invalidates_only_its_environment() {
    let h = harness(200);
    h.cache.prime(
        QueryKey::ActiveStrategies(Environment::Paper),
        serde_json::json!(["paper-plan"]),
    );

    h.orchestrator
        .activate(sdca_request(50), ProviderKind::Keplr)
        .await
        .expect("activation should succeed");

    // Live groups were refetched once; the paper entry is untouched.
    assert_eq!(
        h.cache
            .get(QueryKey::ActiveStrategies(Environment::Live))
            .unwrap()
            .generation,
        1
    );
    let paper = h
        .cache
        .get(QueryKey::ActiveStrategies(Environment::Paper))
        .unwrap();
    assert_eq!(paper.generation, 0);
    assert!(!paper.invalidated);
}

#[tokio::test]
async fn display_fetch_fails_safe_to_zero() {
    struct OfflineIndexer;

    #[async_trait]
    impl BalanceIndexer for OfflineIndexer {
        async fn fetch_account_balances(
            &self,
            _address: &str,
        ) -> Result<Vec<BalanceSnapshot>, IndexerError> {
            Err(IndexerError::Parse("connection refused".to_string()))
        }
    }

    let oracle = BalanceOracle::new(Arc::new(OfflineIndexer), STABLE_DENOM, "INJ");
    let balances = oracle.fetch_balances(&native_address()).await;
    assert_eq!(balances.native_gas, Decimal::ZERO);
    assert_eq!(balances.stable, Decimal::ZERO);
}

#[tokio::test]
async fn required_amount_math_is_exact_on_the_happy_path() {
    // amount 50 with fee rate 0.003 requires exactly 50.15; an indexer
    // reporting exactly 50.15 stable units must pass the gate.
    let indexer = Arc::new(FixedIndexer {
        records: vec![BalanceSnapshot {
            denom: STABLE_DENOM.to_string(),
            symbol: Some("USDT".to_string()),
            amount: "50150000".to_string(),
        }],
    });
    let h = harness_with(
        FakeProvider::new(ProviderKind::Keplr, vec![native_address()]),
        indexer,
        Arc::new(RecordingBackend::default()),
    );

    h.orchestrator
        .activate(sdca_request(50), ProviderKind::Keplr)
        .await
        .expect("exact-threshold activation should pass the gate");
}

#[tokio::test]
async fn requests_use_frequency_and_risk_from_the_dialog() {
    let h = harness(200);
    let request: StrategyActivationRequest = serde_json::from_value(serde_json::json!({
        "amount": "75",
        "frequency": "weekly",
        "riskLevel": "high",
        "tokenSymbol": "ETH",
        "strategyKind": "GRID",
        "chain": "injective",
        "slippage": "0.5",
    }))
    .unwrap();

    h.orchestrator
        .activate(request, ProviderKind::Keplr)
        .await
        .expect("GRID activation should succeed without a recipient");

    let created = h.backend.created.lock();
    assert_eq!(created[0].frequency, Frequency::Weekly);
    assert_eq!(created[0].risk_level, RiskLevel::High);
    assert_eq!(created[0].strategy_kind, StrategyKind::Grid);
    assert_eq!(created[0].slippage, Decimal::new(5, 1));
}
