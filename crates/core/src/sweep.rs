//! Sweep orchestration.
//!
//! One sweep resolves a signer, pages the position store, classifies every
//! position against live chain state and liquidates the eligible ones, one
//! position at a time. Positions are strictly sequential: a position's
//! submit-then-confirm cycle finishes before the next one is classified, so
//! a single signer never races itself on transaction ordering.

use alloy::primitives::{Address, B256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, trace, warn};

use crate::classify::{Classifier, LiquidationKind};
use crate::error::{AttemptError, SweepError};
use crate::executor::{ExecutorFactory, LiquidationExecutor};
use crate::gas::GasPricer;
use crate::store::PositionStore;
use lsa_api::Position;

/// Terminal outcome of one position's pass through the sweep.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Classified as non-liquidatable; nothing submitted.
    Skipped,
    /// Transaction submitted and confirmed.
    Confirmed { tx_hash: B256 },
    /// Aborted at some stage; revisited from scratch next sweep.
    Failed(AttemptError),
}

/// Outcome record for one visited position. Logging only; never persisted.
#[derive(Debug)]
pub struct LiquidationAttempt {
    pub lsa: String,
    /// Classification, when the position got that far.
    pub kind: Option<LiquidationKind>,
    pub outcome: AttemptOutcome,
}

/// What one sweep pass did. `run` always returns this normally — fatal
/// errors are recorded in `aborted`, never propagated to the caller.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub attempts: Vec<LiquidationAttempt>,
    pub aborted: Option<SweepError>,
    /// True when this invocation found another sweep in progress and
    /// returned without touching any position.
    pub overlapped: bool,
}

impl SweepReport {
    fn overlapped() -> Self {
        Self {
            overlapped: true,
            ..Self::default()
        }
    }

    pub fn scanned(&self) -> usize {
        self.attempts.len()
    }

    pub fn skipped(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Skipped))
            .count()
    }

    pub fn liquidated(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Confirmed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Failed(_)))
            .count()
    }
}

/// Drives end-to-end liquidation sweeps.
pub struct Sweeper {
    store: Arc<dyn PositionStore>,
    classifier: Arc<dyn Classifier>,
    executors: Arc<dyn ExecutorFactory>,
    gas: GasPricer,
    page_size: u64,
    running: AtomicBool,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn PositionStore>,
        classifier: Arc<dyn Classifier>,
        executors: Arc<dyn ExecutorFactory>,
        gas: GasPricer,
        page_size: u64,
    ) -> Self {
        Self {
            store,
            classifier,
            executors,
            gas,
            page_size,
            running: AtomicBool::new(false),
        }
    }

    /// Run one sweep pass.
    ///
    /// Never returns an error: fatal failures abort the pass and are
    /// recorded in the report, leaving retry to the next scheduled
    /// invocation. Overlapping invocations are rejected by an in-progress
    /// flag.
    pub async fn run(&self) -> SweepReport {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sweep already in progress, skipping this invocation");
            return SweepReport::overlapped();
        }

        let report = self.sweep().await;

        info!(
            scanned = report.scanned(),
            skipped = report.skipped(),
            liquidated = report.liquidated(),
            failed = report.failed(),
            aborted = report.aborted.is_some(),
            "Sweep finished"
        );

        self.running.store(false, Ordering::SeqCst);
        report
    }

    async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        // Signer resolution precedes everything: no position is processed
        // without a valid chain-write capability.
        let executor = match self.executors.acquire().await {
            Ok(executor) => executor,
            Err(e) => {
                let err = SweepError::SignerResolution(e);
                error!(error = %err, "Aborting sweep");
                report.aborted = Some(err);
                return report;
            }
        };

        let count = match self.store.count().await {
            Ok(count) => count,
            Err(e) => {
                let err = SweepError::PositionCount(e);
                error!(error = %err, "Aborting sweep");
                report.aborted = Some(err);
                return report;
            }
        };

        info!(count, page_size = self.page_size, "Starting sweep");

        let pages = count.div_ceil(self.page_size);
        for page_index in 0..pages {
            let offset = page_index * self.page_size;
            let positions = match self.store.page(self.page_size, offset).await {
                Ok(positions) => positions,
                Err(e) => {
                    let err = SweepError::PositionPage { offset, source: e };
                    error!(error = %err, "Aborting sweep");
                    report.aborted = Some(err);
                    return report;
                }
            };

            for position in &positions {
                let attempt = self.process(position, executor.as_ref()).await;
                report.attempts.push(attempt);
            }
        }

        report
    }

    /// Take one position through classify → price → execute. Every failure
    /// in here is contained to this position.
    async fn process(
        &self,
        position: &Position,
        executor: &dyn LiquidationExecutor,
    ) -> LiquidationAttempt {
        let failed = |kind, error: AttemptError| {
            error!(
                lsa = %position.lsa,
                stage = error.stage(),
                error = %error,
                "Liquidation attempt failed"
            );
            LiquidationAttempt {
                lsa: position.lsa.clone(),
                kind,
                outcome: AttemptOutcome::Failed(error),
            }
        };

        let lsa: Address = match position.lsa.parse() {
            Ok(lsa) => lsa,
            Err(e) => return failed(None, AttemptError::InvalidId(anyhow::Error::new(e))),
        };

        let kind = match self.classifier.classify(lsa).await {
            Ok(kind) => kind,
            Err(e) => return failed(None, AttemptError::Classification(e)),
        };

        if kind == LiquidationKind::None {
            trace!(lsa = %position.lsa, "Position not liquidatable");
            return LiquidationAttempt {
                lsa: position.lsa.clone(),
                kind: Some(kind),
                outcome: AttemptOutcome::Skipped,
            };
        }

        // Gas is quoted fresh for every liquidating position.
        let quote = match self.gas.quote().await {
            Ok(quote) => quote,
            Err(e) => return failed(Some(kind), AttemptError::GasQuote(e)),
        };

        match executor.execute(lsa, kind, &quote).await {
            Ok(tx_hash) => {
                info!(
                    lsa = %position.lsa,
                    kind = kind.as_str(),
                    tx_hash = %tx_hash,
                    "Liquidated LSA"
                );
                LiquidationAttempt {
                    lsa: position.lsa.clone(),
                    kind: Some(kind),
                    outcome: AttemptOutcome::Confirmed { tx_hash },
                }
            }
            Err(e) => failed(Some(kind), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::{GasOracle, GasQuote};
    use anyhow::Result;
    use async_trait::async_trait;
    use lsa_api::PositionStatus;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn lsa_address(index: u64) -> String {
        format!("0x{:040x}", index + 1)
    }

    fn position(lsa: &str) -> Position {
        Position {
            lsa: lsa.to_string(),
            instrument: "BTC-27MAR26".to_string(),
            insurance_amount: "1000000".to_string(),
            price: "64000".to_string(),
            index_price: 64000.0,
            order_id: "ord-1".to_string(),
            contracts_amount: 1.0,
            status: PositionStatus::Bought,
            insurance_id_update: None,
            sell_order_id: None,
            selling_price: "65000".to_string(),
        }
    }

    fn positions(n: u64) -> Vec<Position> {
        (0..n).map(|i| position(&lsa_address(i))).collect()
    }

    #[derive(Default)]
    struct MockStore {
        positions: Vec<Position>,
        fail_count: bool,
        fail_page_at: Option<u64>,
        offsets: Mutex<Vec<u64>>,
        count_gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl PositionStore for MockStore {
        async fn count(&self) -> Result<u64> {
            if let Some(gate) = &self.count_gate {
                gate.notified().await;
            }
            if self.fail_count {
                anyhow::bail!("store unavailable");
            }
            Ok(self.positions.len() as u64)
        }

        async fn page(&self, limit: u64, offset: u64) -> Result<Vec<Position>> {
            self.offsets.lock().unwrap().push(offset);
            if self.fail_page_at == Some(offset) {
                anyhow::bail!("page fetch failed");
            }
            let start = offset as usize;
            let end = (offset + limit).min(self.positions.len() as u64) as usize;
            Ok(self.positions[start.min(self.positions.len())..end].to_vec())
        }
    }

    /// Classifier returning a fixed code per position, errors for listed ids.
    #[derive(Default)]
    struct MockClassifier {
        codes: HashMap<Address, u8>,
        fail_on: Vec<Address>,
    }

    #[async_trait]
    impl Classifier for MockClassifier {
        async fn classify(&self, lsa: Address) -> Result<LiquidationKind> {
            if self.fail_on.contains(&lsa) {
                anyhow::bail!("classification rpc failed");
            }
            Ok(LiquidationKind::from_code(
                self.codes.get(&lsa).copied().unwrap_or(0),
            ))
        }
    }

    struct FixedOracle(u128);

    #[async_trait]
    impl GasOracle for FixedOracle {
        async fn gas_price(&self) -> Result<u128> {
            Ok(self.0)
        }
    }

    #[derive(Debug, Clone)]
    struct RecordedCall {
        lsa: Address,
        kind: LiquidationKind,
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    }

    #[derive(Default)]
    struct MockExecutor {
        calls: Mutex<Vec<RecordedCall>>,
        fail_confirmation: bool,
    }

    #[async_trait]
    impl LiquidationExecutor for MockExecutor {
        async fn execute(
            &self,
            lsa: Address,
            kind: LiquidationKind,
            quote: &GasQuote,
        ) -> Result<B256, AttemptError> {
            self.calls.lock().unwrap().push(RecordedCall {
                lsa,
                kind,
                max_fee_per_gas: quote.max_fee_per_gas,
                max_priority_fee_per_gas: quote.max_priority_fee_per_gas,
            });
            if self.fail_confirmation {
                return Err(AttemptError::Confirmation {
                    tx_hash: B256::repeat_byte(0xaa),
                    source: anyhow::anyhow!("no receipt"),
                });
            }
            Ok(B256::repeat_byte(0x42))
        }
    }

    struct MockFactory {
        executor: Arc<MockExecutor>,
        fail: bool,
    }

    #[async_trait]
    impl ExecutorFactory for MockFactory {
        async fn acquire(&self) -> Result<Arc<dyn LiquidationExecutor>> {
            if self.fail {
                anyhow::bail!("secret provider unreachable");
            }
            Ok(self.executor.clone())
        }
    }

    fn sweeper_with(
        store: MockStore,
        classifier: MockClassifier,
        factory: MockFactory,
    ) -> Sweeper {
        Sweeper::new(
            Arc::new(store),
            Arc::new(classifier),
            Arc::new(factory),
            GasPricer::new(Arc::new(FixedOracle(1000)), 10),
            50,
        )
    }

    fn default_factory() -> (Arc<MockExecutor>, MockFactory) {
        let executor = Arc::new(MockExecutor::default());
        let factory = MockFactory {
            executor: executor.clone(),
            fail: false,
        };
        (executor, factory)
    }

    #[tokio::test]
    async fn scenario_skip_full_micro() {
        let store = MockStore {
            positions: positions(3),
            ..Default::default()
        };
        let mut classifier = MockClassifier::default();
        classifier
            .codes
            .insert(lsa_address(0).parse().unwrap(), 0);
        classifier
            .codes
            .insert(lsa_address(1).parse().unwrap(), 1);
        classifier
            .codes
            .insert(lsa_address(2).parse().unwrap(), 2);
        let (executor, factory) = default_factory();

        let report = sweeper_with(store, classifier, factory).run().await;

        assert!(report.aborted.is_none());
        assert_eq!(report.scanned(), 3);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.liquidated(), 2);
        assert!(matches!(report.attempts[0].outcome, AttemptOutcome::Skipped));

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, LiquidationKind::Full);
        assert_eq!(calls[1].kind, LiquidationKind::Micro);
        for call in calls.iter() {
            assert_eq!(call.max_fee_per_gas, 1100);
            assert_eq!(call.max_priority_fee_per_gas, 275);
        }
    }

    #[tokio::test]
    async fn pages_cover_every_position_once() {
        let store = MockStore {
            positions: positions(120),
            ..Default::default()
        };
        let (_executor, factory) = default_factory();
        let sweeper = sweeper_with(store, MockClassifier::default(), factory);

        let report = sweeper.run().await;

        assert_eq!(report.scanned(), 120);
        let mut lsas: Vec<_> = report.attempts.iter().map(|a| a.lsa.clone()).collect();
        lsas.sort();
        lsas.dedup();
        assert_eq!(lsas.len(), 120);
    }

    #[tokio::test]
    async fn pagination_requests_exact_offsets() {
        let store = Arc::new(MockStore {
            positions: positions(120),
            ..Default::default()
        });
        let (_executor, factory) = default_factory();
        let sweeper = Sweeper::new(
            store.clone(),
            Arc::new(MockClassifier::default()),
            Arc::new(factory),
            GasPricer::new(Arc::new(FixedOracle(1000)), 10),
            50,
        );

        let report = sweeper.run().await;

        assert_eq!(report.scanned(), 120);
        assert_eq!(*store.offsets.lock().unwrap(), vec![0, 50, 100]);
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size_has_no_trailing_page() {
        let store = Arc::new(MockStore {
            positions: positions(100),
            ..Default::default()
        });
        let (_executor, factory) = default_factory();
        let sweeper = Sweeper::new(
            store.clone(),
            Arc::new(MockClassifier::default()),
            Arc::new(factory),
            GasPricer::new(Arc::new(FixedOracle(1000)), 10),
            50,
        );

        sweeper.run().await;
        assert_eq!(*store.offsets.lock().unwrap(), vec![0, 50]);
    }

    #[tokio::test]
    async fn classification_failure_does_not_stop_the_sweep() {
        let store = MockStore {
            positions: positions(3),
            ..Default::default()
        };
        let mut classifier = MockClassifier::default();
        classifier.fail_on.push(lsa_address(0).parse().unwrap());
        classifier
            .codes
            .insert(lsa_address(1).parse().unwrap(), 1);
        classifier
            .codes
            .insert(lsa_address(2).parse().unwrap(), 1);
        let (executor, factory) = default_factory();

        let report = sweeper_with(store, classifier, factory).run().await;

        assert_eq!(report.scanned(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.liquidated(), 2);
        match &report.attempts[0].outcome {
            AttemptOutcome::Failed(e) => assert_eq!(e.stage(), "classification"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(executor.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_liquidatable_positions_never_submit() {
        let store = MockStore {
            positions: positions(5),
            ..Default::default()
        };
        let (executor, factory) = default_factory();

        let report = sweeper_with(store, MockClassifier::default(), factory)
            .run()
            .await;

        assert_eq!(report.skipped(), 5);
        assert!(executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_lsa_is_contained_to_its_position() {
        let mut all = positions(2);
        all[0].lsa = "not-an-address".to_string();
        let store = MockStore {
            positions: all,
            ..Default::default()
        };
        let mut classifier = MockClassifier::default();
        classifier
            .codes
            .insert(lsa_address(1).parse().unwrap(), 1);
        let (executor, factory) = default_factory();

        let report = sweeper_with(store, classifier, factory).run().await;

        assert_eq!(report.failed(), 1);
        assert_eq!(report.liquidated(), 1);
        match &report.attempts[0].outcome {
            AttemptOutcome::Failed(e) => assert_eq!(e.stage(), "id"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(executor.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn signer_failure_processes_nothing() {
        let store = Arc::new(MockStore {
            positions: positions(10),
            ..Default::default()
        });
        let executor = Arc::new(MockExecutor::default());
        let sweeper = Sweeper::new(
            store.clone(),
            Arc::new(MockClassifier::default()),
            Arc::new(MockFactory {
                executor,
                fail: true,
            }),
            GasPricer::new(Arc::new(FixedOracle(1000)), 10),
            50,
        );

        let report = sweeper.run().await;

        assert!(matches!(
            report.aborted,
            Some(SweepError::SignerResolution(_))
        ));
        assert_eq!(report.scanned(), 0);
        assert!(store.offsets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_failure_aborts_before_any_page() {
        let store = Arc::new(MockStore {
            positions: positions(10),
            fail_count: true,
            ..Default::default()
        });
        let (_executor, factory) = default_factory();
        let sweeper = Sweeper::new(
            store.clone(),
            Arc::new(MockClassifier::default()),
            Arc::new(factory),
            GasPricer::new(Arc::new(FixedOracle(1000)), 10),
            50,
        );

        let report = sweeper.run().await;

        assert!(matches!(report.aborted, Some(SweepError::PositionCount(_))));
        assert_eq!(report.scanned(), 0);
        assert!(store.offsets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_failure_aborts_remaining_pages() {
        let store = MockStore {
            positions: positions(120),
            fail_page_at: Some(50),
            ..Default::default()
        };
        let (_executor, factory) = default_factory();

        let report = sweeper_with(store, MockClassifier::default(), factory)
            .run()
            .await;

        // first page fully processed, nothing after the failing one
        assert_eq!(report.scanned(), 50);
        assert!(matches!(
            report.aborted,
            Some(SweepError::PositionPage { offset: 50, .. })
        ));
    }

    #[tokio::test]
    async fn confirmation_failure_is_not_retried() {
        let store = MockStore {
            positions: positions(1),
            ..Default::default()
        };
        let mut classifier = MockClassifier::default();
        classifier
            .codes
            .insert(lsa_address(0).parse().unwrap(), 1);
        let executor = Arc::new(MockExecutor {
            fail_confirmation: true,
            ..Default::default()
        });
        let sweeper = Sweeper::new(
            Arc::new(store),
            Arc::new(classifier),
            Arc::new(MockFactory {
                executor: executor.clone(),
                fail: false,
            }),
            GasPricer::new(Arc::new(FixedOracle(1000)), 10),
            50,
        );

        let report = sweeper.run().await;

        assert_eq!(report.failed(), 1);
        match &report.attempts[0].outcome {
            AttemptOutcome::Failed(e) => assert_eq!(e.stage(), "confirmation"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(executor.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_runs_are_rejected() {
        let gate = Arc::new(Notify::new());
        let store = MockStore {
            positions: positions(1),
            count_gate: Some(gate.clone()),
            ..Default::default()
        };
        let (_executor, factory) = default_factory();
        let sweeper = Arc::new(sweeper_with(store, MockClassifier::default(), factory));

        let first = {
            let sweeper = sweeper.clone();
            tokio::spawn(async move { sweeper.run().await })
        };
        // let the first run reach the gated count() call
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let second = sweeper.run().await;
        assert!(second.overlapped);
        assert_eq!(second.scanned(), 0);

        gate.notify_one();
        let first = first.await.unwrap();
        assert!(!first.overlapped);
        assert_eq!(first.scanned(), 1);
    }
}
