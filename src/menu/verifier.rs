use crate::menu::api::PurchaseService;
use crate::menu::config::{messages, PREMIUM_PRODUCT_ID};
use crate::menu::platform::Notifier;
use crate::menu::storage::Entitlements;
use crate::menu::types::{BillingError, RestoreOutcome, SessionHandle, Verdict, VerifierPhase};
use std::sync::{Arc, Mutex, MutexGuard};

/// Whether a purchase list unlocks premium
pub fn verdict_for(product_ids: &[String]) -> Verdict {
    if product_ids.iter().any(|id| id == PREMIUM_PRODUCT_ID) {
        Verdict::Purchased
    } else {
        Verdict::NotPurchased
    }
}

struct VerifierInner {
    phase: VerifierPhase,
    /// Bumped by every start and teardown; completions carrying an older
    /// value belong to an abandoned attempt
    epoch: u64,
    session: Option<SessionHandle>,
}

/// Restores the premium entitlement from the purchase service
///
/// One instance per menu screen. A verification runs
/// Idle -> SessionStarting -> QueryingPurchases -> Done, and at most one
/// session is open at a time. `teardown` may be called in any phase; whatever
/// the service delivers afterwards for the abandoned attempt is dropped.
pub struct PurchaseVerifier {
    service: Arc<dyn PurchaseService>,
    entitlements: Entitlements,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<VerifierInner>,
}

impl PurchaseVerifier {
    pub fn new(
        service: Arc<dyn PurchaseService>,
        entitlements: Entitlements,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            service,
            entitlements,
            notifier,
            inner: Mutex::new(VerifierInner {
                phase: VerifierPhase::Idle,
                epoch: 0,
                session: None,
            }),
        }
    }

    pub fn phase(&self) -> VerifierPhase {
        self.lock().phase
    }

    /// Check the purchase service for premium and sync the local flag
    pub async fn restore_purchase(&self) -> RestoreOutcome {
        let Some(attempt) = self.begin() else {
            log::info!("Purchase verification already running, ignoring start");
            return RestoreOutcome::AlreadyRunning;
        };

        let session = match self.service.open_session().await {
            Ok(session) => session,
            Err(e) => {
                return match self.conclude(attempt, Err(e)) {
                    Some((verdict, _)) => self.report(attempt, verdict),
                    None => RestoreOutcome::Discarded,
                };
            }
        };

        if !self.session_ready(attempt, &session) {
            log::debug!("Billing session opened after teardown, closing it");
            self.service.close_session(session).await;
            return RestoreOutcome::Discarded;
        }

        let listed = self.service.list_purchases(&session).await;
        let Some((verdict, session)) = self.conclude(attempt, listed) else {
            return RestoreOutcome::Discarded;
        };

        // Still busy until the session is gone, so a new start cannot
        // overlap with it
        if let Some(session) = session {
            self.service.close_session(session).await;
        }
        self.report(attempt, verdict)
    }

    /// Abandon any verification in flight and close its session
    pub async fn teardown(&self) {
        let session = {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.phase = VerifierPhase::Idle;
            inner.session.take()
        };

        if let Some(session) = session {
            log::debug!("Closing billing session on teardown");
            self.service.close_session(session).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, VerifierInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> Option<u64> {
        let mut inner = self.lock();
        if inner.phase.is_busy() {
            return None;
        }
        inner.epoch += 1;
        inner.phase = VerifierPhase::SessionStarting;
        Some(inner.epoch)
    }

    fn session_ready(&self, attempt: u64, session: &SessionHandle) -> bool {
        let mut inner = self.lock();
        if inner.epoch != attempt {
            return false;
        }
        inner.phase = VerifierPhase::QueryingPurchases;
        inner.session = Some(session.clone());
        true
    }

    /// Settle the verdict and hand back the session for closing. The phase
    /// stays busy until `report`.
    fn conclude(
        &self,
        attempt: u64,
        listed: Result<Vec<String>, BillingError>,
    ) -> Option<(Verdict, Option<SessionHandle>)> {
        let mut inner = self.lock();
        if inner.epoch != attempt {
            log::debug!("Dropping purchase result for a torn down verification");
            return None;
        }

        let verdict = match listed {
            Ok(product_ids) => self.apply(&product_ids),
            Err(e) => {
                log::warn!("Purchase verification failed: {}", e);
                Verdict::NotPurchased
            }
        };
        Some((verdict, inner.session.take()))
    }

    fn report(&self, attempt: u64, verdict: Verdict) -> RestoreOutcome {
        {
            let mut inner = self.lock();
            if inner.epoch != attempt {
                return RestoreOutcome::Discarded;
            }
            inner.phase = VerifierPhase::Done(verdict);
        }

        self.notifier.show(match verdict {
            Verdict::Purchased => messages::PREMIUM_PURCHASED,
            Verdict::NotPurchased => messages::PREMIUM_NOT_PURCHASED,
        });
        verdict.into()
    }

    /// Record premium if the list contains it. Absence never revokes.
    fn apply(&self, product_ids: &[String]) -> Verdict {
        match verdict_for(product_ids) {
            Verdict::Purchased => match self.entitlements.mark_premium_purchased() {
                Ok(()) => {
                    log::info!("Premium purchase confirmed");
                    Verdict::Purchased
                }
                Err(e) => {
                    log::error!("Premium confirmed but could not be saved: {}", e);
                    Verdict::NotPurchased
                }
            },
            Verdict::NotPurchased => {
                log::info!("No premium purchase among {} products", product_ids.len());
                Verdict::NotPurchased
            }
        }
    }
}
