use std::collections::HashSet;

use chrono::{Duration, Utc};
use log::*;
use pinepay_engine::{db_types::Transaction, KeyValueCache, OrderFlowApi, PaymentProvider, PaymentStore};
use tokio::task::JoinHandle;

/// Starts the orphaned transaction sweep. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The sweep only reports orphans. It never creates an order for them, nor removes them. Transactions younger than
/// `interval` are left for the next sweep, since their order may still be on its way.
pub fn start_orphan_worker<B, C, P>(api: OrderFlowApi<B, C, P>, interval: Duration) -> JoinHandle<()>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let period = interval.to_std().unwrap_or(std::time::Duration::from_secs(60));
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        let mut sweeper = OrphanSweep::new(api, interval);
        info!("🧹️ Orphaned transaction sweep started. Running every {} minutes", interval.num_minutes());
        loop {
            timer.tick().await;
            sweeper.sweep().await;
        }
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Orphans old enough to report
    pub orphans: usize,
    /// Orphans that no earlier sweep reported
    pub new_orphans: usize,
}

pub struct OrphanSweep<B, C, P> {
    api: OrderFlowApi<B, C, P>,
    min_age: Duration,
    reported: HashSet<String>,
}

impl<B, C, P> OrphanSweep<B, C, P>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    pub fn new(api: OrderFlowApi<B, C, P>, min_age: Duration) -> Self {
        Self { api, min_age, reported: HashSet::new() }
    }

    /// Runs a single sweep. Each orphan is logged at `warn!` the first time it is seen, and at `debug!` after that.
    pub async fn sweep(&mut self) -> SweepSummary {
        trace!("🧹️ Looking for orphaned transactions");
        let orphans = match self.api.find_orphaned_transactions().await {
            Ok(orphans) => orphans,
            Err(e) => {
                error!("🧹️ Error running the orphaned transaction sweep: {e}");
                return SweepSummary::default();
            },
        };
        let cutoff = Utc::now() - self.min_age;
        let orphans = orphans.into_iter().filter(|tx| tx.created_at <= cutoff).collect::<Vec<_>>();
        if orphans.is_empty() {
            debug!("🧹️ No orphaned transactions");
            self.reported.clear();
            return SweepSummary::default();
        }
        let mut new_orphans = 0;
        for tx in &orphans {
            if self.reported.contains(&tx.provider_order_id) {
                debug!("🧹️ Still orphaned: {}", describe(tx));
            } else {
                warn!("🧹️ Orphaned transaction: {}", describe(tx));
                new_orphans += 1;
            }
        }
        self.reported = orphans.iter().map(|tx| tx.provider_order_id.clone()).collect();
        if new_orphans > 0 {
            warn!("🧹️ {} transaction(s) have no order, {new_orphans} of them new", orphans.len());
        }
        SweepSummary { orphans: orphans.len(), new_orphans }
    }
}

fn describe(tx: &Transaction) -> String {
    format!(
        "[{}] provider order: {} merchant reference: {} amount: {} {} created: {}",
        tx.id, tx.provider_order_id, tx.merchant_order_reference, tx.amount, tx.currency, tx.created_at
    )
}
