use log::{debug, warn};
use std::sync::Arc;

use super::alerts_model::{format_alert_message, AlertRunSummary};
use super::alerts_traits::{AlertRelay, AlertRepositoryTrait, AlertServiceTrait};
use crate::accounts::Account;
use crate::Result;

/// Service dispatching at-most-one spending alert per transaction
pub struct AlertService {
    repository: Arc<dyn AlertRepositoryTrait>,
    relay: Arc<dyn AlertRelay>,
}

impl AlertService {
    /// Creates a new AlertService instance
    pub fn new(repository: Arc<dyn AlertRepositoryTrait>, relay: Arc<dyn AlertRelay>) -> Self {
        Self { repository, relay }
    }
}

#[async_trait::async_trait]
impl AlertServiceTrait for AlertService {
    async fn dispatch_pending(&self, account: &Account) -> Result<AlertRunSummary> {
        let mut summary = AlertRunSummary::default();

        if !account.can_alert() {
            debug!("Alerts disabled or unreachable for account {}", account.id);
            return Ok(summary);
        }
        // can_alert() guarantees the address is present
        let recipient = match account.relay_address.as_deref() {
            Some(address) => address.to_string(),
            None => return Ok(summary),
        };

        let eligible = self.repository.list_alertable(&account.id)?;
        summary.eligible = eligible.len();

        for transaction in eligible {
            // Claim before sending; the conditional update is the only gate
            // between this pass and any concurrent one.
            if !self.repository.try_claim(&transaction.id).await? {
                summary.lost_races += 1;
                continue;
            }
            summary.claimed += 1;

            let message = format_alert_message(&transaction, account);
            match self.relay.deliver(&recipient, &message).await {
                Ok(delivery_id) => {
                    self.repository
                        .confirm(&transaction.id, &delivery_id)
                        .await?;
                    summary.delivered += 1;
                }
                Err(err) => {
                    warn!(
                        "Alert delivery failed for transaction {}, releasing claim: {}",
                        transaction.id, err
                    );
                    self.repository.release(&transaction.id).await?;
                    summary.failed += 1;
                }
            }
        }

        debug!(
            "Alert pass for account {}: {} eligible, {} delivered, {} lost, {} failed",
            account.id, summary.eligible, summary.delivered, summary.lost_races, summary.failed
        );
        Ok(summary)
    }

    fn unconfirmed_count(&self) -> Result<i64> {
        self.repository.count_unconfirmed()
    }
}
