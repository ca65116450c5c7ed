//! Bulk invitation dispatcher
//!
//! One task per batch entry on a `JoinSet`, at most `concurrency` running at a time.
//! Each task returns its own [`InvitationOutcome`]; the aggregator only collects what
//! `join_next` hands back, in completion order. A failing (or panicking) entry never
//! touches its siblings. Dropping the future of [`InvitationDispatcher::invite_members`]
//! drops the `JoinSet`, which aborts running tasks and those still waiting for a permit;
//! entries that already committed stay committed.

use crate::core::{AppError, ErrorKind};
use crate::domain::{MembershipManager, TokenGenerator};
use crate::dtos::{CreateMemberDTO, InvitationOutcome, InviteMemberDTO};
use crate::entities::{Member, Organization};
use crate::notifications::{InvitationNotice, NotificationSender};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};
use validator::Validate;

// Per-entry failure codes
pub const ERR_IDENTITY_MISMATCH: &str = "ERR_IMIO_508";
pub const ERR_INVALID_ENTRY: &str = "ERR_IMIO_509";
pub const ERR_MEMBER_LOOKUP: &str = "ERR_IMIO_510";
pub const ERR_MEMBER_CREATE: &str = "ERR_IMIO_511";
pub const ERR_NOTIFICATION: &str = "ERR_IMIO_512";
pub const ERR_MEMBERSHIP_LOOKUP: &str = "ERR_IMIO_513";
pub const ERR_INVITATION_ISSUE: &str = "ERR_IMIO_514";
pub const ERR_NOTHING_DELIVERED: &str = "ERR_IMIO_515";
pub const ERR_UNKNOWN_MEMBER: &str = "ERR_IMIO_516";
pub const ERR_ALREADY_MEMBER: &str = "ERR_IMIO_517";
pub const ERR_NO_MEMBERSHIP: &str = "ERR_IMIO_518";
pub const ERR_NO_ACTIVE_INVITATION: &str = "ERR_IMIO_519";
pub const ERR_PERMITS_CLOSED: &str = "ERR_IMIO_597";
pub const ERR_TASK_LOST: &str = "ERR_IMIO_598";
pub const ERR_TASK_PANICKED: &str = "ERR_IMIO_599";

#[derive(Clone)]
pub struct InvitationDispatcher {
    members: MembershipManager,
    tokens: TokenGenerator,
    sender: Arc<dyn NotificationSender>,
    notification_timeout: Duration,
    concurrency: usize,
}

/// What every task of one batch shares.
struct BatchContext {
    dispatcher: InvitationDispatcher,
    organization: Organization,
    requester_name: String,
    re_invitation: bool,
}

impl InvitationDispatcher {
    pub fn new(
        members: MembershipManager,
        tokens: TokenGenerator,
        sender: Arc<dyn NotificationSender>,
        notification_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            members,
            tokens,
            sender,
            notification_timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Invites every entry of `batch` into the organization and reports per entry.
    ///
    /// Only an unknown organization fails the call; everything else is reported in
    /// the outcome of the entry it happened to.
    #[instrument(skip(self, requester, batch), fields(requester = requester.id, entries = batch.len()))]
    pub async fn invite_members(
        &self,
        organization_id: i64,
        requester: &Member,
        batch: Vec<InviteMemberDTO>,
        re_invitation: bool,
    ) -> Result<Vec<InvitationOutcome>, AppError> {
        let organization = self.members.organization(organization_id).await.map_err(|e| {
            warn!("Cannot invite into organization {}: {}", organization_id, e);
            e.with_code("ERR_IMIO_502")
        })?;

        let context = Arc::new(BatchContext {
            dispatcher: self.clone(),
            organization,
            requester_name: requester
                .display_name()
                .unwrap_or_else(|| requester.phone.clone()),
            re_invitation,
        });
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let total = batch.len();

        let mut tasks = JoinSet::new();
        let mut phones = HashMap::with_capacity(total);
        for entry in batch {
            let context = context.clone();
            let permits = permits.clone();
            let phone = entry.phone.clone();
            let span = info_span!("invite_entry", phone = %entry.phone);
            let handle = tasks.spawn(
                async move {
                    let phone = entry.phone.clone();
                    let _permit = match permits.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            error!("Invite permits closed");
                            return InvitationOutcome::failed(phone, ERR_PERMITS_CLOSED);
                        }
                    };
                    match AssertUnwindSafe(context.invite_one(entry)).catch_unwind().await {
                        Ok(Ok(())) => InvitationOutcome::invited(phone),
                        Ok(Err(code)) => InvitationOutcome::failed(phone, code),
                        Err(_) => {
                            error!("Invite task panicked");
                            InvitationOutcome::failed(phone, ERR_TASK_PANICKED)
                        }
                    }
                }
                .instrument(span),
            );
            phones.insert(handle.id(), phone);
        }

        let outcomes = collect_outcomes(tasks, phones).await;

        let invited = outcomes.iter().filter(|o| o.invited).count();
        info!("Batch done: {}/{} invited", invited, total);
        Ok(outcomes)
    }
}

/// Drains `tasks` in completion order. A task that did not finish still gets a failed
/// outcome under the phone it was spawned for, so the report has one entry per task.
async fn collect_outcomes(
    mut tasks: JoinSet<InvitationOutcome>,
    mut phones: HashMap<Id, String>,
) -> Vec<InvitationOutcome> {
    let mut outcomes = Vec::with_capacity(phones.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!("Invite task did not finish: {}", e);
                let phone = phones.remove(&e.id()).unwrap_or_default();
                outcomes.push(InvitationOutcome::failed(phone, ERR_TASK_LOST));
            }
        }
    }
    outcomes
}

impl BatchContext {
    /// One entry, start to finish. `Err` carries the code of the step that failed.
    async fn invite_one(&self, entry: InviteMemberDTO) -> Result<(), &'static str> {
        let dispatcher = &self.dispatcher;
        let organization_id = self.organization.id;

        if let Err(e) = entry.validate() {
            warn!("Invalid entry: {}", e);
            return Err(ERR_INVALID_ENTRY);
        }

        // 1. member per telefono; l'email, se presente, deve indicare lo stesso member
        let existing = dispatcher
            .members
            .resolve_invitee(&entry.phone, entry.email.as_deref())
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Conflict => ERR_IDENTITY_MISMATCH,
                _ => {
                    error!("Member lookup failed: {}", e);
                    ERR_MEMBER_LOOKUP
                }
            })?;

        let member = match existing {
            Some(member) => member,
            None if self.re_invitation => {
                warn!("Cannot re-invite a member who was never invited");
                return Err(ERR_UNKNOWN_MEMBER);
            }
            None => dispatcher
                .members
                .create_member(&CreateMemberDTO::from(entry))
                .await
                .map_err(|e| {
                    error!("Member creation failed: {}", e);
                    ERR_MEMBER_CREATE
                })?,
        };

        // 2. membership esistente?
        let membership = dispatcher
            .members
            .find_membership(member.id, organization_id)
            .await
            .map_err(|e| {
                error!("Membership lookup failed: {}", e);
                ERR_MEMBERSHIP_LOOKUP
            })?;

        let token = match (membership, self.re_invitation) {
            (Some(_), false) => {
                debug!("Member {} already belongs to the organization", member.id);
                return Err(ERR_ALREADY_MEMBER);
            }
            (None, true) => {
                debug!("Member {} has no membership to re-invite", member.id);
                return Err(ERR_NO_MEMBERSHIP);
            }
            (None, false) => {
                let token = dispatcher.tokens.generate(member.id, organization_id);
                dispatcher
                    .members
                    .issue_invitation(member.id, organization_id, token)
                    .await
                    .map_err(|e| {
                        error!("Invitation could not be stored: {}", e);
                        ERR_INVITATION_ISSUE
                    })?
                    .invitation
                    .link
            }
            (Some(membership), true) => {
                dispatcher
                    .members
                    .active_invitation(membership.id)
                    .await
                    .map_err(|e| {
                        error!("Invitation lookup failed: {}", e);
                        ERR_MEMBERSHIP_LOOKUP
                    })?
                    .ok_or(ERR_NO_ACTIVE_INVITATION)?
                    .link
            }
        };

        // 3. notifica, con timeout
        let notice = InvitationNotice {
            member: &member,
            organization_name: &self.organization.name,
            token: &token,
            requester_name: &self.requester_name,
        };
        let sent = tokio::time::timeout(
            dispatcher.notification_timeout,
            dispatcher.sender.send_invitation(notice),
        )
        .await
        .map_err(|_| {
            warn!(
                "Notification timed out after {:?}",
                dispatcher.notification_timeout
            );
            ERR_NOTIFICATION
        })?
        .map_err(|e| {
            warn!("Notification failed: {}", e);
            ERR_NOTIFICATION
        })?;

        // 4. almeno un messaggio consegnato
        if sent.is_empty() {
            warn!("Notification provider delivered no message");
            return Err(ERR_NOTHING_DELIVERED);
        }

        debug!("Invitation delivered ({} message(s))", sent.message_ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_task_that_dies_still_gets_an_outcome() {
        let mut tasks = JoinSet::new();
        let mut phones = HashMap::new();

        let ok = tasks.spawn(async { InvitationOutcome::invited("+237699000001".to_string()) });
        phones.insert(ok.id(), "+237699000001".to_string());
        let dead = tasks.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            InvitationOutcome::invited("+237699000002".to_string())
        });
        phones.insert(dead.id(), "+237699000002".to_string());
        dead.abort();

        let outcomes = collect_outcomes(tasks, phones).await;

        assert_eq!(outcomes.len(), 2);
        let lost = outcomes
            .iter()
            .find(|o| o.phone == "+237699000002")
            .unwrap();
        assert!(!lost.invited);
        assert_eq!(lost.error, ERR_TASK_LOST);
        assert!(outcomes.iter().any(|o| o.phone == "+237699000001" && o.invited));
    }
}
