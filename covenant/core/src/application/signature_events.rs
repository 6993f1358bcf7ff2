// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Reaction to corporate signature state changes.
//!
//! When a corporate CLA signature transitions unsigned→signed, the first
//! ACL entry is promoted to a full cla-manager and any lingering
//! cla-manager-designee scopes for the affected projects are revoked.
//! Promotion and the per-project revocations run concurrently on a
//! `JoinSet`; all tasks are joined, the first error propagates, and
//! completed siblings are not compensated.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::error::ClaManagerError;
use crate::domain::hierarchy::ProjectHierarchyResolver;
use crate::domain::identity::IdentityResolver;
use crate::domain::repository::{CompanyRepository, SignatureRepository};
use crate::domain::roles::{RoleCatalog, ScopePath, CLA_DESIGNEE_ROLE, CLA_MANAGER_ROLE};
use crate::domain::scope::{LedgerError, ScopeLedger};
use crate::domain::signature::SignatureStreamRecord;

pub struct SignatureEventService {
    companies: Arc<dyn CompanyRepository>,
    signatures: Arc<dyn SignatureRepository>,
    identity: Arc<dyn IdentityResolver>,
    ledger: Arc<dyn ScopeLedger>,
    catalog: Arc<dyn RoleCatalog>,
    hierarchy: Arc<dyn ProjectHierarchyResolver>,
}

impl SignatureEventService {
    pub fn new(
        companies: Arc<dyn CompanyRepository>,
        signatures: Arc<dyn SignatureRepository>,
        identity: Arc<dyn IdentityResolver>,
        ledger: Arc<dyn ScopeLedger>,
        catalog: Arc<dyn RoleCatalog>,
        hierarchy: Arc<dyn ProjectHierarchyResolver>,
    ) -> Self {
        Self {
            companies,
            signatures,
            identity,
            ledger,
            catalog,
            hierarchy,
        }
    }

    /// Entry point for one change-feed record.
    pub async fn signature_signed_event(
        &self,
        record: &SignatureStreamRecord,
    ) -> Result<(), ClaManagerError> {
        let old = record
            .old_signature()
            .map_err(|e| ClaManagerError::dependency("decoding old signature image", e))?;
        let new = record
            .new_signature()
            .map_err(|e| ClaManagerError::dependency("decoding new signature image", e))?;

        if old.signature_signed || !new.signature_signed {
            debug!(event_id = %record.event_id, "not an unsigned-to-signed transition, skipping");
            return Ok(());
        }
        debug!(event_id = %record.event_id, signature_id = %new.signature_id,
               signature_type = %new.signature_type, "signature signed");

        // Timestamping is best-effort; a storage hiccup must not block the
        // role reconciliation below.
        if let Err(e) = self.signatures.add_signed_on(&new.signature_id).await {
            warn!(signature_id = %new.signature_id, error = %e,
                  "failed to stamp signed_on");
        }

        if !new.is_corporate() {
            return Ok(());
        }

        let Some(initial_manager) = new.signature_acl.first().cloned() else {
            return Err(ClaManagerError::dependency(
                "promoting initial CLA manager",
                "initial cla manager details not found: signature ACL is empty",
            ));
        };

        let company = self
            .companies
            .find_by_id(&new.signature_reference_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading signing company", e))?
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: new.signature_reference_id.clone(),
            })?;
        let company_sfid = company
            .external_id()
            .ok_or_else(|| {
                ClaManagerError::dependency(
                    "loading signing company",
                    format!("company {} has no external ID", company.company_id),
                )
            })?
            .to_string();

        let cla_group_id = new.signature_project_id.clone();
        let groups = self
            .hierarchy
            .associated_projects(&cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading associated projects", e))?;

        let mut tasks: JoinSet<Result<(), ClaManagerError>> = JoinSet::new();

        tasks.spawn(Self::promote_initial_manager(
            self.identity.clone(),
            self.ledger.clone(),
            self.catalog.clone(),
            self.hierarchy.clone(),
            initial_manager,
            company_sfid.clone(),
            cla_group_id.clone(),
            groups.clone(),
        ));

        for pcg in &groups {
            tasks.spawn(Self::remove_designee_scopes(
                self.ledger.clone(),
                self.catalog.clone(),
                company_sfid.clone(),
                pcg.project_sfid.clone(),
            ));
        }

        // Join everything; report the first failure after all tasks have
        // run to completion.
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| ClaManagerError::dependency("joining reaction task", e))
                .and_then(|r| r);
            if let Err(e) = outcome {
                warn!(error = %e, "signature reaction task failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Promote the first signature ACL entry to a full cla-manager: grant
    /// the role scope at the CLA group's signing level.
    #[allow(clippy::too_many_arguments)]
    async fn promote_initial_manager(
        identity: Arc<dyn IdentityResolver>,
        ledger: Arc<dyn ScopeLedger>,
        catalog: Arc<dyn RoleCatalog>,
        hierarchy: Arc<dyn ProjectHierarchyResolver>,
        username: String,
        company_sfid: String,
        cla_group_id: String,
        groups: Vec<crate::domain::company::ProjectClaGroup>,
    ) -> Result<(), ClaManagerError> {
        debug!(%username, %company_sfid, %cla_group_id, "promoting initial CLA manager");

        let account = identity
            .find_by_username(&username)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by username", e))?
            .ok_or_else(|| ClaManagerError::IdentityNotFound {
                subject: username.clone(),
            })?;
        let email = account.primary_email().unwrap_or_default().to_string();

        let role_id = catalog
            .role_id(CLA_MANAGER_ROLE)
            .await
            .map_err(|e| ClaManagerError::dependency("resolving role ID for cla-manager", e))?;

        let foundation_level = hierarchy
            .signed_at_foundation_level(&cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("determining signing level", e))?;

        let mut targets = Vec::new();
        if foundation_level {
            if let Some(sfid) = groups
                .first()
                .map(|g| g.foundation_sfid.clone())
                .filter(|sfid| !sfid.is_empty())
            {
                targets.push(sfid);
            }
        } else {
            targets.extend(groups.iter().map(|g| g.project_sfid.clone()));
        }

        for project_sfid in &targets {
            match ledger
                .create_scope(&email, &role_id, &company_sfid, Some(project_sfid))
                .await
            {
                Ok(()) => {
                    debug!(%project_sfid, "granted cla-manager scope to initial manager");
                }
                // Replayed events converge: the scope from an earlier
                // delivery already exists.
                Err(LedgerError::Conflict) => {
                    debug!(%project_sfid, "initial manager already holds cla-manager scope");
                }
                Err(e) => {
                    return Err(ClaManagerError::dependency(
                        "creating cla-manager role scope",
                        e,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Revoke any cla-manager-designee scopes left on one project now that
    /// the CLA is signed. Zero holders is a no-op.
    async fn remove_designee_scopes(
        ledger: Arc<dyn ScopeLedger>,
        catalog: Arc<dyn RoleCatalog>,
        company_sfid: String,
        project_sfid: String,
    ) -> Result<(), ClaManagerError> {
        let holders = ledger
            .list_admin_scopes(&company_sfid, Some(CLA_DESIGNEE_ROLE))
            .await
            .map_err(|e| ClaManagerError::dependency("listing designee scope holders", e))?;
        if holders.is_empty() {
            return Ok(());
        }

        let role_id = catalog
            .role_id(CLA_DESIGNEE_ROLE)
            .await
            .map_err(|e| {
                ClaManagerError::dependency("resolving role ID for cla-manager-designee", e)
            })?;

        for holder in &holders {
            let scope_id = ledger
                .resolve_scope_id(
                    &company_sfid,
                    &project_sfid,
                    CLA_DESIGNEE_ROLE,
                    ScopePath::ProjectOrganization,
                    &holder.username,
                )
                .await
                .map_err(|e| ClaManagerError::dependency("resolving designee scope ID", e))?;
            // The holder may be scoped to a different project of the same
            // company; nothing to revoke here then.
            let Some(scope_id) = scope_id else {
                continue;
            };

            ledger
                .delete_scope(
                    &company_sfid,
                    &role_id,
                    &scope_id,
                    &holder.username,
                    &holder.email,
                )
                .await
                .map_err(|e| ClaManagerError::dependency("deleting designee role scope", e))?;
            debug!(%project_sfid, username = %holder.username, "revoked designee scope");
        }
        Ok(())
    }
}
