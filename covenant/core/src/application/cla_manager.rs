// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Designee reconciliation engine.
//!
//! Orchestrates CLA manager and designee assignment across the identity
//! directory, the scope ledger, the role catalog, the project hierarchy
//! and the internal stores. External calls within one operation are
//! strictly sequential; there is no retry, no local locking and no
//! compensation — the ledger's conflict-on-create is the only
//! cross-invocation guard, so partial completion of a fan-out is an
//! accepted state and retried operations converge.

use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::company::ClaUser;
use crate::domain::company::ProjectClaGroup;
use crate::domain::designee::{ClaManagerDesignee, CompanyClaManager};
use crate::domain::error::ClaManagerError;
use crate::domain::events::{AuditEvent, EventLog};
use crate::domain::hierarchy::ProjectHierarchyResolver;
use crate::domain::identity::{AccountType, IdentityAccount, IdentityResolver};
use crate::domain::notification::{
    AdminNotification, DesigneeNotification, ManagerNotification, NoAccountInvite,
    NotificationDispatcher,
};
use crate::domain::repository::{ClaUserRepository, CompanyRepository, SignatureRepository};
use crate::domain::roles::{
    RoleCatalog, ScopePath, CLA_DESIGNEE_ROLE, CLA_MANAGER_ROLE, COMPANY_OWNER_ROLE,
};
use crate::domain::scope::{LedgerError, ScopeLedger};
use crate::domain::signing::SigningStateOracle;

/// Conservative pattern for first/last names: ASCII word characters,
/// length 1-30.
const NAME_PATTERN: &str = r"^\w{1,30}$";

/// Request body for the original-signer flow.
#[derive(Debug, Clone)]
pub struct CreateManagerRequest {
    pub company_sfid: String,
    pub project_sfid: String,
    pub first_name: String,
    pub last_name: String,
    pub user_email: String,
    /// Username of the authenticated requester; used for notification
    /// payloads only.
    pub requested_by: String,
}

/// The authenticated user driving a contributor-initiated request.
#[derive(Debug, Clone)]
pub struct Requester {
    pub username: String,
    pub email: String,
}

/// One manager entry of a notify-managers request.
#[derive(Debug, Clone)]
pub struct ManagerContact {
    pub name: String,
    pub email: String,
}

/// The reconciliation engine. Stateless across requests; every
/// collaborator is an injected capability handle.
pub struct ClaManagerService {
    companies: Arc<dyn CompanyRepository>,
    cla_users: Arc<dyn ClaUserRepository>,
    signatures: Arc<dyn SignatureRepository>,
    identity: Arc<dyn IdentityResolver>,
    ledger: Arc<dyn ScopeLedger>,
    catalog: Arc<dyn RoleCatalog>,
    hierarchy: Arc<dyn ProjectHierarchyResolver>,
    oracle: Arc<dyn SigningStateOracle>,
    events: Arc<dyn EventLog>,
    notifier: Arc<dyn NotificationDispatcher>,
    name_pattern: Regex,
}

impl ClaManagerService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        companies: Arc<dyn CompanyRepository>,
        cla_users: Arc<dyn ClaUserRepository>,
        signatures: Arc<dyn SignatureRepository>,
        identity: Arc<dyn IdentityResolver>,
        ledger: Arc<dyn ScopeLedger>,
        catalog: Arc<dyn RoleCatalog>,
        hierarchy: Arc<dyn ProjectHierarchyResolver>,
        oracle: Arc<dyn SigningStateOracle>,
        events: Arc<dyn EventLog>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            companies,
            cla_users,
            signatures,
            identity,
            ledger,
            catalog,
            hierarchy,
            oracle,
            events,
            notifier,
            // The pattern is a literal; it cannot fail to compile.
            name_pattern: Regex::new(NAME_PATTERN).unwrap(),
        }
    }

    /// Assign the cla-manager-designee role scope for one
    /// (company, project) pair.
    pub async fn create_manager_designee(
        &self,
        company_sfid: &str,
        project_sfid: &str,
        user_email: &str,
    ) -> Result<ClaManagerDesignee, ClaManagerError> {
        debug!(%company_sfid, %project_sfid, %user_email, "creating CLA manager designee");

        let company = self
            .companies
            .find_by_external_id(company_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading company by external ID", e))?
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: company_sfid.to_string(),
            })?;

        let signed = self
            .oracle
            .is_signed(&company, project_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("checking company/project signing state", e))?;
        if signed {
            warn!(%company_sfid, %project_sfid, "project already signed");
            return Err(ClaManagerError::ProjectAlreadySigned {
                company_sfid: company_sfid.to_string(),
                project_sfid: project_sfid.to_string(),
            });
        }

        let account = self
            .identity
            .find_by_email(user_email)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by email", e))?
            .ok_or_else(|| ClaManagerError::IdentityNotFound {
                subject: user_email.to_string(),
            })?;

        // Ledger 404 on the existence check is "no scope exists", not an
        // error; only a positive answer is a conflict.
        let has_scope = self
            .ledger
            .has_role_scope(CLA_DESIGNEE_ROLE, &account.id, company_sfid, project_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("checking designee role scope", e))?;
        if has_scope {
            warn!(%company_sfid, %project_sfid, username = %account.username,
                  "user already holds designee role scope");
            return Err(ClaManagerError::DesigneeRoleConflict {
                company_sfid: company_sfid.to_string(),
                project_sfid: project_sfid.to_string(),
            });
        }

        let project = self
            .hierarchy
            .project(project_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading project by SFID", e))?
            .ok_or_else(|| ClaManagerError::ProjectNotFound {
                project_sfid: project_sfid.to_string(),
            })?;

        let role_id = self
            .catalog
            .role_id(CLA_DESIGNEE_ROLE)
            .await
            .map_err(|e| {
                ClaManagerError::dependency("resolving role ID for cla-manager-designee", e)
            })?;

        match self
            .ledger
            .create_scope(user_email, &role_id, company_sfid, Some(project_sfid))
            .await
        {
            Ok(()) => {}
            // Raced another concurrent assignment; the ledger's atomic
            // create is the arbiter.
            Err(LedgerError::Conflict) => {
                return Err(ClaManagerError::DesigneeRoleConflict {
                    company_sfid: company_sfid.to_string(),
                    project_sfid: project_sfid.to_string(),
                })
            }
            Err(e) => {
                return Err(ClaManagerError::dependency("creating designee role scope", e));
            }
        }
        debug!(%company_sfid, %project_sfid, role = CLA_DESIGNEE_ROLE,
               "created project|organization role scope");

        self.events
            .log(AuditEvent::AssignUserRoleScope {
                lf_username: account.username.clone(),
                user_sfid: account.id.clone(),
                company_id: company.company_id.clone(),
                project_sfid: project_sfid.to_string(),
                role: CLA_DESIGNEE_ROLE.to_string(),
                scope: format!("{project_sfid}|{company_sfid}"),
            })
            .await;

        if account.account_type == AccountType::Lead {
            debug!(username = %account.username, "converting lead to contact");
            self.identity
                .convert_to_contact(&account.id)
                .await
                .map_err(|e| ClaManagerError::dependency("converting lead to contact", e))?;
            self.events
                .log(AuditEvent::ConvertUserToContact {
                    lf_username: account.username.clone(),
                    project_sfid: project_sfid.to_string(),
                })
                .await;
        }

        Ok(ClaManagerDesignee {
            lf_username: account.username,
            user_sfid: account.id,
            account_type: account.account_type,
            assigned_on: Utc::now(),
            email: user_email.to_string(),
            company_sfid: company_sfid.to_string(),
            project_sfid: project_sfid.to_string(),
            project_name: project.name,
        })
    }

    /// Fan the designee assignment out over a CLA group's associated
    /// projects.
    ///
    /// Aborts on the first per-project failure: partial designee
    /// assignment across a multi-project foundation is an inconsistent
    /// state, so the fan-out is all-or-nothing from the caller's view.
    /// Grants made before the failing project stay in place.
    pub async fn create_manager_designee_by_group(
        &self,
        company_sfid: &str,
        user_email: &str,
        project_cla_groups: &[ProjectClaGroup],
    ) -> Result<Vec<ClaManagerDesignee>, ClaManagerError> {
        let Some(first) = project_cla_groups.first() else {
            return Err(ClaManagerError::InvalidInput(
                "no projects associated with the CLA group".to_string(),
            ));
        };
        debug!(%company_sfid, %user_email, cla_group_id = %first.cla_group_id,
               projects = project_cla_groups.len(), "creating designees by group");

        self.ensure_owner_role(user_email, company_sfid).await?;

        let foundation_level = self
            .hierarchy
            .signed_at_foundation_level(&first.cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("determining signing level", e))?;

        let mut designees = Vec::new();
        if foundation_level {
            // One signature covers all child projects: exactly one grant,
            // against the foundation. An empty foundation SFID skips the
            // grant entirely.
            if !first.foundation_sfid.is_empty() {
                let designee = self
                    .create_manager_designee(company_sfid, &first.foundation_sfid, user_email)
                    .await?;
                designees.push(designee);
            }
        } else {
            for pcg in project_cla_groups {
                debug!(project_sfid = %pcg.project_sfid, "creating designee for project");
                let designee = self
                    .create_manager_designee(company_sfid, &pcg.project_sfid, user_email)
                    .await?;
                designees.push(designee);
            }
        }

        Ok(designees)
    }

    /// Promote a request directly to a signed CLA manager, bypassing the
    /// designee intermediate state (original-signer flow).
    pub async fn create_manager(
        &self,
        cla_group_id: &str,
        request: &CreateManagerRequest,
    ) -> Result<CompanyClaManager, ClaManagerError> {
        debug!(%cla_group_id, company_sfid = %request.company_sfid,
               project_sfid = %request.project_sfid, "creating CLA manager");

        // Fail fast before touching any external system.
        if !self.name_pattern.is_match(&request.first_name)
            || !self.name_pattern.is_match(&request.last_name)
        {
            return Err(ClaManagerError::InvalidInput(
                "first and last name must be 1-30 word characters".to_string(),
            ));
        }
        if request.user_email.is_empty() {
            return Err(ClaManagerError::InvalidInput(
                "user email cannot be empty".to_string(),
            ));
        }

        let company = self
            .companies
            .find_by_external_id(&request.company_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading company by external ID", e))?
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: request.company_sfid.clone(),
            })?;

        let cla_group = self
            .hierarchy
            .cla_group(cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading CLA group", e))?
            .ok_or_else(|| ClaManagerError::ClaGroupNotFound {
                cla_group_id: cla_group_id.to_string(),
            })?;

        // The requesting manager's own account is only needed for the
        // notification payload; lookup failure is soft.
        let manager_account = match self.identity.find_by_username(&request.requested_by).await {
            Ok(account) => account,
            Err(e) => {
                warn!(username = %request.requested_by, error = %e,
                      "failed to load requesting manager account");
                None
            }
        };

        let Some(account) = self
            .identity
            .find_by_email(&request.user_email)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by email", e))?
        else {
            // No directory account: invite inline, then surface the
            // distinct not-found outcome.
            warn!(email = %request.user_email,
                  "user has no directory account, sending invitation");
            let invite = NoAccountInvite {
                recipient_name: format!("{} {}", request.first_name, request.last_name),
                recipient_email: request.user_email.clone(),
                project_name: cla_group.name.clone(),
                requester_username: request.requested_by.clone(),
                requester_email: manager_account
                    .as_ref()
                    .and_then(|m| m.primary_email())
                    .unwrap_or_default()
                    .to_string(),
                organization_id: request.company_sfid.clone(),
                project_sfid: None,
                role_name: CLA_MANAGER_ROLE.to_string(),
            };
            self.notifier
                .invite_user_without_account(&invite)
                .await
                .map_err(|e| ClaManagerError::dependency("sending no-account invitation", e))?;
            return Err(ClaManagerError::IdentityNotFound {
                subject: request.user_email.clone(),
            });
        };

        self.ensure_cla_user(&account, request).await?;

        let project = self
            .hierarchy
            .project(&request.project_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading project by SFID", e))?
            .ok_or_else(|| ClaManagerError::ProjectNotFound {
                project_sfid: request.project_sfid.clone(),
            })?;

        self.signatures
            .add_cla_manager(&company.company_id, cla_group_id, &account.username)
            .await
            .map_err(|e| ClaManagerError::dependency("adding manager to signature ACL", e))?
            .ok_or_else(|| ClaManagerError::SignatureNotFound {
                cla_group_id: cla_group_id.to_string(),
                company_id: company.company_id.clone(),
            })?;

        let role_id = self
            .catalog
            .role_id(CLA_MANAGER_ROLE)
            .await
            .map_err(|e| ClaManagerError::dependency("resolving role ID for cla-manager", e))?;

        let has_scope = self
            .ledger
            .has_role_scope(
                CLA_MANAGER_ROLE,
                &account.id,
                &request.company_sfid,
                &request.project_sfid,
            )
            .await
            .map_err(|e| ClaManagerError::dependency("checking cla-manager role scope", e))?;
        if has_scope {
            return Err(ClaManagerError::RoleScopeConflict {
                company_sfid: request.company_sfid.clone(),
                project_sfid: request.project_sfid.clone(),
            });
        }

        let groups = self
            .hierarchy
            .associated_projects(cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading associated projects", e))?;
        let foundation_level = self
            .hierarchy
            .signed_at_foundation_level(cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("determining signing level", e))?;

        if foundation_level {
            let foundation_sfid = groups
                .first()
                .map(|g| g.foundation_sfid.clone())
                .filter(|sfid| !sfid.is_empty())
                .ok_or_else(|| {
                    ClaManagerError::dependency(
                        "granting cla-manager scope",
                        "foundation-level CLA group has no foundation SFID",
                    )
                })?;
            self.grant_manager_scope(&request.user_email, &role_id, &request.company_sfid, &foundation_sfid)
                .await?;
        } else {
            for pcg in &groups {
                self.grant_manager_scope(
                    &request.user_email,
                    &role_id,
                    &request.company_sfid,
                    &pcg.project_sfid,
                )
                .await?;
            }
        }

        if account.account_type == AccountType::Lead {
            debug!(username = %account.username, "converting lead to contact");
            self.identity
                .convert_to_contact(&account.id)
                .await
                .map_err(|e| ClaManagerError::dependency("converting lead to contact", e))?;
        }

        Ok(CompanyClaManager {
            lf_username: account.username.clone(),
            name: account.full_name(),
            email: request.user_email.clone(),
            user_sfid: account.id,
            approved_on: Utc::now(),
            cla_group_id: cla_group_id.to_string(),
            cla_group_name: cla_group.name,
            project_sfid: request.project_sfid.clone(),
            project_name: project.name,
            organization_name: company.name,
            organization_sfid: request.company_sfid.clone(),
        })
    }

    /// Symmetric teardown of a CLA manager.
    ///
    /// All external scopes are cleared before the signature association is
    /// removed; a failure mid-fan-out returns immediately, leaving the
    /// association intact and some scopes already deleted.
    pub async fn delete_manager(
        &self,
        cla_group_id: &str,
        company_sfid: &str,
        user_lfid: &str,
    ) -> Result<(), ClaManagerError> {
        debug!(%cla_group_id, %company_sfid, %user_lfid, "deleting CLA manager");

        let account = self
            .identity
            .find_by_username(user_lfid)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by username", e))?
            .ok_or_else(|| ClaManagerError::IdentityNotFound {
                subject: user_lfid.to_string(),
            })?;

        let company = self
            .companies
            .find_by_external_id(company_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading company by external ID", e))?
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: company_sfid.to_string(),
            })?;

        let role_id = self
            .catalog
            .role_id(CLA_MANAGER_ROLE)
            .await
            .map_err(|e| ClaManagerError::dependency("resolving role ID for cla-manager", e))?;

        let groups = self
            .hierarchy
            .associated_projects(cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading associated projects", e))?;

        for pcg in &groups {
            // Deletion is strict: the scope must exist, unlike creation
            // which tolerates absence.
            let scope_id = self
                .ledger
                .resolve_scope_id(
                    company_sfid,
                    &pcg.project_sfid,
                    CLA_MANAGER_ROLE,
                    ScopePath::ProjectOrganization,
                    user_lfid,
                )
                .await
                .map_err(|e| ClaManagerError::dependency("resolving scope ID", e))?
                .ok_or_else(|| ClaManagerError::ScopeNotFound {
                    username: user_lfid.to_string(),
                    project_sfid: pcg.project_sfid.clone(),
                })?;

            self.ledger
                .delete_scope(
                    company_sfid,
                    &role_id,
                    &scope_id,
                    user_lfid,
                    account.primary_email().unwrap_or_default(),
                )
                .await
                .map_err(|e| ClaManagerError::dependency("deleting role scope", e))?;
            debug!(project_sfid = %pcg.project_sfid, %scope_id, "deleted cla-manager scope");
        }

        // Association removed last, after all external scopes are gone.
        self.signatures
            .remove_cla_manager(&company.company_id, cla_group_id, user_lfid)
            .await
            .map_err(|e| ClaManagerError::dependency("removing manager from signature ACL", e))?
            .ok_or_else(|| ClaManagerError::SignatureNotFound {
                cla_group_id: cla_group_id.to_string(),
                company_id: company.company_id.clone(),
            })?;

        Ok(())
    }

    /// Contributor-initiated request for a CLA manager.
    ///
    /// With `contact_admin` the request is routed to the organization's
    /// admins instead of assigning a designee; the return value is `None`
    /// in that branch.
    pub async fn create_manager_request(
        &self,
        contact_admin: bool,
        company_sfid: &str,
        project_sfid: &str,
        user_email: &str,
        full_name: &str,
        requester: &Requester,
    ) -> Result<Option<ClaManagerDesignee>, ClaManagerError> {
        debug!(%contact_admin, %company_sfid, %project_sfid, %user_email,
               "handling CLA manager request");

        let company = self
            .companies
            .find_by_external_id(company_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading company by external ID", e))?
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: company_sfid.to_string(),
            })?;

        let signed = self
            .oracle
            .is_signed(&company, project_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("checking company/project signing state", e))?;
        if signed {
            return Err(ClaManagerError::ProjectAlreadySigned {
                company_sfid: company_sfid.to_string(),
                project_sfid: project_sfid.to_string(),
            });
        }

        let project = self
            .hierarchy
            .project(project_sfid)
            .await
            .map_err(|e| ClaManagerError::dependency("loading project by SFID", e))?
            .ok_or_else(|| ClaManagerError::ProjectNotFound {
                project_sfid: project_sfid.to_string(),
            })?;

        if contact_admin {
            // List-call 404 is "no admins", surfaced as NoOrgAdmins below.
            let admins = self
                .ledger
                .list_admin_scopes(company_sfid, None)
                .await
                .map_err(|e| ClaManagerError::dependency("listing organization admins", e))?;
            if admins.is_empty() {
                return Err(ClaManagerError::NoOrgAdmins {
                    company_sfid: company_sfid.to_string(),
                });
            }

            for admin in &admins {
                self.notifier
                    .notify_company_admin(&AdminNotification {
                        admin_name: admin.name.clone(),
                        admin_email: admin.email.clone(),
                        company_name: company.name.clone(),
                        project_names: vec![project.name.clone()],
                        contributor_username: requester.username.clone(),
                        contributor_email: requester.email.clone(),
                    })
                    .await;
                self.events
                    .log(AuditEvent::ContributorNotifyCompanyAdmin {
                        lf_username: requester.username.clone(),
                        company_id: company.company_id.clone(),
                        project_sfid: project_sfid.to_string(),
                        admin_name: admin.name.clone(),
                        admin_email: admin.email.clone(),
                    })
                    .await;
            }
            return Ok(None);
        }

        let Some(account) = self
            .identity
            .find_by_email(user_email)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by email", e))?
        else {
            warn!(email = %user_email, "user has no directory account, sending invitation");
            let invite = NoAccountInvite {
                recipient_name: full_name.to_string(),
                recipient_email: user_email.to_string(),
                project_name: project.name.clone(),
                requester_username: requester.username.clone(),
                requester_email: requester.email.clone(),
                organization_id: company.company_id.clone(),
                project_sfid: Some(project.sfid.clone()),
                role_name: CLA_DESIGNEE_ROLE.to_string(),
            };
            self.notifier
                .invite_user_without_account(&invite)
                .await
                .map_err(|e| ClaManagerError::dependency("sending no-account invitation", e))?;
            return Err(ClaManagerError::IdentityNotFound {
                subject: user_email.to_string(),
            });
        };

        let designee = self
            .create_manager_designee(company_sfid, project_sfid, user_email)
            .await?;

        self.events
            .log(AuditEvent::ContributorAssignDesignee {
                lf_username: requester.username.clone(),
                company_id: company.company_id.clone(),
                project_sfid: project_sfid.to_string(),
                designee_name: designee.lf_username.clone(),
                designee_email: designee.email.clone(),
            })
            .await;

        self.notifier
            .notify_designee(&DesigneeNotification {
                designee_name: account.full_name(),
                designee_email: user_email.to_string(),
                company_name: company.name.clone(),
                project_names: vec![project.name.clone()],
                requester_username: requester.username.clone(),
                requester_email: requester.email.clone(),
            })
            .await;

        self.events
            .log(AuditEvent::ContributorNotifyDesignee {
                lf_username: requester.username.clone(),
                company_id: company.company_id,
                project_sfid: project_sfid.to_string(),
                designee_name: designee.lf_username.clone(),
                designee_email: designee.email.clone(),
            })
            .await;

        Ok(Some(designee))
    }

    /// Company-admin variant of the contributor request, keyed by the
    /// internal company ID and fanning designees across the whole CLA
    /// group.
    ///
    /// With `contact_admin` the existing org admins are notified instead
    /// and no designee is assigned; zero admins is not an error in this
    /// flow, the returned list is simply empty.
    pub async fn invite_company_admin(
        &self,
        contact_admin: bool,
        company_id: &str,
        cla_group_id: &str,
        user_email: &str,
        full_name: &str,
        contributor_user_id: &str,
    ) -> Result<Vec<ClaManagerDesignee>, ClaManagerError> {
        debug!(%contact_admin, %company_id, %cla_group_id, %user_email,
               "handling company admin invitation");

        let groups = self
            .hierarchy
            .associated_projects(cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading associated projects", e))?;

        let company = self
            .companies
            .find_by_id(company_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading company by ID", e))?
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: company_id.to_string(),
            })?;
        // A company never joined against the external directory has no
        // organization to grant scopes under.
        let company_sfid = company
            .external_id()
            .ok_or_else(|| ClaManagerError::CompanyNotFound {
                company_sfid: company_id.to_string(),
            })?
            .to_string();

        let cla_group = self
            .hierarchy
            .cla_group(cla_group_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading CLA group", e))?
            .ok_or_else(|| ClaManagerError::ClaGroupNotFound {
                cla_group_id: cla_group_id.to_string(),
            })?;

        let contributor = self
            .cla_users
            .find_by_id(contributor_user_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading CLA user", e))?
            .ok_or_else(|| ClaManagerError::ClaUserNotFound {
                user_id: contributor_user_id.to_string(),
            })?;

        let Some(account) = self
            .identity
            .find_by_email(user_email)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by email", e))?
        else {
            warn!(email = %user_email, "user has no directory account, sending invitation");
            let invite = NoAccountInvite {
                recipient_name: full_name.to_string(),
                recipient_email: user_email.to_string(),
                project_name: cla_group.name.clone(),
                requester_username: contributor.lf_username.clone(),
                requester_email: contributor.lf_email.clone(),
                organization_id: company_sfid.clone(),
                project_sfid: groups
                    .first()
                    .map(|g| g.foundation_sfid.clone())
                    .filter(|sfid| !sfid.is_empty()),
                role_name: CLA_DESIGNEE_ROLE.to_string(),
            };
            self.notifier
                .invite_user_without_account(&invite)
                .await
                .map_err(|e| ClaManagerError::dependency("sending no-account invitation", e))?;
            return Err(ClaManagerError::IdentityNotFound {
                subject: user_email.to_string(),
            });
        };

        let mut project_names = Vec::with_capacity(groups.len());
        for pcg in &groups {
            let project = self
                .hierarchy
                .project(&pcg.project_sfid)
                .await
                .map_err(|e| ClaManagerError::dependency("loading project by SFID", e))?
                .ok_or_else(|| ClaManagerError::ProjectNotFound {
                    project_sfid: pcg.project_sfid.clone(),
                })?;
            project_names.push(project.name);
        }

        self.ensure_owner_role(user_email, &company_sfid).await?;

        if contact_admin {
            let admins = self
                .ledger
                .list_admin_scopes(&company_sfid, None)
                .await
                .map_err(|e| ClaManagerError::dependency("listing organization admins", e))?;
            for admin in &admins {
                self.notifier
                    .notify_company_admin(&AdminNotification {
                        admin_name: admin.name.clone(),
                        admin_email: admin.email.clone(),
                        company_name: company.name.clone(),
                        project_names: project_names.clone(),
                        contributor_username: contributor.lf_username.clone(),
                        contributor_email: contributor.lf_email.clone(),
                    })
                    .await;
            }
            return Ok(Vec::new());
        }

        let mut designees = Vec::with_capacity(groups.len());
        for pcg in &groups {
            debug!(project_sfid = %pcg.project_sfid, "creating designee for project");
            let designee = self
                .create_manager_designee(&company_sfid, &pcg.project_sfid, user_email)
                .await?;
            designees.push(designee);
        }

        self.notifier
            .notify_designee(&DesigneeNotification {
                designee_name: account.full_name(),
                designee_email: user_email.to_string(),
                company_name: company.name.clone(),
                project_names,
                requester_username: contributor.lf_username.clone(),
                requester_email: contributor.lf_email.clone(),
            })
            .await;

        Ok(designees)
    }

    /// Fan approval-request notifications out to a list of CLA managers.
    pub async fn notify_cla_managers(
        &self,
        user_id: &str,
        company_name: &str,
        cla_group_name: &str,
        managers: &[ManagerContact],
    ) -> Result<(), ClaManagerError> {
        let user = self
            .cla_users
            .find_by_id(user_id)
            .await
            .map_err(|e| ClaManagerError::dependency("loading CLA user", e))?
            .ok_or_else(|| ClaManagerError::ClaUserNotFound {
                user_id: user_id.to_string(),
            })?;

        for manager in managers {
            self.notifier
                .notify_cla_manager(&ManagerNotification {
                    manager_name: manager.name.clone(),
                    manager_email: manager.email.clone(),
                    contributor_username: user.lf_username.clone(),
                    contributor_email: user.lf_email.clone(),
                    company_name: company_name.to_string(),
                    cla_group_name: cla_group_name.to_string(),
                })
                .await;
        }
        Ok(())
    }

    /// Ensure the organization has a company-owner before designee
    /// assignment. Idempotent: an existing owner (the candidate or anyone
    /// else) means no grant is made.
    async fn ensure_owner_role(
        &self,
        user_email: &str,
        org_id: &str,
    ) -> Result<(), ClaManagerError> {
        let account = self
            .identity
            .find_by_email(user_email)
            .await
            .map_err(|e| ClaManagerError::dependency("searching identity by email", e))?
            .ok_or_else(|| ClaManagerError::IdentityNotFound {
                subject: user_email.to_string(),
            })?;

        let has_owner_scope = if account.has_no_account() {
            // Accounts with no real affiliation cannot already be owners.
            false
        } else {
            let user_org = account
                .account
                .as_ref()
                .map(|a| a.id.as_str())
                .unwrap_or(org_id);
            self.ledger
                .is_company_owner(&account.id, user_org)
                .await
                .map_err(|e| ClaManagerError::dependency("checking company owner", e))?
        };
        debug!(%user_email, %has_owner_scope, "company owner check");

        if has_owner_scope {
            return Ok(());
        }

        // List-call 404 is "zero owners", not an error.
        let owners = self
            .ledger
            .list_admin_scopes(org_id, Some(COMPANY_OWNER_ROLE))
            .await
            .map_err(|e| ClaManagerError::dependency("listing company owners", e))?;
        if !owners.is_empty() {
            return Ok(());
        }

        let role_id = self
            .catalog
            .role_id(COMPANY_OWNER_ROLE)
            .await
            .map_err(|e| ClaManagerError::dependency("resolving role ID for company-owner", e))?;

        match self
            .ledger
            .create_scope(user_email, &role_id, org_id, None)
            .await
        {
            Ok(()) => {
                debug!(%user_email, %org_id, "assigned company-owner role");
                Ok(())
            }
            // Raced another assignment; an owner now exists either way.
            Err(LedgerError::Conflict) => {
                debug!(%org_id, "company-owner already assigned concurrently");
                Ok(())
            }
            Err(e) => Err(ClaManagerError::dependency("assigning company-owner role", e)),
        }
    }

    async fn grant_manager_scope(
        &self,
        user_email: &str,
        role_id: &crate::domain::roles::RoleId,
        company_sfid: &str,
        project_sfid: &str,
    ) -> Result<(), ClaManagerError> {
        match self
            .ledger
            .create_scope(user_email, role_id, company_sfid, Some(project_sfid))
            .await
        {
            Ok(()) => {
                debug!(%company_sfid, %project_sfid, "granted cla-manager scope");
                Ok(())
            }
            Err(LedgerError::Conflict) => Err(ClaManagerError::RoleScopeConflict {
                company_sfid: company_sfid.to_string(),
                project_sfid: project_sfid.to_string(),
            }),
            Err(e) => Err(ClaManagerError::dependency("creating cla-manager role scope", e)),
        }
    }

    /// Ensure the identity exists in the internal CLA user store; upsert
    /// keyed by external username.
    async fn ensure_cla_user(
        &self,
        account: &IdentityAccount,
        request: &CreateManagerRequest,
    ) -> Result<(), ClaManagerError> {
        let existing = self
            .cla_users
            .find_by_username(&account.username)
            .await
            .map_err(|e| ClaManagerError::dependency("loading CLA user by username", e))?;
        if existing.is_some() {
            return Ok(());
        }

        debug!(username = %account.username, "creating internal CLA user record");
        let now = Utc::now();
        let user = ClaUser {
            user_id: uuid::Uuid::new_v4().to_string(),
            lf_username: account.username.clone(),
            lf_email: account
                .primary_email()
                .unwrap_or(&request.user_email)
                .to_string(),
            username: format!("{} {}", request.first_name, request.last_name),
            external_id: request.company_sfid.clone(),
            admin: true,
            date_created: now,
            date_modified: now,
        };
        self.cla_users
            .save(&user)
            .await
            .map_err(|e| ClaManagerError::dependency("creating CLA user", e))
    }
}
