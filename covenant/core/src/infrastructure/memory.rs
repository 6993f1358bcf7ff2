// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! In-memory implementations of the domain contracts.
//!
//! The repositories back local development; the ledger, directory and
//! dispatcher doubles additionally record call counts so tests can assert
//! on fan-out shape, not just outcomes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::company::{ClaGroup, ClaUser, Company, ProjectClaGroup};
use crate::domain::events::{AuditEvent, EventLog};
use crate::domain::hierarchy::{HierarchyError, ProjectHierarchyResolver, ProjectSummary};
use crate::domain::identity::{AccountType, IdentityAccount, IdentityError, IdentityResolver};
use crate::domain::notification::{
    AdminNotification, DesigneeNotification, ManagerNotification, NoAccountInvite,
    NotificationDispatcher, NotifyError,
};
use crate::domain::repository::{
    ClaUserRepository, CompanyRepository, RepositoryError, SignatureRepository,
};
use crate::domain::roles::{CatalogError, RoleCatalog, RoleId, ScopePath};
use crate::domain::scope::{AdminScope, LedgerError, ScopeLedger};
use crate::domain::signature::Signature;
use crate::domain::signing::{OracleError, SigningStateOracle};

/// Shared role-name → role-ID convention used by the in-memory catalog and
/// ledger so they agree without wiring.
pub fn role_id_for(role_name: &str) -> String {
    format!("role-{role_name}")
}

#[derive(Default)]
pub struct InMemoryCompanyRepository {
    companies: RwLock<Vec<Company>>,
}

impl InMemoryCompanyRepository {
    pub fn with(companies: Vec<Company>) -> Self {
        Self {
            companies: RwLock::new(companies),
        }
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn find_by_external_id(
        &self,
        company_sfid: &str,
    ) -> Result<Option<Company>, RepositoryError> {
        let companies = self.companies.read().await;
        Ok(companies
            .iter()
            .find(|c| c.external_id() == Some(company_sfid))
            .cloned())
    }

    async fn find_by_id(&self, company_id: &str) -> Result<Option<Company>, RepositoryError> {
        let companies = self.companies.read().await;
        Ok(companies.iter().find(|c| c.company_id == company_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryClaUserRepository {
    users: RwLock<HashMap<String, ClaUser>>,
    saves: AtomicUsize,
}

impl InMemoryClaUserRepository {
    pub fn with(users: Vec<ClaUser>) -> Self {
        Self {
            users: RwLock::new(
                users
                    .into_iter()
                    .map(|u| (u.lf_username.clone(), u))
                    .collect(),
            ),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClaUserRepository for InMemoryClaUserRepository {
    async fn find_by_username(
        &self,
        lf_username: &str,
    ) -> Result<Option<ClaUser>, RepositoryError> {
        Ok(self.users.read().await.get(lf_username).cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<ClaUser>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.user_id == user_id).cloned())
    }

    async fn save(&self, user: &ClaUser) -> Result<(), RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.users
            .write()
            .await
            .insert(user.lf_username.clone(), user.clone());
        Ok(())
    }
}

/// Signatures keyed by (company ID, CLA group ID).
#[derive(Default)]
pub struct InMemorySignatureRepository {
    signatures: RwLock<HashMap<(String, String), Signature>>,
    signed_on_stamps: AtomicUsize,
}

impl InMemorySignatureRepository {
    pub fn with(entries: Vec<((String, String), Signature)>) -> Self {
        Self {
            signatures: RwLock::new(entries.into_iter().collect()),
            signed_on_stamps: AtomicUsize::new(0),
        }
    }

    pub fn signed_on_stamps(&self) -> usize {
        self.signed_on_stamps.load(Ordering::SeqCst)
    }

    pub async fn acl(&self, company_id: &str, cla_group_id: &str) -> Vec<String> {
        let signatures = self.signatures.read().await;
        signatures
            .get(&(company_id.to_string(), cla_group_id.to_string()))
            .map(|s| s.signature_acl.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SignatureRepository for InMemorySignatureRepository {
    async fn add_cla_manager(
        &self,
        company_id: &str,
        cla_group_id: &str,
        lf_username: &str,
    ) -> Result<Option<Signature>, RepositoryError> {
        let mut signatures = self.signatures.write().await;
        let key = (company_id.to_string(), cla_group_id.to_string());
        match signatures.get_mut(&key) {
            Some(signature) => {
                if !signature.signature_acl.iter().any(|u| u == lf_username) {
                    signature.signature_acl.push(lf_username.to_string());
                }
                Ok(Some(signature.clone()))
            }
            None => Ok(None),
        }
    }

    async fn remove_cla_manager(
        &self,
        company_id: &str,
        cla_group_id: &str,
        lf_username: &str,
    ) -> Result<Option<Signature>, RepositoryError> {
        let mut signatures = self.signatures.write().await;
        let key = (company_id.to_string(), cla_group_id.to_string());
        match signatures.get_mut(&key) {
            Some(signature) => {
                signature.signature_acl.retain(|u| u != lf_username);
                Ok(Some(signature.clone()))
            }
            None => Ok(None),
        }
    }

    async fn add_signed_on(&self, signature_id: &str) -> Result<(), RepositoryError> {
        self.signed_on_stamps.fetch_add(1, Ordering::SeqCst);
        let mut signatures = self.signatures.write().await;
        for signature in signatures.values_mut() {
            if signature.signature_id == signature_id {
                signature.signed_on = Some(chrono::Utc::now());
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryIdentityResolver {
    accounts: RwLock<Vec<IdentityAccount>>,
    conversions: AtomicUsize,
}

impl InMemoryIdentityResolver {
    pub fn with(accounts: Vec<IdentityAccount>) -> Self {
        Self {
            accounts: RwLock::new(accounts),
            conversions: AtomicUsize::new(0),
        }
    }

    pub fn conversions(&self) -> usize {
        self.conversions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityAccount>, IdentityError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|a| a.emails.iter().any(|e| e == email))
            .cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<IdentityAccount>, IdentityError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn convert_to_contact(&self, user_id: &str) -> Result<(), IdentityError> {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.write().await;
        for account in accounts.iter_mut() {
            if account.id == user_id {
                account.account_type = AccountType::Contact;
            }
        }
        Ok(())
    }
}

pub struct InMemoryRoleCatalog;

#[async_trait]
impl RoleCatalog for InMemoryRoleCatalog {
    async fn role_id(&self, role_name: &str) -> Result<RoleId, CatalogError> {
        Ok(RoleId(role_id_for(role_name)))
    }
}

/// One subject the in-memory ledger can cross-reference by ID, username or
/// email, the three keys the trait methods use.
#[derive(Debug, Clone)]
pub struct LedgerSubject {
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
struct ScopeRecord {
    scope_id: String,
    role_id: String,
    company_sfid: String,
    project_sfid: Option<String>,
    subject_email: String,
}

/// In-memory scope ledger with the same conflict-on-create semantics as
/// the remote service.
#[derive(Default)]
pub struct InMemoryScopeLedger {
    subjects: RwLock<Vec<LedgerSubject>>,
    scopes: RwLock<Vec<ScopeRecord>>,
    next_scope: AtomicUsize,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    /// Projects whose scope creation fails with a remote error.
    poisoned_projects: RwLock<Vec<String>>,
}

impl InMemoryScopeLedger {
    pub fn with_subjects(subjects: Vec<LedgerSubject>) -> Self {
        Self {
            subjects: RwLock::new(subjects),
            ..Self::default()
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub async fn poison_project(&self, project_sfid: &str) {
        self.poisoned_projects
            .write()
            .await
            .push(project_sfid.to_string());
    }

    /// Seed an existing grant without counting it as a create.
    pub async fn seed_scope(
        &self,
        email: &str,
        role_name: &str,
        company_sfid: &str,
        project_sfid: Option<&str>,
    ) -> String {
        let scope_id = format!("scope-{}", self.next_scope.fetch_add(1, Ordering::SeqCst));
        self.scopes.write().await.push(ScopeRecord {
            scope_id: scope_id.clone(),
            role_id: role_id_for(role_name),
            company_sfid: company_sfid.to_string(),
            project_sfid: project_sfid.map(str::to_string),
            subject_email: email.to_string(),
        });
        scope_id
    }

    pub async fn holds_scope(
        &self,
        email: &str,
        role_name: &str,
        company_sfid: &str,
        project_sfid: Option<&str>,
    ) -> bool {
        let role_id = role_id_for(role_name);
        self.scopes.read().await.iter().any(|s| {
            s.subject_email == email
                && s.role_id == role_id
                && s.company_sfid == company_sfid
                && s.project_sfid.as_deref() == project_sfid
        })
    }

    async fn email_of_user_id(&self, user_id: &str) -> Option<String> {
        let subjects = self.subjects.read().await;
        subjects
            .iter()
            .find(|s| s.user_id == user_id)
            .map(|s| s.email.clone())
    }

    async fn email_of_username(&self, username: &str) -> Option<String> {
        let subjects = self.subjects.read().await;
        subjects
            .iter()
            .find(|s| s.username == username)
            .map(|s| s.email.clone())
    }
}

#[async_trait]
impl ScopeLedger for InMemoryScopeLedger {
    async fn has_role_scope(
        &self,
        role: &str,
        user_id: &str,
        company_sfid: &str,
        project_sfid: &str,
    ) -> Result<bool, LedgerError> {
        let Some(email) = self.email_of_user_id(user_id).await else {
            return Ok(false);
        };
        Ok(self
            .holds_scope(&email, role, company_sfid, Some(project_sfid))
            .await)
    }

    async fn create_scope(
        &self,
        email: &str,
        role_id: &RoleId,
        company_sfid: &str,
        project_sfid: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(project) = project_sfid {
            if self
                .poisoned_projects
                .read()
                .await
                .iter()
                .any(|p| p == project)
            {
                return Err(LedgerError::Remote("injected ledger failure".into()));
            }
        }

        let mut scopes = self.scopes.write().await;
        let duplicate = scopes.iter().any(|s| {
            s.subject_email == email
                && s.role_id == role_id.as_str()
                && s.company_sfid == company_sfid
                && s.project_sfid.as_deref() == project_sfid
        });
        if duplicate {
            return Err(LedgerError::Conflict);
        }
        let scope_id = format!("scope-{}", self.next_scope.fetch_add(1, Ordering::SeqCst));
        scopes.push(ScopeRecord {
            scope_id,
            role_id: role_id.as_str().to_string(),
            company_sfid: company_sfid.to_string(),
            project_sfid: project_sfid.map(str::to_string),
            subject_email: email.to_string(),
        });
        Ok(())
    }

    async fn delete_scope(
        &self,
        _company_sfid: &str,
        _role_id: &RoleId,
        scope_id: &str,
        _username: &str,
        _email: &str,
    ) -> Result<(), LedgerError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut scopes = self.scopes.write().await;
        let before = scopes.len();
        scopes.retain(|s| s.scope_id != scope_id);
        if scopes.len() == before {
            return Err(LedgerError::Remote(format!("unknown scope: {scope_id}")));
        }
        Ok(())
    }

    async fn resolve_scope_id(
        &self,
        company_sfid: &str,
        project_sfid: &str,
        role: &str,
        scope_path: ScopePath,
        username: &str,
    ) -> Result<Option<String>, LedgerError> {
        let Some(email) = self.email_of_username(username).await else {
            return Ok(None);
        };
        let role_id = role_id_for(role);
        let wanted_project = match scope_path {
            ScopePath::Organization => None,
            ScopePath::ProjectOrganization => Some(project_sfid),
        };
        let scopes = self.scopes.read().await;
        Ok(scopes
            .iter()
            .find(|s| {
                s.subject_email == email
                    && s.role_id == role_id
                    && s.company_sfid == company_sfid
                    && s.project_sfid.as_deref() == wanted_project
            })
            .map(|s| s.scope_id.clone()))
    }

    async fn list_admin_scopes(
        &self,
        company_sfid: &str,
        role_filter: Option<&str>,
    ) -> Result<Vec<AdminScope>, LedgerError> {
        let role_id = role_filter.map(role_id_for);
        let scopes = self.scopes.read().await;
        let subjects = self.subjects.read().await;

        let mut out: Vec<AdminScope> = Vec::new();
        for scope in scopes.iter() {
            if scope.company_sfid != company_sfid {
                continue;
            }
            if let Some(role_id) = &role_id {
                if &scope.role_id != role_id {
                    continue;
                }
            }
            if out.iter().any(|a| a.email == scope.subject_email) {
                continue;
            }
            let (username, name) = subjects
                .iter()
                .find(|s| s.email == scope.subject_email)
                .map(|s| (s.username.clone(), s.name.clone()))
                .unwrap_or_default();
            out.push(AdminScope {
                username,
                name,
                email: scope.subject_email.clone(),
            });
        }
        Ok(out)
    }

    async fn is_company_owner(&self, user_id: &str, org_id: &str) -> Result<bool, LedgerError> {
        let Some(email) = self.email_of_user_id(user_id).await else {
            return Ok(false);
        };
        Ok(self
            .holds_scope(&email, crate::domain::roles::COMPANY_OWNER_ROLE, org_id, None)
            .await)
    }
}

#[derive(Default)]
pub struct InMemoryHierarchyResolver {
    projects: RwLock<Vec<ProjectSummary>>,
    groups: RwLock<Vec<ClaGroup>>,
    associations: RwLock<Vec<ProjectClaGroup>>,
    foundation_level: RwLock<HashMap<String, bool>>,
}

impl InMemoryHierarchyResolver {
    pub async fn add_project(&self, sfid: &str, name: &str) {
        self.projects.write().await.push(ProjectSummary {
            sfid: sfid.to_string(),
            name: name.to_string(),
        });
    }

    pub async fn add_cla_group(&self, cla_group_id: &str, name: &str, foundation_level: bool) {
        self.groups.write().await.push(ClaGroup {
            cla_group_id: cla_group_id.to_string(),
            name: name.to_string(),
        });
        self.foundation_level
            .write()
            .await
            .insert(cla_group_id.to_string(), foundation_level);
    }

    pub async fn associate(&self, cla_group_id: &str, project_sfid: &str, foundation_sfid: &str) {
        self.associations.write().await.push(ProjectClaGroup {
            project_sfid: project_sfid.to_string(),
            cla_group_id: cla_group_id.to_string(),
            foundation_sfid: foundation_sfid.to_string(),
            project_name: String::new(),
        });
    }
}

#[async_trait]
impl ProjectHierarchyResolver for InMemoryHierarchyResolver {
    async fn project(&self, project_sfid: &str) -> Result<Option<ProjectSummary>, HierarchyError> {
        let projects = self.projects.read().await;
        Ok(projects.iter().find(|p| p.sfid == project_sfid).cloned())
    }

    async fn cla_group(&self, cla_group_id: &str) -> Result<Option<ClaGroup>, HierarchyError> {
        let groups = self.groups.read().await;
        Ok(groups
            .iter()
            .find(|g| g.cla_group_id == cla_group_id)
            .cloned())
    }

    async fn associated_projects(
        &self,
        cla_group_id: &str,
    ) -> Result<Vec<ProjectClaGroup>, HierarchyError> {
        let associations = self.associations.read().await;
        Ok(associations
            .iter()
            .filter(|a| a.cla_group_id == cla_group_id)
            .cloned()
            .collect())
    }

    async fn signed_at_foundation_level(
        &self,
        cla_group_id: &str,
    ) -> Result<bool, HierarchyError> {
        let levels = self.foundation_level.read().await;
        Ok(levels.get(cla_group_id).copied().unwrap_or(false))
    }
}

/// Oracle answering from a fixed set of signed (company, project) pairs.
#[derive(Default)]
pub struct FixedSigningStateOracle {
    signed: RwLock<Vec<(String, String)>>,
}

impl FixedSigningStateOracle {
    pub async fn mark_signed(&self, company_id: &str, project_sfid: &str) {
        self.signed
            .write()
            .await
            .push((company_id.to_string(), project_sfid.to_string()));
    }
}

#[async_trait]
impl SigningStateOracle for FixedSigningStateOracle {
    async fn is_signed(&self, company: &Company, project_sfid: &str) -> Result<bool, OracleError> {
        let signed = self.signed.read().await;
        Ok(signed
            .iter()
            .any(|(c, p)| c == &company.company_id && p == project_sfid))
    }
}

/// Event log that retains everything it is handed.
#[derive(Default)]
pub struct RecordingEventLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl RecordingEventLog {
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventLog for RecordingEventLog {
    async fn log(&self, event: AuditEvent) {
        self.events.write().await.push(event);
    }
}

/// Dispatcher that records payloads instead of delivering them.
#[derive(Default)]
pub struct RecordingNotificationDispatcher {
    invites: RwLock<Vec<NoAccountInvite>>,
    designee_notes: RwLock<Vec<DesigneeNotification>>,
    admin_notes: RwLock<Vec<AdminNotification>>,
    manager_notes: RwLock<Vec<ManagerNotification>>,
}

impl RecordingNotificationDispatcher {
    pub async fn invites(&self) -> Vec<NoAccountInvite> {
        self.invites.read().await.clone()
    }

    pub async fn designee_notes(&self) -> Vec<DesigneeNotification> {
        self.designee_notes.read().await.clone()
    }

    pub async fn admin_notes(&self) -> Vec<AdminNotification> {
        self.admin_notes.read().await.clone()
    }

    pub async fn manager_notes(&self) -> Vec<ManagerNotification> {
        self.manager_notes.read().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotificationDispatcher {
    async fn invite_user_without_account(
        &self,
        invite: &NoAccountInvite,
    ) -> Result<(), NotifyError> {
        self.invites.write().await.push(invite.clone());
        Ok(())
    }

    async fn notify_designee(&self, notification: &DesigneeNotification) {
        self.designee_notes.write().await.push(notification.clone());
    }

    async fn notify_company_admin(&self, notification: &AdminNotification) {
        self.admin_notes.write().await.push(notification.clone());
    }

    async fn notify_cla_manager(&self, notification: &ManagerNotification) {
        self.manager_notes.write().await.push(notification.clone());
    }
}
