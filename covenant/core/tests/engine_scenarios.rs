// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! End-to-end engine scenarios against the in-memory doubles.

use std::sync::Arc;

use covenant_core::application::{ClaManagerService, Requester, SignatureEventService};
use covenant_core::domain::company::{ClaUser, Company};
use covenant_core::domain::error::{ClaManagerError, ErrorKind};
use covenant_core::domain::hierarchy::ProjectHierarchyResolver;
use covenant_core::domain::identity::{AccountType, IdentityAccount, OrgAffiliation};
use covenant_core::domain::roles::{RoleId, CLA_DESIGNEE_ROLE, CLA_MANAGER_ROLE, COMPANY_OWNER_ROLE};
use covenant_core::domain::scope::{LedgerError, ScopeLedger};
use covenant_core::domain::signature::{Signature, SignatureStreamRecord};
use covenant_core::infrastructure::memory::{
    role_id_for, FixedSigningStateOracle, InMemoryClaUserRepository, InMemoryCompanyRepository,
    InMemoryHierarchyResolver, InMemoryIdentityResolver, InMemoryRoleCatalog, InMemoryScopeLedger,
    InMemorySignatureRepository, LedgerSubject, RecordingEventLog,
    RecordingNotificationDispatcher,
};

struct Harness {
    signatures: Arc<InMemorySignatureRepository>,
    identity: Arc<InMemoryIdentityResolver>,
    ledger: Arc<InMemoryScopeLedger>,
    hierarchy: Arc<InMemoryHierarchyResolver>,
    oracle: Arc<FixedSigningStateOracle>,
    notifier: Arc<RecordingNotificationDispatcher>,
    service: ClaManagerService,
    signature_service: SignatureEventService,
}

fn acme() -> Company {
    Company {
        company_id: "comp-1".into(),
        external_id: Some("SFDC-1".into()),
        name: "Acme".into(),
    }
}

fn jane(account_type: AccountType) -> IdentityAccount {
    IdentityAccount {
        id: "usr-jane".into(),
        username: "janedoe".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        emails: vec!["jane@acme.com".into()],
        account_type,
        account: Some(OrgAffiliation {
            id: "SFDC-1".into(),
            name: "Acme".into(),
        }),
    }
}

fn jane_subject() -> LedgerSubject {
    LedgerSubject {
        user_id: "usr-jane".into(),
        username: "janedoe".into(),
        name: "Jane Doe".into(),
        email: "jane@acme.com".into(),
    }
}

/// Acme with external ID SFDC-1 and CLA group cg-9, plus the given
/// directory accounts and ledger subjects.
fn harness(accounts: Vec<IdentityAccount>, subjects: Vec<LedgerSubject>) -> Harness {
    let companies = Arc::new(InMemoryCompanyRepository::with(vec![acme()]));
    let cla_users = Arc::new(InMemoryClaUserRepository::default());
    let signatures = Arc::new(InMemorySignatureRepository::default());
    let identity = Arc::new(InMemoryIdentityResolver::with(accounts));
    let ledger = Arc::new(InMemoryScopeLedger::with_subjects(subjects));
    let catalog = Arc::new(InMemoryRoleCatalog);
    let hierarchy = Arc::new(InMemoryHierarchyResolver::default());
    let oracle = Arc::new(FixedSigningStateOracle::default());
    let events = Arc::new(RecordingEventLog::default());
    let notifier = Arc::new(RecordingNotificationDispatcher::default());

    let service = ClaManagerService::new(
        companies.clone(),
        cla_users.clone(),
        signatures.clone(),
        identity.clone(),
        ledger.clone(),
        catalog.clone(),
        hierarchy.clone(),
        oracle.clone(),
        events.clone(),
        notifier.clone(),
    );
    let signature_service = SignatureEventService::new(
        companies,
        signatures.clone(),
        identity.clone(),
        ledger.clone(),
        catalog,
        hierarchy.clone(),
    );

    Harness {
        signatures,
        identity,
        ledger,
        hierarchy,
        oracle,
        notifier,
        service,
        signature_service,
    }
}

async fn seed_three_projects(h: &Harness) {
    h.hierarchy.add_cla_group("cg-9", "Acme CLA", false).await;
    for i in 1..=3 {
        let sfid = format!("proj-{i}");
        h.hierarchy.add_project(&sfid, &format!("Project {i}")).await;
        h.hierarchy.associate("cg-9", &sfid, "found-1").await;
    }
}

#[tokio::test]
async fn existence_check_then_create_is_idempotent() {
    let ledger = InMemoryScopeLedger::with_subjects(vec![jane_subject()]);
    let role_id = RoleId(role_id_for(CLA_DESIGNEE_ROLE));

    assert!(!ledger
        .has_role_scope(CLA_DESIGNEE_ROLE, "usr-jane", "SFDC-1", "proj-42")
        .await
        .unwrap());

    ledger
        .create_scope("jane@acme.com", &role_id, "SFDC-1", Some("proj-42"))
        .await
        .unwrap();
    assert!(ledger
        .has_role_scope(CLA_DESIGNEE_ROLE, "usr-jane", "SFDC-1", "proj-42")
        .await
        .unwrap());

    // A second create for the same tuple conflicts and changes nothing.
    let err = ledger
        .create_scope("jane@acme.com", &role_id, "SFDC-1", Some("proj-42"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict));
    assert!(ledger
        .has_role_scope(CLA_DESIGNEE_ROLE, "usr-jane", "SFDC-1", "proj-42")
        .await
        .unwrap());
}

#[tokio::test]
async fn unknown_email_yields_identity_not_found_without_side_effects() {
    let h = harness(vec![], vec![]);
    seed_three_projects(&h).await;
    h.hierarchy.add_project("proj-42", "Project 42").await;

    let err = h
        .service
        .create_manager_designee("SFDC-1", "proj-42", "new@acme.com")
        .await
        .unwrap_err();

    assert!(matches!(err, ClaManagerError::IdentityNotFound { subject } if subject == "new@acme.com"));
    assert_eq!(h.ledger.creates(), 0);
}

#[tokio::test]
async fn by_group_assigns_owner_once_then_one_designee_per_project() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;

    let groups = h.hierarchy.associated_projects("cg-9").await.unwrap();
    let designees = h
        .service
        .create_manager_designee_by_group("SFDC-1", "jane@acme.com", &groups)
        .await
        .unwrap();

    assert_eq!(designees.len(), 3);
    // One owner grant plus one designee grant per project.
    assert_eq!(h.ledger.creates(), 4);
    assert!(
        h.ledger
            .holds_scope("jane@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
            .await
    );
    for i in 1..=3 {
        assert!(
            h.ledger
                .holds_scope(
                    "jane@acme.com",
                    CLA_DESIGNEE_ROLE,
                    "SFDC-1",
                    Some(&format!("proj-{i}"))
                )
                .await
        );
    }
}

#[tokio::test]
async fn by_group_fan_out_stops_at_first_conflict() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;
    // Another owner already exists, so no owner grant happens.
    h.ledger
        .seed_scope("owner@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
        .await;
    // Jane already holds the designee role on the second project.
    h.ledger
        .seed_scope("jane@acme.com", CLA_DESIGNEE_ROLE, "SFDC-1", Some("proj-2"))
        .await;

    let groups = h.hierarchy.associated_projects("cg-9").await.unwrap();
    let err = h
        .service
        .create_manager_designee_by_group("SFDC-1", "jane@acme.com", &groups)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClaManagerError::DesigneeRoleConflict { ref project_sfid, .. } if project_sfid == "proj-2"
    ));
    // Exactly one grant went through (project 1); project 3 was never
    // attempted and project 1's grant stays in place.
    assert_eq!(h.ledger.creates(), 1);
    assert!(
        h.ledger
            .holds_scope("jane@acme.com", CLA_DESIGNEE_ROLE, "SFDC-1", Some("proj-1"))
            .await
    );
    assert!(
        !h.ledger
            .holds_scope("jane@acme.com", CLA_DESIGNEE_ROLE, "SFDC-1", Some("proj-3"))
            .await
    );
}

#[tokio::test]
async fn foundation_level_group_gets_a_single_foundation_grant() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    h.hierarchy.add_cla_group("cg-9", "Acme CLA", true).await;
    h.hierarchy.add_project("found-1", "Foundation").await;
    for i in 1..=3 {
        h.hierarchy
            .associate("cg-9", &format!("proj-{i}"), "found-1")
            .await;
    }
    h.ledger
        .seed_scope("owner@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
        .await;

    let groups = h.hierarchy.associated_projects("cg-9").await.unwrap();
    let designees = h
        .service
        .create_manager_designee_by_group("SFDC-1", "jane@acme.com", &groups)
        .await
        .unwrap();

    assert_eq!(designees.len(), 1);
    assert_eq!(designees[0].project_sfid, "found-1");
    assert_eq!(h.ledger.creates(), 1);
    assert!(
        !h.ledger
            .holds_scope("jane@acme.com", CLA_DESIGNEE_ROLE, "SFDC-1", Some("proj-1"))
            .await
    );
}

#[tokio::test]
async fn foundation_level_group_without_foundation_sfid_grants_nothing() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    h.hierarchy.add_cla_group("cg-9", "Acme CLA", true).await;
    for i in 1..=3 {
        h.hierarchy
            .associate("cg-9", &format!("proj-{i}"), "")
            .await;
    }
    h.ledger
        .seed_scope("owner@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
        .await;

    let groups = h.hierarchy.associated_projects("cg-9").await.unwrap();
    let designees = h
        .service
        .create_manager_designee_by_group("SFDC-1", "jane@acme.com", &groups)
        .await
        .unwrap();

    // No foundation to grant against: the fan-out is skipped outright,
    // with no per-project fallback and no ledger writes.
    assert!(designees.is_empty());
    assert_eq!(h.ledger.creates(), 0);
}

#[tokio::test]
async fn lead_is_converted_to_contact_exactly_once() {
    let h = harness(vec![jane(AccountType::Lead)], vec![jane_subject()]);
    seed_three_projects(&h).await;

    h.service
        .create_manager_designee("SFDC-1", "proj-1", "jane@acme.com")
        .await
        .unwrap();
    assert_eq!(h.identity.conversions(), 1);

    // Now a contact: a second assignment converts nothing.
    h.service
        .create_manager_designee("SFDC-1", "proj-2", "jane@acme.com")
        .await
        .unwrap();
    assert_eq!(h.identity.conversions(), 1);
}

#[tokio::test]
async fn already_signed_pair_is_a_conflict() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;
    h.oracle.mark_signed("comp-1", "proj-1").await;

    let err = h
        .service
        .create_manager_designee("SFDC-1", "proj-1", "jane@acme.com")
        .await
        .unwrap_err();
    assert!(matches!(err, ClaManagerError::ProjectAlreadySigned { .. }));
    assert_eq!(h.ledger.creates(), 0);
}

#[tokio::test]
async fn deletion_without_existing_scope_is_a_hard_error() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;

    let err = h
        .service
        .delete_manager("cg-9", "SFDC-1", "janedoe")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClaManagerError::ScopeNotFound { ref username, ref project_sfid }
            if username == "janedoe" && project_sfid == "proj-1"
    ));
    assert_eq!(h.ledger.deletes(), 0);
}

#[tokio::test]
async fn delete_manager_clears_scopes_then_the_acl() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;
    for i in 1..=3 {
        h.ledger
            .seed_scope(
                "jane@acme.com",
                CLA_MANAGER_ROLE,
                "SFDC-1",
                Some(&format!("proj-{i}")),
            )
            .await;
    }
    let mut signature = Signature {
        signature_id: "sig-1".into(),
        signature_type: "ccla".into(),
        signature_signed: true,
        ..Signature::default()
    };
    signature.signature_acl.push("janedoe".into());
    let signatures = InMemorySignatureRepository::with(vec![(
        ("comp-1".to_string(), "cg-9".to_string()),
        signature,
    )]);
    // Rebuild the harness around the seeded signature store.
    let h = Harness {
        signatures: Arc::new(signatures),
        ..h
    };
    let h = rewire(h);

    h.service
        .delete_manager("cg-9", "SFDC-1", "janedoe")
        .await
        .unwrap();

    assert_eq!(h.ledger.deletes(), 3);
    assert!(h.signatures.acl("comp-1", "cg-9").await.is_empty());
}

/// Rebuild the services after swapping a store on the harness.
fn rewire(h: Harness) -> Harness {
    rewire_with_users(h, vec![])
}

/// Like `rewire`, with a seeded internal user store.
fn rewire_with_users(h: Harness, users: Vec<ClaUser>) -> Harness {
    let companies = Arc::new(InMemoryCompanyRepository::with(vec![acme()]));
    let cla_users = Arc::new(InMemoryClaUserRepository::with(users));
    let catalog = Arc::new(InMemoryRoleCatalog);
    let events = Arc::new(RecordingEventLog::default());

    let service = ClaManagerService::new(
        companies.clone(),
        cla_users,
        h.signatures.clone(),
        h.identity.clone(),
        h.ledger.clone(),
        catalog.clone(),
        h.hierarchy.clone(),
        h.oracle.clone(),
        events,
        h.notifier.clone(),
    );
    let signature_service = SignatureEventService::new(
        companies,
        h.signatures.clone(),
        h.identity.clone(),
        h.ledger.clone(),
        catalog,
        h.hierarchy.clone(),
    );
    Harness {
        service,
        signature_service,
        ..h
    }
}

#[tokio::test]
async fn contact_admin_request_notifies_every_admin() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;
    h.ledger
        .seed_scope("jane@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
        .await;

    let requester = Requester {
        username: "contributor".into(),
        email: "contributor@dev.example".into(),
    };
    let outcome = h
        .service
        .create_manager_request(
            true,
            "SFDC-1",
            "proj-1",
            "jane@acme.com",
            "Jane Doe",
            &requester,
        )
        .await
        .unwrap();

    assert!(outcome.is_none());
    let notes = h.notifier.admin_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].admin_email, "jane@acme.com");
    assert_eq!(notes[0].contributor_username, "contributor");
}

#[tokio::test]
async fn request_without_account_sends_invitation() {
    let h = harness(vec![], vec![]);
    seed_three_projects(&h).await;

    let requester = Requester {
        username: "contributor".into(),
        email: "contributor@dev.example".into(),
    };
    let err = h
        .service
        .create_manager_request(
            false,
            "SFDC-1",
            "proj-1",
            "new@acme.com",
            "New Hire",
            &requester,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClaManagerError::IdentityNotFound { .. }));
    let invites = h.notifier.invites().await;
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].recipient_email, "new@acme.com");
    assert_eq!(invites[0].role_name, CLA_DESIGNEE_ROLE);
    assert_eq!(invites[0].project_sfid.as_deref(), Some("proj-1"));
}

fn contributor_user() -> ClaUser {
    ClaUser {
        user_id: "usr-contrib".into(),
        lf_username: "contributor".into(),
        lf_email: "contributor@dev.example".into(),
        username: "Chris Contributor".into(),
        external_id: "SFDC-1".into(),
        admin: false,
        date_created: chrono::Utc::now(),
        date_modified: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn company_admin_invite_fans_designees_across_the_group() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;
    h.ledger
        .seed_scope("owner@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
        .await;
    let h = rewire_with_users(h, vec![contributor_user()]);

    let designees = h
        .service
        .invite_company_admin(false, "comp-1", "cg-9", "jane@acme.com", "Jane Doe", "usr-contrib")
        .await
        .unwrap();

    assert_eq!(designees.len(), 3);
    assert_eq!(h.ledger.creates(), 3);
    // One summary notification carrying every project in the group.
    let notes = h.notifier.designee_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].designee_email, "jane@acme.com");
    assert_eq!(
        notes[0].project_names,
        vec!["Project 1", "Project 2", "Project 3"]
    );
    assert_eq!(notes[0].requester_username, "contributor");
}

#[tokio::test]
async fn company_admin_invite_without_account_carries_the_foundation() {
    let h = harness(vec![], vec![]);
    seed_three_projects(&h).await;
    let h = rewire_with_users(h, vec![contributor_user()]);

    let err = h
        .service
        .invite_company_admin(false, "comp-1", "cg-9", "new@acme.com", "New Hire", "usr-contrib")
        .await
        .unwrap_err();

    assert!(matches!(err, ClaManagerError::IdentityNotFound { .. }));
    let invites = h.notifier.invites().await;
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].recipient_email, "new@acme.com");
    assert_eq!(invites[0].role_name, CLA_DESIGNEE_ROLE);
    assert_eq!(invites[0].project_sfid.as_deref(), Some("found-1"));
    assert_eq!(invites[0].organization_id, "SFDC-1");
    assert_eq!(invites[0].project_name, "Acme CLA");
}

#[tokio::test]
async fn company_admin_invite_with_contact_admin_only_notifies() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;
    // Jane already owns the org, so the owner ensure is a no-op and she
    // is the one admin on record.
    h.ledger
        .seed_scope("jane@acme.com", COMPANY_OWNER_ROLE, "SFDC-1", None)
        .await;
    let h = rewire_with_users(h, vec![contributor_user()]);

    let designees = h
        .service
        .invite_company_admin(true, "comp-1", "cg-9", "jane@acme.com", "Jane Doe", "usr-contrib")
        .await
        .unwrap();

    assert!(designees.is_empty());
    assert_eq!(h.ledger.creates(), 0);
    let notes = h.notifier.admin_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].admin_email, "jane@acme.com");
    assert_eq!(notes[0].contributor_username, "contributor");
}

#[tokio::test]
async fn signing_promotes_initial_manager_and_revokes_designees() {
    let h = harness(
        vec![jane(AccountType::Contact)],
        vec![
            jane_subject(),
            LedgerSubject {
                user_id: "usr-bob".into(),
                username: "bob".into(),
                name: "Bob Lee".into(),
                email: "bob@acme.com".into(),
            },
        ],
    );
    seed_three_projects(&h).await;
    // Bob held designee on project 1 while the CCLA was pending.
    h.ledger
        .seed_scope("bob@acme.com", CLA_DESIGNEE_ROLE, "SFDC-1", Some("proj-1"))
        .await;
    let signature = Signature {
        signature_id: "sig-1".into(),
        signature_type: "ccla".into(),
        signature_project_id: "cg-9".into(),
        signature_reference_id: "comp-1".into(),
        signature_signed: true,
        signature_acl: vec!["janedoe".into()],
        ..Signature::default()
    };
    let h = Harness {
        signatures: Arc::new(InMemorySignatureRepository::with(vec![(
            ("comp-1".to_string(), "cg-9".to_string()),
            signature,
        )])),
        ..h
    };
    let h = rewire(h);

    let record: SignatureStreamRecord = serde_json::from_value(serde_json::json!({
        "event_id": "evt-1",
        "old_image": {
            "signature_id": "sig-1",
            "signature_type": "ccla",
            "signature_signed": false
        },
        "new_image": {
            "signature_id": "sig-1",
            "signature_type": "ccla",
            "signature_project_id": "cg-9",
            "signature_reference_id": "comp-1",
            "signature_signed": true,
            "signature_acl": ["janedoe"]
        }
    }))
    .unwrap();

    h.signature_service
        .signature_signed_event(&record)
        .await
        .unwrap();

    assert_eq!(h.signatures.signed_on_stamps(), 1);
    for i in 1..=3 {
        assert!(
            h.ledger
                .holds_scope(
                    "jane@acme.com",
                    CLA_MANAGER_ROLE,
                    "SFDC-1",
                    Some(&format!("proj-{i}"))
                )
                .await
        );
    }
    assert!(
        !h.ledger
            .holds_scope("bob@acme.com", CLA_DESIGNEE_ROLE, "SFDC-1", Some("proj-1"))
            .await
    );
}

#[tokio::test]
async fn signed_ccla_with_empty_acl_is_a_dependency_error() {
    let h = harness(vec![jane(AccountType::Contact)], vec![jane_subject()]);
    seed_three_projects(&h).await;

    let record: SignatureStreamRecord = serde_json::from_value(serde_json::json!({
        "event_id": "evt-3",
        "old_image": {
            "signature_id": "sig-3",
            "signature_type": "ccla",
            "signature_signed": false
        },
        "new_image": {
            "signature_id": "sig-3",
            "signature_type": "ccla",
            "signature_project_id": "cg-9",
            "signature_reference_id": "comp-1",
            "signature_signed": true,
            "signature_acl": []
        }
    }))
    .unwrap();

    let err = h
        .signature_service
        .signature_signed_event(&record)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(err
        .to_string()
        .contains("initial cla manager details not found"));
    // No promotion or revocation ran.
    assert_eq!(h.ledger.creates(), 0);
    assert_eq!(h.ledger.deletes(), 0);
}

#[tokio::test]
async fn non_corporate_signatures_only_get_timestamped() {
    let h = harness(vec![], vec![]);
    let record: SignatureStreamRecord = serde_json::from_value(serde_json::json!({
        "event_id": "evt-2",
        "old_image": { "signature_id": "sig-2", "signature_signed": false },
        "new_image": {
            "signature_id": "sig-2",
            "signature_type": "cla",
            "signature_signed": true
        }
    }))
    .unwrap();

    h.signature_service
        .signature_signed_event(&record)
        .await
        .unwrap();
    assert_eq!(h.signatures.signed_on_stamps(), 1);
    assert_eq!(h.ledger.creates(), 0);
}
