// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Signature records and the change-stream record shape.
//!
//! Signatures are mutated externally; the unsigned→signed transition of a
//! corporate signature is delivered as a change-stream record and drives
//! the reaction in `application::signature_events`.

use serde::{Deserialize, Serialize};

pub const CCLA_SIGNATURE_TYPE: &str = "ccla";
pub const CLA_SIGNATURE_TYPE: &str = "cla";

/// Persisted signature record. Only the fields the reconciliation core
/// reads are modeled; the persistence schema carries more.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub signature_id: String,
    /// "ccla" for corporate, "cla" for individual/employee.
    #[serde(default)]
    pub signature_type: String,
    /// CLA group the signature belongs to.
    #[serde(default)]
    pub signature_project_id: String,
    /// Company ID for corporate signatures, user ID otherwise.
    #[serde(default)]
    pub signature_reference_id: String,
    #[serde(default)]
    pub signature_reference_name: String,
    #[serde(default)]
    pub signature_signed: bool,
    #[serde(default)]
    pub signature_approved: bool,
    /// Identities permitted to administer the signature. The first entry
    /// is the initial CLA manager candidate.
    #[serde(default)]
    pub signature_acl: Vec<String>,
    #[serde(default)]
    pub signed_on: Option<chrono::DateTime<chrono::Utc>>,
}

impl Signature {
    pub fn is_corporate(&self) -> bool {
        self.signature_type == CCLA_SIGNATURE_TYPE
    }
}

/// Before/after images of a signature record as delivered by the upstream
/// change feed. Images are decoded lazily so a malformed old image on an
/// insert event does not poison the record.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureStreamRecord {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub old_image: serde_json::Value,
    pub new_image: serde_json::Value,
}

impl SignatureStreamRecord {
    /// Insert events carry no old image; treat it as an unsigned default.
    pub fn old_signature(&self) -> Result<Signature, serde_json::Error> {
        if self.old_image.is_null() {
            return Ok(Signature::default());
        }
        serde_json::from_value(self.old_image.clone())
    }

    pub fn new_signature(&self) -> Result<Signature, serde_json::Error> {
        serde_json::from_value(self.new_image.clone())
    }
}
