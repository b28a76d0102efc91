/// Audit trail for security-relevant events
///
/// Registrations, logins, verifications and denials are emitted as tracing
/// events so they land in the same JSON stream as everything else. Entries
/// never carry passwords, hashes or tokens.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::auth::{Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Register,
    Login,
    CompleteProfile,
    Verify,
    Access,
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::Register => "REGISTER",
            AuditAction::Login => "LOGIN",
            AuditAction::CompleteProfile => "COMPLETE_PROFILE",
            AuditAction::Verify => "VERIFY",
            AuditAction::Access => "ACCESS",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// admin, guru, murid, tugas
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub subject: Option<String>,
    pub role: Option<Role>,
    pub outcome: AuditOutcome,
    pub message: String,
}

impl AuditLog {
    pub fn new(
        action: AuditAction,
        resource_type: impl Into<String>,
        outcome: AuditOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            resource_type: resource_type.into(),
            resource_id: None,
            subject: None,
            role: None,
            outcome,
            message: message.into(),
        }
    }

    pub fn success(action: AuditAction, resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(action, resource_type, AuditOutcome::Success, message)
    }

    pub fn failure(action: AuditAction, resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(action, resource_type, AuditOutcome::Failure, message)
    }

    /// Failure entry for a principal whose role does not hold `module`
    pub fn access_denied(principal: &Principal, module: &str) -> Self {
        Self::failure(AuditAction::Access, module, "Module access denied")
            .with_actor(&principal.subject, principal.role)
    }

    pub fn with_resource_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_actor(mut self, subject: impl Into<String>, role: Role) -> Self {
        self.subject = Some(subject.into());
        self.role = Some(role);
        self
    }

    pub fn emit(&self) {
        let role = self.role.map(|r| r.as_str());
        match self.outcome {
            AuditOutcome::Success => tracing::info!(
                log_id = %self.log_id,
                action = %self.action,
                resource_type = %self.resource_type,
                resource_id = ?self.resource_id,
                subject = ?self.subject,
                role = ?role,
                message = %self.message,
                "Audit log entry"
            ),
            AuditOutcome::Failure => tracing::warn!(
                log_id = %self.log_id,
                action = %self.action,
                resource_type = %self.resource_type,
                resource_id = ?self.resource_id,
                subject = ?self.subject,
                role = ?role,
                message = %self.message,
                "Audit log entry"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_builder() {
        let entry = AuditLog::success(AuditAction::Verify, "murid", "Murid verified")
            .with_resource_id(42)
            .with_actor("guru@sekolah.id", Role::Guru);

        assert_eq!(entry.outcome, AuditOutcome::Success);
        assert_eq!(entry.resource_id.as_deref(), Some("42"));
        assert_eq!(entry.role, Some(Role::Guru));
        entry.emit();
    }

    #[test]
    fn test_access_denied_names_module_and_actor() {
        let pending = Principal::new("baru@sekolah.id", Role::MuridRegistration);
        let entry = AuditLog::access_denied(&pending, "tugas");

        assert_eq!(entry.action, AuditAction::Access);
        assert_eq!(entry.outcome, AuditOutcome::Failure);
        assert_eq!(entry.resource_type, "tugas");
        assert_eq!(entry.subject.as_deref(), Some("baru@sekolah.id"));
        assert_eq!(entry.role, Some(Role::MuridRegistration));
        assert_eq!(serde_json::to_value(&entry).unwrap()["action"], "ACCESS");
    }

    #[test]
    fn test_audit_log_serializes_action_name() {
        let entry = AuditLog::failure(AuditAction::CompleteProfile, "murid", "denied");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "COMPLETE_PROFILE");
        assert_eq!(json["outcome"], "Failure");
    }
}
