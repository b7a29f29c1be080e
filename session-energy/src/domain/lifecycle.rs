use serde::Serialize;

use crate::timestamp::DomainTimestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LifecycleAction {
    Access,
    EndSession,
    Other(String),
}

impl LifecycleAction {
    pub fn from_wire(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("access") {
            Self::Access
        } else if trimmed.eq_ignore_ascii_case("endsession") || trimmed.eq_ignore_ascii_case("end_session") {
            Self::EndSession
        } else {
            Self::Other(trimmed.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LifecycleStatus {
    Granted,
    Completed,
    Denied,
    Other(String),
}

impl LifecycleStatus {
    pub fn from_wire(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("granted") {
            Self::Granted
        } else if trimmed.eq_ignore_ascii_case("completed") {
            Self::Completed
        } else if trimmed.eq_ignore_ascii_case("denied") {
            Self::Denied
        } else {
            Self::Other(trimmed.to_string())
        }
    }
}

/// An access-log entry recorded under an instructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent {
    pub log_id: String,
    pub action: LifecycleAction,
    pub status: LifecycleStatus,
    pub timestamp: Option<DomainTimestamp>,
}

impl LifecycleEvent {
    pub fn is_granted_access(&self) -> bool {
        self.action == LifecycleAction::Access && self.status == LifecycleStatus::Granted
    }

    pub fn is_completed_end(&self) -> bool {
        self.action == LifecycleAction::EndSession && self.status == LifecycleStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_case_insensitive() {
        assert_eq!(LifecycleAction::from_wire("access"), LifecycleAction::Access);
        assert_eq!(LifecycleAction::from_wire("EndSession"), LifecycleAction::EndSession);
        assert_eq!(
            LifecycleAction::from_wire("DoorOpen"),
            LifecycleAction::Other("DoorOpen".to_string())
        );
        assert_eq!(LifecycleStatus::from_wire("GRANTED"), LifecycleStatus::Granted);
        assert_eq!(LifecycleStatus::from_wire("denied"), LifecycleStatus::Denied);
    }
}
