use serde::{Deserialize, Serialize};
use std::fmt;

use super::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Manager,
    Hr,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Candidate, Role::Manager, Role::Hr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Manager => "manager",
            Role::Hr => "hr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Candidate => "Candidato",
            Role::Manager => "Gerente",
            Role::Hr => "RRHH",
        }
    }

    /// Staff roles see every application instead of their own.
    pub fn is_staff(&self) -> bool {
        match self {
            Role::Candidate => false,
            Role::Manager | Role::Hr => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "candidate" => Ok(Role::Candidate),
            "manager" => Ok(Role::Manager),
            "hr" => Ok(Role::Hr),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The signed-in user as the client remembers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Bearer token paired with an [`Identity`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_lowercase_names() {
        let role: Role = serde_json::from_str("\"hr\"").unwrap();
        assert_eq!(role, Role::Hr);
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        assert_eq!("Candidate".parse::<Role>().unwrap(), Role::Candidate);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert_eq!(credential.expose(), "secret-token");
    }
}
