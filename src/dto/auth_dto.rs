use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{EntityId, Identity, Role};

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "El email es requerido"))]
    pub email: String,
    #[validate(length(min = 1, message = "La contraseña es requerida"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: EntityId,
    pub username: String,
    pub role: Role,
}

impl LoginResponse {
    /// The login response does not echo the email, so the one typed by the
    /// user is kept.
    pub fn identity(&self, email: &str) -> Identity {
        Identity {
            id: self.user_id.clone(),
            name: self.username.clone(),
            email: email.to_string(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "El nombre es requerido"))]
    pub name: String,
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Registration form as typed by the user, including the password
/// confirmation that never leaves the client.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub department: Option<String>,
}

impl RegisterForm {
    pub fn into_payload(self) -> Result<RegisterPayload, ValidationErrors> {
        if self.password != self.confirm_password {
            let mut error = ValidationError::new("must_match");
            error.message = Some(Cow::from("Las contraseñas no coinciden"));
            let mut errors = ValidationErrors::new();
            errors.add("confirm_password", error);
            return Err(errors);
        }

        let payload = RegisterPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            role: self.role,
            phone: non_blank(self.phone),
            department: non_blank(self.department),
        };
        payload.validate()?;
        Ok(payload)
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Ana Torres".into(),
            email: "ana@example.com".into(),
            password: "secreto1".into(),
            confirm_password: "secreto1".into(),
            role: Role::Candidate,
            phone: Some("  ".into()),
            department: None,
        }
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let mut f = form();
        f.confirm_password = "otro".into();
        let errors = f.into_payload().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn short_password_is_rejected() {
        let mut f = form();
        f.password = "abc".into();
        f.confirm_password = "abc".into();
        let errors = f.into_payload().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let payload = form().into_payload().unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("phone").is_none());
        assert_eq!(json["role"], "candidate");
    }

    #[test]
    fn login_response_builds_identity() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"accessToken":"tok","userId":9,"username":"ana","role":"candidate"}"#,
        )
        .unwrap();
        let identity = response.identity("ana@example.com");
        assert_eq!(identity.id, EntityId::from(9));
        assert_eq!(identity.name, "ana");
        assert_eq!(identity.email, "ana@example.com");
    }
}
