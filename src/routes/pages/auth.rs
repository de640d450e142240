use validator::Validate;

use super::failure_text;
use crate::dto::auth_dto::{LoginPayload, RegisterForm};
use crate::error::Result;
use crate::routes::{Route, LANDING};
use crate::utils::validation::first_message;
use crate::Portal;

/// Signs in and returns the page to show next.
pub async fn submit_login(portal: &Portal, email: &str, password: &str) -> Result<Route> {
    let payload = LoginPayload {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    if let Err(errors) = payload.validate() {
        portal.notifications.error(
            "Campos requeridos",
            "Por favor, ingresa tu email y contraseña.",
        );
        return Err(errors.into());
    }

    match portal.session.login(&payload.email, &payload.password).await {
        Ok(_) => Ok(LANDING),
        Err(err) => {
            portal.notifications.error(
                "Error de autenticación",
                failure_text(&err, "El email o la contraseña son incorrectos."),
            );
            Err(err.into())
        }
    }
}

/// Creates the account and sends the user to the login page. Registering
/// never signs anyone in.
pub async fn submit_registration(portal: &Portal, form: RegisterForm) -> Result<Route> {
    let payload = match form.into_payload() {
        Ok(payload) => payload,
        Err(errors) => {
            portal.notifications.error("Error", first_message(&errors));
            return Err(errors.into());
        }
    };

    match portal.session.register(&payload).await {
        Ok(_) => Ok(Route::Login),
        Err(err) => {
            portal.notifications.error(
                "Error de registro",
                failure_text(&err, "Ocurrió un error al crear la cuenta."),
            );
            Err(err.into())
        }
    }
}
