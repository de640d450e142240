pub mod pages;

use crate::error::{Error, Result};
use crate::models::{Identity, Role};
use crate::services::session_service::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Jobs,
    Applications,
    CreateJob,
    ApproveJobs,
    Dashboard,
    ManageApplications,
}

/// Where signed-in users land after login or after being turned away.
pub const LANDING: Route = Route::Jobs;

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Home,
        Route::Login,
        Route::Register,
        Route::Jobs,
        Route::Applications,
        Route::CreateJob,
        Route::ApproveJobs,
        Route::Dashboard,
        Route::ManageApplications,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Jobs => "/jobs",
            Route::Applications => "/applications",
            Route::CreateJob => "/create-job",
            Route::ApproveJobs => "/approve-jobs",
            Route::Dashboard => "/dashboard",
            Route::ManageApplications => "/manage-applications",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Inicio",
            Route::Login => "Iniciar sesión",
            Route::Register => "Registro",
            Route::Jobs => "Trabajos",
            Route::Applications => "Mis Postulaciones",
            Route::CreateJob => "Crear Trabajo",
            Route::ApproveJobs => "Aprobar Trabajos",
            Route::Dashboard => "Dashboard",
            Route::ManageApplications => "Gestionar Postulaciones",
        }
    }

    /// Matches a path, ignoring any query string, fragment and trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Requires a signed-in identity.
    pub fn is_protected(&self) -> bool {
        match self {
            Route::Home | Route::Login | Route::Register | Route::Jobs => false,
            Route::Applications
            | Route::CreateJob
            | Route::ApproveJobs
            | Route::Dashboard
            | Route::ManageApplications => true,
        }
    }

    /// Only meaningful while signed out.
    pub fn is_guest_only(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    pub fn allows(&self, role: Role) -> bool {
        match self {
            Route::Home | Route::Login | Route::Register | Route::Jobs => true,
            Route::Applications => match role {
                Role::Candidate => true,
                Role::Manager | Role::Hr => false,
            },
            Route::CreateJob | Route::ManageApplications => match role {
                Role::Candidate => false,
                Role::Manager | Role::Hr => true,
            },
            Route::ApproveJobs | Route::Dashboard => match role {
                Role::Hr => true,
                Role::Candidate | Role::Manager => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The stored session has not been read yet.
    Loading,
    Render(Route),
    Redirect(Route),
}

pub fn resolve(path: &str, session: &SessionState) -> Navigation {
    let route = Route::from_path(path);
    match (session, route) {
        (SessionState::Unresolved, _) => Navigation::Loading,
        (_, None) => Navigation::Redirect(Route::Home),
        (SessionState::Anonymous, Some(route)) => {
            if route.is_protected() {
                Navigation::Redirect(Route::Login)
            } else {
                Navigation::Render(route)
            }
        }
        (SessionState::Authenticated { identity, .. }, Some(route)) => {
            if route.is_guest_only() || !route.allows(identity.role) {
                Navigation::Redirect(LANDING)
            } else {
                Navigation::Render(route)
            }
        }
    }
}

/// Checks that `route` may be shown for `session`, returning the identity
/// when one is signed in.
pub fn authorize(route: Route, session: &SessionState) -> Result<Option<Identity>> {
    match resolve(route.path(), session) {
        Navigation::Loading => Err(Error::Loading),
        Navigation::Render(_) => Ok(session.identity().cloned()),
        Navigation::Redirect(Route::Login) => Err(Error::Unauthenticated),
        Navigation::Redirect(_) => Err(Error::Forbidden(route.path().to_string())),
    }
}

/// Like [`authorize`] for pages that only make sense with a signed-in user.
pub fn require_identity(route: Route, session: &SessionState) -> Result<Identity> {
    authorize(route, session)?.ok_or(Error::Unauthenticated)
}
