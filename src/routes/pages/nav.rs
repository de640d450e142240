use crate::models::{Identity, Role};
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
}

impl From<Route> for NavItem {
    fn from(route: Route) -> Self {
        Self {
            route,
            label: route.title(),
        }
    }
}

/// Top menu entries. Anonymous visitors get none.
pub fn menu(identity: Option<&Identity>) -> Vec<NavItem> {
    let Some(identity) = identity else {
        return Vec::new();
    };

    let routes: &[Route] = match identity.role {
        Role::Candidate => &[Route::Jobs, Route::Applications],
        Role::Manager => &[Route::Jobs, Route::CreateJob, Route::ManageApplications],
        Role::Hr => &[
            Route::Jobs,
            Route::CreateJob,
            Route::ApproveJobs,
            Route::ManageApplications,
        ],
    };
    routes.iter().copied().map(NavItem::from).collect()
}

/// Calls to action on the landing page.
pub fn home_actions(identity: Option<&Identity>) -> Vec<NavItem> {
    match identity {
        None => vec![Route::Register.into(), Route::Jobs.into()],
        Some(_) => vec![Route::Jobs.into()],
    }
}

/// Where to go after signing out.
pub const AFTER_LOGOUT: Route = Route::Home;
