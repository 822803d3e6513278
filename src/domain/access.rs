use crate::domain::models::{RoleCode, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    About,
    Signup,
    Unauthorized,
    Dashboard,
    AdminHome,
    AdminResidents,
    AdminSubs,
    AdminMaintenance,
    SubsHome,
    ResidentsHome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Protected route and nobody is signed in.
    RedirectHome,
    /// Signed in, but the role may not open this route.
    RedirectUnauthorized,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Home,
        Route::About,
        Route::Signup,
        Route::Unauthorized,
        Route::Dashboard,
        Route::AdminHome,
        Route::AdminResidents,
        Route::AdminSubs,
        Route::AdminMaintenance,
        Route::SubsHome,
        Route::ResidentsHome,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::About => "/about",
            Route::Signup => "/signup",
            Route::Unauthorized => "/unauthorized",
            Route::Dashboard => "/dashboard",
            Route::AdminHome => "/dashboard/admin",
            Route::AdminResidents => "/dashboard/admin/residents",
            Route::AdminSubs => "/dashboard/admin/subs",
            Route::AdminMaintenance => "/dashboard/admin/maintenance",
            Route::SubsHome => "/dashboard/subs",
            Route::ResidentsHome => "/dashboard/residents",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        Route::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// `None` for public routes.
    pub fn allowed_roles(self) -> Option<&'static [RoleCode]> {
        match self {
            Route::Home | Route::About | Route::Signup | Route::Unauthorized => None,
            Route::Dashboard => Some(&[RoleCode::Resident, RoleCode::Subcontractor, RoleCode::Admin]),
            Route::AdminHome | Route::AdminResidents | Route::AdminSubs | Route::AdminMaintenance => {
                Some(&[RoleCode::Admin])
            }
            Route::SubsHome => Some(&[RoleCode::Subcontractor]),
            Route::ResidentsHome => Some(&[RoleCode::Resident]),
        }
    }
}

pub fn authorize(session: Option<&Session>, route: Route) -> Access {
    let Some(allowed) = route.allowed_roles() else {
        return Access::Granted;
    };
    match session {
        None => Access::RedirectHome,
        Some(session) if allowed.contains(&session.role_code) => Access::Granted,
        Some(_) => Access::RedirectUnauthorized,
    }
}

/// Landing route after a successful login.
pub fn home_route(role: RoleCode) -> Route {
    match role {
        RoleCode::Admin => Route::AdminHome,
        RoleCode::Subcontractor => Route::SubsHome,
        RoleCode::Resident => Route::ResidentsHome,
    }
}
