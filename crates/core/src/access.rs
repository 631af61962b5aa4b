//! Route table and role-based gating.

use std::fmt;

use crate::model::{CourseId, Role, User};

/// Every page of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Catalog,
    CourseDetails(CourseId),
    Dashboard,
    Learn(CourseId),
    MyCourses,
    TrainerDashboard,
    CreateCourse,
    ManageCourse(CourseId),
    AdminDashboard,
    AdminUsers,
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

const TRAINEE_ONLY: &[Role] = &[Role::Trainee];
const TRAINER_OR_ADMIN: &[Role] = &[Role::Trainer, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Route {
    /// Parse a URL path. Returns `None` for paths the client does not serve.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["courses"] => Route::Catalog,
            ["courses", id] => Route::CourseDetails(id.parse().ok()?),
            ["courses", id, "learn"] => Route::Learn(id.parse().ok()?),
            ["dashboard"] => Route::Dashboard,
            ["my-courses"] => Route::MyCourses,
            ["trainer", "dashboard"] => Route::TrainerDashboard,
            ["trainer", "create-course"] => Route::CreateCourse,
            ["trainer", "courses", id] => Route::ManageCourse(id.parse().ok()?),
            ["admin", "dashboard"] => Route::AdminDashboard,
            ["admin", "users"] => Route::AdminUsers,
            _ => return None,
        };
        Some(route)
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::Catalog => "/courses".into(),
            Route::CourseDetails(id) => format!("/courses/{id}"),
            Route::Dashboard => "/dashboard".into(),
            Route::Learn(id) => format!("/courses/{id}/learn"),
            Route::MyCourses => "/my-courses".into(),
            Route::TrainerDashboard => "/trainer/dashboard".into(),
            Route::CreateCourse => "/trainer/create-course".into(),
            Route::ManageCourse(id) => format!("/trainer/courses/{id}"),
            Route::AdminDashboard => "/admin/dashboard".into(),
            Route::AdminUsers => "/admin/users".into(),
        }
    }

    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Route::Home
            | Route::Login
            | Route::Register
            | Route::Catalog
            | Route::CourseDetails(_) => Access::Public,
            Route::Dashboard | Route::Learn(_) => Access::Authenticated,
            Route::MyCourses => Access::Roles(TRAINEE_ONLY),
            Route::TrainerDashboard | Route::CreateCourse | Route::ManageCourse(_) => {
                Access::Roles(TRAINER_OR_ADMIN)
            }
            Route::AdminDashboard | Route::AdminUsers => Access::Roles(ADMIN_ONLY),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Dashboard flavour for each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Student,
    Trainer,
    Admin,
}

impl Dashboard {
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Trainee => Dashboard::Student,
            Role::Trainer => Dashboard::Trainer,
            Role::Admin => Dashboard::Admin,
        }
    }

    /// Where this dashboard lives. The student dashboard is served at `/dashboard` itself.
    #[must_use]
    pub fn route(self) -> Route {
        match self {
            Dashboard::Student => Route::Dashboard,
            Dashboard::Trainer => Route::TrainerDashboard,
            Dashboard::Admin => Route::AdminDashboard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

/// Decide what happens when `user` (or an anonymous visitor) opens `route`.
#[must_use]
pub fn authorize(route: Route, user: Option<&User>) -> RouteDecision {
    let role = match (route.access(), user) {
        (Access::Public, _) => return RouteDecision::Render(route),
        (_, None) => return RouteDecision::Redirect(Route::Login),
        (Access::Authenticated, Some(user)) => user.role,
        (Access::Roles(allowed), Some(user)) => {
            if !allowed.contains(&user.role) {
                return RouteDecision::Redirect(Route::Dashboard);
            }
            user.role
        }
    };

    if route == Route::Dashboard {
        let target = Dashboard::for_role(role).route();
        if target != Route::Dashboard {
            return RouteDecision::Redirect(target);
        }
    }
    RouteDecision::Render(route)
}

/// Like `authorize`, starting from a raw path. Unknown paths go home.
#[must_use]
pub fn authorize_path(path: &str, user: Option<&User>) -> RouteDecision {
    match Route::parse(path) {
        Some(route) => authorize(route, user),
        None => RouteDecision::Redirect(Route::Home),
    }
}

/// The assistant widget is only offered to signed-in users.
#[must_use]
pub fn chatbot_visible(user: Option<&User>) -> bool {
    user.is_some()
}
