//! Router model: navigation requests, the dashboard's route table, routing
//! decisions, and the `Navigator` seam the guard acts through.

use serde::{Deserialize, Serialize};

/// Dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    ForgotPassword,
    Dashboard,
    Employees,
    Attendance,
    Payroll,
    Compliance,
    Exits,
    Expenses,
    Integrations,
    Performance,
    Training,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Login,
        Route::ForgotPassword,
        Route::Dashboard,
        Route::Employees,
        Route::Attendance,
        Route::Payroll,
        Route::Compliance,
        Route::Exits,
        Route::Expenses,
        Route::Integrations,
        Route::Performance,
        Route::Training,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::ForgotPassword => "/forgot-password",
            Route::Dashboard => "/dashboard",
            Route::Employees => "/employees",
            Route::Attendance => "/attendance",
            Route::Payroll => "/payroll",
            Route::Compliance => "/compliance",
            Route::Exits => "/exits",
            Route::Expenses => "/expenses",
            Route::Integrations => "/integrations",
            Route::Performance => "/performance",
            Route::Training => "/training",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::ForgotPassword => "Forgot password",
            Route::Dashboard => "Dashboard",
            Route::Employees => "Employee records",
            Route::Attendance => "Attendance",
            Route::Payroll => "Payroll",
            Route::Compliance => "Compliance reports",
            Route::Exits => "Exit workflows",
            Route::Expenses => "Expense reimbursement",
            Route::Integrations => "Integrations",
            Route::Performance => "Performance",
            Route::Training => "Training",
        }
    }

    /// Exact match on the path component.
    pub fn from_path(path: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    pub fn is_public(&self) -> bool {
        crate::auth::guard::is_public_path(self.path())
    }
}

/// The location being resolved by one routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    path: String,
}

impl NavigationRequest {
    /// Keep only the path component of a location: query string and
    /// fragment are dropped. Nothing else is normalised.
    pub fn parse(location: &str) -> Self {
        let end = location.find(['?', '#']).unwrap_or(location.len());
        Self {
            path: location[..end].to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Outcome of guarding one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    /// Render the requested (possibly nested) view.
    Render,
    /// Navigate to `to`; when `replace` is set the denied location is
    /// dropped from history instead of pushed over.
    Redirect { to: String, replace: bool },
}

impl Decision {
    pub fn redirect_to_login() -> Self {
        Decision::Redirect {
            to: Route::Login.path().to_string(),
            replace: true,
        }
    }

    pub fn is_render(&self) -> bool {
        matches!(self, Decision::Render)
    }
}

/// Router capabilities the guard needs.
pub trait Navigator {
    fn current_path(&self) -> String;
    fn render(&mut self);
    fn redirect(&mut self, to: &str, replace: bool);
}

/// In-memory browser history implementing [`Navigator`].
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<String>,
    rendered: Option<String>,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.to_string()],
            rendered: None,
        }
    }

    /// Navigate to a new location, adding a history entry.
    pub fn push(&mut self, location: &str) {
        self.entries.push(location.to_string());
        self.rendered = None;
    }

    /// Go back one entry. Returns false when already at the first entry.
    pub fn back(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            self.rendered = None;
            true
        } else {
            false
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn location(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Location most recently rendered, if the current entry was rendered.
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }
}

impl Navigator for MemoryHistory {
    fn current_path(&self) -> String {
        self.location()
            .map(|loc| NavigationRequest::parse(loc).path().to_string())
            .unwrap_or_else(|| "/".to_string())
    }

    fn render(&mut self) {
        self.rendered = self.location().map(str::to_string);
    }

    fn redirect(&mut self, to: &str, replace: bool) {
        if replace {
            self.entries.pop();
        }
        self.entries.push(to.to_string());
        self.rendered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_request_strips_query_and_fragment() {
        assert_eq!(NavigationRequest::parse("/login?next=/payroll").path(), "/login");
        assert_eq!(NavigationRequest::parse("/employees#row-4").path(), "/employees");
        assert_eq!(NavigationRequest::parse("/payroll").path(), "/payroll");
        assert_eq!(NavigationRequest::parse("").path(), "");
    }

    #[test]
    fn test_route_lookup() {
        assert_eq!(Route::from_path("/payroll"), Some(Route::Payroll));
        assert_eq!(Route::from_path("/payroll/"), None);
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn test_only_login_and_forgot_password_are_public() {
        let public: Vec<Route> = Route::ALL.into_iter().filter(Route::is_public).collect();
        assert_eq!(public, vec![Route::Login, Route::ForgotPassword]);
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_string(&Decision::redirect_to_login()).unwrap();
        assert_eq!(json, r#"{"action":"redirect","to":"/login","replace":true}"#);
        assert_eq!(
            serde_json::to_string(&Decision::Render).unwrap(),
            r#"{"action":"render"}"#
        );
    }

    #[test]
    fn test_history_replace_drops_current_entry() {
        let mut history = MemoryHistory::new("/dashboard");
        history.push("/payroll");
        history.redirect("/login", true);

        assert_eq!(history.entries(), ["/dashboard", "/login"]);
        assert!(history.back());
        assert_eq!(history.location(), Some("/dashboard"));
        assert!(!history.back());
    }

    #[test]
    fn test_history_push_redirect_keeps_entry() {
        let mut history = MemoryHistory::new("/payroll");
        history.redirect("/login", false);
        assert_eq!(history.entries(), ["/payroll", "/login"]);
    }

    #[test]
    fn test_history_render_tracks_current_location() {
        let mut history = MemoryHistory::new("/employees?page=2");
        assert_eq!(history.current_path(), "/employees");
        history.render();
        assert_eq!(history.rendered(), Some("/employees?page=2"));
        history.push("/payroll");
        assert_eq!(history.rendered(), None);
    }
}
