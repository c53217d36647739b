//! Named navigation targets for the onboarding shell.
//!
//! Push/replace/back semantics belong to the mobile navigation surface;
//! the core only names where a transition should land.

use serde::{Deserialize, Serialize};

/// A named route in the app shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Splash,
    Welcome,
    Login,
    RoleSelection,
    SignupName,
    SignupHandle,
    SignupEmail,
    SignupPassword,
    /// Performer-only profile completion after signup.
    CompleteProfile,
    /// The main tabbed Discover/Profile experience.
    Tabs,
}

impl Route {
    /// Path string as the navigation surface addresses it.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Splash => "/",
            Self::Welcome => "/welcome",
            Self::Login => "/login",
            Self::RoleSelection => "/role-selection",
            Self::SignupName => "/signup-name",
            Self::SignupHandle => "/signup-username",
            Self::SignupEmail => "/signup-email",
            Self::SignupPassword => "/signup-password",
            Self::CompleteProfile => "/complete-profile",
            Self::Tabs => "/(tabs)",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// The three choices offered on the welcome screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeChoice {
    /// Primary CTA — start the signup flow.
    GetStarted,
    /// Browse without an account.
    ContinueAsGuest,
    /// Existing account.
    LogIn,
}

impl WelcomeChoice {
    pub fn route(&self) -> Route {
        match self {
            Self::GetStarted => Route::RoleSelection,
            Self::ContinueAsGuest => Route::Tabs,
            Self::LogIn => Route::Login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_unique() {
        let routes = [
            Route::Splash,
            Route::Welcome,
            Route::Login,
            Route::RoleSelection,
            Route::SignupName,
            Route::SignupHandle,
            Route::SignupEmail,
            Route::SignupPassword,
            Route::CompleteProfile,
            Route::Tabs,
        ];
        let mut seen = std::collections::HashSet::new();
        for route in routes {
            assert!(seen.insert(route.path()), "duplicate path {}", route.path());
        }
    }

    #[test]
    fn welcome_choices_route() {
        assert_eq!(WelcomeChoice::GetStarted.route(), Route::RoleSelection);
        assert_eq!(WelcomeChoice::ContinueAsGuest.route(), Route::Tabs);
        assert_eq!(WelcomeChoice::LogIn.route(), Route::Login);
    }
}
