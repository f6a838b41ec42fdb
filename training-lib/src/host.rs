//! Host page state passed in explicitly.

use serde::Deserialize;
use serde::Serialize;

/// Default login path of the site.
pub const DEFAULT_LOGIN_URL: &str = "/accounts/login/";

/// Authentication state rendered into the page by the server.
///
/// # Example
///
/// ```
/// use training_lib::host::HostContext;
///
/// let guest = HostContext::anonymous("/accounts/login/");
/// assert_eq!(guest.export_redirect(), Some("/accounts/login/"));
///
/// let member = HostContext::authenticated("/accounts/login/");
/// assert_eq!(member.export_redirect(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    /// Whether the visitor is logged in.
    #[serde(default)]
    pub is_authenticated: bool,
    /// Where anonymous visitors are sent to log in.
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

impl Default for HostContext {
    fn default() -> Self {
        Self::anonymous(DEFAULT_LOGIN_URL)
    }
}

impl HostContext {
    /// Context for a visitor that is not logged in.
    pub fn anonymous(login_url: impl Into<String>) -> Self {
        Self {
            is_authenticated: false,
            login_url: login_url.into(),
        }
    }

    /// Context for a logged-in visitor.
    pub fn authenticated(login_url: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            login_url: login_url.into(),
        }
    }

    /// Exporting results requires an account; returns where to send the
    /// visitor instead, if anywhere.
    pub fn export_redirect(&self) -> Option<&str> {
        if self.is_authenticated {
            None
        } else {
            Some(&self.login_url)
        }
    }
}
