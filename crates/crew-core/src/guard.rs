//! Access predicate for client views.
//!
//! Stateless: it reads the credential gate and the store as they are right
//! now and says whether a view may be shown, or where to send the user.

use crate::credential::CredentialStore;
use crate::store::AppStore;
use crate::types::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Settings,
    Wizard,
    Execution,
    Dashboard,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(View),
}

impl View {
    pub fn is_protected(self) -> bool {
        !matches!(self, View::Home | View::Settings)
    }
}

pub fn check(view: View, credential: &CredentialStore, store: &AppStore) -> Access {
    if !view.is_protected() {
        return Access::Allow;
    }
    if !credential.has_valid_credential() {
        return Access::Redirect(View::Settings);
    }

    let ready = match view {
        View::Execution | View::Dashboard => store.session_id().is_some(),
        View::Result => store.status() == SessionStatus::Completed || store.result().is_some(),
        _ => true,
    };

    if ready {
        Access::Allow
    } else {
        Access::Redirect(View::Wizard)
    }
}
