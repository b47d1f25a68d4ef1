use std::collections::BTreeSet;

use api_types::{
    AccountId,
    account::Account,
    operation::{OperationKind, StatementRow},
};
use tokio::time::Instant;

use super::guard::Resource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthView {
    #[default]
    LoggedOut,
    LoggedIn {
        username: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StatementView {
    #[default]
    Empty,
    Rows {
        account_id: AccountId,
        rows: Vec<StatementRow>,
    },
    /// The last fetch could not reach the server.
    Unavailable { account_id: AccountId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: Option<Instant>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn expiring_at(mut self, at: Instant) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationForm {
    pub kind: OperationKind,
    pub amount: String,
}

/// Everything the UI renders. Owned by the controller; the UI only reads
/// snapshots and edits the form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Views {
    pub auth: AuthView,
    pub accounts: Vec<Account>,
    pub selected: Option<AccountId>,
    pub statement: StatementView,
    pub login: LoginForm,
    pub operation: OperationForm,
    /// Feedback for login, register and account creation.
    pub notice: Option<Notice>,
    /// Feedback line of the operation form.
    pub operation_message: Option<Notice>,
    /// `false` after a refresh could not reach the server.
    pub online: bool,
    pub busy: BTreeSet<Resource>,
}

impl Default for Views {
    fn default() -> Self {
        Self {
            auth: AuthView::LoggedOut,
            accounts: Vec::new(),
            selected: None,
            statement: StatementView::Empty,
            login: LoginForm::default(),
            operation: OperationForm::default(),
            notice: None,
            operation_message: None,
            online: true,
            busy: BTreeSet::new(),
        }
    }
}

impl Views {
    /// Logged-out rendering: no account data of any kind.
    pub fn clear_account_data(&mut self) {
        self.auth = AuthView::LoggedOut;
        self.accounts.clear();
        self.selected = None;
        self.statement = StatementView::Empty;
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.auth, AuthView::LoggedIn { .. })
    }

    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.selected?;
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn is_busy(&self, resource: Resource) -> bool {
        self.busy.contains(&resource)
    }

    /// Id of the account after (`step > 0`) or before the current selection,
    /// clamped to the list. Starts from the first account when nothing is
    /// selected.
    pub fn neighbour_account(&self, step: isize) -> Option<AccountId> {
        if self.accounts.is_empty() {
            return None;
        }
        let current = self
            .selected
            .and_then(|id| self.accounts.iter().position(|account| account.id == id));
        let index = match current {
            None => 0,
            Some(index) => index
                .saturating_add_signed(step)
                .min(self.accounts.len() - 1),
        };
        Some(self.accounts[index].id)
    }

    pub fn prune_expired(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
        }
        if self
            .operation_message
            .as_ref()
            .is_some_and(|n| n.is_expired(now))
        {
            self.operation_message = None;
        }
    }
}
