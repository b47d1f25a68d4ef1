//! The refresh cascade.
//!
//! Order within one run: `me`, then the account list, then the statement of
//! the selected account. The statement depends on a selection that the
//! account list may have just changed.

use api_types::{AccountId, account::Account};

use super::{AuthView, Controller, StatementView, Views, classify};
use crate::{client::ClientError, config::StaleSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Synced,
    LoggedOut,
    SessionExpired,
    Unreachable,
}

/// What happened to the active account when the list was reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    None,
    Kept(AccountId),
    /// The selected account is not in the new list.
    Vanished(AccountId),
}

impl Controller {
    /// Re-synchronizes every view with the session state.
    ///
    /// Runs after login, logout and once at startup. Without a token it only
    /// blanks the account views.
    pub async fn update_auth_state(&self) -> Refresh {
        let Some(token) = self.session().get() else {
            self.with_views(Views::clear_account_data);
            return Refresh::LoggedOut;
        };

        let me = match self.inner.client.me().await {
            Ok(me) => me,
            Err(err) => return self.me_failed(err, &token),
        };
        if let Some(refresh) = self.superseded(&token) {
            return refresh;
        }
        self.with_views(|views| {
            views.auth = AuthView::LoggedIn {
                username: me.username,
            };
            views.online = true;
        });

        let selection = match self.reload_accounts().await {
            Ok(selection) => selection,
            Err(refresh) => return refresh,
        };

        if let SelectionStatus::Kept(account_id) = selection {
            if let Err(refresh) = self.reload_statement(account_id).await {
                return refresh;
            }
        }

        Refresh::Synced
    }

    pub(super) async fn reload_accounts(&self) -> Result<SelectionStatus, Refresh> {
        let token = self.current_token()?;
        match self.inner.client.accounts().await {
            Ok(accounts) => {
                if let Some(refresh) = self.superseded(&token) {
                    return Err(refresh);
                }
                let policy = self.inner.settings.stale_selection;
                Ok(self.with_views(|views| apply_accounts(views, accounts, policy)))
            }
            Err(err) => Err(self.refresh_failed(err, &token, None)),
        }
    }

    pub(super) async fn reload_statement(&self, account_id: AccountId) -> Result<(), Refresh> {
        let token = self.current_token()?;
        match self.inner.client.statement(account_id).await {
            Ok(rows) => {
                if let Some(refresh) = self.superseded(&token) {
                    return Err(refresh);
                }
                self.with_views(|views| {
                    views.online = true;
                    if views.selected == Some(account_id) {
                        views.statement = StatementView::Rows { account_id, rows };
                    } else {
                        tracing::debug!(account_id, "selection changed, statement discarded");
                    }
                });
                Ok(())
            }
            Err(err) => Err(self.refresh_failed(err, &token, Some(account_id))),
        }
    }

    /// Account data is never requested without a token.
    fn current_token(&self) -> Result<String, Refresh> {
        self.session().get().ok_or_else(|| {
            tracing::debug!("logged out before reload, request skipped");
            Refresh::LoggedOut
        })
    }

    /// `Some` when the session no longer holds the token a response was
    /// fetched with: a logout or a newer login owns the views now.
    fn superseded(&self, token: &str) -> Option<Refresh> {
        match self.session().get() {
            Some(current) if current == token => None,
            Some(_) => {
                tracing::debug!("token replaced during refresh, response discarded");
                Some(Refresh::Synced)
            }
            None => {
                tracing::debug!("logged out during refresh, response discarded");
                Some(Refresh::LoggedOut)
            }
        }
    }

    /// A failed `me` demotes to logged-out mode whatever the cause: the
    /// session cannot be confirmed, so it is dropped.
    fn me_failed(&self, err: ClientError, token: &str) -> Refresh {
        if self.token_replaced(token) {
            tracing::debug!("identity check failed for a replaced token: {err}");
            return Refresh::SessionExpired;
        }
        let unreachable = matches!(
            classify::classify(classify::Context::Refresh, &err),
            classify::Failure::Transport
        );
        tracing::warn!("identity check failed, dropping session: {err}");
        self.session().clear();
        self.with_views(|views| {
            views.clear_account_data();
            views.online = !unreachable;
        });
        if unreachable {
            Refresh::Unreachable
        } else {
            Refresh::SessionExpired
        }
    }

    fn token_replaced(&self, token: &str) -> bool {
        self.session().get().as_deref().is_some_and(|t| t != token)
    }

    /// Recovery for a failed account or statement fetch. Silent: nothing is
    /// shown to the user, the cause only goes to the log.
    fn refresh_failed(
        &self,
        err: ClientError,
        token: &str,
        statement_for: Option<AccountId>,
    ) -> Refresh {
        match classify::classify(classify::Context::Refresh, &err) {
            classify::Failure::Transport => {
                tracing::warn!("refresh failed, server unreachable: {err}");
                self.with_views(|views| {
                    views.online = false;
                    if let Some(account_id) = statement_for {
                        if views.selected == Some(account_id) {
                            views.statement = StatementView::Unavailable { account_id };
                        }
                    }
                });
                Refresh::Unreachable
            }
            _ => {
                // A newer login may have replaced the token this request used.
                if self.token_replaced(token) {
                    tracing::debug!("refresh rejected for a replaced token: {err}");
                    return Refresh::SessionExpired;
                }
                tracing::warn!("refresh rejected, dropping session: {err}");
                self.session().clear();
                self.with_views(Views::clear_account_data);
                Refresh::SessionExpired
            }
        }
    }
}

fn apply_accounts(
    views: &mut Views,
    accounts: Vec<Account>,
    policy: StaleSelection,
) -> SelectionStatus {
    views.accounts = accounts;
    views.online = true;

    let Some(account_id) = views.selected else {
        return SelectionStatus::None;
    };
    if views.accounts.iter().any(|account| account.id == account_id) {
        return SelectionStatus::Kept(account_id);
    }

    tracing::warn!(account_id, ?policy, "selected account is no longer listed");
    if policy == StaleSelection::Clear {
        views.selected = None;
        views.statement = StatementView::Empty;
    }
    SelectionStatus::Vanished(account_id)
}
