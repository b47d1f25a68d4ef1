use api_types::{
    AccountId,
    auth::Credentials,
    operation::OperationNew,
};

use super::{
    Controller, Notice, Outcome, Refresh, Resource, StatementView,
    classify::{Context, classify, user_message},
};

impl Controller {
    /// Logs in with the credentials of the login form, then runs the full
    /// cascade.
    pub async fn login(&self) -> Outcome {
        let credentials = match self.credentials() {
            Ok(credentials) => credentials,
            Err(outcome) => return outcome,
        };
        let Some(_slot) = self.acquire(Resource::Session) else {
            return Outcome::Busy;
        };
        self.with_views(|views| views.notice = None);

        match self.inner.client.login(&credentials).await {
            Ok(res) => {
                tracing::info!(username = %credentials.username, "logged in");
                self.session().set(Some(&res.access_token));
                self.with_views(|views| views.login.password.clear());
                self.update_auth_state().await.into()
            }
            Err(err) => self.mutation_failed("login", err),
        }
    }

    /// Registers the credentials of the login form. The user logs in
    /// afterwards; nothing is refreshed.
    pub async fn register(&self) -> Outcome {
        let credentials = match self.credentials() {
            Ok(credentials) => credentials,
            Err(outcome) => return outcome,
        };
        let Some(_slot) = self.acquire(Resource::Session) else {
            return Outcome::Busy;
        };
        self.with_views(|views| views.notice = None);

        match self.inner.client.register(&credentials).await {
            Ok(_) => {
                tracing::info!(username = %credentials.username, "registered");
                self.with_views(|views| {
                    views.notice = Some(Notice::success("Registered, you can log in now"));
                });
                Outcome::Done
            }
            Err(err) => self.mutation_failed("register", err),
        }
    }

    pub async fn logout(&self) -> Outcome {
        let Some(_slot) = self.acquire(Resource::Session) else {
            return Outcome::Busy;
        };
        tracing::info!("logged out");
        self.session().clear();
        self.with_views(|views| {
            views.notice = None;
            views.operation_message = None;
        });
        self.update_auth_state().await.into()
    }

    /// Creates an account for the logged-in user and reloads the list.
    pub async fn create_account(&self) -> Outcome {
        if !self.session().is_authenticated() {
            return self.invalid_notice("Log in first");
        }
        let Some(_slot) = self.acquire(Resource::Accounts) else {
            return Outcome::Busy;
        };
        self.with_views(|views| views.notice = None);

        match self.inner.client.account_create().await {
            Ok(account) => {
                tracing::info!(account_id = account.id, "account created");
                let deadline = self.notice_deadline();
                self.with_views(|views| {
                    views.notice = Some(
                        Notice::success(format!("Account {} created", account.id))
                            .expiring_at(deadline),
                    );
                });
                match self.reload_accounts().await {
                    Ok(_) => Outcome::Done,
                    Err(refresh) => refresh.into(),
                }
            }
            Err(err) => self.mutation_failed("create account", err),
        }
    }

    /// Submits the operation form against the active account, then reloads
    /// the account list and that account's statement, in this order.
    ///
    /// The amount is cleared only on success so a failed submission can be
    /// retried as is.
    pub async fn submit_operation(&self) -> Outcome {
        let (account_id, form) = self.with_views(|views| (views.selected, views.operation.clone()));
        let Some(account_id) = account_id else {
            return self.invalid_operation("Select an account");
        };
        let Some(amount) = parse_amount(&form.amount) else {
            return self.invalid_operation("Invalid amount");
        };
        let Some(_slot) = self.acquire(Resource::Account(account_id)) else {
            return Outcome::Busy;
        };
        self.with_views(|views| views.operation_message = Some(Notice::info("Processing...")));

        let payload = OperationNew {
            kind: form.kind,
            amount,
        };
        match self.inner.client.operation_submit(account_id, &payload).await {
            Ok(receipt) => {
                tracing::info!(account_id, kind = form.kind.as_str(), amount, "operation submitted");
                let message = receipt
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| "Operation completed".to_string());
                let deadline = self.notice_deadline();
                self.with_views(|views| {
                    views.operation_message = Some(Notice::success(message).expiring_at(deadline));
                    views.operation.amount.clear();
                });

                if let Err(refresh) = self.reload_accounts().await {
                    return refresh.into();
                }
                match self.reload_statement(account_id).await {
                    Ok(()) => Outcome::Done,
                    Err(refresh) => refresh.into(),
                }
            }
            Err(err) => {
                let failure = classify(Context::Mutation, &err);
                tracing::warn!(account_id, "operation failed: {err}");
                let message = user_message(&failure);
                self.with_views(|views| {
                    views.operation_message = Some(Notice::error(message.clone()));
                });
                Outcome::Failed(message)
            }
        }
    }

    /// Makes `account_id` the active account and loads its statement.
    pub async fn select_account(&self, account_id: Option<AccountId>) -> Outcome {
        let changed = self.with_views(|views| {
            let changed = views.selected != account_id;
            views.selected = account_id;
            if account_id.is_none() {
                views.statement = StatementView::Empty;
            }
            changed
        });
        let Some(account_id) = account_id else {
            return Outcome::Done;
        };
        if changed {
            tracing::debug!(account_id, "account selected");
        }

        match self.reload_statement(account_id).await {
            Ok(()) => Outcome::Done,
            Err(Refresh::Synced) => Outcome::Done,
            Err(refresh) => refresh.into(),
        }
    }

    fn credentials(&self) -> Result<Credentials, Outcome> {
        let (username, password) = self.with_views(|views| {
            (
                views.login.username.trim().to_string(),
                views.login.password.clone(),
            )
        });
        if username.is_empty() || password.is_empty() {
            return Err(self.invalid_notice("Enter username and password"));
        }
        Ok(Credentials { username, password })
    }

    fn invalid_notice(&self, message: &str) -> Outcome {
        self.with_views(|views| views.notice = Some(Notice::error(message)));
        Outcome::Invalid(message.to_string())
    }

    fn invalid_operation(&self, message: &str) -> Outcome {
        self.with_views(|views| views.operation_message = Some(Notice::error(message)));
        Outcome::Invalid(message.to_string())
    }

    fn mutation_failed(&self, action: &str, err: crate::client::ClientError) -> Outcome {
        let failure = classify(Context::Mutation, &err);
        tracing::warn!("{action} failed: {err}");
        let message = user_message(&failure);
        self.with_views(|views| views.notice = Some(Notice::error(message.clone())));
        Outcome::Failed(message)
    }
}

/// Parses a user-typed amount. Accepts `.` or `,` as decimal separator and
/// only finite, strictly positive values.
pub fn parse_amount(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    let amount = normalized.parse::<f64>().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}
