use std::{future::Future, time::Duration};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

use crate::{
    client::Client,
    config::AppConfig,
    controller::{Controller, ControllerSettings, Outcome, Views},
    error::Result,
    session::{FileTokenStore, Session},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Username,
    Password,
    Accounts,
    Amount,
}

/// What one frame renders.
#[derive(Debug)]
pub struct AppState {
    pub views: Views,
    pub focus: Focus,
    pub base_url: String,
    pub timezone: chrono_tz::Tz,
}

pub struct App {
    config: AppConfig,
    controller: Controller,
    timezone: chrono_tz::Tz,
    focus: Focus,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let session = Session::open(FileTokenStore::new(&config.session_path));
        let client = Client::new(&config.base_url, session)?;
        let controller = Controller::new(client, ControllerSettings::from(&config));
        let timezone = config.tz()?;

        Ok(Self {
            config,
            controller,
            timezone,
            focus: Focus::Username,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(base_url = %self.config.base_url, "starting");
        self.dispatch(|controller| async move { Outcome::from(controller.update_auth_state().await) });

        let mut terminal = ui::TerminalGuard::enter()?;
        self.event_loop(&mut terminal).await
    }

    async fn event_loop(&mut self, terminal: &mut ui::TerminalGuard) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            self.controller.tick();
            let state = self.snapshot();
            self.focus = state.focus;
            terminal.draw(|frame| ui::render(frame, &state))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key, &state.views);
                    }
                }
            }
            // Let spawned handlers make progress between frames.
            tokio::task::yield_now().await;
        }

        tracing::info!("quitting");
        Ok(())
    }

    fn snapshot(&self) -> AppState {
        let views = self.controller.views();
        let focus = focus_for(self.focus, views.is_logged_in());
        AppState {
            views,
            focus,
            base_url: self.config.base_url.clone(),
            timezone: self.timezone,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, views: &Views) {
        let logged_in = views.is_logged_in();
        match map_key(key) {
            AppAction::Quit => self.should_quit = true,
            AppAction::NextField => self.focus = next_focus(self.focus),
            AppAction::Cancel => self.controller.with_views(|views| {
                views.notice = None;
                views.operation_message = None;
            }),
            AppAction::Submit => match self.focus {
                Focus::Username | Focus::Password => {
                    self.dispatch(|controller| async move { controller.login().await });
                }
                Focus::Amount => {
                    self.dispatch(|controller| async move { controller.submit_operation().await });
                }
                Focus::Accounts => {
                    let selected = views.selected;
                    self.dispatch(move |controller| async move {
                        controller.select_account(selected).await
                    });
                }
            },
            action @ (AppAction::Up | AppAction::Down) if self.focus == Focus::Accounts => {
                let step = if action == AppAction::Up { -1 } else { 1 };
                if let Some(account_id) = views.neighbour_account(step) {
                    self.dispatch(move |controller| async move {
                        controller.select_account(Some(account_id)).await
                    });
                }
            }
            AppAction::Up | AppAction::Down => {}
            AppAction::Logout if logged_in => {
                self.dispatch(|controller| async move { controller.logout().await });
            }
            AppAction::Register if !logged_in => {
                self.dispatch(|controller| async move { controller.register().await });
            }
            AppAction::CreateAccount if logged_in => {
                self.dispatch(|controller| async move { controller.create_account().await });
            }
            AppAction::ToggleKind if logged_in => self
                .controller
                .with_views(|views| views.operation.kind = views.operation.kind.toggled()),
            AppAction::Logout
            | AppAction::Register
            | AppAction::CreateAccount
            | AppAction::ToggleKind => {}
            AppAction::Backspace => {
                let focus = self.focus;
                self.controller.with_views(|views| {
                    if let Some(field) = text_field(views, focus) {
                        field.pop();
                    }
                });
            }
            AppAction::Input(ch) => self.handle_input(ch),
            AppAction::None => {}
        }
    }

    fn handle_input(&mut self, ch: char) {
        match self.focus {
            Focus::Accounts => {
                if matches!(ch, 'q' | 'Q') {
                    self.should_quit = true;
                }
            }
            Focus::Amount if !(ch.is_ascii_digit() || ch == '.' || ch == ',') => {}
            focus => self.controller.with_views(|views| {
                if let Some(field) = text_field(views, focus) {
                    field.push(ch);
                }
            }),
        }
    }

    /// Runs a handler on its own task so the UI keeps drawing while the
    /// request is pending.
    fn dispatch<F, Fut>(&self, handler: F)
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let fut = handler(self.controller.clone());
        tokio::spawn(async move {
            let outcome = fut.await;
            tracing::debug!(?outcome, "handler finished");
        });
    }
}

fn text_field(views: &mut Views, focus: Focus) -> Option<&mut String> {
    match focus {
        Focus::Username => Some(&mut views.login.username),
        Focus::Password => Some(&mut views.login.password),
        Focus::Amount => Some(&mut views.operation.amount),
        Focus::Accounts => None,
    }
}

fn next_focus(focus: Focus) -> Focus {
    match focus {
        Focus::Username => Focus::Password,
        Focus::Password => Focus::Username,
        Focus::Accounts => Focus::Amount,
        Focus::Amount => Focus::Accounts,
    }
}

/// Keeps focus on a field of the screen currently shown.
fn focus_for(focus: Focus, logged_in: bool) -> Focus {
    match (focus, logged_in) {
        (Focus::Username | Focus::Password, true) => Focus::Accounts,
        (Focus::Accounts | Focus::Amount, false) => Focus::Username,
        (focus, _) => focus,
    }
}
