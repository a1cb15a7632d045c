//! The client controller: one handler per user interaction. Each handler
//! talks to the backend, updates the session, and returns the effects a
//! host must apply to its display.

use tracing::{debug, error, info, warn};

use crate::client::Backend;
use crate::error::ApiError;
use crate::session::Session;
use crate::storage::KeyValueStore;
use crate::view::{self, ActivitiesView, AuthView, Banner, LOAD_FAILED};

const LOGIN_REJECTED: &str = "Login failed";
const LOGIN_FAILED: &str = "Login request failed. Please try again.";
const CHANGE_REJECTED: &str = "An error occurred";
const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
const UNREGISTER_FAILED: &str = "Failed to unregister. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Refresh,
    Login { username: String, password: String },
    Logout,
    Signup { email: String, activity: String },
    Unregister { activity: String, email: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the activity list and dropdown wholesale
    RenderActivities(ActivitiesView),
    /// Replace the activity list with a static message; dropdown untouched
    ActivitiesFailed(String),
    RenderAuth(AuthView),
    ShowBanner(Banner),
    ShowLoginError(String),
    /// Hide the login dialog, clear its form and any login error
    CloseLoginDialog,
    ResetSignupForm,
}

pub struct Controller {
    backend: Box<dyn Backend>,
    store: Box<dyn KeyValueStore>,
    session: Session,
}

impl Controller {
    /// Build a controller, restoring any session left in `store`.
    pub fn new(backend: Box<dyn Backend>, store: Box<dyn KeyValueStore>) -> Self {
        let session = Session::restore(store.as_ref());
        Self {
            backend,
            store,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth_view(&self) -> AuthView {
        view::render_auth(&self.session)
    }

    pub async fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Refresh => vec![self.fetch_activities().await],
            Event::Login { username, password } => self.login(&username, &password).await,
            Event::Logout => self.logout().await,
            Event::Signup { email, activity } => {
                let result = self.backend.signup(&self.session, &activity, &email).await;
                self.participant_reply(result, SIGNUP_FAILED, vec![Effect::ResetSignupForm])
                    .await
            }
            Event::Unregister { activity, email } => {
                let result = self
                    .backend
                    .unregister(&self.session, &activity, &email)
                    .await;
                self.participant_reply(result, UNREGISTER_FAILED, Vec::new())
                    .await
            }
        }
    }

    async fn fetch_activities(&self) -> Effect {
        match self.backend.activities().await {
            Ok(list) => Effect::RenderActivities(view::render_activities(&list, &self.session)),
            Err(e) => {
                error!("Error fetching activities: {}", e);
                Effect::ActivitiesFailed(LOAD_FAILED.to_string())
            }
        }
    }

    async fn login(&mut self, username: &str, password: &str) -> Vec<Effect> {
        match self.backend.login(username, password).await {
            Ok(grant) => {
                self.session
                    .establish(&grant.token, &grant.username, self.store.as_mut());
                info!("Logged in as {}", grant.username);
                vec![
                    Effect::CloseLoginDialog,
                    Effect::RenderAuth(self.auth_view()),
                    self.fetch_activities().await,
                ]
            }
            Err(e) => {
                warn!("Login as {} failed: {}", username, e);
                let text = e.rejection_detail(LOGIN_REJECTED).unwrap_or(LOGIN_FAILED);
                vec![Effect::ShowLoginError(text.to_string())]
            }
        }
    }

    /// The local session is cleared whatever the backend says.
    async fn logout(&mut self) -> Vec<Effect> {
        if let Err(e) = self.backend.logout(&self.session).await {
            debug!("Ignoring logout failure: {}", e);
        }
        self.session.clear(self.store.as_mut());
        info!("Logged out");
        vec![
            Effect::RenderAuth(self.auth_view()),
            self.fetch_activities().await,
        ]
    }

    async fn participant_reply(
        &self,
        result: Result<String, ApiError>,
        failure: &str,
        on_success: Vec<Effect>,
    ) -> Vec<Effect> {
        match result {
            Ok(message) => {
                info!("{}", message);
                let mut effects = vec![Effect::ShowBanner(Banner::success(message))];
                effects.extend(on_success);
                effects.push(self.fetch_activities().await);
                effects
            }
            Err(e) => match e.rejection_detail(CHANGE_REJECTED) {
                Some(detail) => {
                    warn!("Rejected: {}", detail);
                    vec![Effect::ShowBanner(Banner::error(detail))]
                }
                None => {
                    error!("{} ({})", failure, e);
                    vec![Effect::ShowBanner(Banner::error(failure))]
                }
            },
        }
    }
}
