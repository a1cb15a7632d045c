pub mod dashboard;
pub mod views;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use chrono_tz::Tz;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::controller::{Controller, Effect};
use crate::view::{ActivityCard, AuthView, Banner};

/// What the activity list area currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum ListArea {
    #[default]
    Loading,
    Cards(Vec<ActivityCard>),
    Failed(String),
}

/// The dashboard page between requests: the host side of the effects.
pub(crate) struct PageState {
    pub(crate) list: ListArea,
    pub(crate) options: Vec<String>,
    pub(crate) auth: AuthView,
    pub(crate) banner: Option<Banner>,
    pub(crate) login_open: bool,
    pub(crate) login_error: Option<String>,
}

impl PageState {
    pub(crate) fn new(auth: AuthView) -> Self {
        Self {
            list: ListArea::default(),
            options: Vec::new(),
            auth,
            banner: None,
            login_open: false,
            login_error: None,
        }
    }

    pub(crate) fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RenderActivities(view) => {
                    self.list = ListArea::Cards(view.cards);
                    self.options = view.options;
                }
                Effect::ActivitiesFailed(text) => self.list = ListArea::Failed(text),
                Effect::RenderAuth(auth) => self.auth = auth,
                Effect::ShowBanner(banner) => self.banner = Some(banner),
                Effect::ShowLoginError(text) => {
                    self.login_open = true;
                    self.login_error = Some(text);
                }
                Effect::CloseLoginDialog => {
                    self.login_open = false;
                    self.login_error = None;
                }
                // forms are rendered empty on every page load
                Effect::ResetSignupForm => {}
            }
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) controller: Arc<tokio::sync::Mutex<Controller>>,
    pub(crate) page: Arc<Mutex<PageState>>,
    pub(crate) tz: Tz,
}

impl AppState {
    pub(crate) fn new(controller: Controller, tz: Tz) -> Self {
        let page = PageState::new(controller.auth_view());
        Self {
            controller: Arc::new(tokio::sync::Mutex::new(controller)),
            page: Arc::new(Mutex::new(page)),
            tz,
        }
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::page_handler))
        .route("/refresh", post(dashboard::refresh_handler))
        .route("/login", post(dashboard::login_handler))
        .route("/login/open", post(dashboard::open_login))
        .route("/login/close", post(dashboard::close_login))
        .route("/logout", post(dashboard::logout_handler))
        .route("/signup", post(dashboard::signup_handler))
        .route("/unregister", post(dashboard::unregister_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(controller: Controller, tz: Tz, addr: &str) -> Result<()> {
    let app = router(AppState::new(controller, tz));

    let listener = TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
