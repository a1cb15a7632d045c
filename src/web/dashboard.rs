use axum::extract::{Form, State};
use axum::response::{Html, Redirect};
use chrono::Utc;
use serde::Deserialize;

use super::views::render_page;
use super::{AppState, ListArea};
use crate::controller::Event;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParticipantForm {
    activity: String,
    email: String,
}

/// Run one event through the controller and fold its effects into the page.
async fn handle(state: &AppState, event: Event) {
    let effects = state.controller.lock().await.dispatch(event).await;
    state.page.lock().unwrap().apply(effects);
}

/// Renders the cached page. The list is only fetched on the first load;
/// later changes arrive through the effects of each form post.
pub(crate) async fn page_handler(State(state): State<AppState>) -> Html<String> {
    let loading = state.page.lock().unwrap().list == ListArea::Loading;
    if loading {
        handle(&state, Event::Refresh).await;
    }

    let now = Utc::now();
    let updated = now
        .with_timezone(&state.tz)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string();
    let page = state.page.lock().unwrap();
    Html(render_page(&page, &updated, now))
}

pub(crate) async fn refresh_handler(State(state): State<AppState>) -> Redirect {
    handle(&state, Event::Refresh).await;
    Redirect::to("/")
}

pub(crate) async fn open_login(State(state): State<AppState>) -> Redirect {
    state.page.lock().unwrap().login_open = true;
    Redirect::to("/")
}

pub(crate) async fn close_login(State(state): State<AppState>) -> Redirect {
    let mut page = state.page.lock().unwrap();
    page.login_open = false;
    page.login_error = None;
    Redirect::to("/")
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Redirect {
    handle(
        &state,
        Event::Login {
            username: form.username,
            password: form.password,
        },
    )
    .await;
    Redirect::to("/")
}

pub(crate) async fn logout_handler(State(state): State<AppState>) -> Redirect {
    handle(&state, Event::Logout).await;
    Redirect::to("/")
}

pub(crate) async fn signup_handler(
    State(state): State<AppState>,
    Form(form): Form<ParticipantForm>,
) -> Redirect {
    handle(
        &state,
        Event::Signup {
            email: form.email,
            activity: form.activity,
        },
    )
    .await;
    Redirect::to("/")
}

pub(crate) async fn unregister_handler(
    State(state): State<AppState>,
    Form(form): Form<ParticipantForm>,
) -> Redirect {
    handle(
        &state,
        Event::Unregister {
            activity: form.activity,
            email: form.email,
        },
    )
    .await;
    Redirect::to("/")
}
