use chrono::{DateTime, Utc};
use leptos::prelude::*;

use super::{ListArea, PageState};
use crate::view::{ActivityCard, AuthButton, AuthView, Banner, ParticipantRow, SELECT_PLACEHOLDER};

const STYLE: &str = include_str!("../style.css");

/// The whole dashboard. `now` decides whether the banner has expired.
pub(super) fn render_page(page: &PageState, updated: &str, now: DateTime<Utc>) -> String {
    let auth_html = render_auth(&page.auth);
    let login_html = if page.login_open {
        render_login_modal(page.login_error.as_deref())
    } else {
        String::new()
    };
    let banner_html = page
        .banner
        .as_ref()
        .filter(|b| b.is_visible_at(now))
        .map(render_banner)
        .unwrap_or_default();
    let list_html = render_list(&page.list);
    let signup_html = if page.auth.signup_visible {
        render_signup(&page.options)
    } else {
        String::new()
    };
    let updated = updated.to_string();

    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>"School Activities"</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <header>
                    <h1>"School Activities"</h1>
                    <h2>"Extracurricular Activities"</h2>
                    <div inner_html=auth_html />
                </header>
                <div inner_html=login_html />
                <main>
                    <div inner_html=banner_html />
                    <section id="activities-container">
                        <h3>"Available Activities"</h3>
                        <form class="inline" method="post" action="/refresh">
                            <button type="submit" id="refresh-btn">"Refresh"</button>
                        </form>
                        <div id="activities-list" inner_html=list_html />
                    </section>
                    <div inner_html=signup_html />
                </main>
                <footer>
                    <p class="timestamp">"Updated: " {updated}</p>
                </footer>
            </body>
        </html>
    }
    .to_html()
}

fn render_auth(auth: &AuthView) -> String {
    let status = auth.status.clone();
    let label = auth.button.label();

    match auth.button {
        AuthButton::Logout => view! {
            <form class="auth-bar" method="post" action="/logout">
                <span id="auth-status">{status}</span>
                <button type="submit" id="auth-btn">{label}</button>
            </form>
        }
        .to_html(),
        AuthButton::Login => view! {
            <form class="auth-bar" method="post" action="/login/open">
                <span id="auth-status">{status}</span>
                <button type="submit" id="auth-btn">{label}</button>
            </form>
        }
        .to_html(),
    }
}

fn render_login_modal(error: Option<&str>) -> String {
    let error_html = match error {
        Some(text) => {
            let text = text.to_string();
            view! { <p id="login-error" class="error">{text}</p> }.to_html()
        }
        None => String::new(),
    };

    view! {
        <div id="login-modal" class="modal">
            <div class="modal-content">
                <form class="close" method="post" action="/login/close">
                    <button type="submit" title="Close">"×"</button>
                </form>
                <h3>"Teacher Login"</h3>
                <form method="post" action="/login">
                    <input type="text" name="username" placeholder="Username" required=true />
                    <input type="password" name="password" placeholder="Password" required=true />
                    <button type="submit">"Login"</button>
                </form>
                <div inner_html=error_html />
            </div>
        </div>
    }
    .to_html()
}

fn render_banner(banner: &Banner) -> String {
    let text = banner.text.clone();
    let css = format!("banner {}", banner.kind.css_class());
    view! { <div id="message" class=css>{text}</div> }.to_html()
}

fn render_list(list: &ListArea) -> String {
    match list {
        ListArea::Loading => view! { <p>"Loading activities..."</p> }.to_html(),
        ListArea::Failed(text) => {
            let text = text.clone();
            view! { <p>{text}</p> }.to_html()
        }
        ListArea::Cards(cards) if cards.is_empty() => {
            view! { <p class="empty">"No activities available."</p> }.to_html()
        }
        ListArea::Cards(cards) => cards.iter().map(render_card).collect(),
    }
}

fn render_card(card: &ActivityCard) -> String {
    let name = card.name.clone();
    let description = card.description.clone();
    let schedule = card.schedule.clone();
    let availability = card.availability();
    let participants_html = render_participants(&card.name, &card.participants);

    view! {
        <div class="activity-card">
            <h4>{name}</h4>
            <p>{description}</p>
            <p><strong>"Schedule:"</strong> " " {schedule}</p>
            <p><strong>"Availability:"</strong> " " {availability}</p>
            <div class="participants-container" inner_html=participants_html />
        </div>
    }
    .to_html()
}

fn render_participants(activity: &str, participants: &[ParticipantRow]) -> String {
    if participants.is_empty() {
        return view! { <p><em>"No participants yet"</em></p> }.to_html();
    }

    let rows_html: String = participants
        .iter()
        .map(|p| {
            let email = p.email.clone();
            if !p.removable {
                return view! {
                    <li><span class="participant-email">{email}</span></li>
                }
                .to_html();
            }
            let activity = activity.to_string();
            let hidden_email = p.email.clone();
            view! {
                <li>
                    <span class="participant-email">{email}</span>
                    <form class="inline" method="post" action="/unregister">
                        <input type="hidden" name="activity" value=activity />
                        <input type="hidden" name="email" value=hidden_email />
                        <button type="submit" class="delete-btn" title="Unregister">"❌"</button>
                    </form>
                </li>
            }
            .to_html()
        })
        .collect();

    view! {
        <div class="participants-section">
            <h5>"Participants:"</h5>
            <ul class="participants-list" inner_html=rows_html />
        </div>
    }
    .to_html()
}

fn render_signup(options: &[String]) -> String {
    let options_html: String = std::iter::once(
        view! { <option value="">{SELECT_PLACEHOLDER}</option> }.to_html(),
    )
    .chain(options.iter().map(|name| {
        let value = name.clone();
        let label = name.clone();
        view! { <option value=value>{label}</option> }.to_html()
    }))
    .collect();

    view! {
        <section id="signup-container">
            <h3>"Sign Up a Student"</h3>
            <form id="signup-form" method="post" action="/signup">
                <input type="email" name="email" placeholder="student@school.edu" required=true />
                <select name="activity" required=true inner_html=options_html />
                <button type="submit">"Sign Up"</button>
            </form>
        </section>
    }
    .to_html()
}
