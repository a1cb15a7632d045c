use std::path::Path;

use anyhow::{bail, Result};
use tracing::debug;

use crate::client::SchoolClient;
use crate::config;
use crate::controller::{Controller, Effect, Event};
use crate::models::Config;
use crate::storage::FileStore;
use crate::view::{ActivitiesView, ActivityCard, AuthView, BannerKind};

/// Controller over the configured backend and the on-disk session.
pub fn open_controller(cfg: &Config, config_path: &Path, base_url: Option<&str>) -> Result<Controller> {
    let base_url = base_url.unwrap_or(cfg.server.base_url.as_str());
    let session_path = config::session_path(cfg, config_path);
    debug!("Backend {}, session file {}", base_url, session_path.display());

    let client = SchoolClient::new(base_url)?;
    let store = FileStore::open(&session_path);
    Ok(Controller::new(Box::new(client), Box::new(store)))
}

/// Dispatch one event and print its effects. The first error shown to the
/// user becomes the command's error.
pub async fn run_event(controller: &mut Controller, event: Event) -> Result<()> {
    let effects = controller.dispatch(event).await;
    apply_effects(&effects)
}

/// Print who is logged in, then the activity list.
pub async fn run_activities(controller: &mut Controller) -> Result<()> {
    print_auth(&controller.auth_view());
    run_event(controller, Event::Refresh).await
}

pub fn run_whoami(controller: &Controller) {
    match controller.session().username() {
        Some(name) if controller.session().is_authenticated() => println!("{}", name),
        _ => println!("Not logged in (read-only mode)"),
    }
}

fn apply_effects(effects: &[Effect]) -> Result<()> {
    let mut failure: Option<&str> = None;

    for effect in effects {
        match effect {
            Effect::RenderActivities(view) => print!("{}", format_activities(view)),
            Effect::RenderAuth(auth) => print_auth(auth),
            Effect::ShowBanner(banner) => match banner.kind {
                BannerKind::Success => println!("{}\n", banner.text),
                BannerKind::Error => {
                    failure.get_or_insert(banner.text.as_str());
                }
            },
            Effect::ActivitiesFailed(text) | Effect::ShowLoginError(text) => {
                failure.get_or_insert(text.as_str());
            }
            Effect::CloseLoginDialog | Effect::ResetSignupForm => {}
        }
    }

    match failure {
        Some(text) => bail!("{}", text),
        None => Ok(()),
    }
}

fn print_auth(auth: &AuthView) {
    if auth.status.is_empty() {
        println!("Not logged in (read-only mode)\n");
    } else {
        println!("{}\n", auth.status);
    }
}

fn format_activities(view: &ActivitiesView) -> String {
    if view.cards.is_empty() {
        return "No activities available.\n".to_string();
    }
    view.cards.iter().map(format_card).collect::<Vec<_>>().join("\n")
}

fn format_card(card: &ActivityCard) -> String {
    let mut out = format!(
        "{}\n  {}\n  Schedule: {}\n  Availability: {}\n",
        card.name,
        card.description,
        card.schedule,
        card.availability()
    );
    if card.participants.is_empty() {
        out.push_str("  No participants yet\n");
    } else {
        out.push_str("  Participants:\n");
        for p in &card.participants {
            if p.removable {
                out.push_str(&format!("    - {} ❌\n", p.email));
            } else {
                out.push_str(&format!("    - {}\n", p.email));
            }
        }
    }
    out
}
