//! Pure rendering: (activities, session) in, a view description out.
//! Hosts decide how the description is drawn.

use chrono::{DateTime, Duration, Utc};

use crate::models::Activity;
use crate::session::Session;

pub const SELECT_PLACEHOLDER: &str = "-- Select an activity --";
pub const LOAD_FAILED: &str = "Failed to load activities. Please try again later.";
pub const LOGIN_LABEL: &str = "🔑 Teacher Login";
pub const LOGOUT_LABEL: &str = "Logout";

const BANNER_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRow {
    pub email: String,
    /// A delete control is offered for this row
    pub removable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    pub participants: Vec<ParticipantRow>,
}

impl ActivityCard {
    pub fn availability(&self) -> String {
        format!("{} spots left", self.spots_left)
    }
}

/// Everything the activity list area and the activity dropdown show.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivitiesView {
    pub cards: Vec<ActivityCard>,
    /// Dropdown entries after the placeholder, in card order
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthButton {
    Login,
    Logout,
}

impl AuthButton {
    pub fn label(self) -> &'static str {
        match self {
            AuthButton::Login => LOGIN_LABEL,
            AuthButton::Logout => LOGOUT_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthView {
    pub status: String,
    pub button: AuthButton,
    pub signup_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn css_class(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }
}

/// A message shown above the signup form for five seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    pub shown_at: DateTime<Utc>,
}

impl Banner {
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(BannerKind::Success, text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(BannerKind::Error, text.into())
    }

    fn new(kind: BannerKind, text: String) -> Self {
        Self {
            kind,
            text,
            shown_at: Utc::now(),
        }
    }

    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now - self.shown_at < Duration::seconds(BANNER_TTL_SECS)
    }
}

pub fn render_activities(activities: &[Activity], session: &Session) -> ActivitiesView {
    let removable = session.is_authenticated();

    let cards = activities
        .iter()
        .map(|a| ActivityCard {
            name: a.name.clone(),
            description: a.details.description.clone(),
            schedule: a.details.schedule.clone(),
            spots_left: a.spots_left(),
            participants: a
                .details
                .participants
                .iter()
                .map(|email| ParticipantRow {
                    email: email.clone(),
                    removable,
                })
                .collect(),
        })
        .collect();

    ActivitiesView {
        cards,
        options: activities.iter().map(|a| a.name.clone()).collect(),
    }
}

pub fn render_auth(session: &Session) -> AuthView {
    if session.is_authenticated() {
        AuthView {
            status: format!("👤 {}", session.username().unwrap_or_default()),
            button: AuthButton::Logout,
            signup_visible: true,
        }
    } else {
        AuthView {
            status: String::new(),
            button: AuthButton::Login,
            signup_visible: false,
        }
    }
}
