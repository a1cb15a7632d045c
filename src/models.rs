use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SessionConfig {
    /// Session file; relative paths resolve against the config file's directory
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// One entry of the `GET /activities` object, keyed by activity name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActivityDetails {
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub name: String,
    pub details: ActivityDetails,
}

impl Activity {
    pub fn spots_left(&self) -> i64 {
        self.details.max_participants - self.details.participants.len() as i64
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoginGrant {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// A non-2xx body. `detail` is usually a string, but validation errors
/// carry a list of `{msg, ...}` objects instead.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail` as display text: strings as is, `msg` fields joined with
    /// "; ", anything else as compact JSON.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if msgs.is_empty() {
                    Some(serde_json::Value::Array(items.clone()).to_string())
                } else {
                    Some(msgs.join("; "))
                }
            }
            other => Some(other.to_string()),
        }
    }
}

/// The `GET /activities` object in the backend's key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activities(pub Vec<Activity>);

impl<'de> Deserialize<'de> for Activities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ActivitiesVisitor;

        impl<'de> Visitor<'de> for ActivitiesVisitor {
            type Value = Activities;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of activity name to activity details")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Activities, A::Error> {
                let mut list = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, details)) = map.next_entry::<String, ActivityDetails>()? {
                    list.push(Activity { name, details });
                }
                Ok(Activities(list))
            }
        }

        deserializer.deserialize_map(ActivitiesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activities_keep_backend_order() {
        let json = r#"{
            "Programming Class": {"description": "Code", "schedule": "Tue", "max_participants": 20, "participants": []},
            "Chess Club": {"description": "Club", "schedule": "Mon", "max_participants": 5, "participants": ["a@x.com"]}
        }"#;
        let Activities(list) = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = list.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Programming Class", "Chess Club"]);
        assert_eq!(list[1].spots_left(), 4);
        assert_eq!(list[0].spots_left(), 20);
    }

    #[test]
    fn test_spots_left_can_go_negative() {
        let activity = Activity {
            name: "Gym".into(),
            details: ActivityDetails {
                description: "Sports".into(),
                schedule: "Fri".into(),
                max_participants: 1,
                participants: vec!["a@x.com".into(), "b@x.com".into()],
            },
        };
        assert_eq!(activity.spots_left(), -1);
    }

    #[test]
    fn test_activities_reject_wrong_shape() {
        assert!(serde_json::from_str::<Activities>(r#"{"detail": "boom"}"#).is_err());
        assert!(serde_json::from_str::<Activities>("[]").is_err());
    }

    #[test]
    fn test_error_detail_shapes() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Already registered"}"#).unwrap();
        assert_eq!(body.detail_text().as_deref(), Some("Already registered"));

        let body: ErrorBody = serde_json::from_str(
            r#"{"detail": [{"loc": ["query", "email"], "msg": "field required"}, {"msg": "too long"}]}"#,
        )
        .unwrap();
        assert_eq!(body.detail_text().as_deref(), Some("field required; too long"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail": {"code": 7}}"#).unwrap();
        assert_eq!(body.detail_text().as_deref(), Some(r#"{"code":7}"#));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.detail_text(), None);
        let body: ErrorBody = serde_json::from_str(r#"{"detail": null}"#).unwrap();
        assert_eq!(body.detail_text(), None);
    }
}
