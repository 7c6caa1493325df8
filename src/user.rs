use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vocabulary::UserId;

/// An account created on first sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verified identity handed over by the identity provider.
///
/// Field names follow Google's userinfo payload, where the subject is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "id")]
    pub google_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_userinfo_payload() {
        let json = r#"{
            "id": "10982",
            "email": "ada@example.com",
            "verified_email": true,
            "name": "Ada",
            "picture": "https://example.com/ada.png"
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.google_id, "10982");
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_profile_optional_fields() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id": "1", "email": "x@example.com"}"#).unwrap();
        assert_eq!(profile.name, None);
        assert_eq!(profile.picture, None);
    }
}
