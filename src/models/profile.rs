//! User profile model.

use crate::db::{fields, Document};
use crate::models::Session;
use serde::Serialize;

/// Shown until a stored name is loaded.
pub const DEFAULT_DISPLAY_NAME: &str = "GoRide User";

/// Profile stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// Auth provider uid (also the document id)
    pub uid: String,
    /// User-chosen name, stored as `name`
    pub display_name: String,
    /// From the auth provider; not editable here
    pub email: Option<String>,
}

impl UserProfile {
    /// Profile with the placeholder name.
    pub fn placeholder(session: &Session) -> Self {
        Self {
            uid: session.uid.clone(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            email: session.email.clone(),
        }
    }

    /// Build from the stored document. A missing document or blank name keeps
    /// the placeholder.
    pub fn from_document(session: &Session, doc: Option<&Document>) -> Self {
        let mut profile = Self::placeholder(session);
        if let Some(name) = doc
            .and_then(|d| d.get_str(fields::NAME))
            .filter(|name| !name.trim().is_empty())
        {
            profile.display_name = name.to_string();
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Fields;
    use serde_json::json;

    fn session() -> Session {
        Session::new("u1", Some("alice@example.com".to_string()))
    }

    #[test]
    fn test_missing_document_keeps_placeholder() {
        let profile = UserProfile::from_document(&session(), None);
        assert_eq!(profile.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_blank_name_keeps_placeholder() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("   "));
        let doc = Document::new("u1", fields);
        let profile = UserProfile::from_document(&session(), Some(&doc));
        assert_eq!(profile.display_name, DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_stored_name_is_used() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Alice"));
        let doc = Document::new("u1", fields);
        let profile = UserProfile::from_document(&session(), Some(&doc));
        assert_eq!(profile.display_name, "Alice");
    }
}
