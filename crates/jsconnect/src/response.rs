//! jsConnect Response Model
//!
//! A response carries either an error or user data, never both. Unset fields
//! are left out of the JSON. The anonymous response sets the user fields to
//! empty strings instead, which the forum reads as "nobody is signed in".

use crate::signature::{sign, HashAlgorithm};
use serde::Serialize;

/// Media type of a JSONP response
pub const JSONP_CONTENT_TYPE: &str = "application/javascript";

/// Media type of a bare JSON (error) response
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Signed-in user fields sent to the forum
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserData {
    #[serde(rename = "uniqueid", skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "photourl", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<String>,
}

impl UserData {
    /// User data of a caller that is not signed in
    pub fn anonymous() -> Self {
        Self {
            unique_id: Some(String::new()),
            name: Some(String::new()),
            email: Some(String::new()),
            photo_url: Some(String::new()),
            roles: None,
        }
    }

    fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("UniqueId", &self.unique_id),
            ("Name", &self.name),
            ("Email", &self.email),
            ("PhotoUrl", &self.photo_url),
            ("Roles", &self.roles),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    /// Canonical query string of the fields that are set
    pub fn query_string(&self) -> String {
        canonical_query_string(self.fields())
    }
}

/// Builds the sorted, percent-encoded `key=value&...` string that is signed.
///
/// Keys are lower-cased. Everything except ASCII alphanumerics and `-._~`
/// is escaped with upper-case hex, so `'`, `!`, `*`, `(` and `)` are
/// escaped too and a space becomes `%20`.
pub fn canonical_query_string<'k, 'v, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'k str, &'v str)>,
{
    let mut pairs: Vec<(String, String)> = fields
        .into_iter()
        .map(|(key, value)| {
            (
                urlencoding::encode(&key.to_lowercase()).into_owned(),
                urlencoding::encode(value).into_owned(),
            )
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Error fields sent to the forum
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Error(ErrorData),
    User(UserData),
}

/// Response returned to the forum
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SsoResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl SsoResponse {
    /// Error response without client id or signature
    pub fn error(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            client_id: None,
            signature: None,
            payload: Payload::Error(ErrorData {
                error: code.map(str::to_string),
                message: message.into(),
            }),
        }
    }

    /// User response signed over its canonical query string
    pub fn signed(client_id: &str, user: UserData, algorithm: HashAlgorithm, secret: &str) -> Self {
        let signature = sign(algorithm, &user.query_string(), secret);
        Self {
            client_id: Some(client_id.to_string()),
            signature: Some(signature),
            payload: Payload::User(user),
        }
    }

    pub fn user(&self) -> Option<&UserData> {
        match &self.payload {
            Payload::User(user) => Some(user),
            Payload::Error(_) => None,
        }
    }

    pub fn error_data(&self) -> Option<&ErrorData> {
        match &self.payload {
            Payload::Error(error) => Some(error),
            Payload::User(_) => None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Wraps the JSON body in a call to `callback`
    pub fn to_jsonp(&self, callback: &str) -> Result<String, serde_json::Error> {
        Ok(format!("{}({})", callback, self.to_json()?))
    }
}

/// Response body ready to be written with HTTP status 200
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: &'static str,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_query_string_sorted_and_encoded() {
        let query = canonical_query_string([("Name", "A b"), ("Email", "x@y.com")]);
        assert_eq!(query, "email=x%40y.com&name=A%20b");
    }

    #[test]
    fn test_query_string_escapes_reserved() {
        let query = canonical_query_string([("Roles", "a'b!c*d(e)f~g-h_i.j")]);
        assert_eq!(query, "roles=a%27b%21c%2Ad%28e%29f~g-h_i.j");
    }

    #[test]
    fn test_query_string_skips_unset_fields() {
        let user = UserData {
            unique_id: Some("4".into()),
            name: Some("Petr Švihlík".into()),
            email: Some("petr@example.com".into()),
            photo_url: None,
            roles: Some("member,moderator".into()),
        };

        assert_eq!(
            user.query_string(),
            "email=petr%40example.com&name=Petr%20%C5%A0vihl%C3%ADk&roles=member%2Cmoderator&uniqueid=4"
        );
    }

    #[test]
    fn test_anonymous_query_string() {
        assert_eq!(
            UserData::anonymous().query_string(),
            "email=&name=&photourl=&uniqueid="
        );
    }

    #[test]
    fn test_error_json_omits_user_fields() {
        let response = SsoResponse::error(Some("invalid_client"), "Unknown client x.");
        let value: Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();

        assert_eq!(value, json!({"error": "invalid_client", "message": "Unknown client x."}));
    }

    #[test]
    fn test_message_only_error() {
        let response = SsoResponse::error(None, "boom");
        assert_eq!(response.to_json().unwrap(), r#"{"message":"boom"}"#);
    }

    #[test]
    fn test_signed_anonymous_jsonp() {
        let response = SsoResponse::signed("forum", UserData::anonymous(), HashAlgorithm::Md5, "secret");
        let expected_signature = sign(HashAlgorithm::Md5, "email=&name=&photourl=&uniqueid=", "secret");

        assert_eq!(response.signature.as_deref(), Some(expected_signature.as_str()));

        let jsonp = response.to_jsonp("cb").unwrap();
        assert!(jsonp.starts_with("cb({") && jsonp.ends_with("})"));

        let value: Value = serde_json::from_str(&jsonp[3..jsonp.len() - 1]).unwrap();
        assert_eq!(
            value,
            json!({
                "client_id": "forum",
                "signature": expected_signature,
                "uniqueid": "",
                "name": "",
                "email": "",
                "photourl": "",
            })
        );
    }
}
