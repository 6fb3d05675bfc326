use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::User;

/// Signup body. Fields are optional at the serde level so a missing field is
/// a 400 with a useful message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub target_weight: Option<f64>,
    pub daily_calorie_intake: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub target_weight: Option<f64>,
    pub daily_calorie_intake: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_uses_camel_case() {
        let res = TokenResponse {
            token: "t".into(),
            user_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&res).expect("serialize");
        assert!(json.contains("\"userId\""));
    }

    #[test]
    fn signup_request_tolerates_missing_fields() {
        let req: SignupRequest = serde_json::from_str(r#"{"email":"a@b.co"}"#).expect("parse");
        assert_eq!(req.email.as_deref(), Some("a@b.co"));
        assert!(req.password.is_none());
        assert!(req.daily_calorie_intake.is_none());
    }
}
