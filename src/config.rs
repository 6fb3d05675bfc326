use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Model-outputs endpoint of the food recognition service.
    pub classifier_url: String,
    pub classifier_key: String,
    /// Endpoint of the macronutrient prediction service.
    pub predictor_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub relay_url: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub upload_dir: String,
    pub jwt: JwtConfig,
    pub inference: InferenceConfig,
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "caltrack".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "caltrack-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let inference = InferenceConfig {
            classifier_url: std::env::var("CLARIFAI_API_URL").unwrap_or_else(|_| {
                "https://api.clarifai.com/v2/models/food-item-recognition/outputs".into()
            }),
            classifier_key: std::env::var("CLARIFAI_API_KEY")?,
            predictor_url: std::env::var("MODEL_API_URL")?,
        };
        let notify = NotifyConfig {
            relay_url: std::env::var("MAIL_RELAY_URL")?,
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "caltrack@localhost".into()),
        };
        Ok(Self {
            database_url,
            upload_dir,
            jwt,
            inference,
            notify,
        })
    }
}
