use std::env;

use anyhow::Context;
use secrecy::SecretString;

pub const DEFAULT_SHIPPING_FEE: i64 = 500;
pub const DEFAULT_MEMBER_PLAN: &str = "plus";
pub const DEFAULT_PAYMENT_APP_ID: &str = "gocart";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub admin_email: String,
    pub auth: AuthConfig,
    pub checkout: CheckoutConfig,
    pub payments: PaymentConfig,
    pub geocoding_api_key: Option<SecretString>,
    pub images: ImageConfig,
    pub identity_webhook_secret: SecretString,
}

/// How bearer tokens issued by the identity provider are verified.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// HS256 with a shared secret.
    SharedSecret(SecretString),
    /// RS256 with the provider's PEM encoded public key.
    PublicKey(String),
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Flat fee in cents, charged once per checkout for non-members.
    pub shipping_fee: i64,
    /// Plan name granting membership, matched against the token `pla` claim.
    pub member_plan: String,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: SecretString,
    pub webhook_secret: SecretString,
    pub app_id: String,
    pub api_base: String,
    pub currency: String,
    /// Where the hosted checkout page sends the buyer back to.
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub private_key: SecretString,
    pub url_endpoint: String,
    pub upload_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let auth = match env::var("AUTH_JWT_PUBLIC_KEY") {
            Ok(pem) if !pem.trim().is_empty() => AuthConfig::PublicKey(pem),
            _ => AuthConfig::SharedSecret(secret("JWT_SECRET")?),
        };

        let checkout = CheckoutConfig {
            shipping_fee: env::var("SHIPPING_FEE_CENTS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|fee| *fee >= 0)
                .unwrap_or(DEFAULT_SHIPPING_FEE),
            member_plan: env::var("MEMBER_PLAN").unwrap_or_else(|_| DEFAULT_MEMBER_PLAN.into()),
        };

        let payments = PaymentConfig {
            secret_key: secret("STRIPE_SECRET_KEY")?,
            webhook_secret: secret("STRIPE_WEBHOOK_SECRET")?,
            app_id: env::var("PAYMENT_APP_ID").unwrap_or_else(|_| DEFAULT_PAYMENT_APP_ID.into()),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            return_url: env::var("CHECKOUT_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/orders".into()),
        };

        let images = ImageConfig {
            private_key: secret("IMAGEKIT_PRIVATE_KEY")?,
            url_endpoint: env::var("IMAGEKIT_URL_ENDPOINT")
                .context("IMAGEKIT_URL_ENDPOINT is not set")?,
            upload_url: env::var("IMAGEKIT_UPLOAD_URL")
                .unwrap_or_else(|_| "https://upload.imagekit.io/api/v1/files/upload".into()),
        };

        Ok(Self {
            database_url,
            host,
            port,
            admin_email: env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?,
            auth,
            checkout,
            payments,
            geocoding_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            images,
            identity_webhook_secret: secret("IDENTITY_WEBHOOK_SECRET")?,
        })
    }
}

fn secret(name: &str) -> anyhow::Result<SecretString> {
    let value = env::var(name).with_context(|| format!("{name} is not set"))?;
    Ok(SecretString::from(value))
}
