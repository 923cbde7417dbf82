use std::sync::Arc;

use crate::{
    clients::{geocoding::Geocoder, images::ImageHost, payments::PaymentGateway},
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    middleware::auth::TokenVerifier,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenVerifier>,
    pub payments: PaymentGateway,
    pub geocoder: Geocoder,
    pub images: ImageHost,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> anyhow::Result<Self> {
        let orm = orm_from_pool(&pool);
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        let tokens = TokenVerifier::from_config(&config.auth)?;
        Ok(Self {
            payments: PaymentGateway::new(http.clone(), config.payments.clone()),
            geocoder: Geocoder::new(http.clone(), config.geocoding_api_key.clone()),
            images: ImageHost::new(http, config.images.clone()),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            pool,
            orm,
        })
    }
}
