use crate::auth::{
    recaptcha::RecaptchaVerifier, service::AuthService, token::TokenCodec, token::TokenTtls,
};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::proctor::{self, CookieSettings};
use crate::store::postgres::PgUserStore;
use anyhow::Result;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&dsn)
                .await?;

            let store = Arc::new(PgUserStore::new(pool));
            let codec = TokenCodec::new(globals.jwt_secret.expose_secret(), TokenTtls::default());
            let bot_filter = Arc::new(RecaptchaVerifier::new(
                globals.recaptcha_url.clone(),
                globals.recaptcha_secret.clone(),
            )?);
            let service = Arc::new(AuthService::new(store, codec, bot_filter));
            let cookies = CookieSettings::from_origin(&globals.frontend_origin, globals.secure_cookies);

            proctor::new(port, service, cookies, &globals.frontend_origin).await?;
        }
    }

    Ok(())
}
