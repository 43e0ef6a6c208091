use secrecy::SecretString;

/// Secrets and deployment settings shared by all actions.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub jwt_secret: SecretString,
    pub recaptcha_secret: SecretString,
    pub recaptcha_url: String,
    pub frontend_origin: String,
    pub secure_cookies: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            recaptcha_secret: SecretString::default(),
            recaptcha_url: String::new(),
            frontend_origin: String::new(),
            secure_cookies: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("s3cret".to_string()));
        assert_eq!(args.jwt_secret.expose_secret(), "s3cret");
        assert_eq!(args.recaptcha_secret.expose_secret(), "");
        assert!(!args.secure_cookies);
    }
}
