use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(String::to_string)
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --{name}"))
}

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let mut globals = GlobalArgs::new(SecretString::from(required(matches, "jwt-secret")?));
    globals.recaptcha_secret = SecretString::from(required(matches, "recaptcha-secret")?);
    globals.recaptcha_url = required(matches, "recaptcha-url")?;
    globals.frontend_origin = required(matches, "frontend-origin")?;
    globals.secure_cookies = matches.get_flag("secure-cookies");

    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: required(matches, "dsn")?,
    };

    Ok((action, globals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler_builds_action_and_globals() {
        let matches = commands::new()
            .no_binary_name(true)
            .try_get_matches_from([
                "--dsn",
                "postgres://localhost/proctor",
                "--jwt-secret",
                "topsecret",
                "--recaptcha-secret",
                "captcha",
                "--port",
                "9090",
                "--secure-cookies",
            ])
            .unwrap();

        let (action, globals) = handler(&matches).unwrap();
        let Action::Server { port, dsn } = action;
        assert_eq!(port, 9090);
        assert_eq!(dsn, "postgres://localhost/proctor");
        assert_eq!(globals.jwt_secret.expose_secret(), "topsecret");
        assert!(globals.secure_cookies);
    }
}
