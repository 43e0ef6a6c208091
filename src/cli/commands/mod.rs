use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("proctor")
        .about("Examination platform backend")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PROCTOR_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("PROCTOR_DSN")
                .required(true),
        )
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .help("Shared secret used to sign session tokens")
                .env("PROCTOR_JWT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("recaptcha-secret")
                .long("recaptcha-secret")
                .help("Server-side secret for the human verification service")
                .env("PROCTOR_RECAPTCHA_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("recaptcha-url")
                .long("recaptcha-url")
                .help("Verification endpoint, example: https://www.google.com/recaptcha/api/siteverify")
                .env("PROCTOR_RECAPTCHA_URL")
                .default_value("https://www.google.com/recaptcha/api/siteverify"),
        )
        .arg(
            Arg::new("frontend-origin")
                .long("frontend-origin")
                .help("Frontend origin allowed by CORS, cookies are scoped to its host")
                .env("PROCTOR_FRONTEND_ORIGIN")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("secure-cookies")
                .long("secure-cookies")
                .help("Mark session cookies Secure (set when serving over HTTPS)")
                .env("PROCTOR_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .help("Log verbosity level (0-4 or error, warn, info, debug, trace)")
                .env("PROCTOR_VERBOSITY")
                .default_value("0")
                .value_parser(validator_log_level()),
        )
}
