use crate::auth::AuthStrategy;
use crate::errors::ValidationError;
use crate::models::LookupOptions;

fn validate_string_option(
    errors: &mut Vec<ValidationError>,
    key: &str,
    value: &Option<String>,
    message: &str,
) {
    if value.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::new(key, message));
    }
}

/// Checks that every option required by the selected auth mode is present
/// and non-empty. An empty list means the options are usable.
pub fn validate_options(options: &LookupOptions) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_string_option(
        &mut errors,
        "host",
        &options.host,
        "You must provide the search API host.",
    );

    match AuthStrategy::from_options(options) {
        AuthStrategy::StaticToken(_) => {
            validate_string_option(
                &mut errors,
                "token",
                &options.token,
                "You must provide an API token.",
            );
        }
        AuthStrategy::CredentialExchange(_) => {
            validate_string_option(
                &mut errors,
                "username",
                &options.username,
                "You must provide a username.",
            );
            validate_string_option(
                &mut errors,
                "password",
                &options.password,
                "You must provide a password.",
            );
        }
    }

    validate_string_option(
        &mut errors,
        "tenant",
        &options.tenant,
        "You must provide a tenant.",
    );

    errors
}
