use serde::Deserialize;
use thiserror::Error;

use crate::util::text::{contains_any_phrase, non_blank};

pub const DETAILS_DELIMITER: &str = " | ";

pub const MSG_TOO_MANY_REQUESTS: &str = "Muitas requisições. Aguarde um minuto e tente novamente.";
pub const MSG_ALREADY_VOTED: &str = "Você já votou recentemente a partir deste dispositivo.";
pub const MSG_EXPIRED: &str = "Esta pesquisa expirou.";
pub const MSG_NOT_FOUND: &str = "Pesquisa não encontrada ou expirada.";
pub const MSG_GENERIC: &str = "Não foi possível concluir a solicitação. Tente novamente.";
pub const MSG_UNREACHABLE: &str = "Não foi possível conectar ao servidor. Verifique sua conexão.";

const ALREADY_VOTED_HINTS: &[&str] = &["já recebemos um voto", "already voted"];
const EXPIRED_HINTS: &[&str] = &["expirou", "expirada", "expired"];

/// Normalized non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("render failed: {0}")]
    Render(#[from] tera::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Details>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Details {
    One(String),
    Many(Vec<String>),
}

impl Details {
    fn joined(self) -> Option<String> {
        let text = match self {
            Self::One(value) => value,
            Self::Many(values) => values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(DETAILS_DELIMITER),
        };
        non_blank(Some(text.as_str()))
    }
}

/// Builds an [`ApiError`] from a failed response's status and raw body.
///
/// Bodies that are not JSON, or lack a message, fall back to the per-status
/// default message.
pub fn normalize_error(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message =
        non_blank(parsed.message.as_deref()).unwrap_or_else(|| default_message(status).to_string());
    ApiError {
        status,
        message,
        details: parsed.details.and_then(Details::joined),
    }
}

pub fn default_message(status: u16) -> &'static str {
    match status {
        429 => MSG_TOO_MANY_REQUESTS,
        409 => MSG_ALREADY_VOTED,
        404 => MSG_NOT_FOUND,
        _ => MSG_GENERIC,
    }
}

/// User-facing message for a failed vote, as a function of status and the
/// server's message only.
pub fn vote_failure_message(status: Option<u16>, message: &str) -> String {
    if status == Some(429) {
        return MSG_TOO_MANY_REQUESTS.to_string();
    }
    if status == Some(409) || contains_any_phrase(message, ALREADY_VOTED_HINTS) {
        return MSG_ALREADY_VOTED.to_string();
    }
    if contains_any_phrase(message, EXPIRED_HINTS) {
        return MSG_EXPIRED.to_string();
    }
    if status == Some(404) {
        return MSG_NOT_FOUND.to_string();
    }
    non_blank(Some(message)).unwrap_or_else(|| MSG_GENERIC.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_details_are_joined_with_delimiter() {
        let err = normalize_error(
            400,
            r#"{"message":"Dados inválidos","details":["optionId obrigatório","questionId inválido"]}"#,
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Dados inválidos");
        assert_eq!(
            err.details.as_deref(),
            Some("optionId obrigatório | questionId inválido")
        );
    }

    #[test]
    fn string_details_pass_through() {
        let err = normalize_error(500, r#"{"message":"boom","details":"stack"}"#);
        assert_eq!(err.details.as_deref(), Some("stack"));
    }

    #[test]
    fn missing_message_defaults_by_status() {
        assert_eq!(normalize_error(429, "").message, MSG_TOO_MANY_REQUESTS);
        assert_eq!(normalize_error(404, "{}").message, MSG_NOT_FOUND);
        assert_eq!(normalize_error(409, r#"{"message":"  "}"#).message, MSG_ALREADY_VOTED);
        let err = normalize_error(502, "<html>bad gateway</html>");
        assert_eq!(err.message, MSG_GENERIC);
        assert_eq!(err.details, None);
    }

    #[test]
    fn vote_failures_map_to_domain_messages() {
        assert_eq!(vote_failure_message(Some(429), "slow down"), MSG_TOO_MANY_REQUESTS);
        assert_eq!(vote_failure_message(Some(409), "conflict"), MSG_ALREADY_VOTED);
        assert_eq!(
            vote_failure_message(Some(400), "Já recebemos um voto deste dispositivo"),
            MSG_ALREADY_VOTED
        );
        assert_eq!(
            vote_failure_message(Some(400), "A pesquisa expirou em 01/10"),
            MSG_EXPIRED
        );
        assert_eq!(vote_failure_message(Some(404), "Not Found"), MSG_NOT_FOUND);
        assert_eq!(vote_failure_message(Some(422), "Opção inválida"), "Opção inválida");
        assert_eq!(vote_failure_message(None, ""), MSG_GENERIC);
    }

    #[test]
    fn rate_limit_wins_over_message_hints() {
        assert_eq!(
            vote_failure_message(Some(429), "já recebemos um voto"),
            MSG_TOO_MANY_REQUESTS
        );
    }
}
