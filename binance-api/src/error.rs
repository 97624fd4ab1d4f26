use http::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    UrlError(#[from] url::ParseError),

    #[error(transparent)]
    HttpError(#[from] http::Error),

    #[error(transparent)]
    HeaderError(#[from] http::header::InvalidHeaderValue),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Binance returned HTTP {status}, code {code}: {msg}")]
    Api { status: u16, code: i64, msg: String },
}

/// Body Binance sends with every non-2xx answer.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

impl Error {
    /// Decodes `{"code": -1121, "msg": "Invalid symbol."}`. Bodies that are not
    /// in that shape keep their text and get code 0.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        return match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(body) => Error::Api {
                status: status.as_u16(),
                code: body.code,
                msg: body.msg,
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                code: 0,
                msg: String::from_utf8_lossy(body).into_owned(),
            },
        };
    }
}
