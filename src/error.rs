use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Cannot fetch page: {0}")]
    FetchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("No measurements saved")]
    NoMeasurements,

    #[error("Prompt cancelled: {0}")]
    PromptError(String),
}

impl FitError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FitError::HttpError(_) => Some(
                "Check your internet connection, or save the page and run:\n  fitcheck analyze <url> --file page.html"
            ),
            FitError::FetchError(_) => Some(
                "Only http(s) pages can be fetched; for anything else save the HTML and pass --file"
            ),
            FitError::NoMeasurements => Some(
                "Save your measurements first:\n  fitcheck measurements set --bust 94cm --waist 76cm --hips 101cm --height 168cm"
            ),
            FitError::InvalidMeasurement(_) => Some(
                "Values accept an explicit unit (e.g. \"32in\" or \"81cm\"); bare numbers below 50 are read as inches"
            ),
            FitError::TomlError(_) | FitError::ConfigError(_) => Some(
                "Check the files in your fitcheck config directory, or delete them to restore defaults"
            ),
            FitError::UrlParseError(_) => Some(
                "Pass a full URL including the scheme, e.g. https://www.asos.com/..."
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FitError>;
