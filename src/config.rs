use std::{env, fmt, num::NonZeroUsize, path::PathBuf, str::FromStr};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

pub const DEFAULT_MAX_TEXT_CHARS: usize = 1000;
pub const DEFAULT_MODEL_BATCH_SIZE: usize = 32;
pub const DEFAULT_RESULTS_PATH: &str = "results.csv";

/// 利用する分類器の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    Lexicon,
    Model,
}

impl ClassifierKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lexicon => "lexicon",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassifierKind {
    type Err = UnsupportedValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "lexicon" | "vader" => Ok(Self::Lexicon),
            "model" | "bert" => Ok(Self::Model),
            _ => Err(UnsupportedValue::new(raw, "lexicon, model")),
        }
    }
}

/// ログ出力形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = UnsupportedValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(UnsupportedValue::new(raw, "text, json")),
        }
    }
}

#[derive(Debug, Error)]
#[error("unsupported value `{value}` (expected one of: {expected})")]
pub struct UnsupportedValue {
    value: String,
    expected: &'static str,
}

impl UnsupportedValue {
    pub(crate) fn new(value: &str, expected: &'static str) -> Self {
        Self {
            value: value.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    classifier_kind: ClassifierKind,
    max_text_chars: NonZeroUsize,
    lexicon_path: Option<PathBuf>,
    model_batch_size: NonZeroUsize,
    results_path: PathBuf,
    log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier_kind: ClassifierKind::Model,
            max_text_chars: NonZeroUsize::new(DEFAULT_MAX_TEXT_CHARS).unwrap_or(NonZeroUsize::MIN),
            lexicon_path: None,
            model_batch_size: NonZeroUsize::new(DEFAULT_MODEL_BATCH_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// 環境変数から分類パイプラインの設定値を読み込み、検証する。
    ///
    /// すべての値に既定値があるため、未設定の変数はエラーにならない。
    ///
    /// # Errors
    /// 数値や列挙値のパースに失敗した場合は [`ConfigError::Invalid`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let classifier_kind = parse_from_str("SENTIMENT_CLASSIFIER", "model")?;
        let max_text_chars =
            parse_non_zero_usize("SENTIMENT_MAX_TEXT_CHARS", DEFAULT_MAX_TEXT_CHARS)?;
        let lexicon_path = parse_path_opt("SENTIMENT_LEXICON_PATH");
        let model_batch_size =
            parse_non_zero_usize("SENTIMENT_MODEL_BATCH_SIZE", DEFAULT_MODEL_BATCH_SIZE)?;
        let results_path = parse_path_opt("SENTIMENT_RESULTS_PATH")
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_PATH));
        let log_format = parse_from_str("SENTIMENT_LOG_FORMAT", "text")?;

        Ok(Self {
            classifier_kind,
            max_text_chars,
            lexicon_path,
            model_batch_size,
            results_path,
            log_format,
        })
    }

    #[must_use]
    pub fn with_classifier_kind(mut self, kind: ClassifierKind) -> Self {
        self.classifier_kind = kind;
        self
    }

    #[must_use]
    pub fn with_max_text_chars(mut self, max_text_chars: NonZeroUsize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }

    #[must_use]
    pub fn with_lexicon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lexicon_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    #[must_use]
    pub fn classifier_kind(&self) -> ClassifierKind {
        self.classifier_kind
    }

    #[must_use]
    pub fn max_text_chars(&self) -> NonZeroUsize {
        self.max_text_chars
    }

    #[must_use]
    pub fn lexicon_path(&self) -> Option<&std::path::Path> {
        self.lexicon_path.as_deref()
    }

    #[must_use]
    pub fn model_batch_size(&self) -> NonZeroUsize {
        self.model_batch_size
    }

    #[must_use]
    pub fn results_path(&self) -> &std::path::Path {
        &self.results_path
    }

    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn parse_path_opt(name: &'static str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_from_str<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = UnsupportedValue>,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}
