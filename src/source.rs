//! Input acquisition: local files, remote URLs or an interactive prompt.

use crate::document::{DocumentError, DocumentKind};
use reqwest::Client;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Text shown when asking for interactive input
pub const PROMPT_TEXT: &str = "Enter the prompt ('quit' to exit)";

/// Interactive answer that ends the run without a request
const QUIT: &str = "quit";

#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    DocumentError(#[from] DocumentError),
    #[error("failed to fetch URL: {0}")]
    FetchError(reqwest::Error),
    #[error("{0}")]
    StatusError(reqwest::Error),
    #[error("Please enter a prompt.")]
    EmptyPrompt,
    #[error("cancelled")]
    Cancelled,
    #[error("input is {chars} characters, above the limit of {limit}")]
    TooLarge { chars: usize, limit: usize },
    #[error("failed to read prompt: {0}")]
    PromptError(String),
}

/// Where the text to summarise comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Url(String),
    Interactive,
}

impl InputSource {
    /// File wins over URL, URL wins over the interactive prompt
    pub fn select(file: Option<PathBuf>, url: Option<String>) -> Self {
        match (file, url) {
            (Some(path), _) => InputSource::File(path),
            (None, Some(url)) => InputSource::Url(url),
            (None, None) => InputSource::Interactive,
        }
    }
}

/// Source of interactive answers
pub trait Prompt: Send {
    fn ask(&mut self, message: &str) -> Result<String, InputError>;
}

/// Prompts on the terminal, or drains stdin when it is not a terminal
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&mut self, message: &str) -> Result<String, InputError> {
        if atty::is(atty::Stream::Stdin) {
            dialoguer::Input::<String>::new()
                .with_prompt(message)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| InputError::PromptError(e.to_string()))
        } else {
            tracing::debug!("stdin is not a terminal, reading it whole");
            ReaderPrompt(std::io::stdin()).ask(message)
        }
    }
}

/// Answers with everything the wrapped reader yields, e.g. piped stdin
#[derive(Debug)]
pub struct ReaderPrompt<R>(pub R);

impl<R: Read + Send> Prompt for ReaderPrompt<R> {
    fn ask(&mut self, _message: &str) -> Result<String, InputError> {
        let mut text = String::new();
        self.0
            .read_to_string(&mut text)
            .map_err(|e| InputError::PromptError(e.to_string()))?;
        Ok(text)
    }
}

/// Reads the input text from whichever source was selected.
pub struct InputAcquirer {
    http: Client,
    max_chars: usize,
}

impl InputAcquirer {
    pub fn new(http: Client, max_chars: usize) -> Self {
        Self { http, max_chars }
    }

    /// Fetch the text and apply the size guard
    pub async fn acquire(
        &self,
        source: &InputSource,
        prompt: &mut dyn Prompt,
    ) -> Result<String, InputError> {
        tracing::debug!(?source, "acquiring input");
        let text = match source {
            InputSource::File(path) => read_file(path).await?,
            InputSource::Url(url) => self.fetch_url(url).await?,
            InputSource::Interactive => read_prompt(prompt)?,
        };
        self.check_size(text)
    }

    async fn fetch_url(&self, url: &str) -> Result<String, InputError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(InputError::FetchError)?
            .error_for_status()
            .map_err(InputError::StatusError)?;
        response.text().await.map_err(InputError::FetchError)
    }

    fn check_size(&self, text: String) -> Result<String, InputError> {
        let chars = text.chars().count();
        if chars > self.max_chars {
            return Err(InputError::TooLarge {
                chars,
                limit: self.max_chars,
            });
        }
        Ok(text)
    }
}

/// Structured documents are extracted; anything else is read verbatim
async fn read_file(path: &Path) -> Result<String, InputError> {
    match DocumentKind::from_path(path) {
        Some(kind) => Ok(kind.extract(path)?),
        None => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InputError::ReadError {
                path: path.to_path_buf(),
                source,
            }),
    }
}

fn read_prompt(prompt: &mut dyn Prompt) -> Result<String, InputError> {
    let answer = prompt.ask(PROMPT_TEXT)?;
    if answer.trim() == QUIT {
        return Err(InputError::Cancelled);
    }
    if answer.trim().is_empty() {
        return Err(InputError::EmptyPrompt);
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Option<String>);

    impl Prompt for Scripted {
        fn ask(&mut self, _message: &str) -> Result<String, InputError> {
            self.0
                .take()
                .ok_or_else(|| InputError::PromptError("asked twice".to_string()))
        }
    }

    fn acquirer(max_chars: usize) -> InputAcquirer {
        InputAcquirer::new(Client::new(), max_chars)
    }

    #[test]
    fn file_takes_precedence_over_url() {
        let source = InputSource::select(
            Some(PathBuf::from("notes.txt")),
            Some("https://example.com".to_string()),
        );
        assert_eq!(source, InputSource::File(PathBuf::from("notes.txt")));
    }

    #[test]
    fn url_takes_precedence_over_prompt() {
        let source = InputSource::select(None, Some("https://example.com".to_string()));
        assert_eq!(source, InputSource::Url("https://example.com".to_string()));
        assert_eq!(InputSource::select(None, None), InputSource::Interactive);
    }

    #[tokio::test]
    async fn plain_file_is_returned_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.md");
        let content = "  # Title\r\n\nBody with\ttabs and trailing space \n";
        std::fs::write(&path, content).unwrap();

        let text = acquirer(1_000)
            .acquire(&InputSource::File(path), &mut Scripted(None))
            .await
            .unwrap();
        assert_eq!(text, content);
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = acquirer(1_000)
            .acquire(
                &InputSource::File(PathBuf::from("/nonexistent/input.txt")),
                &mut Scripted(None),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::ReadError { .. }));
        assert!(err.to_string().contains("/nonexistent/input.txt"));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let err = acquirer(1_000)
            .acquire(&InputSource::Interactive, &mut Scripted(Some("  ".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::EmptyPrompt));
        assert_eq!(err.to_string(), "Please enter a prompt.");
    }

    #[tokio::test]
    async fn quit_cancels() {
        let err = acquirer(1_000)
            .acquire(&InputSource::Interactive, &mut Scripted(Some("quit".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::Cancelled));
    }

    #[tokio::test]
    async fn prompt_answer_is_used_as_input() {
        let text = acquirer(1_000)
            .acquire(
                &InputSource::Interactive,
                &mut Scripted(Some("Summarise me".into())),
            )
            .await
            .unwrap();
        assert_eq!(text, "Summarise me");
    }

    #[tokio::test]
    async fn oversized_input_is_rejected() {
        let err = acquirer(5)
            .acquire(
                &InputSource::Interactive,
                &mut Scripted(Some("héllo wörld".into())),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InputError::TooLarge {
                chars: 11,
                limit: 5
            }
        ));
    }

    #[tokio::test]
    async fn size_limit_counts_characters_not_bytes() {
        let text = acquirer(5)
            .acquire(&InputSource::Interactive, &mut Scripted(Some("ééééé".into())))
            .await
            .unwrap();
        assert_eq!(text, "ééééé");
    }

    #[tokio::test]
    async fn piped_input_is_read_whole() {
        let piped = "First line.\nSecond line.\n\nThird paragraph.\n";
        let text = acquirer(1_000)
            .acquire(
                &InputSource::Interactive,
                &mut ReaderPrompt(std::io::Cursor::new(piped)),
            )
            .await
            .unwrap();
        assert_eq!(text, piped);
    }

    #[tokio::test]
    async fn piped_quit_and_empty_input_follow_prompt_rules() {
        let err = acquirer(1_000)
            .acquire(
                &InputSource::Interactive,
                &mut ReaderPrompt(std::io::Cursor::new("quit\n")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::Cancelled));

        let err = acquirer(1_000)
            .acquire(
                &InputSource::Interactive,
                &mut ReaderPrompt(std::io::empty()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::EmptyPrompt));
    }

    #[test]
    fn non_utf8_pipe_is_a_prompt_error() {
        let err = ReaderPrompt(std::io::Cursor::new(vec![0xff, 0xfe]))
            .ask(PROMPT_TEXT)
            .unwrap_err();
        assert!(matches!(err, InputError::PromptError(_)));
    }
}
