//! One summarisation run: system message, input, completion, report.

use crate::client::{http_client, CompletionClient, CompletionError};
use crate::completion::CompletionRequest;
use crate::config::{ConfigError, RunConfig};
use crate::report;
use crate::source::{InputAcquirer, InputError, InputSource, Prompt};
use crate::stats::StatsReport;
use std::io::Write;
use std::time::Instant;
use thiserror::Error;

/// Any failure of a run, by the step that failed
#[derive(Error, Debug)]
pub enum SummariserError {
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error(transparent)]
    InputError(#[from] InputError),
    #[error(transparent)]
    RequestError(#[from] CompletionError),
    #[error("failed to build HTTP client: {0}")]
    HttpClientError(reqwest::Error),
    #[error("failed to write output: {0}")]
    OutputError(#[from] std::io::Error),
}

impl SummariserError {
    /// The user chose to quit at the prompt
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SummariserError::InputError(InputError::Cancelled))
    }
}

/// Acquirer sharing the run's timeout and size limit
pub fn input_acquirer(config: &RunConfig) -> Result<InputAcquirer, SummariserError> {
    let http = http_client(config.timeout).map_err(SummariserError::HttpClientError)?;
    Ok(InputAcquirer::new(http, config.max_input_chars))
}

/// Runs the pipeline against any [`CompletionClient`].
pub struct Summariser<'a, C: ?Sized> {
    config: &'a RunConfig,
    client: &'a C,
    acquirer: InputAcquirer,
}

impl<'a, C> Summariser<'a, C>
where
    C: CompletionClient + ?Sized,
{
    pub fn new(config: &'a RunConfig, client: &'a C, acquirer: InputAcquirer) -> Self {
        Self {
            config,
            client,
            acquirer,
        }
    }

    pub async fn run(
        &self,
        source: &InputSource,
        prompt: &mut dyn Prompt,
        out: &mut dyn Write,
    ) -> Result<(), SummariserError> {
        let system_message = self.config.load_system_message()?;
        let input = self.acquirer.acquire(source, prompt).await?;

        report::write_sending(out)?;
        out.flush()?;

        let request = CompletionRequest::summarise(
            &self.config.deployment,
            &system_message,
            &input,
            self.config.temperature,
            self.config.max_tokens,
        );

        let started = Instant::now();
        let result = self.client.complete(&request).await?;
        let elapsed = started.elapsed();

        report::write_response(out, &result.text)?;

        if self.config.show_stats {
            let stats = StatsReport::new(
                &result.usage,
                &system_message,
                &input,
                &result.text,
                &self.config.pricing,
                elapsed,
            );
            report::write_stats(out, &stats)?;
        }

        Ok(())
    }
}
