//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::error::KitbagResult;
use crate::fetch::{FetchMode, Fetcher};
use crate::store::StoredResponse;
use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.is_interactive(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            // Plain output for CI
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar over a known number of resource downloads.
///
/// Shows an indicatif bar in interactive mode, one plain line per
/// resource in CI.
#[derive(Clone)]
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    pub fn new(ctx: &UiContext, label: &str, total: u64) -> Self {
        let bar = if ctx.is_interactive() {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {spinner:.cyan} {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("{} ({} resources)...", label, total);
            None
        };
        Self { bar }
    }

    /// Record one fetched resource
    pub fn on_item(&self, url: &str) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
            bar.set_message(shorten(url));
        } else {
            println!("  {} {}", style("·").dim(), url);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

fn shorten(text: &str) -> String {
    let chars = text.chars().count();
    if chars > 60 {
        let tail: String = text.chars().skip(chars - 57).collect();
        format!("...{tail}")
    } else {
        text.to_string()
    }
}

/// Fetcher wrapper that reports each completed fetch to a progress bar
pub struct ProgressFetcher {
    inner: Arc<dyn Fetcher>,
    progress: DownloadProgress,
}

impl ProgressFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, progress: DownloadProgress) -> Self {
        Self { inner, progress }
    }
}

#[async_trait]
impl Fetcher for ProgressFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> KitbagResult<StoredResponse> {
        let response = self.inner.fetch(url, mode).await?;
        self.progress.on_item(url);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Testing...");
        spinner.stop("Done");
        // Should not panic
    }

    #[test]
    fn download_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = DownloadProgress::new(&ctx, "Downloading", 2);
        progress.on_item("https://app.example.com/main.js");
        progress.on_item("https://app.example.com/assets/fonts.css");
        progress.finish();
        // Should not panic
    }

    #[test]
    fn shorten_keeps_url_tail() {
        let short = "https://app.example.com/a.js";
        assert_eq!(shorten(short), short);

        let long = format!("https://app.example.com/assets/{}.png", "x".repeat(80));
        let shortened = shorten(&long);
        assert_eq!(shortened.len(), 60);
        assert!(shortened.starts_with("..."));
        assert!(shortened.ends_with(".png"));
    }

    #[tokio::test]
    async fn progress_fetcher_passes_responses_through() {
        struct Canned;

        #[async_trait]
        impl Fetcher for Canned {
            async fn fetch(&self, _url: &str, _mode: FetchMode) -> KitbagResult<StoredResponse> {
                Ok(StoredResponse::new(200, "body"))
            }
        }

        let ctx = UiContext::non_interactive();
        let progress = DownloadProgress::new(&ctx, "Downloading", 1);
        let fetcher = ProgressFetcher::new(Arc::new(Canned), progress);

        let response = fetcher
            .fetch("https://app.example.com/a.js", FetchMode::Normal)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
}
