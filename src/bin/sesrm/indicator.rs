// Progress indicator.
//
// Reads OperationStatistics from the pipeline's stats channel and shows a
// one-line progress display with indicatif, then a final summary.

use std::io;
use std::io::Write;

use async_channel::Receiver;
use indicatif::{HumanCount, HumanDuration, ProgressBar, ProgressStyle};
use sesrm_rs::types::OperationStatistics;
use simple_moving_average::{SMA, SumTreeSMA};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

/// Totals returned by [`show_indicator`] after the stats channel closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSummary {
    pub listed: u64,
    pub skipped: u64,
    pub retrieved: u64,
    pub deleted: u64,
    pub previewed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl IndicatorSummary {
    fn add(&mut self, stats: &OperationStatistics) {
        match stats {
            OperationStatistics::TemplateListed { .. } => self.listed += 1,
            OperationStatistics::TemplateSkipped { .. } => self.skipped += 1,
            OperationStatistics::TemplateRetrieved { .. } => self.retrieved += 1,
            OperationStatistics::TemplateDeleted { .. } => self.deleted += 1,
            OperationStatistics::TemplatePreviewed { .. } => self.previewed += 1,
            OperationStatistics::TemplateFailed { .. } => self.failed += 1,
            OperationStatistics::TemplateCancelled { .. } => self.cancelled += 1,
        }
    }

    fn completed(&self) -> u64 {
        self.retrieved + self.deleted + self.previewed + self.failed + self.cancelled
    }

    fn message(&self, requests_per_sec: u64) -> String {
        format!(
            "listed {} templates,  skipped {} | retrieved {},  deleted {},  previewed {} | {:>3} requests/sec,  failed {},  cancelled {}",
            self.listed,
            self.skipped,
            self.retrieved,
            self.deleted,
            self.previewed,
            HumanCount(requests_per_sec),
            self.failed,
            self.cancelled,
        )
    }
}

/// Moving average window in seconds (samples).
const MOVING_AVERAGE_PERIOD_SECS: usize = 10;

/// How often (in seconds) to refresh the progress display.
const REFRESH_INTERVAL: f32 = 1.0;

/// Spawn a background task that reads statistics from the channel and
/// displays progress.
///
/// The task runs until `stats_receiver` is closed, which the pipeline does
/// at the end of `run()`. Await the returned handle after the run.
pub fn show_indicator(
    stats_receiver: Receiver<OperationStatistics>,
    show_progress: bool,
    show_result: bool,
) -> JoinHandle<IndicatorSummary> {
    let progress_style =
        ProgressStyle::with_template("{wide_msg}").unwrap_or_else(|_| ProgressStyle::default_bar());
    let progress_text = ProgressBar::new(0);
    progress_text.set_style(progress_style);

    tokio::spawn(async move {
        let start_time = Instant::now();

        let mut ma_completed = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();
        let mut summary = IndicatorSummary::default();

        loop {
            let completed_before_period = summary.completed();

            let period = Instant::now();
            loop {
                while let Ok(stats) = stats_receiver.try_recv() {
                    summary.add(&stats);
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() && stats_receiver.is_empty() {
                    let elapsed = start_time.elapsed();
                    let elapsed_secs_f64 = elapsed.as_secs_f64();

                    let requests_per_sec = if elapsed_secs_f64 < f64::from(REFRESH_INTERVAL) {
                        summary.completed()
                    } else {
                        (summary.completed() as f64 / elapsed_secs_f64) as u64
                    };

                    info!(
                        message = "template summary",
                        listed = summary.listed,
                        skipped = summary.skipped,
                        retrieved = summary.retrieved,
                        deleted = summary.deleted,
                        previewed = summary.previewed,
                        failed = summary.failed,
                        cancelled = summary.cancelled,
                        requests_per_sec = requests_per_sec,
                        duration_sec = elapsed_secs_f64,
                    );

                    if show_result {
                        if let Ok(style) = ProgressStyle::with_template("{msg}") {
                            progress_text.set_style(style);
                        }
                        progress_text.finish_with_message(format!(
                            "{},  duration {}",
                            summary.message(requests_per_sec),
                            HumanDuration(elapsed),
                        ));

                        println!();
                        let _ = io::stdout().flush();
                    }

                    return summary;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }

            ma_completed.add_sample(summary.completed() - completed_before_period);

            if show_progress {
                progress_text.set_message(summary.message(ma_completed.get_average()));
            }
        }
    })
}
