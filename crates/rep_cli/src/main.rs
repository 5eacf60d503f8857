use clap::Parser;
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rep_analysis::{Collaborators, Pipeline, RunReport};
use rep_core::config::{
    DEFAULT_ALERT_THRESHOLD, DEFAULT_COMPANY, DEFAULT_DATA_DIRECTORY, DEFAULT_FEED_URL,
    DEFAULT_INFERENCE_URL, DEFAULT_NER_MODEL, DEFAULT_SENTIMENT_MODEL, DEFAULT_SMTP_PORT,
    DEFAULT_SMTP_SERVER, TRIGGERING_ARTICLE_LIMIT,
};
use rep_core::{DetectorKind, EmailSettings, LabelScheme, Notifier, ScorerKind, Settings};
use rep_feeds::RssFetcher;
use rep_inference::{create_detector, create_scorer, TextPreprocessor};
use rep_notify::SmtpNotifier;
use rep_storage::{create_history_store, ReportWriter};
use rep_web::{create_app, AppState};

/// Monitor a company's reputation in the news.
#[derive(Parser)]
#[command(name = "repscan", author, version, about, long_about = None)]
pub struct Cli {
    /// Serve the score history API instead of running an analysis
    #[arg(long)]
    dashboard: bool,
    /// Re-run the analysis periodically (e.g. 1h, 30m, 1d 12h)
    #[arg(long)]
    interval: Option<humantime::Duration>,
    /// Address the dashboard API listens on
    #[arg(long, default_value = "127.0.0.1:8501")]
    listen: SocketAddr,
    #[arg(long, env = "REPSCAN_FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,
    #[arg(long, env = "REPSCAN_COMPANY", default_value = DEFAULT_COMPANY)]
    company: String,
    /// Alert when the score falls strictly below this value
    #[arg(long, env = "REPSCAN_THRESHOLD", default_value_t = DEFAULT_ALERT_THRESHOLD, allow_hyphen_values = true)]
    threshold: f64,
    #[arg(long, env = "EMAIL_SENDER")]
    email_sender: Option<String>,
    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    email_password: Option<String>,
    #[arg(long, env = "EMAIL_RECIPIENT")]
    email_recipient: Option<String>,
    #[arg(long, env = "SMTP_SERVER", default_value = DEFAULT_SMTP_SERVER)]
    smtp_server: String,
    #[arg(long, env = "SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,
    #[arg(long, env = "REPSCAN_DATA_DIR", default_value = DEFAULT_DATA_DIRECTORY)]
    data_dir: PathBuf,
    #[arg(long, env = "REPSCAN_SENTIMENT_MODEL", default_value = DEFAULT_SENTIMENT_MODEL)]
    sentiment_model: String,
    #[arg(long, env = "REPSCAN_NER_MODEL", default_value = DEFAULT_NER_MODEL)]
    ner_model: String,
    #[arg(long, env = "REPSCAN_INFERENCE_URL", default_value = DEFAULT_INFERENCE_URL)]
    inference_url: String,
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,
    /// Sentiment backend: auto, remote or lexicon
    #[arg(long, env = "REPSCAN_SCORER", default_value = "auto")]
    scorer: ScorerKind,
    /// Mention detector: heuristic or remote
    #[arg(long, env = "REPSCAN_DETECTOR", default_value = "heuristic")]
    detector: DetectorKind,
    /// Sentiment labels: three or five
    #[arg(long, env = "REPSCAN_LABELS", default_value = "three")]
    labels: LabelScheme,
    #[arg(long)]
    remove_stopwords: bool,
    #[arg(long, default_value_t = 8)]
    max_concurrency: usize,
    /// Timeout of every outgoing HTTP or SMTP call
    #[arg(long, default_value = "10s")]
    timeout: humantime::Duration,
    #[arg(long, default_value_t = TRIGGERING_ARTICLE_LIMIT)]
    triggering_limit: usize,
    /// Skip writing the per-run detailed results file
    #[arg(long)]
    no_report: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            feed_url: self.feed_url.clone(),
            target_company: self.company.clone(),
            alert_threshold: self.threshold,
            email: EmailSettings {
                sender: self.email_sender.clone(),
                password: self.email_password.clone(),
                recipient: self.email_recipient.clone(),
                smtp_server: self.smtp_server.clone(),
                smtp_port: self.smtp_port,
            },
            data_dir: self.data_dir.clone(),
            sentiment_model: self.sentiment_model.clone(),
            ner_model: self.ner_model.clone(),
            inference_url: self.inference_url.clone(),
            inference_token: self.hf_token.clone(),
            scorer: self.scorer,
            detector: self.detector,
            label_scheme: self.labels,
            remove_stopwords: self.remove_stopwords,
            max_concurrency: self.max_concurrency,
            request_timeout: self.timeout.into(),
            triggering_article_limit: self.triggering_limit,
        }
    }
}

/// Logs go to stderr and, when it can be opened, to the run log file.
fn init_tracing(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let opened = log_file
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(log_file));
    let (file_layer, file_error) = match opened {
        Ok(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!("⚠️ Unable to open log file {}: {}, logging to stderr only", log_file.display(), e);
    }
}

fn build_pipeline(settings: &Settings, write_report: bool) -> anyhow::Result<Pipeline> {
    let fetcher = RssFetcher::from_settings(settings)?;
    info!("📡 Feed: {}", fetcher.feed_url());

    let detector = create_detector(settings)?;
    info!("🔍 Mention detector initialized (using {})", detector.name());

    let scorer = create_scorer(settings)?;
    info!("🧠 Sentiment scorer initialized (using {})", scorer.name());

    let history = create_history_store(settings);
    info!("💾 History stored in {}", settings.history_file().display());

    let notifier: Option<Arc<dyn Notifier>> =
        match SmtpNotifier::from_settings(&settings.email, settings.request_timeout) {
            Ok(notifier) => {
                info!("📧 Alerts will be sent to {:?}", settings.email.recipient);
                Some(Arc::new(notifier) as Arc<dyn Notifier>)
            }
            Err(e) => {
                warn!("📭 Email alerts disabled: {}", e);
                None
            }
        };

    Ok(Pipeline::new(
        settings,
        Collaborators {
            fetcher: Arc::new(fetcher),
            normalizer: Arc::new(TextPreprocessor::new(settings.remove_stopwords)),
            detector,
            scorer,
            history,
            notifier,
            report: write_report.then(|| ReportWriter::new(&settings.data_dir)),
        },
    ))
}

fn log_report(report: &RunReport) {
    match report.stop {
        Some(reason) => info!("🏁 Run stopped early ({}), score 0.0", reason),
        None => info!(
            "🏁 Reputation score: {:.3} ({} relevant articles, alert {})",
            report.value(),
            report.score.contributing_article_count,
            report.alert
        ),
    }
    if report.is_degraded() {
        warn!("⚠️ {} stage(s) ran degraded", report.degradations.len());
    }
}

async fn serve_dashboard(settings: Settings, listen: SocketAddr) -> anyhow::Result<()> {
    let state = AppState {
        history: create_history_store(&settings),
        settings,
    };
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("🌐 Dashboard API listening on http://{}", listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    info!("👋 Dashboard stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let settings = cli.settings();

    init_tracing(&settings.log_file());
    settings.validate()?;

    if cli.dashboard {
        return serve_dashboard(settings, cli.listen).await;
    }

    let pipeline = build_pipeline(&settings, !cli.no_report)?;

    match cli.interval {
        None => {
            let report = pipeline.run().await?;
            log_report(&report);
        }
        Some(interval) => {
            info!("🔄 Running in periodic mode every {}", interval);
            loop {
                match pipeline.run().await {
                    Ok(report) => log_report(&report),
                    Err(e) => {
                        error!("❌ Analysis aborted: {}", e);
                        return Err(e.into());
                    }
                }
                info!("⏳ Next run in {}", interval);
                tokio::select! {
                    _ = tokio::time::sleep(interval.into()) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("👋 Stopping periodic analysis");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["repscan"]).unwrap();
        let settings = cli.settings();
        assert!(!cli.dashboard);
        assert!(cli.interval.is_none());
        assert_eq!(settings.alert_threshold, DEFAULT_ALERT_THRESHOLD);
        assert_eq!(settings.request_timeout, std::time::Duration::from_secs(10));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "repscan",
            "--interval",
            "1h 30m",
            "--threshold",
            "-0.5",
            "--scorer",
            "lexicon",
            "--labels",
            "five",
            "--company",
            "Acme",
        ])
        .unwrap();
        assert_eq!(
            std::time::Duration::from(cli.interval.unwrap()),
            std::time::Duration::from_secs(5400)
        );
        let settings = cli.settings();
        assert_eq!(settings.alert_threshold, -0.5);
        assert_eq!(settings.scorer, ScorerKind::Lexicon);
        assert_eq!(settings.label_scheme, LabelScheme::five_way());
        assert_eq!(settings.target_company, "Acme");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["repscan", "--scorer", "gpt"]).is_err());
        assert!(Cli::try_parse_from(["repscan", "--interval", "soon"]).is_err());
    }

    #[test]
    fn test_build_pipeline_without_credentials() {
        let cli = Cli::try_parse_from(["repscan", "--scorer", "lexicon"]).unwrap();
        let mut settings = cli.settings();
        settings.email = EmailSettings::default();
        assert!(build_pipeline(&settings, false).is_ok());
    }
}
