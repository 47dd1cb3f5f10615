//! Main application orchestration and execution

use crate::{
    config::{display_config_summary, validate_config},
    diagnostics::{DiagnosticsTrigger, PathTracer, SystemTraceroute},
    error::{AppError, Result},
    executor::{SamplerConfig, TargetSampler},
    identity::IdentityLookup,
    logging::LoggerFactory,
    models::Config,
    output::{LatencyReport, OutputCoordinator},
    probe::{Prober, SystemPing},
};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    prober: Arc<dyn Prober>,
    tracer: Arc<dyn PathTracer>,
    identity: Option<IdentityLookup>,
}

impl App {
    /// Application using the system `ping` and `traceroute` binaries
    pub fn new(config: Config) -> Self {
        let prober: Arc<dyn Prober> = Arc::new(SystemPing::new(config.probe_timeout()));
        let tracer: Arc<dyn PathTracer> = Arc::new(SystemTraceroute::new(config.trace_timeout()));
        let identity = config.identity_lookup.then(|| IdentityLookup::from_config(&config));

        Self {
            config,
            prober,
            tracer,
            identity,
        }
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn PathTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Replace or disable the public address lookup
    pub fn with_identity(mut self, identity: Option<IdentityLookup>) -> Self {
        self.identity = identity;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sample, rank and trace, returning the finished report.
    ///
    /// Only an empty target list or an internal failure is an error; probe
    /// and trace failures end up in the report.
    pub async fn execute(&self) -> Result<LatencyReport> {
        let targets = self.config.targets();
        if targets.is_empty() {
            return Err(AppError::NoTargetsSupplied);
        }

        let loggers = LoggerFactory::new(self.config.clone());
        let logger = loggers.create_logger("APP").await;
        let mut phases = loggers.create_phase_logger();
        let run_id = logger.start_operation("probe run").await;
        crate::log_debug!(logger, "Session {}", loggers.session_id());

        crate::log_info!(
            logger,
            "Probing {} targets {} times each, tracing up to {}",
            targets.len(),
            self.config.sample_count,
            self.config.diagnostics_count
        );

        let identities = match &self.identity {
            Some(lookup) => {
                phases.start_phase("identity").await;
                let identities = lookup.lookup_all().await;
                phases.end_phase("identity").await;
                identities
            }
            None => Vec::new(),
        };

        phases.start_phase("sampling").await;
        let sampler = TargetSampler::new(Arc::clone(&self.prober), SamplerConfig::from(&self.config))
            .with_logger(loggers.create_probe_logger());
        let outcome = match sampler.run(&targets).await {
            Ok(outcome) => outcome,
            Err(e) => {
                loggers.create_error_logger().log_error(&e, Some("Sampling"), Some(&run_id)).await;
                logger.end_operation(&run_id, "probe run", false).await;
                return Err(e);
            }
        };
        phases.end_phase("sampling").await;

        phases
            .log_sampling_summary(
                targets.len(),
                outcome.summary.total_samples,
                outcome.summary.successful_samples,
                outcome.summary.duration,
                outcome.summary.deadline_exceeded,
            )
            .await;

        let report = LatencyReport::from_outcome(outcome, self.config.sample_count).with_identities(identities);

        if report.summary.deadline_exceeded {
            crate::log_warn!(
                logger,
                "Sampling deadline cut short: {}",
                report.summary.aborted_targets.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
            );
        }

        let probe_logger = loggers.create_probe_logger();
        for entry in report.ranking.unreachable() {
            if let Err(e) = entry.require_mean() {
                probe_logger.log_unreachable(&e).await;
            }
        }

        phases.start_phase("diagnostics").await;
        let trigger = DiagnosticsTrigger::new(Arc::clone(&self.tracer)).with_logger(probe_logger);
        let diagnostics = trigger.run(&report.ranking, self.config.diagnostics_count).await;
        phases.end_phase("diagnostics").await;
        logger.end_operation(&run_id, "probe run", true).await;

        Ok(report.with_diagnostics(diagnostics))
    }

    /// Run the application and print the report to stdout
    pub async fn run(self) -> Result<()> {
        let warnings = validate_config(&self.config)?;

        if self.config.debug {
            eprintln!("Configuration Summary:");
            eprintln!("{}", display_config_summary(&self.config));
        }

        if self.config.verbose || self.config.debug {
            for warning in &warnings {
                eprintln!("  {}", warning.format(self.config.enable_color));
            }
        }

        let coordinator = OutputCoordinator::from_config(&self.config);

        if self.config.targets.is_empty() {
            return Err(AppError::NoTargetsSupplied);
        }

        if !self.config.json_output {
            println!("{}", coordinator.display_plan(&self.config.targets(), self.config.sample_count));
        }

        let report = self.execute().await?;
        println!("{}", coordinator.display_report(&report)?);

        Ok(())
    }
}
