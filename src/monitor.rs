//! Fixed-interval monitoring loop

use crate::config::MonitorConfig;
use crate::domain::extract_domain;
use crate::errors::{MonitorError, Result};
use crate::prober::Prober;
use crate::stats::StatsAggregator;
use crate::transport::{HttpTransport, Transport};
use crate::types::ConfiguredEndpoint;

use std::future::Future;
use std::sync::Arc;
use tokio::time::{Duration, Instant, sleep};
use tracing::{debug, info, instrument, warn};

/// Drift-corrected cycle schedule.
///
/// `next_run` always moves by exactly one interval from the previous target,
/// never from the time a cycle actually finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    next_run: Instant,
    interval: Duration,
}

impl Schedule {
    pub fn new(first_run: Instant, interval: Duration) -> Self {
        Self {
            next_run: first_run,
            interval,
        }
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }

    /// Move the target forward by one interval and return it
    pub fn advance(&mut self) -> Instant {
        self.next_run += self.interval;
        self.next_run
    }

    /// Time left until the target, clamped to zero once it has passed
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        self.next_run.saturating_duration_since(now)
    }
}

/// What happened during one pass over the endpoint list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub probed: usize,
    pub up: usize,
    pub skipped: usize,
    pub duration: Duration,
}

/// Probes every configured endpoint on a fixed interval and reports availability
pub struct Monitor {
    config: MonitorConfig,
    endpoints: Vec<ConfiguredEndpoint>,
    prober: Prober,
    stats: StatsAggregator,
}

impl Monitor {
    /// Create a monitor backed by the reqwest transport
    pub fn new(config: MonitorConfig, endpoints: Vec<ConfiguredEndpoint>) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Self::with_transport(config, endpoints, Arc::new(transport))
    }

    /// Create a monitor that probes through `transport`
    pub fn with_transport(
        config: MonitorConfig,
        endpoints: Vec<ConfiguredEndpoint>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let prober = Prober::new(transport, config.request_timeout, config.latency_threshold);

        Ok(Self {
            config,
            endpoints,
            prober,
            stats: StatsAggregator::new(),
        })
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    /// Run until interrupted with Ctrl-C
    pub async fn start(&mut self) -> Result<()> {
        info!(
            "Monitoring {} endpoints every {}s (timeout {}ms, latency threshold {}ms)",
            self.endpoints.len(),
            self.config.check_interval.as_secs_f64(),
            self.config.request_timeout.as_millis(),
            self.config.latency_threshold.as_millis()
        );

        self.run_until_signal(tokio::signal::ctrl_c()).await
    }

    /// Run until `signal` resolves.
    ///
    /// If the listener itself fails, the loop stops and the failure is returned.
    pub async fn run_until_signal<S>(&mut self, signal: S) -> Result<()>
    where
        S: Future<Output = std::io::Result<()>>,
    {
        let mut signal_error = None;
        let shutdown = async {
            if let Err(e) = signal.await {
                signal_error = Some(e);
            }
        };

        let cycles = self.run_until(shutdown).await;
        debug!("Completed {} cycles", cycles);

        match signal_error {
            Some(e) => Err(MonitorError::Other(format!(
                "Failed to wait for shutdown signal: {}",
                e
            ))),
            None => {
                info!("Monitoring stopped by user.");
                Ok(())
            }
        }
    }

    /// Run cycles back to back on the schedule until `shutdown` resolves.
    ///
    /// Shutdown is observed both mid-cycle and while sleeping; an abandoned
    /// probe is simply not recorded. Returns the number of completed cycles.
    pub async fn run_until<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut schedule = Schedule::new(Instant::now(), self.config.check_interval);
        let mut cycles = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                summary = self.run_cycle() => {
                    cycles += 1;
                    debug!(
                        "Cycle {} finished in {:.2}s: {} probed, {} up, {} skipped",
                        cycles,
                        summary.duration.as_secs_f64(),
                        summary.probed,
                        summary.up,
                        summary.skipped
                    );
                }
            }

            schedule.advance();
            let pause = schedule.sleep_duration(Instant::now());
            if pause.is_zero() {
                warn!(
                    "Cycle overran the {}s interval, starting next cycle immediately",
                    self.config.check_interval.as_secs_f64()
                );
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(pause) => {}
            }
        }

        cycles
    }

    /// Probe every endpoint once, in order, then log the cumulative report
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) -> CycleSummary {
        let cycle_start = Instant::now();
        let mut summary = CycleSummary {
            probed: 0,
            up: 0,
            skipped: 0,
            duration: Duration::ZERO,
        };

        for entry in &self.endpoints {
            let endpoint = match entry {
                ConfiguredEndpoint::Ready(endpoint) => endpoint,
                ConfiguredEndpoint::MissingUrl { position } => {
                    warn!("Skipping endpoint with missing URL (entry {})", position + 1);
                    summary.skipped += 1;
                    continue;
                }
            };

            let domain = extract_domain(&endpoint.url);
            let result = self.prober.probe(endpoint).await;

            self.stats.record(domain, result.is_up);
            summary.probed += 1;
            if result.is_up {
                summary.up += 1;
            }
        }

        self.log_report();

        summary.duration = cycle_start.elapsed();
        summary
    }

    fn log_report(&self) {
        info!("--- Availability Report ---");
        for line in self.stats.report() {
            info!("{} - Availability: {:.2}%", line.domain, line.availability);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainKey;
    use crate::transport::{ProbeRequest, TransportResponse};
    use crate::types::Endpoint;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies per URL with a scripted sequence of (status, latency) pairs.
    ///
    /// Latency is spent with `tokio::time::sleep`, so paused-clock tests can
    /// model slow cycles without waiting.
    #[derive(Default)]
    struct ScriptedTransport {
        scripts: Mutex<HashMap<String, Vec<(u16, Duration)>>>,
        sent_at: Mutex<Vec<(String, Instant)>>,
    }

    impl ScriptedTransport {
        fn script(self, url: &str, replies: &[(u16, u64)]) -> Self {
            let replies = replies
                .iter()
                .rev()
                .map(|&(status, millis)| (status, Duration::from_millis(millis)))
                .collect();
            self.scripts.lock().unwrap().insert(url.to_string(), replies);
            self
        }

        fn sent_at(&self) -> Vec<Instant> {
            self.sent_at.lock().unwrap().iter().map(|(_, at)| *at).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ProbeRequest<'_>) -> Result<TransportResponse> {
            self.sent_at
                .lock()
                .unwrap()
                .push((request.url.to_string(), Instant::now()));

            let next = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(request.url)
                .and_then(|replies| replies.pop());

            let Some((status_code, elapsed)) = next else {
                return Err(MonitorError::Transport("connection refused".to_string()));
            };

            sleep(elapsed).await;
            Ok(TransportResponse { status_code, elapsed })
        }
    }

    fn ready(url: &str) -> ConfiguredEndpoint {
        ConfiguredEndpoint::Ready(Endpoint::new(url))
    }

    fn monitor(endpoints: Vec<ConfiguredEndpoint>, transport: Arc<ScriptedTransport>) -> Monitor {
        Monitor::with_transport(MonitorConfig::default(), endpoints, transport).unwrap()
    }

    #[test]
    fn test_schedule_ignores_cycle_duration() {
        let t0 = Instant::now();
        let mut schedule = Schedule::new(t0, Duration::from_secs(15));
        assert_eq!(schedule.next_run(), t0);

        // first cycle overruns: 20s of work against a 15s interval
        let next = schedule.advance();
        assert_eq!(next, t0 + Duration::from_secs(15));
        assert_eq!(schedule.sleep_duration(t0 + Duration::from_secs(20)), Duration::ZERO);

        // second cycle is short; target is still anchored to t0
        let next = schedule.advance();
        assert_eq!(next, t0 + Duration::from_secs(30));
        assert_eq!(
            schedule.sleep_duration(t0 + Duration::from_secs(21)),
            Duration::from_secs(9)
        );
    }

    #[test]
    fn test_schedule_never_skips_ticks() {
        let t0 = Instant::now();
        let mut schedule = Schedule::new(t0, Duration::from_secs(15));

        // however late cycles finish, each advance moves exactly one interval
        for k in 1..=4u32 {
            let next = schedule.advance();
            assert_eq!(next, t0 + Duration::from_secs(15) * k);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = MonitorConfig {
            check_interval: Duration::ZERO,
            ..MonitorConfig::default()
        };
        let result = Monitor::with_transport(config, vec![], Arc::new(ScriptedTransport::default()));
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_huge_interval_is_rejected() {
        let config = MonitorConfig {
            check_interval: Duration::from_secs(u64::MAX),
            ..MonitorConfig::default()
        };
        let result = Monitor::with_transport(config, vec![], Arc::new(ScriptedTransport::default()));
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_signal_listener_stops_with_error() {
        let mut monitor = monitor(
            vec![ready("https://a.example/")],
            Arc::new(ScriptedTransport::default()),
        );

        let result = monitor
            .run_until_signal(async { Err(std::io::Error::other("no signal handler")) })
            .await;

        assert!(matches!(result, Err(MonitorError::Other(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_stops_loop_cleanly() {
        let transport = Arc::new(
            ScriptedTransport::default().script("https://a.example/", &[(200, 10), (200, 10)]),
        );
        let mut monitor = monitor(vec![ready("https://a.example/")], transport);

        let result = monitor
            .run_until_signal(async {
                sleep(Duration::from_secs(20)).await;
                Ok(())
            })
            .await;

        assert!(result.is_ok());
        let stats = monitor.stats().get(&DomainKey::Host("a.example".to_string()));
        assert_eq!(stats.map(|s| s.total), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_domain_availability_over_two_cycles() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script("https://example.com/a", &[(200, 40), (200, 40)])
                .script("https://example.com/b", &[(503, 40), (204, 40)]),
        );
        let mut monitor = monitor(
            vec![ready("https://example.com/a"), ready("https://example.com/b")],
            transport,
        );
        let key = DomainKey::Host("example.com".to_string());

        let first = monitor.run_cycle().await;
        assert_eq!(first.probed, 2);
        assert_eq!(first.up, 1);
        assert_eq!(format!("{:.2}", monitor.stats().report()[0].availability), "50.00");

        monitor.run_cycle().await;
        let stats = monitor.stats().get(&key).unwrap();
        assert_eq!((stats.up, stats.total), (3, 4));
        assert_eq!(format!("{:.2}", stats.availability()), "75.00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_contained_within_the_cycle() {
        let transport = Arc::new(
            ScriptedTransport::default().script("https://good.example/", &[(200, 10)]),
        );
        let mut monitor = monitor(
            vec![
                ready("https://down.example/"),
                ConfiguredEndpoint::MissingUrl { position: 1 },
                ConfiguredEndpoint::Ready(
                    Endpoint::new("https://bad-body.example/").with_body("{oops: [1"),
                ),
                ready("https://good.example/"),
            ],
            transport.clone(),
        );

        let summary = monitor.run_cycle().await;
        assert_eq!(summary.probed, 3);
        assert_eq!(summary.up, 1);
        assert_eq!(summary.skipped, 1);

        // the malformed body never reaches the transport
        assert_eq!(transport.sent_at().len(), 2);

        let domains: Vec<String> = monitor
            .stats()
            .report()
            .iter()
            .map(|line| format!("{} {:.2}", line.domain, line.availability))
            .collect();
        assert_eq!(
            domains,
            vec!["down.example 0.00", "bad-body.example 0.00", "good.example 100.00"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_url_is_logged_as_one_warning() {
        let (logs, _guard) = crate::logging::capture::CapturedLogs::install();
        let transport = Arc::new(
            ScriptedTransport::default().script("https://good.example/", &[(200, 10)]),
        );
        let mut monitor = monitor(
            vec![
                ConfiguredEndpoint::MissingUrl { position: 0 },
                ready("https://good.example/"),
            ],
            transport,
        );

        monitor.run_cycle().await;

        assert_eq!(
            logs.at_level("WARN"),
            vec!["Skipping endpoint with missing URL (entry 1)"]
        );
        assert!(logs.at_level("ERROR").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_cycle_keeps_original_cadence() {
        // cycle 1 takes 20s, later cycles take 1s; interval is 15s
        let transport = Arc::new(ScriptedTransport::default().script(
            "https://slow.example/",
            &[(200, 20_000), (200, 1_000), (200, 1_000)],
        ));
        let mut monitor = monitor(vec![ready("https://slow.example/")], transport.clone());

        let t0 = Instant::now();
        let cycles = monitor
            .run_until(tokio::time::sleep_until(t0 + Duration::from_secs(40)))
            .await;

        assert_eq!(cycles, 3);
        assert_eq!(
            transport.sent_at(),
            vec![
                t0,
                // next target t0+15 already passed: no pause
                t0 + Duration::from_secs(20),
                // anchored to t0+30, not to the t0+21 completion
                t0 + Duration::from_secs(30),
            ]
        );
    }

    #[tokio::test]
    async fn test_cycle_against_live_server() {
        use wiremock::matchers::path;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let yaml = format!(
            "- url: {0}/ok\n- url: {0}/broken\n- url: {0}/slow\n- method: GET\n",
            server.uri()
        );
        let endpoints = crate::config::parse_endpoints(&yaml).unwrap();
        let mut monitor = Monitor::new(MonitorConfig::default(), endpoints).unwrap();

        let summary = monitor.run_cycle().await;
        assert_eq!(summary.probed, 3);
        assert_eq!(summary.up, 1);
        assert_eq!(summary.skipped, 1);

        let report = monitor.stats().report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].domain, DomainKey::Host("127.0.0.1".to_string()));
        assert_eq!((report[0].up, report[0].total), (1, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_in_flight_cycle() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .script("https://a.example/", &[(200, 100)])
                .script("https://b.example/", &[(200, 10_000)]),
        );
        let mut monitor = monitor(
            vec![ready("https://a.example/"), ready("https://b.example/")],
            transport,
        );

        let cycles = monitor
            .run_until(tokio::time::sleep(Duration::from_secs(1)))
            .await;

        assert_eq!(cycles, 0);
        // the finished probe is kept, the abandoned one is not recorded
        assert_eq!(monitor.stats().len(), 1);
        assert_eq!(
            monitor.stats().get(&DomainKey::Host("a.example".to_string())),
            Some(crate::stats::DomainStats { up: 1, total: 1 })
        );
    }
}
