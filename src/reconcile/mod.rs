//! Liveness-driven reconciliation of ad-list subscriptions.
//!
//! Every candidate address is probed once. Live addresses are enabled or
//! created remotely and reported; redirecting and dead addresses get their
//! entries disabled. Redirect targets are chased through the same worklist.

pub mod diagnostic;
pub mod worklist;

use std::collections::{BTreeSet, HashMap};

use url::Url;

use crate::app::{AppError, Result};
use crate::domain::AdListEntry;
use crate::probe::{Liveness, LivenessProbe};
use crate::remote::RemoteListService;

pub use diagnostic::{Action, Diagnostic};
pub use worklist::Worklist;

pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub probed: usize,
    pub created: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub failed: usize,
}

impl ReconcileStats {
    pub fn mutations(&self) -> usize {
        self.created + self.enabled + self.disabled
    }
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Live addresses, sorted.
    pub valid: Vec<String>,
    /// In the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ReconcileStats,
}

pub struct UrlReconciler<'a, R: ?Sized, P: ?Sized> {
    remote: &'a mut R,
    probe: &'a P,
    max_redirect_hops: usize,
    dry_run: bool,
}

impl<'a, R, P> UrlReconciler<'a, R, P>
where
    R: RemoteListService + ?Sized,
    P: LivenessProbe + ?Sized,
{
    pub fn new(remote: &'a mut R, probe: &'a P) -> Self {
        Self {
            remote,
            probe,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            dry_run: false,
        }
    }

    pub fn max_redirect_hops(mut self, hops: usize) -> Self {
        self.max_redirect_hops = hops;
        self
    }

    /// Classify and report without touching the remote service.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fetch the current entries from the remote service, then reconcile
    /// them together with `seed`.
    pub async fn reconcile_remote<I>(&mut self, seed: I) -> Result<ReconcileReport>
    where
        I: IntoIterator<Item = String>,
    {
        let entries = self.remote.list_entries().await?;
        tracing::info!("Remote service has {} ad-list entries", entries.len());
        self.reconcile(entries, seed).await
    }

    /// Probe every address in `seed` and `entries` and push the observed
    /// state back to the remote service.
    ///
    /// Per-address failures end up in [`ReconcileReport::diagnostics`]; only
    /// fatal remote errors are returned.
    pub async fn reconcile<I>(
        &mut self,
        entries: Vec<AdListEntry>,
        seed: I,
    ) -> Result<ReconcileReport>
    where
        I: IntoIterator<Item = String>,
    {
        // Addresses are not unique remotely, so keep every entry per address.
        let mut known: HashMap<String, Vec<AdListEntry>> = HashMap::new();
        for entry in entries {
            known.entry(entry.address.clone()).or_default().push(entry);
        }

        let mut worklist: Worklist = seed.into_iter().chain(known.keys().cloned()).collect();
        let mut valid = BTreeSet::new();
        let mut report = ReconcileReport::default();

        tracing::debug!("Worklist starts with {} addresses", worklist.len());

        while let Some((address, hops)) = worklist.pop_any() {
            report.stats.probed += 1;
            let liveness = self.probe.check(&address).await;
            tracing::debug!("{} -> {:?}", address, liveness);

            match liveness {
                Liveness::Live => {
                    match known.get_mut(&address) {
                        Some(existing) => {
                            for entry in existing.iter_mut().filter(|e| !e.enabled) {
                                self.set_enabled(entry, true, &mut report).await?;
                            }
                        }
                        None => self.create(&address, &mut report).await?,
                    }
                    valid.insert(address);
                }
                Liveness::Redirect { location, status } => {
                    self.disable_all(known.get_mut(&address), &mut report).await?;

                    if !is_absolute(&location) {
                        report.diagnostics.push(Diagnostic::InvalidRedirect {
                            address,
                            status,
                            location,
                        });
                    } else if hops + 1 > self.max_redirect_hops {
                        report.diagnostics.push(Diagnostic::RedirectLimit {
                            address,
                            location,
                            hops: hops + 1,
                        });
                    } else if !worklist.push(location.clone(), hops + 1) {
                        tracing::debug!("Redirect target {} already queued or checked", location);
                    }
                }
                Liveness::Dead(reason) => {
                    self.disable_all(known.get_mut(&address), &mut report).await?;
                    report
                        .diagnostics
                        .push(Diagnostic::Invalid { address, reason });
                }
            }
        }

        report.valid = valid.into_iter().collect();

        tracing::info!(
            "Reconciled {} addresses: {} live, {} created, {} enabled, {} disabled, {} failed",
            report.stats.probed,
            report.valid.len(),
            report.stats.created,
            report.stats.enabled,
            report.stats.disabled,
            report.stats.failed
        );

        Ok(report)
    }

    async fn disable_all(
        &mut self,
        existing: Option<&mut Vec<AdListEntry>>,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        if let Some(existing) = existing {
            for entry in existing.iter_mut().filter(|e| e.enabled) {
                self.set_enabled(entry, false, report).await?;
            }
        }
        Ok(())
    }

    async fn set_enabled(
        &mut self,
        entry: &mut AdListEntry,
        enabled: bool,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let action = Action::for_flag(enabled);

        if self.dry_run {
            tracing::info!("Would {} entry {} ({})", action, entry.id, entry.address);
        } else {
            let result = self
                .remote
                .set_enabled(
                    entry.id,
                    enabled,
                    entry.comment.as_deref(),
                    entry.groups.as_deref(),
                )
                .await;

            if let Err(e) = result {
                return self.record_failure(&entry.address, action, e, report);
            }
            tracing::info!("{}d entry {} ({})", action, entry.id, entry.address);
        }

        entry.enabled = enabled;
        if enabled {
            report.stats.enabled += 1;
        } else {
            report.stats.disabled += 1;
        }
        Ok(())
    }

    async fn create(&mut self, address: &str, report: &mut ReconcileReport) -> Result<()> {
        if self.dry_run {
            tracing::info!("Would create entry for {}", address);
        } else {
            if let Err(e) = self.remote.create_entry(address).await {
                return self.record_failure(address, Action::Create, e, report);
            }
            tracing::info!("Created entry for {}", address);
        }

        report.stats.created += 1;
        Ok(())
    }

    fn record_failure(
        &self,
        address: &str,
        action: Action,
        error: AppError,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        if error.is_fatal() {
            return Err(error);
        }

        tracing::warn!("Could not {} {}: {}", action, address, error);
        report.stats.failed += 1;
        report.diagnostics.push(match error {
            AppError::Lookup(_) => Diagnostic::Lookup {
                address: address.to_string(),
                error: error.to_string(),
            },
            other => Diagnostic::MutationFailed {
                address: address.to_string(),
                action,
                error: other.to_string(),
            },
        });
        Ok(())
    }
}

fn is_absolute(location: &str) -> bool {
    Url::parse(location)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::DeadReason;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Create(String),
        SetEnabled(i64, bool),
    }

    /// In-memory remote that behaves like the real service for state.
    #[derive(Default)]
    struct FakeRemote {
        entries: Vec<AdListEntry>,
        calls: Vec<Call>,
        reject_create: bool,
        missing_ids: Vec<i64>,
        fail_list: bool,
        lose_session: bool,
    }

    impl FakeRemote {
        fn with(entries: Vec<AdListEntry>) -> Self {
            Self {
                entries,
                ..Default::default()
            }
        }

        fn mutations(&self) -> Vec<Call> {
            self.calls
                .iter()
                .filter(|c| **c != Call::List)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl RemoteListService for FakeRemote {
        async fn list_entries(&mut self) -> Result<Vec<AdListEntry>> {
            self.calls.push(Call::List);
            if self.fail_list {
                return Err(AppError::Auth("session token lost".into()));
            }
            Ok(self.entries.clone())
        }

        async fn create_entry(&mut self, address: &str) -> Result<()> {
            self.calls.push(Call::Create(address.to_string()));
            if self.lose_session {
                return Err(AppError::Auth("session token lost".into()));
            }
            if self.reject_create || self.entries.iter().any(|e| e.address == address) {
                return Err(AppError::RemoteMutation("already exists".into()));
            }
            let id = self.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            self.entries.push(AdListEntry::new(id, address, true));
            Ok(())
        }

        async fn set_enabled(
            &mut self,
            id: i64,
            enabled: bool,
            _comment: Option<&str>,
            _groups: Option<&[i64]>,
        ) -> Result<()> {
            self.calls.push(Call::SetEnabled(id, enabled));
            if self.missing_ids.contains(&id) {
                return Err(AppError::Lookup(id.to_string()));
            }
            let entry = self
                .entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| AppError::Lookup(id.to_string()))?;
            entry.enabled = enabled;
            Ok(())
        }
    }

    /// Unknown addresses answer 404.
    #[derive(Default)]
    struct FakeProbe {
        outcomes: HashMap<String, Liveness>,
        checked: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn with(outcomes: &[(&str, Liveness)]) -> Self {
            Self {
                outcomes: outcomes
                    .iter()
                    .map(|(u, l)| (u.to_string(), l.clone()))
                    .collect(),
                checked: Mutex::new(Vec::new()),
            }
        }

        fn checked(&self) -> Vec<String> {
            self.checked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LivenessProbe for FakeProbe {
        async fn check(&self, url: &str) -> Liveness {
            self.checked.lock().unwrap().push(url.to_string());
            self.outcomes
                .get(url)
                .cloned()
                .unwrap_or(Liveness::Dead(DeadReason::Status(404)))
        }
    }

    fn redirect(location: &str) -> Liveness {
        Liveness::Redirect {
            location: location.to_string(),
            status: 301,
        }
    }

    fn seed(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_live_without_entry_is_created() {
        let mut remote = FakeRemote::default();
        let probe = FakeProbe::with(&[("http://a.example/list", Liveness::Live)]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile(vec![], seed(&["http://a.example/list"]))
            .await
            .unwrap();

        assert_eq!(report.valid, vec!["http://a.example/list"]);
        assert_eq!(
            remote.mutations(),
            vec![Call::Create("http://a.example/list".into())]
        );
        assert!(report.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_live_disabled_entry_is_enabled_once() {
        let mut remote = FakeRemote::with(vec![AdListEntry::new(4, "http://a.example/", false)]);
        let probe = FakeProbe::with(&[("http://a.example/", Liveness::Live)]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(seed(&["http://a.example/"]))
            .await
            .unwrap();

        assert_eq!(report.valid, vec!["http://a.example/"]);
        assert_eq!(remote.mutations(), vec![Call::SetEnabled(4, true)]);
        assert_eq!(report.stats.enabled, 1);
    }

    #[tokio::test]
    async fn test_live_enabled_entry_is_left_alone() {
        let mut remote = FakeRemote::with(vec![AdListEntry::new(1, "http://a.example/", true)]);
        let probe = FakeProbe::with(&[("http://a.example/", Liveness::Live)]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(Vec::new())
            .await
            .unwrap();

        assert_eq!(report.valid, vec!["http://a.example/"]);
        assert!(remote.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_dead_enabled_entry_is_disabled() {
        let mut remote = FakeRemote::with(vec![AdListEntry::new(2, "http://b.example/", true)]);
        let probe = FakeProbe::default();

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(seed(&["http://b.example/"]))
            .await
            .unwrap();

        assert!(report.valid.is_empty());
        assert_eq!(remote.mutations(), vec![Call::SetEnabled(2, false)]);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::Invalid {
                address: "http://b.example/".into(),
                reason: DeadReason::Status(404),
            }]
        );
    }

    #[tokio::test]
    async fn test_probe_error_counts_as_dead() {
        let mut remote = FakeRemote::with(vec![AdListEntry::new(2, "http://b.example/", false)]);
        let probe = FakeProbe::with(&[(
            "http://b.example/",
            Liveness::Dead(DeadReason::Error("timed out".into())),
        )]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(Vec::new())
            .await
            .unwrap();

        // already disabled, nothing to push
        assert!(remote.mutations().is_empty());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            report.diagnostics[0].to_string(),
            "!! Invalid (timed out): http://b.example/"
        );
    }

    #[tokio::test]
    async fn test_redirect_is_chased_and_target_created() {
        let mut remote = FakeRemote::default();
        let probe = FakeProbe::with(&[
            ("http://c.example/", redirect("http://d.example/")),
            ("http://d.example/", Liveness::Live),
        ]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile(vec![], seed(&["http://c.example/"]))
            .await
            .unwrap();

        assert_eq!(report.valid, vec!["http://d.example/"]);
        assert_eq!(
            remote.mutations(),
            vec![Call::Create("http://d.example/".into())]
        );
    }

    #[tokio::test]
    async fn test_redirect_disables_source_entry() {
        let mut remote = FakeRemote::with(vec![
            AdListEntry::new(1, "http://old.example/", true),
            AdListEntry::new(2, "http://new.example/", true),
        ]);
        let probe = FakeProbe::with(&[
            ("http://old.example/", redirect("http://new.example/")),
            ("http://new.example/", Liveness::Live),
        ]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(Vec::new())
            .await
            .unwrap();

        assert_eq!(report.valid, vec!["http://new.example/"]);
        assert_eq!(remote.mutations(), vec![Call::SetEnabled(1, false)]);
        // target already in the worklist, probed only once
        let checked = probe.checked();
        assert_eq!(
            checked.iter().filter(|u| *u == "http://new.example/").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_relative_redirect_is_reported_and_dropped() {
        let mut remote = FakeRemote::default();
        let probe = FakeProbe::with(&[(
            "http://c.example/",
            Liveness::Redirect {
                location: "/login".into(),
                status: 302,
            },
        )]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile(vec![], seed(&["http://c.example/"]))
            .await
            .unwrap();

        assert!(report.valid.is_empty());
        assert_eq!(probe.checked(), vec!["http://c.example/"]);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::InvalidRedirect {
                address: "http://c.example/".into(),
                status: 302,
                location: "/login".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_redirect_cycle_terminates() {
        let mut remote = FakeRemote::default();
        let probe = FakeProbe::with(&[
            ("http://x.example/", redirect("http://y.example/")),
            ("http://y.example/", redirect("http://x.example/")),
        ]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile(vec![], seed(&["http://x.example/"]))
            .await
            .unwrap();

        assert!(report.valid.is_empty());
        assert_eq!(report.stats.probed, 2);
        assert!(remote.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_redirect_chain_stops_at_hop_limit() {
        let outcomes: Vec<(String, Liveness)> = (0..5)
            .map(|i| {
                (
                    format!("http://hop{}.example/", i),
                    redirect(&format!("http://hop{}.example/", i + 1)),
                )
            })
            .collect();
        let outcomes: Vec<(&str, Liveness)> = outcomes
            .iter()
            .map(|(u, l)| (u.as_str(), l.clone()))
            .collect();
        let mut remote = FakeRemote::default();
        let probe = FakeProbe::with(&outcomes);

        let report = UrlReconciler::new(&mut remote, &probe)
            .max_redirect_hops(2)
            .reconcile(vec![], seed(&["http://hop0.example/"]))
            .await
            .unwrap();

        assert_eq!(report.stats.probed, 3);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::RedirectLimit {
                address: "http://hop2.example/".into(),
                location: "http://hop3.example/".into(),
                hops: 3,
            }]
        );
    }

    #[tokio::test]
    async fn test_second_run_issues_no_mutations() {
        let mut remote = FakeRemote::with(vec![
            AdListEntry::new(1, "http://live.example/", false),
            AdListEntry::new(2, "http://dead.example/", true),
            AdListEntry::new(3, "http://moved.example/", true),
        ]);
        let probe = FakeProbe::with(&[
            ("http://live.example/", Liveness::Live),
            ("http://moved.example/", redirect("http://target.example/")),
            ("http://target.example/", Liveness::Live),
            ("http://fresh.example/", Liveness::Live),
        ]);
        let seeds = seed(&["http://fresh.example/", "http://dead.example/"]);

        let first = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(seeds.clone())
            .await
            .unwrap();
        assert_eq!(first.stats.mutations(), 5);

        let calls_before = remote.mutations().len();
        let second = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(seeds)
            .await
            .unwrap();

        assert_eq!(second.stats.mutations(), 0);
        assert_eq!(remote.mutations().len(), calls_before);
        assert_eq!(first.valid, second.valid);
        assert_eq!(
            second.valid,
            vec![
                "http://fresh.example/",
                "http://live.example/",
                "http://target.example/"
            ]
        );
    }

    #[tokio::test]
    async fn test_output_is_sorted() {
        let urls = ["http://z.example/", "http://a.example/", "http://m.example/"];
        let outcomes: Vec<(&str, Liveness)> = urls.iter().map(|u| (*u, Liveness::Live)).collect();
        let mut remote = FakeRemote::default();
        let probe = FakeProbe::with(&outcomes);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile(vec![], seed(&urls))
            .await
            .unwrap();

        assert_eq!(
            report.valid,
            vec!["http://a.example/", "http://m.example/", "http://z.example/"]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let mut remote = FakeRemote::with(vec![AdListEntry::new(9, "http://gone.example/", true)]);
        remote.reject_create = true;
        remote.missing_ids = vec![9];
        let probe = FakeProbe::with(&[
            ("http://new.example/", Liveness::Live),
            ("http://other.example/", Liveness::Live),
        ]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(seed(&["http://new.example/", "http://other.example/"]))
            .await
            .unwrap();

        assert_eq!(report.stats.probed, 3);
        assert_eq!(report.stats.failed, 3);
        // liveness was observed even though the create was rejected
        assert_eq!(
            report.valid,
            vec!["http://new.example/", "http://other.example/"]
        );
        assert!(report
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Lookup { address, .. } if address == "http://gone.example/")));
        assert!(report.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::MutationFailed {
                action: Action::Create,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_lost_session_is_fatal() {
        let mut remote = FakeRemote {
            lose_session: true,
            ..Default::default()
        };
        let probe = FakeProbe::with(&[("http://a.example/", Liveness::Live)]);

        let result = UrlReconciler::new(&mut remote, &probe)
            .reconcile(vec![], seed(&["http://a.example/"]))
            .await;

        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_listing_failure_reaches_caller() {
        let mut remote = FakeRemote {
            fail_list: true,
            ..FakeRemote::with(vec![AdListEntry::new(1, "http://a.example/", true)])
        };
        let checker = FakeProbe::with(&[("http://a.example/", Liveness::Live)]);

        let result = UrlReconciler::new(&mut remote, &checker)
            .reconcile_remote(seed(&["http://a.example/"]))
            .await;

        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(checker.checked().is_empty());
        assert!(remote.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_remote_addresses_all_follow_liveness() {
        let mut remote = FakeRemote::with(vec![
            AdListEntry::new(1, "http://dup.example/", true),
            AdListEntry::new(2, "http://dup.example/", true),
        ]);
        let probe = FakeProbe::default();

        UrlReconciler::new(&mut remote, &probe)
            .reconcile_remote(Vec::new())
            .await
            .unwrap();

        assert_eq!(
            remote.mutations(),
            vec![Call::SetEnabled(1, false), Call::SetEnabled(2, false)]
        );
        assert_eq!(probe.checked().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let mut remote = FakeRemote::with(vec![AdListEntry::new(2, "http://b.example/", true)]);
        let probe = FakeProbe::with(&[("http://a.example/", Liveness::Live)]);

        let report = UrlReconciler::new(&mut remote, &probe)
            .dry_run(true)
            .reconcile_remote(seed(&["http://a.example/"]))
            .await
            .unwrap();

        assert!(remote.mutations().is_empty());
        assert_eq!(report.stats.created, 1);
        assert_eq!(report.stats.disabled, 1);
        assert_eq!(report.valid, vec!["http://a.example/"]);
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("https://d.example/list.txt"));
        assert!(is_absolute("http://d.example"));
        assert!(!is_absolute("/relative/path"));
        assert!(!is_absolute("d.example/list"));
        assert!(!is_absolute("ftp://d.example/list"));
    }
}
