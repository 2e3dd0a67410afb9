//! End-to-end pipeline for one run.
//!
//! ```text
//! catalog ─► installer products ─► per product: server metadata + distribution
//!         ─► drop incompatible ─► select version ─► replicate packages
//!         ─► install hand-off (one full re-fetch on failure) ─► completion wait
//! ```
//!
//! Everything runs sequentially on the calling thread; use [`spawn_worker`]
//! to run it off the consumer's thread. The `running` flag is checked only
//! between phases, never during a download.

mod error;
mod report;
mod weights;
mod worker;

pub use error::RunError;
pub use report::ReplicationReport;
pub use weights::package_weights;
pub use worker::spawn_worker;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::catalog::{find_installer_products, Catalog, CatalogStore, Product};
use crate::context::RunContext;
use crate::descriptor::{parse_distribution, parse_server_metadata, DistributionInfo, ServerMetadata};
use crate::host::{host_darwin_major, HostMachine, MachineIdentity};
use crate::install::{CompletionWaiter, FlagCompletion, InstallError, InstallHandoff, InstallStep, VerifyAssets};
use crate::mirror::discover_mirror;
use crate::progress::{progress_percent, METADATA_WEIGHT, PRODUCT_INFO_WEIGHT, PRODUCT_WEIGHT};
use crate::replicate::AssetReplicator;
use crate::resolve::{latest_version, resolve, ProductInfo, ResolveError};

/// Overall progress added once the catalog has been parsed (percent).
const PARSED_MILESTONE_PERCENT: f64 = 1.0;

/// Overall progress added once the installer has been handed off (percent).
const HANDOFF_MILESTONE_PERCENT: f64 = 15.0;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub product_id: String,
    /// Human-readable product label.
    pub label: String,
    /// Replication of the product's packages that was handed off.
    pub report: ReplicationReport,
    /// Whether any asset had to be fetched a second time.
    pub refetched: bool,
}

/// Drives catalog resolution, replication and the install hand-off.
pub struct ReplicationOrchestrator {
    replicator: AssetReplicator,
    machine: Arc<dyn MachineIdentity>,
    install_step: Arc<dyn InstallStep>,
    completion: Arc<dyn CompletionWaiter>,
    darwin_major: Option<u32>,
    mirror_locator: fn() -> Option<String>,
}

impl std::fmt::Debug for ReplicationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationOrchestrator")
            .field("replicator", &self.replicator)
            .field("darwin_major", &self.darwin_major)
            .finish_non_exhaustive()
    }
}

impl ReplicationOrchestrator {
    /// Create an orchestrator with host defaults: machine model from the
    /// host, Darwin version from `uname`, file verification as install step
    /// and flag-based completion.
    pub fn new(replicator: AssetReplicator) -> Self {
        Self {
            replicator,
            machine: Arc::new(HostMachine),
            install_step: Arc::new(VerifyAssets),
            completion: Arc::new(FlagCompletion::default()),
            darwin_major: host_darwin_major(),
            mirror_locator: discover_mirror,
        }
    }

    /// Use a different machine identity.
    pub fn with_machine(mut self, machine: Arc<dyn MachineIdentity>) -> Self {
        self.machine = machine;
        self
    }

    /// Use a different install step.
    pub fn with_install_step(mut self, step: Arc<dyn InstallStep>) -> Self {
        self.install_step = step;
        self
    }

    /// Use a different completion waiter.
    pub fn with_completion(mut self, completion: Arc<dyn CompletionWaiter>) -> Self {
        self.completion = completion;
        self
    }

    /// Override the host Darwin major version used to pick the catalog.
    pub fn with_darwin_major(mut self, major: Option<u32>) -> Self {
        self.darwin_major = major;
        self
    }

    /// Use a different caching server locator.
    pub fn with_mirror_locator(mut self, locator: fn() -> Option<String>) -> Self {
        self.mirror_locator = locator;
        self
    }

    /// Run the whole pipeline.
    pub fn run(&self, ctx: &RunContext) -> Result<RunOutcome, RunError> {
        let (catalog, infos) = self.discover(ctx)?;

        checkpoint(ctx)?;
        let target = match ctx.config().target_version {
            Some(ref target) => {
                info!(target = %target, "Using requested version");
                target.clone()
            }
            None => {
                let latest = latest_version(infos.values())?;
                info!(target = %latest, "Using latest version");
                latest
            }
        };

        let product_id = resolve(infos.values(), &target)?;
        let (Some(info), Some(product)) = (infos.get(&product_id), catalog.product(&product_id))
        else {
            return Err(ResolveError::NotFound { target }.into());
        };
        let label = info.label();
        ctx.overall_text(format!("Found macOS Product ID: {}", product_id));
        ctx.version_text(label.clone());

        checkpoint(ctx)?;
        ctx.reset_stage_progress();
        ctx.overall_text(format!("Downloading packages for: {}", label));
        let mirror = self.mirror(ctx);

        let mut report = self.replicate_product(ctx, product, mirror.as_deref());
        ctx.show_indeterminate();
        ctx.overall_text("All Download Tasks Complete!");

        checkpoint(ctx)?;
        ctx.overall_text("Creating macOS installer...");
        let mut refetched = false;
        if let Err(e) = self.hand_off(ctx, info, &report) {
            warn!(error = %e, "Product installation failed. Redownloading.");
            ctx.overall_text("Product installation failed. Redownloading.");
            refetched = true;
            report = self.replicate_product(ctx, product, mirror.as_deref());
            self.hand_off(ctx, info, &report)?;
        }

        ctx.overall_text("Installer downloaded and staged.");
        ctx.overall_progress(progress_percent(HANDOFF_MILESTONE_PERCENT));

        if ctx.config().installer_only || !self.install_step.awaits_completion() {
            ctx.overall_text("Done!");
        } else {
            ctx.overall_text("Waiting for the installer to signal completion...");
            self.completion.wait(ctx);
        }

        Ok(RunOutcome {
            product_id,
            label,
            report,
            refetched,
        })
    }

    /// Download and parse the catalog and return every installer product
    /// compatible with this machine, keyed by product id.
    pub fn candidates(&self, ctx: &RunContext) -> Result<BTreeMap<String, ProductInfo>, RunError> {
        self.discover(ctx).map(|(_, infos)| infos)
    }

    fn discover(
        &self,
        ctx: &RunContext,
    ) -> Result<(Catalog, BTreeMap<String, ProductInfo>), RunError> {
        checkpoint(ctx)?;
        ctx.overall_text("Downloading list of latest macOS installers...");
        let url = CatalogStore::catalog_url(ctx.config(), self.darwin_major)?;
        let catalog = CatalogStore::new(self.replicator.clone()).load_catalog(ctx, &url)?;

        checkpoint(ctx)?;
        ctx.overall_text("Parsing list...");
        let installers = find_installer_products(&catalog);
        debug!(count = installers.len(), "Installer products");

        let model = self.machine_model(ctx);
        let mut infos = BTreeMap::new();
        for id in installers {
            checkpoint(ctx)?;
            let Some(product) = catalog.product(&id) else {
                continue;
            };
            if let Some(info) = self.product_info(ctx, product, model.as_deref()) {
                infos.insert(id, info);
            }
        }

        ctx.overall_progress(progress_percent(PARSED_MILESTONE_PERCENT));

        if infos.is_empty() {
            return Err(RunError::NoInstallerProducts);
        }
        Ok((catalog, infos))
    }

    /// Replicate every package of `product`. Failures are recorded in the
    /// report and do not stop the remaining packages.
    pub fn replicate_product(
        &self,
        ctx: &RunContext,
        product: &Product,
        mirror: Option<&str>,
    ) -> ReplicationReport {
        let root = &ctx.config().workdir;
        let weights = package_weights(&product.packages, PRODUCT_WEIGHT);
        let mut report = ReplicationReport::new();

        ctx.reset_stage_progress();
        for (package, weight) in product.packages.iter().zip(weights) {
            ctx.reset_stage_progress();
            debug!(
                size = package.size,
                total = product.total_size(),
                weight,
                "Package"
            );

            let sources = package
                .url
                .iter()
                .map(|url| (url, weight))
                .chain(package.metadata_url.iter().map(|url| (url, 0.0)));

            for (url, weight) in sources {
                match self.replicator.replicate(ctx, url, weight, root, mirror) {
                    Ok(path) => report.record_success(path),
                    Err(e) => {
                        error!(url = %url, error = %e, "Could not replicate");
                        report.record_failure(url.as_str());
                    }
                }
            }
        }

        report
    }

    /// Fetch and parse one product's descriptors; `None` when the product
    /// does not support `model`.
    fn product_info(&self, ctx: &RunContext, product: &Product, model: Option<&str>) -> Option<ProductInfo> {
        let root = &ctx.config().workdir;
        ctx.reset_stage_progress();

        let metadata = match product.server_metadata_url {
            Some(ref url) => match self.replicator.replicate(ctx, url, METADATA_WEIGHT, root, None) {
                Ok(path) => parse_server_metadata(&path),
                Err(e) => {
                    error!(url = %url, error = %e, "Could not replicate");
                    ServerMetadata::default()
                }
            },
            None => {
                warn!(product = %product.id, "Malformed catalog: no server metadata");
                ServerMetadata::default()
            }
        };

        let (distribution, distribution_path) = match product.distribution_url() {
            Some(url) => match self.replicator.replicate(ctx, url, PRODUCT_INFO_WEIGHT, root, None) {
                Ok(path) => (parse_distribution(&path), Some(path)),
                Err(e) => {
                    error!(url = %url, error = %e, "Could not replicate");
                    (DistributionInfo::default(), None)
                }
            },
            None => (DistributionInfo::default(), None),
        };

        if let Some(model) = model {
            if distribution.excludes(model) {
                debug!(product = %product.id, model, "Not compatible with this machine");
                return None;
            }
        }

        Some(ProductInfo::from_parts(
            product,
            metadata,
            distribution,
            distribution_path,
        ))
    }

    fn machine_model(&self, ctx: &RunContext) -> Option<String> {
        let model = ctx.config().machine_model.clone().or_else(|| self.machine.model());
        match model {
            Some(ref m) => debug!(model = %m, "Machine model"),
            None => warn!("Machine model unknown, compatibility filtering disabled"),
        }
        model
    }

    fn mirror(&self, ctx: &RunContext) -> Option<String> {
        let config = ctx.config();
        if config.mirror.is_some() {
            return config.mirror.clone();
        }
        if config.discover_mirror {
            debug!("Checking for caching server");
            return (self.mirror_locator)();
        }
        None
    }

    fn hand_off(
        &self,
        ctx: &RunContext,
        info: &ProductInfo,
        report: &ReplicationReport,
    ) -> Result<(), InstallError> {
        if report.has_failures() {
            return Err(InstallError::IncompleteReplication {
                failed: report.failure_count(),
            });
        }

        let handoff = InstallHandoff {
            product_id: info.id.clone(),
            label: info.label(),
            distribution_path: info.distribution_path.clone(),
            replicated: report.replicated.clone(),
        };
        self.install_step.install(ctx, &handoff)
    }
}

fn checkpoint(ctx: &RunContext) -> Result<(), RunError> {
    if ctx.is_running() {
        Ok(())
    } else {
        Err(RunError::Cancelled)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::Receiver;

    use tempfile::TempDir;

    use super::*;
    use crate::catalog::fixtures::CATALOG_XML;
    use crate::config::RunConfig;
    use crate::error::ErrorKind;
    use crate::events::{event_channel, RecordingSink, RunEvent};
    use crate::host::StaticMachine;
    use crate::replicate::mock::ScriptedTransport;

    const CATALOG_URL: &str = "http://origin.test/index.sucatalog";
    const SMD_URL: &str = "http://origin.test/041-91758/InstallAssistantAuto.smd";
    const DIST_URL: &str = "http://origin.test/041-91758/041-91758.English.dist";
    const ESD_URL: &str = "http://origin.test/041-91758/InstallESDDmg.pkg";
    const ESD_META_URL: &str = "http://origin.test/041-91758/InstallESDDmg.pkm";
    const AUTO_URL: &str = "http://origin.test/041-91758/InstallAssistantAuto.pkg";

    const SMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>CFBundleShortVersionString</key>
    <string>10.15.1</string>
    <key>localization</key>
    <dict>
        <key>English</key>
        <dict>
            <key>title</key>
            <string>macOS Catalina</string>
        </dict>
    </dict>
</dict>
</plist>
"#;

    const DIST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<installer-gui-script minSpecVersion="2">
    <script><![CDATA[
var nonSupportedModels = ['MacBookPro9,2','MacBookAir5,1'];
]]></script>
</installer-gui-script>
"#;

    fn transport() -> ScriptedTransport {
        ScriptedTransport::new()
            .with_body(CATALOG_URL, CATALOG_XML.as_bytes().to_vec())
            .with_body(SMD_URL, SMD.as_bytes().to_vec())
            .with_body(DIST_URL, DIST.as_bytes().to_vec())
            .with_body(ESD_URL, vec![1u8; 3_000_000])
            .with_body(ESD_META_URL, b"<pkm/>".to_vec())
            .with_body(AUTO_URL, vec![2u8; 7_000_000])
    }

    fn context(temp: &TempDir, config: impl FnOnce(RunConfig) -> RunConfig) -> (RunContext, Receiver<RunEvent>) {
        let (sender, receiver) = event_channel();
        let config = config(
            RunConfig::new(temp.path().to_path_buf())
                .with_catalog_url(CATALOG_URL)
                .with_discover_mirror(false)
                .with_installer_only(true),
        );
        (RunContext::new(config, sender), receiver)
    }

    fn orchestrator(transport: Arc<ScriptedTransport>) -> ReplicationOrchestrator {
        ReplicationOrchestrator::new(AssetReplicator::new(transport))
            .with_machine(Arc::new(StaticMachine::new("MacBookPro15,1")))
            .with_darwin_major(Some(19))
            .with_mirror_locator(|| None)
    }

    fn recorded(receiver: &Receiver<RunEvent>) -> RecordingSink {
        RecordingSink {
            events: receiver.try_iter().collect(),
        }
    }

    /// Fails the first `failures` hand-offs, then succeeds.
    struct FlakyInstall {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyInstall {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl InstallStep for FlakyInstall {
        fn install(&self, _ctx: &RunContext, _handoff: &InstallHandoff) -> Result<(), InstallError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(InstallError::EmptyCommand)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_run_replicates_latest_installer() {
        let temp = TempDir::new().unwrap();
        let (ctx, receiver) = context(&temp, |c| c);
        let transport = Arc::new(transport());

        let outcome = orchestrator(Arc::clone(&transport)).run(&ctx).unwrap();

        assert_eq!(outcome.product_id, "041-91758");
        assert_eq!(outcome.label, "macOS Catalina 10.15.1 - Dated: 10-07-2019");
        assert!(!outcome.refetched);
        assert!(outcome.report.is_complete());
        assert_eq!(outcome.report.attempted, 3);

        let esd = temp.path().join("041-91758/InstallESDDmg.pkg");
        assert_eq!(std::fs::metadata(&esd).unwrap().len(), 3_000_000);
        assert!(temp.path().join("041-91758/InstallAssistantAuto.pkg").is_file());

        // catalog 2 + metadata 1 + distribution 2 + parsed 1 + packages 74 + hand-off 15
        let sink = recorded(&receiver);
        assert!((sink.overall_total() - 95.0).abs() < 1e-6);
        assert!(sink.fatal_error().is_none());
        assert!(sink
            .events
            .iter()
            .any(|e| matches!(e, RunEvent::VersionText(t) if t.contains("10.15.1"))));
    }

    #[test]
    fn test_target_version_not_found() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c.with_target_version("10.16"));

        let err = orchestrator(Arc::new(transport())).run(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "unable to find target version: 10.16");
    }

    #[test]
    fn test_incompatible_machine_has_no_candidates() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c);

        let err = orchestrator(Arc::new(transport()))
            .with_machine(Arc::new(StaticMachine::new("MacBookAir5,1")))
            .run(&ctx)
            .unwrap_err();
        assert!(matches!(err, RunError::NoInstallerProducts));
    }

    #[test]
    fn test_configured_model_overrides_host() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c.with_machine_model("MacBookPro9,2"));

        let err = orchestrator(Arc::new(transport())).candidates(&ctx).unwrap_err();
        assert!(matches!(err, RunError::NoInstallerProducts));
    }

    #[test]
    fn test_candidates_list_installers_only() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c);

        let infos = orchestrator(Arc::new(transport())).candidates(&ctx).unwrap();
        assert_eq!(infos.keys().collect::<Vec<_>>(), vec!["041-91758"]);
        assert_eq!(infos["041-91758"].title, "macOS Catalina");
    }

    #[test]
    fn test_missing_catalog_is_fatal() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c);

        let err = orchestrator(Arc::new(ScriptedTransport::new()))
            .run(&ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c);
        ctx.stop();

        let transport = Arc::new(transport());
        let err = orchestrator(Arc::clone(&transport)).run(&ctx).unwrap_err();
        assert!(matches!(err, RunError::Cancelled));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_failed_install_refetches_once() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c);
        let transport = Arc::new(transport());
        let install = Arc::new(FlakyInstall::new(1));

        let outcome = orchestrator(Arc::clone(&transport))
            .with_install_step(install.clone())
            .run(&ctx)
            .unwrap();

        assert!(outcome.refetched);
        assert_eq!(install.calls.load(Ordering::SeqCst), 2);
        let auto_requests = transport
            .requests()
            .iter()
            .filter(|u| u.as_str() == AUTO_URL)
            .count();
        assert_eq!(auto_requests, 2);
    }

    #[test]
    fn test_missing_package_fails_after_refetch() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c);
        let transport = Arc::new(transport().with_status(AUTO_URL, 404));
        let install = Arc::new(FlakyInstall::new(0));

        let err = orchestrator(Arc::clone(&transport))
            .with_install_step(install.clone())
            .run(&ctx)
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Install(InstallError::IncompleteReplication { failed: 1 })
        ));
        assert_eq!(err.kind(), ErrorKind::Install);
        // the install step never sees an incomplete product
        assert_eq!(install.calls.load(Ordering::SeqCst), 0);
        // the other package was still replicated, twice
        let esd_requests = transport.requests().iter().filter(|u| u.as_str() == ESD_URL).count();
        assert_eq!(esd_requests, 2);
    }

    #[test]
    fn test_configured_mirror_serves_packages() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c.with_mirror("cache.test:49180"));
        let mirror_auto = "http://cache.test:49180/041-91758/InstallAssistantAuto.pkg?source=http://origin.test";
        let transport = Arc::new(transport().with_body(mirror_auto, vec![3u8; 7_000_000]));

        let outcome = orchestrator(Arc::clone(&transport)).run(&ctx).unwrap();
        assert!(outcome.report.is_complete());

        let requests = transport.requests();
        assert!(requests.iter().any(|u| u == mirror_auto));
        assert!(!requests.iter().any(|u| u == AUTO_URL));
        // not mirrored: the metadata sidecar
        assert!(requests.iter().any(|u| u == ESD_META_URL));
        // the ESD package is not on the mirror and came from the origin
        assert!(requests.iter().any(|u| u == ESD_URL));
    }

    #[test]
    fn test_discovered_mirror_used_only_when_enabled() {
        let temp = TempDir::new().unwrap();
        let (ctx, _receiver) = context(&temp, |c| c.with_discover_mirror(true));
        let transport = Arc::new(transport());

        orchestrator(Arc::clone(&transport))
            .with_mirror_locator(|| Some("cache.test:49180".to_string()))
            .run(&ctx)
            .unwrap();

        assert!(transport
            .requests()
            .iter()
            .any(|u| u.starts_with("http://cache.test:49180/")));
    }

    struct CountingWait(AtomicUsize);

    impl CompletionWaiter for CountingWait {
        fn wait(&self, _ctx: &RunContext) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Succeeds and asks the run to wait for a completion signal.
    struct SignallingInstall;

    impl InstallStep for SignallingInstall {
        fn install(&self, _ctx: &RunContext, _handoff: &InstallHandoff) -> Result<(), InstallError> {
            Ok(())
        }

        fn awaits_completion(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_completion_wait_unless_installer_only() {
        for (installer_only, expected) in [(false, 1), (true, 0)] {
            let temp = TempDir::new().unwrap();
            let (ctx, _receiver) = context(&temp, |c| c.with_installer_only(installer_only));
            let wait = Arc::new(CountingWait(AtomicUsize::new(0)));

            orchestrator(Arc::new(transport()))
                .with_install_step(Arc::new(SignallingInstall))
                .with_completion(wait.clone())
                .run(&ctx)
                .unwrap();
            assert_eq!(wait.0.load(Ordering::SeqCst), expected);
        }
    }

    #[test]
    fn test_verified_run_returns_without_waiting() {
        let temp = TempDir::new().unwrap();
        let (ctx, receiver) = context(&temp, |c| c.with_installer_only(false));
        let wait = Arc::new(CountingWait(AtomicUsize::new(0)));

        orchestrator(Arc::new(transport()))
            .with_completion(wait.clone())
            .run(&ctx)
            .unwrap();
        assert_eq!(wait.0.load(Ordering::SeqCst), 0);
        assert!(ctx.is_running());

        let sink = recorded(&receiver);
        assert!(sink
            .events
            .iter()
            .any(|e| matches!(e, RunEvent::OverallText(text) if text == "Done!")));
    }

    #[test]
    fn test_spawned_worker_reports_fatal_error() {
        let temp = TempDir::new().unwrap();
        let (ctx, receiver) = context(&temp, |c| c.with_target_version("10.16"));

        let handle = spawn_worker(ctx, orchestrator(Arc::new(transport()))).unwrap();
        assert!(handle.join().unwrap().is_err());

        let sink = recorded(&receiver);
        assert_eq!(sink.fatal_error(), Some("unable to find target version: 10.16"));
    }
}
