//! `gesturecall run`: the extension variant against a live browser.
//!
//! Every open tab gets a page context attached over CDP. All pages share one
//! coordinator, which owns the inference context. Lines typed on stdin are
//! tab commands, see [`crate::control`].

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use gesturecall_config::Config;
use gesturecall_core::relay::{self, ContextHandle, Mailbox, bus::DEFAULT_MAILBOX_CAPACITY};
use gesturecall_core::{Coordinator, DetectionLoop, LocalInferenceHost, PageContext, TabRegistry, UrlPolicy};
use gesturecall_page_cdp::{CdpClient, CdpPage, PageInfo};
use gesturecall_protocols::{InferenceHost, PageSurface, SettingsStore, TabInfo, VideoSource};

use crate::adapters;
use crate::control::{self, TabCommand};

struct AttachedTab {
    page: Arc<CdpPage>,
    context: Arc<PageContext>,
    handle: ContextHandle,
    watcher: JoinHandle<()>,
}

/// Keeps the attached tabs in step with the browser's tab list.
struct TabSupervisor {
    client: CdpClient,
    tabs: Arc<TabRegistry>,
    coordinator: Mailbox,
    source: Arc<dyn VideoSource>,
    store: Arc<dyn SettingsStore>,
    detection: gesturecall_core::DetectionConfig,
    policy: UrlPolicy,
    tab_filter: Option<String>,
    attached: HashMap<String, AttachedTab>,
}

impl TabSupervisor {
    fn wants(&self, info: &PageInfo) -> bool {
        if !TabInfo::new(info.id.clone(), Some(info.url.clone())).is_eligible() {
            return false;
        }
        match &self.tab_filter {
            Some(filter) => info.url.contains(filter.as_str()),
            None => true,
        }
    }

    async fn sync(&mut self) -> Result<(), Box<dyn Error>> {
        let pages = self.client.list_pages().await?;

        let gone: Vec<String> = self
            .attached
            .iter()
            .filter(|(id, tab)| tab.page.is_detached() || !pages.iter().any(|p| &p.id == *id))
            .map(|(id, _)| id.clone())
            .collect();
        for id in gone {
            if let Some(tab) = self.attached.remove(&id) {
                self.detach(&id, tab).await;
            }
        }

        for info in &pages {
            if self.attached.contains_key(&info.id) {
                self.tabs.update_url(&info.id, info.url.clone());
            } else if self.wants(info) {
                if let Err(e) = self.attach(info).await {
                    warn!(tab = %info.id, url = %info.url, "Failed to attach tab: {}", e);
                }
            }
        }
        Ok(())
    }

    async fn attach(&mut self, info: &PageInfo) -> Result<(), Box<dyn Error>> {
        let page = Arc::new(self.client.attach_page(&info.id).await?);
        let detection = DetectionLoop::new(
            self.detection,
            self.source.clone(),
            page.clone(),
            Arc::new(self.coordinator.clone()),
        );
        let context = Arc::new(
            PageContext::new(info.id.clone(), page.clone(), page.clone(), self.store.clone(), detection)
                .with_policy(self.policy.clone()),
        );

        let handle = relay::spawn_context(&format!("page-{}", info.id), DEFAULT_MAILBOX_CAPACITY, context.clone());
        self.tabs
            .register(info.id.clone(), Some(info.url.clone()), Some(Arc::new(handle.mailbox())));
        let watcher = context.watch_navigation(page.as_ref());

        info!(tab = %info.id, url = %info.url, "Tab attached");

        // The page load itself is the first navigation.
        let url = match page.current_url().await {
            Ok(url) => url,
            Err(e) => {
                debug!("Falling back to listed URL: {}", e);
                info.url.clone()
            }
        };
        context.auto_start(&url).await;

        self.attached.insert(
            info.id.clone(),
            AttachedTab {
                page,
                context,
                handle,
                watcher,
            },
        );
        Ok(())
    }

    async fn detach(&self, id: &str, tab: AttachedTab) {
        info!(tab = %id, "Tab closed");
        self.tabs.unregister(id);
        tab.watcher.abort();
        tab.context.close().await;
        tab.handle.shutdown().await;
        self.client.detach_page(&tab.page).await;
    }

    async fn handle_line(&self, line: &str) {
        let command = match TabCommand::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        match control::execute(self.tabs.as_ref(), &command).await {
            Ok(output) => println!("{}", output),
            Err(e) => println!("Error: {}", e),
        }
    }

    async fn shutdown(&mut self) {
        let attached: Vec<(String, AttachedTab)> = self.attached.drain().collect();
        for (id, tab) in attached {
            self.detach(&id, tab).await;
        }
    }
}

pub(crate) async fn run(
    config: &Config,
    debug_url: Option<String>,
    tab_filter: Option<String>,
) -> Result<(), Box<dyn Error>> {
    info!("Starting GestureCall v{}", env!("CARGO_PKG_VERSION"));

    let store = adapters::open_store(config).await?;
    let source = adapters::video_source(config)?;
    let factory = adapters::tracker_factory(config);

    // The inference host reports results to the coordinator's own mailbox,
    // so the mailbox exists before the coordinator does.
    let tabs = Arc::new(TabRegistry::new());
    let (coordinator_mailbox, coordinator_rx) = relay::mailbox("coordinator", DEFAULT_MAILBOX_CAPACITY);
    let host = Arc::new(LocalInferenceHost::new(
        factory,
        adapters::tracker_options(config),
        Arc::new(coordinator_mailbox.clone()),
    ));
    let coordinator = Arc::new(Coordinator::new(tabs.clone(), host.clone()));
    let coordinator_handle = relay::serve(coordinator_mailbox.clone(), coordinator_rx, coordinator);

    let debug_url = debug_url.unwrap_or_else(|| config.browser.debug_url.clone());
    let client = CdpClient::connect(&debug_url, Duration::from_secs(config.browser.connect_timeout_secs)).await?;
    info!("Connected to browser at {}", debug_url);

    let mut supervisor = TabSupervisor {
        client,
        tabs,
        coordinator: coordinator_mailbox,
        source: source.clone(),
        store,
        detection: adapters::detection_config(config),
        policy: adapters::url_policy(config),
        tab_filter: tab_filter.or_else(|| config.browser.tab_filter.clone()),
        attached: HashMap::new(),
    };

    info!("GestureCall ready:");
    info!("  Camera source: {}", source.name());
    info!("  Detection:     every {} ms", config.detection.interval_ms);
    info!("  Control:       tabs | start <tab> | stop <tab> | cover <tab> [on|off]");

    let mut commands = control::spawn_stdin_reader(16);

    let mut poll = tokio::time::interval(Duration::from_secs(config.browser.poll_secs.max(1)));
    let outcome = loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Err(e) = supervisor.sync().await {
                    if !supervisor.client.is_connected() {
                        error!("Lost connection to browser: {}", e);
                        break Err(e);
                    }
                    warn!("Tab sync failed: {}", e);
                }
            }
            Some(line) = commands.recv() => {
                supervisor.handle_line(&line).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break Ok(());
            }
        }
    };

    info!("Shutting down...");
    supervisor.shutdown().await;
    coordinator_handle.shutdown().await;
    host.close().await;
    outcome
}
