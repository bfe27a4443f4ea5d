use std::time::Instant;

use fiber_core::{
    Element, Event, MemoryRenderTarget, NodeId, Reconciler, ReconcilerConfig, RenderTarget,
    WorkStatus,
};
use fiber_runtime_std::StdRuntime;

pub struct AppShell<T: RenderTarget> {
    runtime: StdRuntime,
    reconciler: Reconciler<T>,
    container: NodeId,
    start_time: Instant,
    commits: usize,
}

impl<T: RenderTarget> AppShell<T> {
    pub fn new(target: T, container: NodeId, content: Element) -> Self {
        Self::with_config(target, container, content, ReconcilerConfig::default())
    }

    pub fn with_config(
        target: T,
        container: NodeId,
        content: Element,
        config: ReconcilerConfig,
    ) -> Self {
        let runtime = StdRuntime::new();
        let mut reconciler = Reconciler::with_config(target, runtime.runtime(), config);
        reconciler.render(content, container);
        let mut shell = Self {
            runtime,
            reconciler,
            container,
            start_time: Instant::now(),
            commits: 0,
        };
        shell.update();
        shell
    }

    /// Replaces the whole content; the new tree is diffed against the old one.
    pub fn set_content(&mut self, content: Element) {
        self.reconciler.render(content, self.container);
    }

    /// Whether calling [`AppShell::update`] would do any work.
    pub fn should_work(&self) -> bool {
        self.reconciler.has_pending_work()
    }

    /// Runs one idle callback if the reconciler asked for one.
    pub fn update(&mut self) {
        match self.runtime.run_idle_callback(&mut self.reconciler) {
            Ok(Some(WorkStatus::Committed(report))) => {
                self.commits += 1;
                log::debug!(
                    "commit #{} after {:?}: {report:?}",
                    self.commits,
                    self.start_time.elapsed()
                );
            }
            Ok(_) => {}
            Err(err) => log::error!("render pass failed: {err}"),
        }
    }

    /// Updates until nothing is left to do.
    pub fn settle(&mut self) {
        match self.runtime.run_until_idle(&mut self.reconciler) {
            Ok(commits) => self.commits += commits,
            Err(err) => log::error!("render pass failed: {err}"),
        }
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn runtime(&self) -> &StdRuntime {
        &self.runtime
    }

    pub fn target(&self) -> &T {
        self.reconciler.target()
    }

    pub fn reconciler(&mut self) -> &mut Reconciler<T> {
        &mut self.reconciler
    }
}

impl AppShell<MemoryRenderTarget> {
    /// A shell rendering into a fresh in-memory target under a `root` node.
    pub fn headless(content: Element) -> Self {
        let mut target = MemoryRenderTarget::new();
        let container = target.create_root("root");
        Self::new(target, container, content)
    }

    /// Dispatches `event` to the first node of `kind`. Returns whether a
    /// listener handled it.
    pub fn dispatch(&mut self, kind: &str, event: &Event) -> bool {
        let target = self.reconciler.target();
        let Some(node) = target.find_by_kind(self.container, kind) else {
            log::warn!("no <{kind}> to dispatch {} to", event.name);
            return false;
        };
        match target.dispatch(node, event) {
            Ok(handled) => handled,
            Err(err) => {
                log::error!("event dispatch failed: {err}");
                false
            }
        }
    }

    pub fn dump(&self) -> String {
        self.reconciler.target().dump_tree(self.container)
    }

    pub fn log_debug_info(&self) {
        println!("\n");
        println!("════════════════════════════════════════════════════════");
        println!("           DEBUG: CURRENT TREE STATE");
        println!("════════════════════════════════════════════════════════");
        print!("{}", self.dump());
        println!("fibers: {}", self.reconciler.tree().len());
        println!("commits: {}", self.commits);
        println!("════════════════════════════════════════════════════════");
        println!("\n");
    }
}
