//! # Network Runtime and Component Registry
//!
//! The [`Runtime`] is the single orchestrator-owned object that names
//! component factories, instantiates and names components, wires edges
//! between them, injects initial messages, and starts/stops the whole
//! network atomically. Where the source this spec distills from keeps two
//! process-global maps (`s_factories`, `s_nodes`), this crate follows
//! spec.md §9's explicit redesign guidance and owns both as plain fields on
//! an instance — tests build an independent `Runtime` each time instead of
//! sharing hidden process-wide state.
//!
//! All mutation here happens on the orchestrator thread, before
//! `start_network` or after `stop_network`; spec.md §5 documents this as an
//! invariant the runtime relies on rather than enforces with a lock.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::component::Component;
use crate::port::{connect_to_queue, send_message};
use crate::status::MessageStatus;

/// A parameterless producer of a new, fully-wired [`Component`] instance —
/// the "factory" side of the `component_id -> factory` registry map.
pub type ComponentFactory = Box<dyn Fn() -> Component>;

/// Owns the `component_id -> factory` and `instance_name -> Component` maps
/// and the operations that compose a network out of them.
#[derive(Default)]
pub struct Runtime {
    factories: HashMap<String, ComponentFactory>,
    nodes: HashMap<String, Component>,
}

impl Runtime {
    /// Creates an empty runtime with no registered factories or instances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `factory` under `id`. A second registration under the same
    /// id replaces the first, per spec.md §4.6.
    pub fn register_component(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn() -> Component + 'static,
    ) {
        let id = id.into();
        if self.factories.insert(id.clone(), Box::new(factory)).is_some() {
            info!(component_id = %id, "replaced existing component factory");
        }
    }

    /// Instantiates the factory registered under `component_id` and stores
    /// it as `name`.
    ///
    /// Fails if no such factory is registered, or if `name` is already in
    /// use — both are orchestrator/programmer mistakes outside the
    /// `MessageStatus` taxonomy, so they surface as `anyhow::Result` rather
    /// than a silent no-op, per `SPEC_FULL.md` §7.
    pub fn add_node(&mut self, component_id: &str, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            warn!(node = %name, "add_node rejected: name already in use");
            return Err(anyhow!("node name '{name}' is already in use"));
        }
        let factory = self
            .factories
            .get(component_id)
            .ok_or_else(|| anyhow!("no component registered under id '{component_id}'"))?;
        let mut component = factory();
        component.set_label(name.clone());
        info!(node = %name, component_id, "instantiated node");
        self.nodes.insert(name, component);
        Ok(())
    }

    /// Destroys the instance named `name`, if present. Dropping the
    /// `Component` stops its execution context and closes its input
    /// queues, unblocking any producer still sending to it. Returns `true`
    /// if an instance was found and removed.
    pub fn remove_node(&mut self, name: &str) -> bool {
        match self.nodes.remove(name) {
            Some(_component) => {
                info!(node = %name, "removed node");
                true
            }
            None => false,
        }
    }

    /// Binds output port `out_idx` of `src_name` to input port `in_idx` of
    /// `tgt_name`. If either name is unknown, the requested port index is
    /// undeclared, the types disagree, or `src_name == tgt_name` (a
    /// self-loop), this is a silent no-op and returns `false` — matching
    /// the documented `add_edge` policy in spec.md §4.6/§9.
    pub fn add_edge(&mut self, src_name: &str, out_idx: usize, tgt_name: &str, in_idx: usize) -> bool {
        let Some(target) = self.nodes.get(tgt_name) else {
            warn!(target = %tgt_name, "add_edge: unknown target node");
            return false;
        };
        let Some((target_type, target_queue)) = target.input_queue_info(in_idx) else {
            warn!(target = %tgt_name, in_idx, "add_edge: unknown or already-started input port");
            return false;
        };
        let same_parent = src_name == tgt_name;
        let Some(src) = self.nodes.get_mut(src_name) else {
            warn!(source = %src_name, "add_edge: unknown source node");
            return false;
        };
        let Some(output) = src.output_mut(out_idx) else {
            warn!(source = %src_name, out_idx, "add_edge: unknown or already-started output port");
            return false;
        };
        let connected = connect_to_queue(output, target_type, target_queue, same_parent);
        if connected {
            info!(src_name, out_idx, tgt_name, in_idx, "wired edge");
        } else {
            warn!(src_name, out_idx, tgt_name, in_idx, "add_edge rejected: type mismatch or self-loop");
        }
        connected
    }

    /// Injects `value` directly into input port `in_idx` of `name`, the
    /// mechanism for initial/configuration messages delivered before or
    /// during `initialize()`.
    ///
    /// Returns `None` if `name` or `in_idx` is unknown (silent no-op, same
    /// policy as `add_edge`); otherwise `Some(status)` from
    /// [`crate::port::send_message`].
    pub fn add_initial<T: Send + 'static>(
        &mut self,
        name: &str,
        in_idx: usize,
        value: T,
    ) -> Option<MessageStatus> {
        let node = self.nodes.get(name)?;
        let port = node.input(in_idx)?;
        let status = send_message(port, value);
        match status {
            MessageStatus::Okay => info!(node = %name, in_idx, "delivered initial message"),
            other => warn!(node = %name, in_idx, status = %other, "initial message not delivered"),
        }
        Some(status)
    }

    /// Calls `start_process` on every registered instance. Iteration order
    /// over the instance map is unspecified; components must tolerate
    /// being started before all of their upstreams, which blocking
    /// receives handle naturally.
    pub fn start_network(&mut self) {
        info!(node_count = self.nodes.len(), "starting network");
        for (name, component) in self.nodes.iter_mut() {
            if component.start_process() {
                info!(node = %name, "started");
            }
        }
    }

    /// Calls `stop_process` on every instance, then blocks until each
    /// execution context has exited — guaranteeing no leaked thread
    /// survives the call.
    pub fn stop_network(&mut self) {
        info!(node_count = self.nodes.len(), "stopping network");
        for component in self.nodes.values_mut() {
            component.stop_process();
        }
        for component in self.nodes.values_mut() {
            component.join();
        }
    }

    /// Instance names currently registered, for diagnostics/tests.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentBuilder, ComponentContext, ComponentLogic};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Counter;
    impl ComponentLogic for Counter {
        fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
            std::thread::sleep(Duration::from_millis(2));
            let _ = ctx.should_run();
            Ok(())
        }
    }

    struct Sink {
        out: Arc<Mutex<Vec<u32>>>,
    }
    impl ComponentLogic for Sink {
        fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
            if let Ok(v) = ctx.receive::<u32>(0).into_result() {
                self.out.lock().unwrap().push(v);
            }
            Ok(())
        }
    }

    #[test]
    fn register_then_add_node_produces_an_instance() {
        let mut rt = Runtime::new();
        rt.register_component("counter", || ComponentBuilder::new().build(Box::new(Counter)));
        assert!(rt.add_node("counter", "c1").is_ok());
        assert_eq!(rt.node_names(), vec!["c1"]);
    }

    #[test]
    fn add_node_rejects_duplicate_name() {
        let mut rt = Runtime::new();
        rt.register_component("counter", || ComponentBuilder::new().build(Box::new(Counter)));
        rt.add_node("counter", "c1").unwrap();
        assert!(rt.add_node("counter", "c1").is_err());
    }

    #[test]
    fn add_node_rejects_unknown_component_id() {
        let mut rt = Runtime::new();
        assert!(rt.add_node("nope", "x").is_err());
    }

    #[test]
    fn add_edge_silently_rejects_unknown_names() {
        let mut rt = Runtime::new();
        rt.register_component("counter", || ComponentBuilder::new().build(Box::new(Counter)));
        rt.add_node("counter", "c1").unwrap();
        assert!(!rt.add_edge("missing", 0, "c1", 0));
        assert!(!rt.add_edge("c1", 0, "missing", 0));
    }

    #[test]
    fn add_initial_then_start_network_delivers_before_process() {
        let mut rt = Runtime::new();
        let out = Arc::new(Mutex::new(Vec::new()));
        let out2 = out.clone();
        rt.register_component("sink", move || {
            ComponentBuilder::new()
                .input::<u32>(0, 4)
                .build(Box::new(Sink { out: out2.clone() }))
        });
        rt.add_node("sink", "s1").unwrap();
        assert_eq!(rt.add_initial("s1", 0, 99u32), Some(MessageStatus::Okay));
        rt.start_network();
        std::thread::sleep(Duration::from_millis(30));
        rt.stop_network();
        assert_eq!(*out.lock().unwrap(), vec![99]);
    }

    #[test]
    fn remove_node_stops_and_drops_instance() {
        let mut rt = Runtime::new();
        rt.register_component("counter", || ComponentBuilder::new().build(Box::new(Counter)));
        rt.add_node("counter", "c1").unwrap();
        rt.start_network();
        assert!(rt.remove_node("c1"));
        assert!(!rt.remove_node("c1"));
    }
}
