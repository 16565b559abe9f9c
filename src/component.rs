//! # Component Lifecycle and Execution Context
//!
//! A [`Component`] owns a fixed set of [`InputPort`]/[`OutputPort`]s and a
//! user-supplied [`ComponentLogic`] implementation. `start_process` spawns a
//! dedicated OS thread running the component's `initialize`/`process` loop;
//! `stop_process` signals cooperative shutdown.
//!
//! Port-array immutability after `start_process` (spec.md §3) is enforced
//! structurally rather than with a runtime check: the port maps and the
//! logic object are *moved* into the spawned thread's closure. Once that
//! move has happened there is no longer a `&mut` path back to them from the
//! `Component` handle the registry holds — attempting to wire an edge onto
//! an already-started component simply finds nothing to wire (see
//! [`Component::output_mut`]).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::notify::{Notifier, MESSAGE_ARRIVAL, PROCESS_SHUTDOWN, PROCESS_START};
use crate::port::{InputPort, OutputPort};
use crate::queue::MessageQueue;
use crate::status::{MessageStatus, Optional};
use crate::type_id::TypeId;

/// Extension points an external component author implements. `initialize`
/// runs exactly once before the first `process` call; `process` runs
/// repeatedly until the component's `should_run` flag flips false.
///
/// This is the "trait/interface with dynamic dispatch" rendering of the
/// polymorphic component contract spec.md §9 asks for; `Box<dyn
/// ComponentLogic>` is the vtable.
pub trait ComponentLogic: Send {
    /// Called once, before any `process` call, with blocking receives on
    /// configuration ports permitted.
    fn initialize(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called repeatedly while the component is running. Expected to
    /// complete in bounded time, including on `Terminated` port results.
    fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()>;
}

/// Borrowed view of a running component's ports and cancellation flag,
/// handed to [`ComponentLogic::initialize`]/[`ComponentLogic::process`].
pub struct ComponentContext<'a> {
    inputs: &'a HashMap<usize, InputPort>,
    outputs: &'a HashMap<usize, OutputPort>,
    should_run: &'a AtomicBool,
    notifier: &'a Arc<Notifier>,
}

impl<'a> ComponentContext<'a> {
    /// Blocking typed receive on the input port at `index`.
    ///
    /// # Panics
    /// Panics if `index` was not declared on this component — an undeclared
    /// port index is a programming error, not a runtime-recoverable
    /// condition in the sense `spec.md`'s `MessageStatus` taxonomy covers.
    pub fn receive<T: 'static>(&self, index: usize) -> Optional<T> {
        let port = self
            .inputs
            .get(&index)
            .unwrap_or_else(|| panic!("no input port declared at index {index}"));
        port.receive(self.should_run)
    }

    /// Blocking typed send on the output port at `index`. See panic note on
    /// [`ComponentContext::receive`].
    pub fn send<T: Send + 'static>(&self, index: usize, value: T) -> MessageStatus {
        let port = self
            .outputs
            .get(&index)
            .unwrap_or_else(|| panic!("no output port declared at index {index}"));
        port.send(value, self.should_run)
    }

    /// True while the component has not been asked to stop.
    pub fn should_run(&self) -> bool {
        self.should_run.load(Ordering::Acquire)
    }

    /// Multi-port wait: returns the first of `indices` (in argument order)
    /// with a message already queued, blocking on `MessageArrival` (or
    /// `ProcessShutdown`, so a stalled wait still observes cancellation) and
    /// re-scanning when none are ready. Tie-break is declaration order in
    /// `indices`, per spec.md §4.5.
    pub fn await_any(&self, indices: &[usize]) -> Optional<usize> {
        loop {
            if !self.should_run() {
                return Optional::failed(MessageStatus::Terminated);
            }
            for &idx in indices {
                if let Some(port) = self.inputs.get(&idx) {
                    if port.base().has_message() {
                        return Optional::ok(idx);
                    }
                }
            }
            self.notifier.wait_mask(MESSAGE_ARRIVAL | PROCESS_SHUTDOWN);
        }
    }

    /// Observational forwarding to the input port at `index`, or `None` if
    /// undeclared.
    pub fn input_has_message(&self, index: usize) -> Option<bool> {
        self.inputs.get(&index).map(|p| p.base().has_message())
    }
}

/// Builder that declares a component's ports before any logic runs.
/// Mirrors the "zero-argument constructor that declares all input/output
/// ports" contract of spec.md §6: the parameterless constructor an external
/// author provides is expected to build and return one of these.
pub struct ComponentBuilder {
    notifier: Arc<Notifier>,
    inputs: HashMap<usize, InputPort>,
    outputs: HashMap<usize, OutputPort>,
}

impl ComponentBuilder {
    pub fn new() -> Self {
        Self {
            notifier: Arc::new(Notifier::new()),
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Declares an input port of type `T` at `index` with the given queue
    /// `capacity` (must be at least 1).
    ///
    /// # Panics
    /// Panics if `index` is already declared on this component — port
    /// indices must be unique within their array (spec.md §3).
    pub fn input<T: 'static>(mut self, index: usize, capacity: usize) -> Self {
        let port = InputPort::new::<T>(capacity, self.notifier.clone());
        if self.inputs.insert(index, port).is_some() {
            panic!("duplicate input port index {index}");
        }
        self
    }

    /// Declares an output port of type `T` at `index`, initially
    /// unconnected.
    ///
    /// # Panics
    /// Panics if `index` is already declared on this component.
    pub fn output<T: 'static>(mut self, index: usize) -> Self {
        let port = OutputPort::new::<T>();
        if self.outputs.insert(index, port).is_some() {
            panic!("duplicate output port index {index}");
        }
        self
    }

    /// Finishes construction, pairing the declared ports with `logic`.
    pub fn build(self, logic: Box<dyn ComponentLogic>) -> Component {
        Component {
            label: String::from("unnamed"),
            notifier: self.notifier,
            should_run: Arc::new(AtomicBool::new(false)),
            is_running: Arc::new(AtomicBool::new(false)),
            built: Some(BuiltParts {
                inputs: self.inputs,
                outputs: self.outputs,
                logic,
            }),
            thread: None,
        }
    }
}

impl Default for ComponentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct BuiltParts {
    inputs: HashMap<usize, InputPort>,
    outputs: HashMap<usize, OutputPort>,
    logic: Box<dyn ComponentLogic>,
}

/// A constructed, possibly-running instance of [`ComponentLogic`] plus its
/// declared ports.
///
/// States (spec.md §4.5): `Constructed` (`built.is_some()`, `thread.is_none()`)
/// → `Started`/`Initializing`/`Running` (collapsed here into `thread.is_some()`,
/// the execution context itself tracks the finer-grained states internally
/// via `is_running` and the one-shot `ProcessStart` wake bit) → `Stopped`
/// (the spawned thread has returned; observed via `is_running() == false`
/// after a `join`).
pub struct Component {
    label: String,
    notifier: Arc<Notifier>,
    should_run: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    built: Option<BuiltParts>,
    thread: Option<JoinHandle<()>>,
}

impl Component {
    /// Instance name assigned by the runtime registry, used in log output.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Assigns the instance name used in subsequent log output. Called by
    /// [`crate::runtime::Runtime::add_node`] right after construction.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// True once `should_run` has been set (i.e. `start_process` was
    /// called), regardless of whether the execution context has finished.
    pub fn should_run(&self) -> bool {
        self.should_run.load(Ordering::Acquire)
    }

    /// True while the execution context is between consuming `ProcessStart`
    /// and returning from its process loop.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Mutable access to the output port at `index`, available only before
    /// `start_process` has moved the port arrays into the execution
    /// context. Returns `None` both for an undeclared index and for an
    /// already-started component — the runtime treats both as "nothing to
    /// wire" (see `add_edge`'s silent no-op policy).
    pub fn output_mut(&mut self, index: usize) -> Option<&mut OutputPort> {
        self.built.as_mut()?.outputs.get_mut(&index)
    }

    /// The type and shared queue handle backing the input port at `index`,
    /// used by the runtime to wire an edge without borrowing this component
    /// and another one from the same map simultaneously.
    pub fn input_queue_info(&self, index: usize) -> Option<(TypeId, Arc<MessageQueue>)> {
        let port = self.built.as_ref()?.inputs.get(&index)?;
        Some((port.base().type_id(), port.queue().clone()))
    }

    /// Direct access to the input port at `index`, used by the runtime to
    /// deliver initial messages via [`crate::port::send_message`].
    pub fn input(&self, index: usize) -> Option<&InputPort> {
        self.built.as_ref()?.inputs.get(&index)
    }

    /// Spawns the execution context and signals it to begin. Returns
    /// `false` without effect if this component has already been started.
    pub fn start_process(&mut self) -> bool {
        let Some(parts) = self.built.take() else {
            return false;
        };
        self.should_run.store(true, Ordering::Release);
        let should_run = Arc::clone(&self.should_run);
        let is_running = Arc::clone(&self.is_running);
        let notifier = Arc::clone(&self.notifier);
        let label = self.label.clone();
        let handle = thread::Builder::new()
            .name(label.clone())
            .spawn(move || run(parts, should_run, is_running, notifier, label))
            .expect("failed to spawn component execution context");
        self.thread = Some(handle);
        self.notifier.signal(PROCESS_START);
        true
    }

    /// Signals cooperative shutdown. The execution context observes this on
    /// its next wake or send-retry and returns `Terminated` from any
    /// blocking call in progress.
    pub fn stop_process(&mut self) {
        self.should_run.store(false, Ordering::Release);
        self.notifier.signal(PROCESS_SHUTDOWN);
    }

    /// Blocks until the execution context has exited, if one was spawned.
    /// Idempotent; a second call is a no-op.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if let Err(panic) = handle.join() {
                warn!(component = %self.label, ?panic, "component execution context panicked");
            }
        }
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.stop_process();
        self.join();
    }
}

fn run(
    mut parts: BuiltParts,
    should_run: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    notifier: Arc<Notifier>,
    label: String,
) {
    notifier.wait_mask(PROCESS_START);
    is_running.store(true, Ordering::Release);

    let ctx = ComponentContext {
        inputs: &parts.inputs,
        outputs: &parts.outputs,
        should_run: &should_run,
        notifier: &notifier,
    };

    debug!(component = %label, "initializing");
    if let Err(err) = parts.logic.initialize(&ctx) {
        warn!(component = %label, error = %err, "initialize returned an error; continuing to process loop");
    }

    debug!(component = %label, "entering process loop");
    while should_run.load(Ordering::Acquire) {
        if let Err(err) = parts.logic.process(&ctx) {
            warn!(component = %label, error = %err, "process iteration returned an error");
        }
    }
    debug!(component = %label, "process loop exited");

    is_running.store(false, Ordering::Release);
    // `parts` (and with it every InputPort) drops here, closing each input
    // queue and unblocking any producer still pushing into this component.
}
