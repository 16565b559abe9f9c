//! S3 — Graceful shutdown under block: a consumer parked in a blocking
//! `receive` on an otherwise-silent input must observe `Terminated` shortly
//! after `stop_process`, with no leaked execution context.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fbp_runtime::status::MessageStatus;
use fbp_runtime::{Component, ComponentBuilder, ComponentContext, ComponentLogic, Runtime};

struct BlockedOnReceive {
    result: Arc<Mutex<Option<MessageStatus>>>,
    unblocked_at: Arc<Mutex<Option<Instant>>>,
}
impl ComponentLogic for BlockedOnReceive {
    fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
        let outcome = ctx.receive::<f64>(0);
        *self.unblocked_at.lock().unwrap() = Some(Instant::now());
        *self.result.lock().unwrap() = Some(outcome.status());
        Ok(())
    }
}

#[test]
fn stop_process_unblocks_receive_within_one_timeout_window() {
    let result = Arc::new(Mutex::new(None));
    let unblocked_at = Arc::new(Mutex::new(None));
    let result2 = result.clone();
    let unblocked_at2 = unblocked_at.clone();

    let mut rt = Runtime::new();
    rt.register_component("blocker", move || -> Component {
        ComponentBuilder::new().input::<f64>(0, 1).build(Box::new(BlockedOnReceive {
            result: result2.clone(),
            unblocked_at: unblocked_at2.clone(),
        }))
    });
    rt.add_node("blocker", "b1").unwrap();
    rt.start_network();

    // Give the component time to actually enter the blocking receive.
    std::thread::sleep(Duration::from_millis(30));
    let stop_requested_at = Instant::now();
    rt.stop_network(); // joins internally: returns only after the thread exits.

    assert_eq!(*result.lock().unwrap(), Some(MessageStatus::Terminated));
    let elapsed = unblocked_at.lock().unwrap().unwrap().duration_since(stop_requested_at);
    // One MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS window plus a scheduler quantum;
    // generous bound to absorb CI jitter.
    assert!(
        elapsed < Duration::from_millis(500),
        "receive took too long to observe Terminated: {elapsed:?}"
    );
}
