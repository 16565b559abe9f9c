//! S6 — Multi-port await: `await_any({A, B, C})` returns the first
//! declaration-order index with a message ready, independent of the order
//! messages actually arrived in.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fbp_runtime::{Component, ComponentBuilder, ComponentContext, ComponentLogic, Runtime};

struct Awaiter {
    results: Arc<Mutex<Vec<usize>>>,
}
impl ComponentLogic for Awaiter {
    fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
        let first = ctx.await_any(&[0, 1, 2]);
        if let Ok(idx) = first.into_result() {
            // Drain whatever arrived at that index so a second `process`
            // call (and a second `await_any`) observes the next one.
            match idx {
                0 => {
                    ctx.receive::<u32>(0).into_result().ok();
                }
                1 => {
                    ctx.receive::<u32>(1).into_result().ok();
                }
                _ => {
                    ctx.receive::<u32>(2).into_result().ok();
                }
            }
            self.results.lock().unwrap().push(idx);
        }
        Ok(())
    }
}

#[test]
fn await_any_returns_declaration_order_among_ready_ports() {
    let results = Arc::new(Mutex::new(Vec::new()));
    let results2 = results.clone();

    let mut rt = Runtime::new();
    rt.register_component("awaiter", move || -> Component {
        ComponentBuilder::new()
            .input::<u32>(0, 4)
            .input::<u32>(1, 4)
            .input::<u32>(2, 4)
            .build(Box::new(Awaiter {
                results: results2.clone(),
            }))
    });
    rt.add_node("awaiter", "w1").unwrap();

    // B ready first, A second; `await_any` must report B on the first call
    // (only B has a message), then A on the second.
    assert!(rt.add_initial("w1", 1, 100u32).is_some());
    rt.start_network();
    std::thread::sleep(Duration::from_millis(30));
    assert!(rt.add_initial("w1", 0, 200u32).is_some());
    std::thread::sleep(Duration::from_millis(50));
    rt.stop_network();

    let results = results.lock().unwrap();
    assert!(results.len() >= 2, "expected at least two await_any resolutions, got {results:?}");
    assert_eq!(results[0], 1, "B should resolve first: only B had a message");
    assert_eq!(results[1], 0, "A should resolve next");
}
