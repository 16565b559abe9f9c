//! S1 — Straight pipe: a one-output producer feeding a one-input consumer
//! sees every value, in order, with no initial messages involved.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fbp_runtime::{Component, ComponentBuilder, ComponentContext, ComponentLogic, Runtime};

struct Src {
    sent: bool,
}
impl ComponentLogic for Src {
    fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
        if !self.sent {
            for v in 1i32..=3 {
                ctx.send(0, v);
            }
            self.sent = true;
        }
        std::thread::sleep(Duration::from_millis(5));
        Ok(())
    }
}

struct Snk {
    seen: Arc<Mutex<Vec<i32>>>,
}
impl ComponentLogic for Snk {
    fn process(&mut self, ctx: &ComponentContext) -> anyhow::Result<()> {
        if let Ok(v) = ctx.receive::<i32>(0).into_result() {
            self.seen.lock().unwrap().push(v);
        }
        Ok(())
    }
}

#[test]
fn straight_pipe_delivers_values_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_for_sink = seen.clone();

    let mut rt = Runtime::new();
    rt.register_component("src", || -> Component {
        ComponentBuilder::new()
            .output::<i32>(0)
            .build(Box::new(Src { sent: false }))
    });
    rt.register_component("snk", move || -> Component {
        ComponentBuilder::new().input::<i32>(0, 8).build(Box::new(Snk {
            seen: seen_for_sink.clone(),
        }))
    });

    rt.add_node("src", "producer").unwrap();
    rt.add_node("snk", "consumer").unwrap();
    assert!(rt.add_edge("producer", 0, "consumer", 0));

    rt.start_network();
    std::thread::sleep(Duration::from_millis(100));
    rt.stop_network();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}
