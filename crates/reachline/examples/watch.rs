//! Console demo: print connectivity changes as they happen.
//!
//! ```sh
//! cargo run --example watch
//! ```
//! Then toggle WiFi / unplug the cable and watch the output.

use reachline::{REACHABILITY_CHANGED, ReachabilityContext, STATUS_KEY};

fn main() {
    tracing_subscriber::fmt::init();

    let ctx = ReachabilityContext::new();

    // Loosely coupled consumers listen on the hub...
    let _sub = ctx.hub().subscribe_scoped(REACHABILITY_CHANGED, |payload| {
        if let Some(status) = payload.get(STATUS_KEY) {
            println!("[hub]    connectivity: {status}");
        }
    });

    let Some(monitor) = ctx.default_monitor() else {
        eprintln!("no default monitor available; treating connectivity as Unknown");
        return;
    };

    // ...while components holding the monitor can use the signal directly.
    monitor.status_changed.connect(|change| {
        println!("[signal] {} -> {}", change.previous, change.current);
    });

    monitor.start_monitoring();
    println!("watching the default route, ctrl-c to quit");

    loop {
        std::thread::park();
    }
}
