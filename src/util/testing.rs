use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::arena::TreeArena;
use crate::builder::TreeBuilder;
use crate::record::Record;
use generational_arena::Index;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "pathtree=trace");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Assembles `root` plus `(id, path)` candidates, in the given order.
///
/// Returns the arena, the root index and the candidate indices.
pub fn assemble(
    root: (&str, &str),
    candidates: &[(&str, &str)],
) -> (TreeArena<Record>, Index, Vec<Index>) {
    let mut arena = TreeArena::new();
    let root_idx = arena.insert_node(Record::with_path(root.0, root.1));
    let records = candidates
        .iter()
        .map(|(id, path)| Record::with_path(*id, *path));
    let report = TreeBuilder::new()
        .build_tree(&mut arena, root_idx, records)
        .expect("assemble");
    (arena, root_idx, report.linked)
}
