//! Browse a directory tree with the asynchronous tree model.
//!
//! Run with: cargo run -p treeview --example browse -- [DIR] [CONFIG.toml]
//!
//! Expands everything below DIR in the background, reports progress from
//! the model's events, then prints the tree.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use treeview::factory::source;
use treeview::logging::TreeModelDebug;
use treeview::{
    DataNodeFactory, DataNodeTreeModel, TreeModelEvent, TreeViewConfig, spawn_recursive_expand,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "treeview=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let config = match args.next() {
        Some(path) => TreeViewConfig::from_file(path)?,
        None => TreeViewConfig::default(),
    };

    let factory = DataNodeFactory::from_config(&config.factory);
    let root = factory.make_data_node(None, source(std::path::absolute(&dir)?))?;
    let model = DataNodeTreeModel::with_config(root.clone(), &config)?;

    let inserted = Arc::new(AtomicUsize::new(0));
    let counter = inserted.clone();
    model.events().connect(move |event: &TreeModelEvent| {
        if let TreeModelEvent::NodesInserted { children, .. } = event {
            counter.fetch_add(children.len(), Ordering::Relaxed);
        }
    });

    let expansion = spawn_recursive_expand(&model, &root)?;
    while !expansion.is_finished() {
        std::thread::sleep(Duration::from_millis(200));
        println!("... {} nodes found", inserted.load(Ordering::Relaxed));
    }
    expansion.join()?;
    model.flush_events()?;

    print!("{}", TreeModelDebug::new().format_model(&model));
    Ok(())
}
