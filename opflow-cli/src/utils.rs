use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use opflow_exec::executor::{
    CompositeEventSink, EventSink, StdoutEventSink, StoreEventSink, TracingEventSink,
};
use opflow_exec::{DirClient, MemoryClient, RemoteClient};
use opflow_store::{FileStore, StateStore, StoreError, DEFAULT_NAMESPACE};

use crate::{ClusterArgs, EventsTarget, StoreArgs};

/// Logs go to stderr so that stdout only carries command output.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("opflow=debug,info")
            } else {
                EnvFilter::try_new("opflow=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .try_init()?;
    Ok(())
}

/// Splits `<namespace>/<name>`; a bare name lives in the default namespace.
pub fn parse_target(target: &str) -> Result<(String, String), String> {
    match target.split_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((ns.to_string(), name.to_string()))
        }
        None if !target.is_empty() => Ok((DEFAULT_NAMESPACE.to_string(), target.to_string())),
        _ => Err(format!(
            "invalid target {target:?}, expected <namespace>/<name>"
        )),
    }
}

pub async fn open_store(args: &StoreArgs) -> Result<Arc<FileStore>, StoreError> {
    FileStore::open(&args.store).await.map(Arc::new)
}

pub fn remote_client(args: &ClusterArgs) -> Arc<dyn RemoteClient> {
    if args.cluster == "memory" {
        Arc::new(MemoryClient::new())
    } else {
        Arc::new(DirClient::new(&args.cluster))
    }
}

pub fn event_sink(target: EventsTarget, store: Arc<dyn StateStore>) -> Arc<dyn EventSink> {
    let mut sink = CompositeEventSink::new();
    sink.add(Arc::new(TracingEventSink));
    if matches!(target, EventsTarget::Store | EventsTarget::Both) {
        sink.add(Arc::new(StoreEventSink::new(store)));
    }
    if matches!(target, EventsTarget::Stdout | EventsTarget::Both) {
        sink.add(Arc::new(StdoutEventSink));
    }
    Arc::new(sink)
}
