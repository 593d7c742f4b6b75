use crate::cmd::reconcile::run;
use crate::{ClusterArgs, EventsArgs, OutputArgs, StoreArgs};

pub async fn execute_cmd(
    target: &str,
    output: OutputArgs,
    store: StoreArgs,
    cluster: ClusterArgs,
    events: EventsArgs,
) -> i32 {
    run(target, None, output, store, cluster, events).await
}
