use crate::{CommitEvent, Config, Executor, Result};
use std::future::Future;
use tokio::sync::broadcast;

/// Open connection to a database.
pub trait Connection: Executor + 'static {
    /// Opens a connection to `url`, reading the `quarry_*` configuration parameters from it.
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send;

    fn config(&self) -> &Config;

    /// Receiver of the commit events of this connection, created at the time of the call.
    fn notifications(&self) -> broadcast::Receiver<CommitEvent>;
}
