use crate::{
    CommitEvent, Connection, Database, Error, ErrorKind, Identifier, Result, TypedStatement,
    stream::{self, Stream, StreamExt},
};
use std::{collections::BTreeSet, sync::Arc};
use tokio::sync::{
    broadcast::{
        self,
        error::{RecvError, TryRecvError},
    },
    watch,
};

/// One result of a live query.
#[derive(Debug)]
pub struct Published<R> {
    /// Starts at 0 with the initial execution, incremented by each refresh.
    pub generation: u64,
    pub result: Result<Arc<[R]>, Arc<Error>>,
}

impl<R> Published<R> {
    fn new(generation: u64, result: Result<Vec<R>>) -> Self {
        Self {
            generation,
            result: result.map(Into::into).map_err(Arc::new),
        }
    }

    /// The rows, or the error of the execution that produced this result.
    pub fn rows(&self) -> Result<&[R], &Error> {
        match &self.result {
            Ok(rows) => Ok(&rows[..]),
            Err(e) => Err(&**e),
        }
    }
}

/// Result of a statement kept up to date with the commits on its connection.
///
/// Clones observe the same results. The refresh task stops when the last clone is dropped.
#[derive(Debug)]
pub struct LiveQuery<R> {
    receiver: watch::Receiver<Arc<Published<R>>>,
}

impl<R> Clone for LiveQuery<R> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<R: Send + Sync + 'static> LiveQuery<R> {
    /// The most recent result, without waiting.
    pub fn latest(&self) -> Arc<Published<R>> {
        self.receiver.borrow().clone()
    }

    /// Waits for a result newer than the last one seen through this handle.
    pub async fn changed(&mut self) -> Result<Arc<Published<R>>> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ErrorKind::Provider.error("The live query is no longer refreshed"))?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// The current result followed by every refresh. Intermediate results may be skipped when
    /// the consumer is slower than the refreshes, the last one is always delivered.
    pub fn into_stream(mut self) -> impl Stream<Item = Arc<Published<R>>> + Send {
        let current = self.receiver.borrow_and_update().clone();
        stream::once(async move { current }).chain(stream::unfold(self, |mut live| async move {
            let published = live.changed().await.ok()?;
            Some((published, live))
        }))
    }
}

pub(crate) fn spawn_refresh<C, S>(
    database: Database<C>,
    statement: S,
    tables: BTreeSet<Identifier>,
    mut events: broadcast::Receiver<CommitEvent>,
    initial: Result<Vec<S::Row>>,
) -> LiveQuery<S::Row>
where
    C: Connection,
    S: TypedStatement + 'static,
    S::Row: Sync,
{
    let (sender, receiver) = watch::channel(Arc::new(Published::new(0, initial)));
    tokio::spawn(async move {
        let mut generation = 0;
        loop {
            let relevant = tokio::select! {
                _ = sender.closed() => break,
                event = events.recv() => match event {
                    Ok(event) => event.touches(&tables),
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("Live query missed {} commit events, refreshing", skipped);
                        true
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            if !relevant {
                continue;
            }
            // Commits that arrived in the meantime are covered by this execution
            loop {
                match events.try_recv() {
                    Ok(..) | Err(TryRecvError::Lagged(..)) => {}
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => break,
                }
            }
            generation += 1;
            let result = database.fetch_all(&statement).await;
            if let Err(e) = &result {
                log::error!("{:#}", e);
            }
            sender.send_replace(Arc::new(Published::new(generation, result)));
        }
        log::trace!("Live query stopped after {} refreshes", generation);
    });
    LiveQuery { receiver }
}

#[cfg(test)]
mod tests {
    use super::{LiveQuery, Published};
    use crate::{ErrorKind, stream::StreamExt};
    use std::sync::Arc;
    use tokio::sync::watch;

    #[tokio::test]
    async fn stream_starts_with_current() {
        let (sender, receiver) = watch::channel(Arc::new(Published::new(0, Ok(vec![1i64]))));
        let live = LiveQuery { receiver };
        let mut stream = Box::pin(live.clone().into_stream());
        let first = stream.next().await.unwrap();
        assert_eq!(first.generation, 0);
        assert_eq!(first.rows().unwrap(), [1]);
        sender.send_replace(Arc::new(Published::new(1, Ok(vec![1, 2]))));
        sender.send_replace(Arc::new(Published::new(
            2,
            Err(ErrorKind::Provider.error("no such table: person")),
        )));
        let next = stream.next().await.unwrap();
        assert_eq!(next.generation, 2);
        assert!(next.rows().is_err());
        assert_eq!(live.latest().generation, 2);
        drop(sender);
        assert!(stream.next().await.is_none());
    }
}
