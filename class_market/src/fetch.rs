//! Background fetches for views.

use std::future::Future;
use tokio::{sync::watch, task::JoinHandle};

/// State of a view's data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    /// User-facing message of the failure.
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Idle => Loadable::Idle,
            Loadable::Loading => Loadable::Loading,
            Loadable::Loaded(value) => Loadable::Loaded(f(value)),
            Loadable::Failed(message) => Loadable::Failed(message),
        }
    }
}

impl<T, E: ToString> From<Result<T, E>> for Loadable<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(e) => Loadable::Failed(e.to_string()),
        }
    }
}

/// A fetch running on its own task.
///
/// State is published through a watch channel. Starting a new fetch aborts
/// the previous one, and dropping the resource aborts whatever is in flight,
/// so a result never lands in a view that is gone.
pub struct Resource<T> {
    tx: watch::Sender<Loadable<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Resource<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Loadable::Idle);
        Self { tx, task: None }
    }

    /// Abort any running fetch and start `fetch`.
    pub fn start<F, E>(&mut self, fetch: F)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: ToString,
    {
        self.cancel();
        self.tx.send_replace(Loadable::Loading);
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let state = Loadable::from(fetch.await);
            tx.send_replace(state);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn state(&self) -> Loadable<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Loadable<T>> {
        self.tx.subscribe()
    }

    /// Wait until the current fetch settles and return its state.
    pub async fn settled(&self) -> Loadable<T> {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl<T> Drop for Resource<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
