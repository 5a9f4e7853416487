use tokio::sync::watch;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reason {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Interrupt => write!(f, "interrupted"),
            Reason::Terminate => write!(f, "terminated"),
        }
    }
}

#[derive(Debug)]
pub struct Send(watch::Sender<Option<Reason>>);

impl Send {
    #[tracing::instrument(skip(self))]
    pub fn cancel(&self, reason: Reason) {
        if self.0.send(Some(reason)).is_err() {
            tracing::debug!("receiver dropped, nothing to cancel");
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recv(watch::Receiver<Option<Reason>>);

impl Recv {
    pub fn reason(&self) -> Option<Reason> {
        *self.0.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Waits until cancelled; never returns if the sender is dropped without cancelling.
    pub async fn recv(&mut self) -> Reason {
        loop {
            if let Some(reason) = *self.0.borrow_and_update() {
                return reason;
            }
            if self.0.changed().await.is_err() {
                tracing::debug!("cancellation sender dropped, run will never be cancelled");
                return std::future::pending().await;
            }
        }
    }
}

pub fn new() -> (Send, Recv) {
    let (send, recv) = watch::channel(None);
    (Send(send), Recv(recv))
}

/// A receiver that is never cancelled.
pub fn never() -> Recv {
    new().1
}
