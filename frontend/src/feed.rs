//! Owned subscription handles for the change feed and auth notifications.
//!
//! A [`Feed`] belongs to the scope that opened it. Dropping it runs the
//! release hook exactly once, which tears down the underlying channel; any
//! [`FeedListener`] still waiting then resolves with `None`.

use std::fmt;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::lock::Mutex;
use futures::StreamExt;

pub struct Feed<T> {
    listener: FeedListener<T>,
    release: Option<Box<dyn FnOnce()>>,
}

impl<T> Feed<T> {
    pub fn new(receiver: UnboundedReceiver<T>, release: impl FnOnce() + 'static) -> Self {
        Self {
            listener: FeedListener {
                receiver: Rc::new(Mutex::new(receiver)),
            },
            release: Some(Box::new(release)),
        }
    }

    /// A fresh channel whose sending half is handed to the notification source.
    pub fn channel(release: impl FnOnce() + 'static) -> (UnboundedSender<T>, Self) {
        let (sender, receiver) = mpsc::unbounded();
        (sender, Self::new(receiver, release))
    }

    pub fn listener(&self) -> FeedListener<T> {
        self.listener.clone()
    }

    pub fn release(self) {
        drop(self);
    }
}

impl<T> Drop for Feed<T> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
        // A listener parked on the lock keeps waiting until the source side hangs up.
        if let Some(mut receiver) = self.listener.receiver.try_lock() {
            receiver.close();
        }
    }
}

impl<T> fmt::Debug for Feed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feed")
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Cloneable waiting end of a [`Feed`].
pub struct FeedListener<T> {
    receiver: Rc<Mutex<UnboundedReceiver<T>>>,
}

impl<T> FeedListener<T> {
    /// Next notification, or `None` once the feed has been released.
    pub async fn next(&self) -> Option<T> {
        let mut receiver = self.receiver.lock().await;
        receiver.next().await
    }
}

impl<T> Clone for FeedListener<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Rc::clone(&self.receiver),
        }
    }
}

impl<T> fmt::Debug for FeedListener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FeedListener")
    }
}
