use crossbeam_channel::{SendError, unbounded};
use tracing::Span;

pub mod reactor;

pub struct Sender<Event>(crossbeam_channel::Sender<(Span, Event)>);
pub type Receiver<Event> = crossbeam_channel::Receiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    pub fn send(&self, event: Event) {
        // A dropped receiver only means the other side is shutting down.
        _ = self.try_send(event)
    }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_after_receiver_dropped_is_ignored() {
        let (tx, rx) = channel::<u32>();
        tx.send(1);
        assert_eq!(rx.try_recv().map(|(_, e)| e), Ok(1));
        drop(rx);
        tx.send(2);
        assert!(tx.try_send(3).is_err());
    }
}
