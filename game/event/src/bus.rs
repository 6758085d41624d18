use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use common::Error;
use slog_scope::trace;

use crate::types::{Event, EventType};

#[derive(Debug, Error)]
pub enum BusError {
    #[error("subscriber is already registered")]
    AlreadyRegistered,
    #[error("subscriber is not registered")]
    NotRegistered,
}

/// A participant in the bus. `handled_types` stands in for the source's runtime reflection over
/// `on<EventName>`-prefixed methods: Rust has no such reflection, so each subscriber declares its
/// handled event types statically instead.
pub trait Subscriber {
    fn handled_types(&self) -> &'static [EventType];
    fn handle(&self, event: &Event);
}

type WeakSub = Weak<dyn Subscriber>;

/// Central, single-threaded, asynchronous dispatch bus. Subscribers hold the bus (via `Rc`); the
/// bus holds subscribers **weakly** — a dropped subscriber is silently purged from dispatch,
/// never causing a use-after-free. Grounded in
/// `game/simulation/src/event/pubsub.rs::EventDispatcher`, generalized from per-entity `Rc`-owned
/// handlers to a single global `Weak`-held bus, per `evtman.py::EventManager`.
pub struct EventBus {
    subscribers: RefCell<HashMap<EventType, Vec<WeakSub>>>,
    queue: RefCell<VecDeque<Event>>,
}

impl EventBus {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            subscribers: RefCell::new(HashMap::new()),
            queue: RefCell::new(VecDeque::new()),
        })
    }

    /// Indexes `subscriber` under every event type it handles. Fails with `AlreadyRegistered` if
    /// the same subscriber (by pointer identity) is already indexed under any type.
    pub fn register(&self, subscriber: &Rc<dyn Subscriber>) -> Result<(), BusError> {
        let types = subscriber.handled_types();
        let weak: WeakSub = Rc::downgrade(subscriber);

        let mut subs = self.subscribers.borrow_mut();
        if let Some(first) = types.first() {
            if let Some(list) = subs.get(first) {
                if list.iter().any(|w| w.ptr_eq(&weak)) {
                    return Err(BusError::AlreadyRegistered);
                }
            }
        }

        for ty in types {
            subs.entry(*ty).or_insert_with(Vec::new).push(weak.clone());
        }

        Ok(())
    }

    /// Removes `subscriber` from every type index. Fails with `NotRegistered` if it was indexed
    /// under none.
    pub fn unregister(&self, subscriber: &Rc<dyn Subscriber>) -> Result<(), BusError> {
        let weak: WeakSub = Rc::downgrade(subscriber);
        let mut subs = self.subscribers.borrow_mut();

        let mut found = false;
        for list in subs.values_mut() {
            let before = list.len();
            list.retain(|w| !w.ptr_eq(&weak));
            found |= list.len() != before;
        }

        if found {
            Ok(())
        } else {
            Err(BusError::NotRegistered)
        }
    }

    /// Appends to the internal FIFO queue. Never dispatches synchronously.
    pub fn post(&self, event: Event) {
        if event.should_log() {
            trace!("posting event"; "event" => ?event);
        }
        self.queue.borrow_mut().push_back(event);
    }

    /// Drains the queue in FIFO order. Events posted by a handler during dispatch are appended
    /// to the same queue and are processed later in this same `pump` call, after all events that
    /// were already queued. Per event, the handler list for its type is snapshotted before any
    /// handler runs: a subscriber registered mid-dispatch will not receive the event currently
    /// being dispatched, but one unregistered mid-dispatch still will, since the snapshot was
    /// already taken.
    pub fn pump(&self) {
        loop {
            let event = match self.queue.borrow_mut().pop_front() {
                Some(e) => e,
                None => break,
            };

            let ty = event.event_type();
            let snapshot: Vec<WeakSub> = self
                .subscribers
                .borrow()
                .get(&ty)
                .cloned()
                .unwrap_or_default();

            let mut any_dead = false;
            for weak in &snapshot {
                match weak.upgrade() {
                    Some(sub) => sub.handle(&event),
                    None => any_dead = true,
                }
            }

            if any_dead {
                if let Some(list) = self.subscribers.borrow_mut().get_mut(&ty) {
                    list.retain(|w| w.upgrade().is_some());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::Event;

    struct SpecificSub;
    impl Subscriber for SpecificSub {
        fn handled_types(&self) -> &'static [EventType] {
            &[EventType::DummyB]
        }
        fn handle(&self, event: &Event) {
            assert!(matches!(event, &Event::DummyB));
        }
    }

    struct AnySub(Cell<usize>);
    impl Subscriber for AnySub {
        fn handled_types(&self) -> &'static [EventType] {
            &[EventType::DummyA, EventType::DummyB]
        }
        fn handle(&self, _: &Event) {
            self.0.set(self.0.get() + 1)
        }
    }

    #[test]
    fn pub_sub_delivery() {
        let bus = EventBus::new();

        let specific = Rc::new(SpecificSub);
        let any = Rc::new(AnySub(Cell::new(0)));

        let specific_dyn: Rc<dyn Subscriber> = specific.clone();
        let any_dyn: Rc<dyn Subscriber> = any.clone();

        bus.register(&specific_dyn).unwrap();
        bus.register(&any_dyn).unwrap();

        bus.post(Event::DummyB);
        bus.post(Event::DummyA);
        bus.pump();

        // any_sub saw both, specific saw only DummyB (asserted inside handle)
        assert_eq!(any.0.get(), 2);

        bus.unregister(&any_dyn).unwrap();
        bus.post(Event::DummyA);
        bus.pump();
        assert_eq!(any.0.get(), 2); // unregistered, no further deliveries
    }

    #[test]
    fn double_register_fails() {
        let bus = EventBus::new();
        let sub: Rc<dyn Subscriber> = Rc::new(AnySub(Cell::new(0)));
        bus.register(&sub).unwrap();
        assert!(matches!(
            bus.register(&sub),
            Err(BusError::AlreadyRegistered)
        ));
    }

    #[test]
    fn unregister_unregistered_fails() {
        let bus = EventBus::new();
        let sub: Rc<dyn Subscriber> = Rc::new(AnySub(Cell::new(0)));
        assert!(matches!(
            bus.unregister(&sub),
            Err(BusError::NotRegistered)
        ));
    }

    #[test]
    fn dropped_subscriber_is_not_invoked() {
        let bus = EventBus::new();
        {
            let sub: Rc<dyn Subscriber> = Rc::new(AnySub(Cell::new(0)));
            bus.register(&sub).unwrap();
        } // sub dropped, only a Weak remains in the bus

        bus.post(Event::DummyA);
        bus.pump(); // must not panic or invoke a dead handler
    }

    #[test]
    fn posting_during_dispatch_is_delivered_in_same_pump() {
        // Handling DummyA posts a DummyB; both must be delivered within one pump() call.
        struct Chainer {
            bus: Weak<EventBus>,
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl Subscriber for Chainer {
            fn handled_types(&self) -> &'static [EventType] {
                &[EventType::DummyA, EventType::DummyB]
            }
            fn handle(&self, event: &Event) {
                match event {
                    Event::DummyA => {
                        self.log.borrow_mut().push("a");
                        if let Some(bus) = self.bus.upgrade() {
                            bus.post(Event::DummyB);
                        }
                    }
                    Event::DummyB => self.log.borrow_mut().push("b"),
                    _ => unreachable!(),
                }
            }
        }

        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sub: Rc<dyn Subscriber> = Rc::new(Chainer {
            bus: Rc::downgrade(&bus),
            log: log.clone(),
        });
        bus.register(&sub).unwrap();

        bus.post(Event::DummyA);
        bus.pump();

        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }
}
