//! Ordered listener registry shared by every widget.
//!
//! Listeners are called synchronously in registration order. A listener
//! that panics is not caught; the panic unwinds through the widget call.

/// Handle returned on registration; used to remove that exact listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub struct Listeners<F: ?Sized> {
    next_id: u64,
    entries: Vec<(ListenerId, Box<F>)>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self { next_id: 0, entries: Vec::new() }
    }
}

impl<F: ?Sized> Listeners<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<F>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Remove a previously added listener. Unknown ids are ignored.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.entries.iter().position(|(eid, _)| *eid == id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.entries.iter_mut().map(|(_, l)| l)
    }
}

impl<F: ?Sized> std::fmt::Debug for Listeners<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("len", &self.entries.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Cb = dyn FnMut(u32);

    #[test]
    fn test_fires_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ls: Listeners<Cb> = Listeners::new();
        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            ls.add(Box::new(move |v| seen.borrow_mut().push(format!("{}{}", tag, v))));
        }
        for l in ls.iter_mut() {
            l(1);
        }
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_remove_by_identity() {
        let count = Rc::new(RefCell::new(0));
        let mut ls: Listeners<Cb> = Listeners::new();
        let c1 = count.clone();
        let first = ls.add(Box::new(move |_| *c1.borrow_mut() += 1));
        let c2 = count.clone();
        ls.add(Box::new(move |_| *c2.borrow_mut() += 10));

        assert!(ls.remove(first));
        assert!(!ls.remove(first));
        for l in ls.iter_mut() {
            l(0);
        }
        assert_eq!(*count.borrow(), 10);
        assert_eq!(ls.len(), 1);
    }
}
