//! Observable cells
//!
//! An [`ObservableCell`] is a single value slot with ordered change
//! listeners. Two cells can be merged into a two-way binding: a change on
//! either side is pushed to the other exactly once, never bouncing back.
//!
//! ```rust
//! use tether_core::ObservableCell;
//!
//! let model = ObservableCell::new(5);
//! let field = ObservableCell::new(0);
//!
//! model.merge(&field, |_| {}, |_| {});
//! assert_eq!(field.get(), 5);
//!
//! field.set(9);
//! assert_eq!(model.get(), 9);
//! ```
//!
//! # Propagation
//!
//! `set` stores the value, runs the cell's listeners in registration order,
//! then walks the merge links. Every cell reached during one walk keeps its
//! `propagating` flag raised until the originating `set` returns, so each cell
//! is updated at most once per walk, even when the links form a cycle. A
//! `set` on a cell whose flag is raised commits the value without notifying
//! anyone; that is the loop breaker.
//!
//! Links hold their peer weakly. Dropping a cell never keeps its peer alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Change listener
pub type Listener<T> = Rc<dyn Fn(&T)>;

/// Identifies a listener registered with [`ObservableCell::listen`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct PeerLink<T> {
    peer: Weak<CellInner<T>>,
    /// Runs when a change crosses this link into `peer`
    on_propagate: Listener<T>,
}

struct CellInner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    peers: RefCell<Vec<PeerLink<T>>>,
    propagating: Cell<bool>,
    next_listener: Cell<u64>,
}

/// Cells touched by one propagation walk; their flags drop with the guard
struct PropagationGuard<T> {
    touched: Vec<Rc<CellInner<T>>>,
}

impl<T> PropagationGuard<T> {
    fn new() -> Self {
        Self {
            touched: Vec::new(),
        }
    }

    fn enter(&mut self, cell: &Rc<CellInner<T>>) {
        cell.propagating.set(true);
        self.touched.push(cell.clone());
    }
}

impl<T> Drop for PropagationGuard<T> {
    fn drop(&mut self) {
        for cell in &self.touched {
            cell.propagating.set(false);
        }
    }
}

impl<T: Clone + 'static> CellInner<T> {
    /// Store, notify local listeners, then push along live links
    fn propagate(
        cell: &Rc<CellInner<T>>,
        value: T,
        hop: Option<&Listener<T>>,
        guard: &mut PropagationGuard<T>,
    ) {
        guard.enter(cell);
        *cell.value.borrow_mut() = value.clone();

        if let Some(hop) = hop {
            hop(&value);
        }

        let listeners: Vec<Listener<T>> = cell
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in &listeners {
            listener(&value);
        }

        for (peer, on_propagate) in cell.live_links() {
            if peer.propagating.get() {
                tracing::trace!("merge propagation suppressed, peer already updated");
                continue;
            }
            Self::propagate(&peer, value.clone(), Some(&on_propagate), guard);
        }
    }

    /// Snapshot of links whose peer is still alive; dead links are pruned
    fn live_links(&self) -> Vec<(Rc<CellInner<T>>, Listener<T>)> {
        let mut peers = self.peers.borrow_mut();
        peers.retain(|link| link.peer.strong_count() > 0);
        peers
            .iter()
            .filter_map(|link| {
                link.peer
                    .upgrade()
                    .map(|peer| (peer, link.on_propagate.clone()))
            })
            .collect()
    }

    /// Link to `peer`, replacing an existing link to the same cell
    fn link(&self, peer: &Rc<CellInner<T>>, on_propagate: Listener<T>) {
        let mut peers = self.peers.borrow_mut();
        peers.retain(|link| link.peer.strong_count() > 0 && !ptr_eq(&link.peer, peer));
        peers.push(PeerLink {
            peer: Rc::downgrade(peer),
            on_propagate,
        });
    }

    fn unlink(&self, peer: &Rc<CellInner<T>>) -> bool {
        let mut peers = self.peers.borrow_mut();
        let before = peers.len();
        peers.retain(|link| !ptr_eq(&link.peer, peer));
        peers.len() != before
    }
}

fn ptr_eq<T>(weak: &Weak<CellInner<T>>, strong: &Rc<CellInner<T>>) -> bool {
    std::ptr::eq(weak.as_ptr(), Rc::as_ptr(strong))
}

/// A mutable value slot with change listeners and two-way merge links
///
/// Cloning yields another handle to the same slot.
pub struct ObservableCell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T> Clone for ObservableCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> ObservableCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(CellInner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                peers: RefCell::new(Vec::new()),
                propagating: Cell::new(false),
                next_listener: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store a value and propagate it
    ///
    /// While this cell is already propagating, the value is committed and
    /// nothing else happens.
    pub fn set(&self, value: T) {
        if self.inner.propagating.get() {
            tracing::trace!("cell set during its own propagation, committing silently");
            *self.inner.value.borrow_mut() = value;
            return;
        }
        let mut guard = PropagationGuard::new();
        CellInner::propagate(&self.inner, value, None, &mut guard);
    }

    /// Mutate the current value in place, then propagate it like `set`
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    /// Append a listener. It is not called with the current value, only on
    /// later changes.
    pub fn listen<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        let listener: Listener<T> = Rc::new(listener);
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Bind this cell and `peer` both ways
    ///
    /// `on_self_changed` runs whenever a change from this side reaches the
    /// peer, `on_peer_changed` whenever one from the peer reaches this cell.
    /// This cell is the primary: its current value is copied into the peer
    /// once, right away. Merging again with the same peer replaces the
    /// previous hooks instead of adding a second link.
    pub fn merge<F, G>(&self, peer: &ObservableCell<T>, on_self_changed: F, on_peer_changed: G)
    where
        F: Fn(&T) + 'static,
        G: Fn(&T) + 'static,
    {
        if Rc::ptr_eq(&self.inner, &peer.inner) {
            tracing::warn!("ignoring merge of a cell with itself");
            return;
        }

        let on_self_changed: Listener<T> = Rc::new(on_self_changed);
        self.inner.link(&peer.inner, on_self_changed.clone());
        peer.inner.link(&self.inner, Rc::new(on_peer_changed));

        let value = self.get();
        if self.inner.propagating.get() || peer.inner.propagating.get() {
            // merged from inside a propagation walk
            *peer.inner.value.borrow_mut() = value;
            return;
        }
        let mut guard = PropagationGuard::new();
        guard.enter(&self.inner);
        CellInner::propagate(&peer.inner, value, Some(&on_self_changed), &mut guard);
    }

    /// Remove the link to `peer` on both sides; values are left as they are
    pub fn unmerge(&self, peer: &ObservableCell<T>) -> bool {
        let here = self.inner.unlink(&peer.inner);
        let there = peer.inner.unlink(&self.inner);
        here || there
    }

    /// Whether a live merge link to `peer` exists; agrees with [`peer_count`](Self::peer_count)
    pub fn is_merged_with(&self, peer: &ObservableCell<T>) -> bool {
        self.inner
            .live_links()
            .iter()
            .any(|(linked, _)| Rc::ptr_eq(linked, &peer.inner))
    }

    /// Number of live merge links
    pub fn peer_count(&self) -> usize {
        self.inner.live_links().len()
    }

    /// Whether both handles refer to the same slot
    pub fn ptr_eq(&self, other: &ObservableCell<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + PartialEq + 'static> ObservableCell<T> {
    /// `set` only when the value differs; returns whether it did
    pub fn set_if_changed(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: Clone + Default + 'static> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCell")
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("peers", &self.inner.peers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |v: &T| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn test_listen_does_not_fire_immediately() {
        let cell = ObservableCell::new(1);
        let (log, listener) = recorder::<i32>();
        cell.listen(listener);
        assert!(log.borrow().is_empty());

        cell.set(2);
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let cell = ObservableCell::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            cell.listen(move |_| order.borrow_mut().push(tag));
        }

        cell.set(1);
        cell.set(2);
        assert_eq!(
            *order.borrow(),
            vec!["first", "second", "third", "first", "second", "third"]
        );
    }

    #[test]
    fn test_set_inside_listener_commits_without_recursion() {
        let cell = ObservableCell::new(0);
        let calls = Rc::new(Cell::new(0));
        let handle = cell.clone();
        let c = calls.clone();
        cell.listen(move |v| {
            c.set(c.get() + 1);
            handle.set(v + 100);
        });

        cell.set(1);
        assert_eq!(calls.get(), 1);
        assert_eq!(cell.get(), 101);
    }

    #[test]
    fn test_unlisten() {
        let cell = ObservableCell::new(0);
        let (log, listener) = recorder::<i32>();
        let id = cell.listen(listener);
        assert_eq!(cell.listener_count(), 1);
        assert!(cell.unlisten(id));
        assert!(!cell.unlisten(id));
        cell.set(3);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_merge_copies_primary_value_once() {
        let a = ObservableCell::new(5);
        let b = ObservableCell::new(0);
        let (hops, on_a) = recorder::<i32>();
        let (b_log, b_listener) = recorder::<i32>();
        b.listen(b_listener);

        a.merge(&b, on_a, |_| {});
        assert_eq!(a.get(), 5);
        assert_eq!(b.get(), 5);
        assert_eq!(*hops.borrow(), vec![5]);
        assert_eq!(*b_log.borrow(), vec![5]);
    }

    #[test]
    fn test_merge_flows_both_ways_one_hop_each() {
        let a = ObservableCell::new(5);
        let b = ObservableCell::new(0);
        a.merge(&b, |_| {}, |_| {});

        let (a_log, a_listener) = recorder::<i32>();
        let (b_log, b_listener) = recorder::<i32>();
        a.listen(a_listener);
        b.listen(b_listener);

        b.set(9);
        assert_eq!(a.get(), 9);
        assert_eq!(*a_log.borrow(), vec![9]);
        assert_eq!(*b_log.borrow(), vec![9]);

        a.set(3);
        assert_eq!(b.get(), 3);
        assert_eq!(*a_log.borrow(), vec![9, 3]);
        assert_eq!(*b_log.borrow(), vec![9, 3]);
    }

    #[test]
    fn test_local_listeners_run_before_peer() {
        let a = ObservableCell::new(0);
        let b = ObservableCell::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        a.merge(&b, move |_| o.borrow_mut().push("hop a->b"), |_| {});
        let o = order.clone();
        a.listen(move |_| o.borrow_mut().push("a"));
        let o = order.clone();
        b.listen(move |_| o.borrow_mut().push("b"));

        a.set(1);
        assert_eq!(*order.borrow(), vec!["a", "hop a->b", "b"]);
    }

    #[test]
    fn test_remerge_does_not_multiply_notifications() {
        let a = ObservableCell::new(1);
        let b = ObservableCell::new(0);
        for _ in 0..5 {
            a.merge(&b, |_| {}, |_| {});
        }
        assert_eq!(a.peer_count(), 1);
        assert_eq!(b.peer_count(), 1);

        let (log, listener) = recorder::<i32>();
        b.listen(listener);
        a.set(2);
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_chain_of_three() {
        let a = ObservableCell::new(0);
        let b = ObservableCell::new(0);
        let c = ObservableCell::new(0);
        a.merge(&b, |_| {}, |_| {});
        b.merge(&c, |_| {}, |_| {});

        let (log, listener) = recorder::<i32>();
        c.listen(listener);
        a.set(4);
        assert_eq!((a.get(), b.get(), c.get()), (4, 4, 4));
        assert_eq!(*log.borrow(), vec![4]);

        c.set(8);
        assert_eq!((a.get(), b.get(), c.get()), (8, 8, 8));
    }

    #[test]
    fn test_cycle_notifies_each_cell_once() {
        let a = ObservableCell::new(0);
        let b = ObservableCell::new(0);
        let c = ObservableCell::new(0);
        a.merge(&b, |_| {}, |_| {});
        b.merge(&c, |_| {}, |_| {});
        c.merge(&a, |_| {}, |_| {});

        let counts: Vec<Rc<Cell<u32>>> = (0..3).map(|_| Rc::new(Cell::new(0))).collect();
        for (cell, count) in [&a, &b, &c].into_iter().zip(&counts) {
            let count = count.clone();
            cell.listen(move |_| count.set(count.get() + 1));
        }

        b.set(6);
        assert_eq!((a.get(), b.get(), c.get()), (6, 6, 6));
        for count in &counts {
            assert_eq!(count.get(), 1);
        }
    }

    #[test]
    fn test_dropped_peer_is_pruned() {
        let a = ObservableCell::new(0);
        {
            let b = ObservableCell::new(0);
            a.merge(&b, |_| {}, |_| {});
            assert_eq!(a.peer_count(), 1);
        }
        a.set(2);
        assert_eq!(a.peer_count(), 0);
    }

    #[test]
    fn test_write_to_visited_cell_commits_silently() {
        let a = ObservableCell::new(0);
        let b = ObservableCell::new(0);
        let c = ObservableCell::new(0);
        a.merge(&b, |_| {}, |_| {});
        b.merge(&c, |_| {}, |_| {});

        let back = b.clone();
        c.listen(move |_| back.set(7));
        let (log, listener) = recorder::<i32>();
        b.listen(listener);

        a.set(1);
        assert_eq!((a.get(), b.get(), c.get()), (1, 7, 1));
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn test_merge_queries_agree_after_peer_drops() {
        let a = ObservableCell::new(0);
        let c = ObservableCell::new(0);
        a.merge(&c, |_| {}, |_| {});
        {
            let b = ObservableCell::new(0);
            a.merge(&b, |_| {}, |_| {});
            assert!(a.is_merged_with(&b));
            assert_eq!(a.peer_count(), 2);
        }
        assert!(a.is_merged_with(&c));
        assert_eq!(a.peer_count(), 1);
    }

    #[test]
    fn test_unmerge_stops_propagation() {
        let a = ObservableCell::new(1);
        let b = ObservableCell::new(0);
        a.merge(&b, |_| {}, |_| {});
        assert!(a.is_merged_with(&b));
        assert!(b.unmerge(&a));
        assert!(!a.is_merged_with(&b));

        a.set(10);
        assert_eq!(b.get(), 1);
        assert!(!a.unmerge(&b));
    }

    #[test]
    fn test_update_and_set_if_changed() {
        let cell = ObservableCell::new(String::from("a"));
        let (log, listener) = recorder::<String>();
        cell.listen(listener);

        cell.update(|s| s.push('b'));
        assert!(!cell.set_if_changed("ab".to_string()));
        assert!(cell.set_if_changed("abc".to_string()));
        assert_eq!(*log.borrow(), vec!["ab".to_string(), "abc".to_string()]);
    }

    #[test]
    fn test_self_merge_is_ignored() {
        let a = ObservableCell::new(1);
        a.merge(&a.clone(), |_| {}, |_| {});
        assert_eq!(a.peer_count(), 0);
    }
}
