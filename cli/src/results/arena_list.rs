//! Doubly-linked list stored in an arena of slots.
//!
//! Every pushed value gets a [`NodeRef`] that stays valid until that exact
//! node is removed, no matter how many other nodes are inserted or removed
//! in between. Freed slots are reused; each slot carries a generation that is
//! bumped on removal, so a handle to a removed node never resolves to the
//! value that later reuses its slot.

/// Stable handle to a node of an [`ArenaList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

#[derive(Debug)]
pub struct ArenaList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for ArenaList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ArenaList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_back(&mut self, value: T) -> NodeRef {
        let node = Node {
            value,
            prev: self.tail,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].node = Some(node);
                index
            },
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            },
        };

        match self.tail.and_then(|tail| self.node_at_mut(tail)) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        NodeRef {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Unlink and return the node's value; `None` if the handle is stale.
    pub fn remove(&mut self, node_ref: NodeRef) -> Option<T> {
        if !self.contains(node_ref) {
            return None;
        }

        let slot = &mut self.slots[node_ref.index];
        let node = slot.node.take()?;
        slot.generation += 1;
        self.free.push(node_ref.index);
        self.len -= 1;

        match node.prev.and_then(|prev| self.node_at_mut(prev)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|next| self.node_at_mut(next)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }

        Some(node.value)
    }

    pub fn pop_front(&mut self) -> Option<(NodeRef, T)> {
        let front = self.front()?;
        self.remove(front).map(|value| (front, value))
    }

    pub fn contains(&self, node_ref: NodeRef) -> bool {
        self.slots
            .get(node_ref.index)
            .is_some_and(|slot| slot.generation == node_ref.generation && slot.node.is_some())
    }

    pub fn get(&self, node_ref: NodeRef) -> Option<&T> {
        if !self.contains(node_ref) {
            return None;
        }
        self.node_at(node_ref.index).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, node_ref: NodeRef) -> Option<&mut T> {
        if !self.contains(node_ref) {
            return None;
        }
        self.node_at_mut(node_ref.index).map(|node| &mut node.value)
    }

    pub fn front(&self) -> Option<NodeRef> {
        self.head.map(|index| self.handle(index))
    }

    pub fn back(&self) -> Option<NodeRef> {
        self.tail.map(|index| self.handle(index))
    }

    pub fn next(&self, node_ref: NodeRef) -> Option<NodeRef> {
        if !self.contains(node_ref) {
            return None;
        }
        let next = self.node_at(node_ref.index)?.next?;
        Some(self.handle(next))
    }

    pub fn prev(&self, node_ref: NodeRef) -> Option<NodeRef> {
        if !self.contains(node_ref) {
            return None;
        }
        let prev = self.node_at(node_ref.index)?.prev?;
        Some(self.handle(prev))
    }

    /// Iterate values front to back
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn handle(&self, index: usize) -> NodeRef {
        NodeRef {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn node_at(&self, index: usize) -> Option<&Node<T>> {
        self.slots.get(index).and_then(|slot| slot.node.as_ref())
    }

    fn node_at_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(index).and_then(|slot| slot.node.as_mut())
    }
}

pub struct Iter<'a, T> {
    list: &'a ArenaList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node_at(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.value)
    }
}
