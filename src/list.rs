extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

/// Sentinel index marking the absence of a neighbour.
const NIL: usize = usize::MAX;

/// A node in the arena-backed doubly linked list.
///
/// Nodes are addressed by their position in the arena. A vacant slot keeps
/// `val == None` and sits on the free list until the next insertion reuses it.
struct Entry<T> {
    val: Option<T>,
    prev: usize,
    next: usize,
}

impl<T> Entry<T> {
    fn new(val: T) -> Self {
        Entry {
            val: Some(val),
            prev: NIL,
            next: NIL,
        }
    }
}

/// A doubly linked list whose nodes live in a `Vec` and link to each other by index.
///
/// The front of the list is the most recently attached entry and the back is
/// the oldest one. Every operation that takes an index is O(1): detaching a
/// node only rewrites the links of its two neighbours, and freed slots are
/// recycled through a free list so the arena never grows past the peak number
/// of live entries.
///
/// Indices handed out by [`List::push_front`] stay valid until the entry is
/// removed. Using a stale index is not undefined behaviour; the accessors
/// return `None` and the mutators ignore it.
///
/// # Examples
///
/// ```ignore
/// let mut list = List::new();
/// let a = list.push_front("a");
/// let _b = list.push_front("b");
///
/// list.move_to_front(a);
/// assert_eq!(list.pop_back(), Some("b"));
/// ```
pub(crate) struct List<T> {
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> List<T> {
    /// Creates an empty list.
    pub(crate) fn new() -> List<T> {
        List {
            entries: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    /// Returns the current number of items in the list.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list contains no items.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn is_live(&self, idx: usize) -> bool {
        self.entries.get(idx).is_some_and(|e| e.val.is_some())
    }

    /// Inserts `val` at the front and returns the index addressing it.
    pub(crate) fn push_front(&mut self, val: T) -> usize {
        let idx = match self.free.pop() {
            Some(idx) => {
                self.entries[idx] = Entry::new(val);
                idx
            }
            None => {
                self.entries.push(Entry::new(val));
                self.entries.len() - 1
            }
        };
        self.attach(idx);
        self.len += 1;
        idx
    }

    /// Moves a live entry to the front of the list.
    pub(crate) fn move_to_front(&mut self, idx: usize) {
        if !self.is_live(idx) || self.head == idx {
            return;
        }
        self.detach(idx);
        self.attach(idx);
    }

    /// Returns the index of the back (oldest) entry.
    pub(crate) fn back(&self) -> Option<usize> {
        if self.tail == NIL {
            None
        } else {
            Some(self.tail)
        }
    }

    /// Removes the back (oldest) entry and returns its value.
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        let idx = self.back()?;
        self.remove(idx)
    }

    /// Removes the entry at `idx` and returns its value.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<T> {
        if !self.is_live(idx) {
            return None;
        }
        self.detach(idx);
        self.len -= 1;
        self.free.push(idx);
        self.entries[idx].val.take()
    }

    /// Gets a reference to the value stored at `idx`.
    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.entries.get(idx).and_then(|e| e.val.as_ref())
    }

    /// Gets a mutable reference to the value stored at `idx`.
    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.entries.get_mut(idx).and_then(|e| e.val.as_mut())
    }

    /// Iterates values from front (newest) to back (oldest).
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Removes every entry and releases the arena.
    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let entry = &self.entries[idx];
            (entry.prev, entry.next)
        };
        if prev == NIL {
            self.head = next;
        } else {
            self.entries[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.entries[next].prev = prev;
        }
        let entry = &mut self.entries[idx];
        entry.prev = NIL;
        entry.next = NIL;
    }

    fn attach(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let entry = &mut self.entries[idx];
            entry.prev = NIL;
            entry.next = old_head;
        }
        if old_head == NIL {
            self.tail = idx;
        } else {
            self.entries[old_head].prev = idx;
        }
        self.head = idx;
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Front-to-back iterator over a [`List`].
pub(crate) struct Iter<'a, T> {
    list: &'a List<T>,
    cursor: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cursor == NIL {
            return None;
        }
        let entry = &self.list.entries[self.cursor];
        self.cursor = entry.next;
        self.remaining -= 1;
        entry.val.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    fn collect<T: Clone>(list: &List<T>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_add_items() {
        let mut list = List::new();
        assert!(list.is_empty());
        list.push_front(1);
        list.push_front(2);
        list.push_front(3);
        assert_eq!(list.len(), 3);
        assert_eq!(collect(&list), vec![3, 2, 1]);
    }

    #[test]
    fn test_get_value() {
        let mut list = List::new();
        let a = list.push_front(String::from("a"));
        assert_eq!(list.get(a).map(String::as_str), Some("a"));
        if let Some(v) = list.get_mut(a) {
            v.push('!');
        }
        assert_eq!(list.get(a).map(String::as_str), Some("a!"));
        assert_eq!(list.get(42), None);
    }

    #[test]
    fn test_pop_back_order() {
        let mut list = List::new();
        list.push_front(1);
        list.push_front(2);
        list.push_front(3);
        assert_eq!(list.pop_back(), Some(1));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_move_to_front() {
        let mut list = List::new();
        let a = list.push_front('a');
        let b = list.push_front('b');
        let _c = list.push_front('c');

        list.move_to_front(a);
        assert_eq!(collect(&list), vec!['a', 'c', 'b']);

        // Already at the front; nothing changes.
        list.move_to_front(a);
        assert_eq!(collect(&list), vec!['a', 'c', 'b']);

        list.move_to_front(b);
        assert_eq!(collect(&list), vec!['b', 'a', 'c']);
        assert_eq!(list.len(), 3);
        assert_eq!(list.pop_back(), Some('c'));
    }

    #[test]
    fn test_remove_middle() {
        let mut list = List::new();
        let _a = list.push_front(1);
        let b = list.push_front(2);
        let _c = list.push_front(3);
        assert_eq!(list.remove(b), Some(2));
        assert_eq!(collect(&list), vec![3, 1]);
        assert_eq!(list.remove(b), None);
        list.move_to_front(b);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_slot_reuse() {
        let mut list = List::new();
        let a = list.push_front(1);
        list.push_front(2);
        assert_eq!(list.remove(a), Some(1));
        let c = list.push_front(3);
        assert_eq!(c, a);
        assert_eq!(list.entries.len(), 2);
        assert_eq!(collect(&list), vec![3, 2]);
    }

    #[test]
    fn test_clear() {
        let mut list = List::new();
        for i in 0..10 {
            list.push_front(i);
        }
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.back(), None);
        list.push_front(99);
        assert_eq!(collect(&list), vec![99]);
    }

    #[test]
    fn test_length_consistency_after_complex_operations() {
        let mut list = List::new();
        let mut handles = Vec::new();
        for i in 0..20 {
            handles.push(list.push_front(i));
        }
        for (n, &h) in handles.iter().enumerate() {
            if n % 3 == 0 {
                list.remove(h);
            } else if n % 3 == 1 {
                list.move_to_front(h);
            }
        }
        assert_eq!(list.len(), list.iter().count());
        while list.pop_back().is_some() {}
        assert_eq!(list.len(), 0);
        assert_eq!(list.iter().count(), 0);
    }
}
