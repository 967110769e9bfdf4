//! Array-backed binary min-heap parameterized by a comparator.

use std::cmp::Ordering;

pub(crate) struct Heap<T, F: Fn(&T, &T) -> Ordering> {
    items: Vec<T>,
    cmp: F,
}

impl<T, F: Fn(&T, &T) -> Ordering> Heap<T, F> {
    pub fn new(cmp: F) -> Heap<T, F> {
        Heap { items: vec![], cmp }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }

        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let item = self.items.pop();

        if !self.items.is_empty() {
            self.sift_down(0);
        }

        item
    }

    fn sift_up(&mut self, mut at: usize) {
        while at > 0 {
            let parent = (at - 1) / 2;
            if (self.cmp)(&self.items[at], &self.items[parent]) == Ordering::Less {
                self.items.swap(at, parent);
                at = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut at: usize) {
        let len = self.items.len();

        loop {
            let left = 2 * at + 1;
            if left >= len {
                break;
            }

            let right = left + 1;
            let mut smallest = left;
            if right < len && (self.cmp)(&self.items[right], &self.items[left]) == Ordering::Less {
                smallest = right;
            }

            if (self.cmp)(&self.items[smallest], &self.items[at]) == Ordering::Less {
                self.items.swap(at, smallest);
                at = smallest;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_comparator_order() {
        let mut heap = Heap::new(|a: &u32, b: &u32| a.cmp(b));
        for v in [5u32, 1, 4, 1, 3, 9, 2] {
            heap.push(v);
        }

        let mut out = vec![];
        while let Some(v) = heap.pop() {
            out.push(v);
        }

        assert_eq!(out, vec![1, 1, 2, 3, 4, 5, 9]);
    }

    #[test]
    fn reverse_comparator() {
        let mut heap = Heap::new(|a: &u32, b: &u32| b.cmp(a));
        for v in [1u32, 3, 2] {
            heap.push(v);
        }
        assert_eq!(heap.pop(), Some(3));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn empty_pop() {
        let mut heap: Heap<u32, _> = Heap::new(|a: &u32, b: &u32| a.cmp(b));
        assert!(heap.is_empty());
        assert_eq!(heap.pop(), None);
    }
}
