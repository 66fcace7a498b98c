//! Fixed-capacity object pools with generational handles
//!
//! Slots are recycled through a free list. A handle to a recycled slot is
//! rejected because its generation no longer matches, so stale references
//! held by projectiles or chain resolution can never touch a new occupant.

use std::fmt;

/// A generational slot handle. Compact u32 index + generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Create a handle from raw parts (mainly for testing).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this handle (incremented on reuse).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena of at most `capacity` live values.
///
/// `activate` returns `None` once every slot is occupied; callers treat that
/// as a dropped request, never as an error.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    capacity: usize,
    len: usize,
}

impl<T> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            capacity,
            len: 0,
        }
    }

    /// Activate a slot holding `value`.
    pub fn activate(&mut self, value: T) -> Option<Handle> {
        self.activate_with(|_| value)
    }

    /// Activate a slot, building the value from its handle so it can store its own id.
    pub fn activate_with(&mut self, build: impl FnOnce(Handle) -> T) -> Option<Handle> {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else if self.slots.len() < self.capacity {
            self.slots.push(Slot {
                generation: 0,
                value: None,
            });
            (self.slots.len() - 1) as u32
        } else {
            return None;
        };

        let slot = &mut self.slots[index as usize];
        let handle = Handle {
            index,
            generation: slot.generation,
        };
        slot.value = Some(build(handle));
        self.len += 1;
        Some(handle)
    }

    /// Deactivate a slot, returning its value if the handle was live.
    pub fn deactivate(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterate live values with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    /// Snapshot of live handles, for loops that mutate the pool while walking it.
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Deactivate every live slot.
    pub fn clear(&mut self) {
        for handle in self.handles() {
            self.deactivate(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_and_get() {
        let mut pool = Pool::with_capacity(4);
        let a = pool.activate(10).unwrap();
        let b = pool.activate(20).unwrap();
        assert_eq!(pool.get(a), Some(&10));
        assert_eq!(pool.get(b), Some(&20));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let mut pool = Pool::with_capacity(2);
        assert!(pool.activate(1).is_some());
        assert!(pool.activate(2).is_some());
        assert!(pool.is_full());
        assert!(pool.activate(3).is_none());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut pool = Pool::with_capacity(1);
        let first = pool.activate("a").unwrap();
        assert_eq!(pool.deactivate(first), Some("a"));

        let second = pool.activate("b").unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(pool.get(first).is_none());
        assert_eq!(pool.get(second), Some(&"b"));
    }

    #[test]
    fn test_double_deactivate() {
        let mut pool = Pool::with_capacity(2);
        let h = pool.activate(5).unwrap();
        assert!(pool.deactivate(h).is_some());
        assert!(pool.deactivate(h).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_activate_with_sees_own_handle() {
        let mut pool = Pool::with_capacity(3);
        let h = pool.activate_with(|handle| handle).unwrap();
        assert_eq!(pool.get(h), Some(&h));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut pool = Pool::with_capacity(4);
        let a = pool.activate(1).unwrap();
        pool.activate(2).unwrap();
        pool.activate(3).unwrap();
        pool.deactivate(a);

        let values: Vec<i32> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![2, 3]);

        pool.clear();
        assert!(pool.is_empty());
    }
}
