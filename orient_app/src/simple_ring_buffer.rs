/// A bounded ring buffer for Copy types.
/// Storage grows with the first `capacity` pushes, after which the oldest
/// element is overwritten.
pub struct RingBuffer<T: Copy> {
    buffer: Vec<T>,
    capacity: usize,
    head: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// Create a new empty buffer holding at most `capacity` elements (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::new(),
            capacity: capacity.max(1),
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Push with overwrite (cyclic behavior)
    pub fn push_cyclic(&mut self, val: T) {
        if self.is_full() {
            // overwrite oldest
            self.buffer[self.head] = val;
            self.head = (self.head + 1) % self.capacity;
        } else {
            self.buffer.push(val);
        }
    }

    /// Peek by index relative to head
    pub fn peek(&self, index: usize) -> Option<T> {
        if index >= self.count() {
            return None;
        }
        let pos = (self.head + index) % self.count();
        Some(self.buffer[pos])
    }

    /// Element halfway through the buffer in insertion order.
    pub fn middle(&self) -> Option<T> {
        self.peek(self.count() / 2)
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.buffer.split_at(self.head);
        older.iter().chain(newer)
    }
}
