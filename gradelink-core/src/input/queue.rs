//! Bounded button event queue

use heapless::Deque;

use crate::traits::Button;

/// Events kept before the oldest is dropped
pub const QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressKind {
    /// Released
    Click,
    /// Still pressed after the hold time; the release still reports a click
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub button: Button,
    pub kind: PressKind,
}

/// FIFO of button events; a full queue drops its oldest event
#[derive(Debug, Default)]
pub struct ClickQueue {
    events: Deque<ButtonEvent, QUEUE_DEPTH>,
    dropped: u32,
}

impl ClickQueue {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: ButtonEvent) {
        if self.events.is_full() {
            self.events.pop_front();
            self.dropped = self.dropped.wrapping_add(1);
            debug!("Button queue full, oldest event dropped");
        }
        let _ = self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<ButtonEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events lost to overflow since boot
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(button: Button) -> ButtonEvent {
        ButtonEvent {
            button,
            kind: PressKind::Click,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ClickQueue::new();
        queue.push(click(Button::Up));
        queue.push(click(Button::Enter));
        assert_eq!(queue.pop(), Some(click(Button::Up)));
        assert_eq!(queue.pop(), Some(click(Button::Enter)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut queue = ClickQueue::new();
        for button in Button::ALL {
            queue.push(click(button));
        }
        queue.push(click(Button::Up));
        queue.push(click(Button::Down));
        assert_eq!(queue.len(), QUEUE_DEPTH);

        // Ten pushed into eight slots: the first Up and Down are gone
        queue.push(click(Button::Mode));
        assert_eq!(queue.len(), QUEUE_DEPTH);
        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.pop(), Some(click(Button::Mode)));
        assert_eq!(queue.pop(), Some(click(Button::Enter)));
    }
}
