//! Per-caller review session.
//!
//! Tracks the review a caller is currently working on. The session is owned
//! by the caller and passed into the controller; nothing is global.

use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReviewSession {
    current: Option<Uuid>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Uuid> {
        self.current
    }

    pub fn begin(&mut self, review_id: Uuid) {
        self.current = Some(review_id);
    }

    /// Forget the current review if it is `review_id`.
    pub fn clear_if(&mut self, review_id: Uuid) {
        if self.current == Some(review_id) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_if_only_clears_matching_review() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut s = ReviewSession::new();
        s.begin(a);
        s.clear_if(b);
        assert_eq!(s.current(), Some(a));
        s.clear_if(a);
        assert_eq!(s.current(), None);
    }
}
