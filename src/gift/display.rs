use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A transient "+N seconds" marker floating over the timer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEffect {
    pub id: String,
    /// Seconds this credit added to the balance.
    pub amount: u64,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
}

/// Holds the currently visible effects. Expiry itself is scheduled by the
/// session loop; each effect is retired after a fixed duration regardless
/// of any other effect's lifecycle or further gift activity.
#[derive(Debug, Default)]
pub struct DisplayManager {
    active: Vec<DisplayEffect>,
}

impl DisplayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new effect. Ids are unique even for effects created
    /// within the same second.
    pub fn show(&mut self, amount: u64, sender_name: &str) -> DisplayEffect {
        let effect = DisplayEffect {
            id: Uuid::new_v4().to_string(),
            amount,
            sender_name: sender_name.to_string(),
            created_at: Utc::now(),
        };

        self.active.push(effect.clone());
        effect
    }

    /// Removes a retired effect from the visible set. Returns whether the
    /// id was still active; unknown ids are ignored.
    pub fn retire(&mut self, id: &str) -> bool {
        let before = self.active.len();
        self.active.retain(|effect| effect.id != id);
        before != self.active.len()
    }

    pub fn active(&self) -> &[DisplayEffect] {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_within_one_instant() {
        let mut display = DisplayManager::new();
        let a = display.show(5, "viewer_1");
        let b = display.show(5, "viewer_1");
        assert_ne!(a.id, b.id);
        assert_eq!(display.active().len(), 2);
    }

    #[test]
    fn retire_removes_only_the_target() {
        let mut display = DisplayManager::new();
        let a = display.show(1, "viewer_1");
        let b = display.show(2, "viewer_2");

        assert!(display.retire(&a.id));
        assert_eq!(display.active().len(), 1);
        assert_eq!(display.active()[0].id, b.id);
    }

    #[test]
    fn retiring_unknown_id_is_a_noop() {
        let mut display = DisplayManager::new();
        display.show(1, "viewer_1");
        assert!(!display.retire("nope"));
        assert_eq!(display.active().len(), 1);
    }
}
