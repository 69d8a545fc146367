//! Page-wide reading mode state shared by every controller.

use std::cell::Cell;

/// Page-wide activation counter, count of controllers currently in reading
/// mode and the "enter on next view" flag.
///
/// Single-threaded: controllers share it through an `Rc` and update it with
/// plain read-modify-write.
#[derive(Debug, Default)]
pub struct ReadingModeService {
    counter: Cell<usize>,
    active: Cell<usize>,
    enabled_on_enter: Cell<bool>,
}

impl ReadingModeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mounted reading-mode regions.
    pub fn counter(&self) -> usize {
        self.counter.get()
    }

    pub fn increase_counter(&self) {
        self.counter.set(self.counter.get().saturating_add(1));
    }

    /// Decrements the counter, never below zero.
    pub fn decrease_counter(&self) {
        let current = self.counter.get();
        if current == 0 {
            tracing::warn!("reading mode counter decreased below zero; ignoring");
            return;
        }
        self.counter.set(current - 1);
    }

    /// Number of controllers that entered reading mode and have neither left
    /// it nor been unmounted.
    pub fn active(&self) -> usize {
        self.active.get()
    }

    pub fn activate(&self) {
        self.active.set(self.active.get().saturating_add(1));
    }

    pub fn deactivate(&self) {
        let current = self.active.get();
        if current == 0 {
            tracing::warn!("reading mode activation count decreased below zero; ignoring");
            return;
        }
        self.active.set(current - 1);
    }

    /// Whether the page is in reading mode: at least one region is mounted,
    /// and either some controller is still active or reading mode was entered
    /// and not left since.
    pub fn is_enabled(&self) -> bool {
        self.counter.get() > 0 && (self.active.get() > 0 || self.enabled_on_enter.get())
    }

    pub fn is_enabled_on_enter(&self) -> bool {
        self.enabled_on_enter.get()
    }

    pub fn set_enabled_on_enter(&self, enabled: bool) {
        self.enabled_on_enter.set(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::ReadingModeService;

    #[test]
    fn counter_tracks_mounts_and_never_goes_negative() {
        let service = ReadingModeService::new();
        for _ in 0..3 {
            service.increase_counter();
        }
        service.decrease_counter();
        assert_eq!(service.counter(), 2);

        for _ in 0..5 {
            service.decrease_counter();
        }
        assert_eq!(service.counter(), 0);
    }

    #[test]
    fn enabled_requires_a_mounted_region() {
        let service = ReadingModeService::new();
        service.set_enabled_on_enter(true);
        assert!(!service.is_enabled());

        service.increase_counter();
        assert!(service.is_enabled());

        service.set_enabled_on_enter(false);
        assert!(!service.is_enabled());
    }

    #[test]
    fn an_active_controller_keeps_the_page_enabled_after_another_exits() {
        let service = ReadingModeService::new();
        service.increase_counter();
        service.increase_counter();
        service.activate();
        service.activate();
        service.set_enabled_on_enter(true);

        service.set_enabled_on_enter(false);
        service.deactivate();
        assert_eq!(service.active(), 1);
        assert!(service.is_enabled());

        service.deactivate();
        assert!(!service.is_enabled());

        service.deactivate();
        assert_eq!(service.active(), 0);
    }
}
