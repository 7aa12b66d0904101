use egui::Rect;
use std::time::Instant;

use crate::autoscroll::{AutoscrollController, AutoscrollState, Reconciliation, ScrollMode, SentinelGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Wheel,
}

pub trait SentinelSurface {
    fn viewport_height(&self) -> f32;

    /// Sentinel rect relative to the top of the viewport, `None` if it has
    /// not been laid out.
    fn measure(&self) -> Option<Rect>;

    fn scroll_into_view(&mut self);
}

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

pub trait EventSource {
    fn listen(&mut self, kind: EventKind) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
}

pub trait Host: SentinelSurface + FrameScheduler + EventSource {}

impl<T: SentinelSurface + FrameScheduler + EventSource> Host for T {}

/// Resources held between mount and unmount.
#[derive(Debug)]
struct Mounted {
    scroll_listener: ListenerId,
    wheel_listener: ListenerId,
    pending_frame: Option<FrameHandle>,
}

/// Owns the host for the lifetime of a mounted pane and releases what it
/// acquired on unmount or drop.
pub struct ViewportBinding<H: Host> {
    host: H,
    controller: AutoscrollController,
    has_content: bool,
    mounted: Option<Mounted>,
}

impl<H: Host> ViewportBinding<H> {
    pub fn mount(mut host: H, has_content: bool) -> Self {
        let scroll_listener = host.listen(EventKind::Scroll);
        let wheel_listener = host.listen(EventKind::Wheel);

        // Start at the bottom of whatever is already there.
        if has_content {
            host.scroll_into_view();
        }
        tracing::debug!(has_content, "log pane mounted");

        Self {
            host,
            controller: AutoscrollController::new(),
            has_content,
            mounted: Some(Mounted {
                scroll_listener,
                wheel_listener,
                pending_frame: None,
            }),
        }
    }

    pub fn unmount(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        self.host.unlisten(mounted.scroll_listener);
        self.host.unlisten(mounted.wheel_listener);
        if let Some(handle) = mounted.pending_frame {
            self.host.cancel_frame(handle);
        }
        tracing::debug!("log pane unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> AutoscrollState {
        self.controller.state()
    }

    pub fn mode(&self) -> ScrollMode {
        self.controller.mode()
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.mounted.as_ref().and_then(|m| m.pending_frame)
    }

    /// Negative `delta_y` points toward the top of the log.
    pub fn on_wheel(&mut self, delta_y: f32, now: Instant) {
        if self.mounted.is_none() {
            return;
        }
        if delta_y < 0.0 {
            self.controller.on_manual_scroll_up(now);
        }
    }

    /// Schedules one reconciliation pass on the next frame, replacing any
    /// pass that is already waiting.
    pub fn on_scroll(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        if let Some(handle) = mounted.pending_frame.take() {
            self.host.cancel_frame(handle);
        }
        let handle = self.host.request_frame();
        tracing::trace!(frame = handle.0, "reconcile scheduled");
        mounted.pending_frame = Some(handle);
    }

    /// Frame callback. Stale or post-teardown handles are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Instant) -> Option<Reconciliation> {
        let mounted = self.mounted.as_mut()?;
        if mounted.pending_frame != Some(handle) {
            return None;
        }
        mounted.pending_frame = None;

        let viewport_height = self.host.viewport_height();
        let geometry = self.host.measure().map(|rect| SentinelGeometry {
            sentinel_bottom: rect.bottom(),
            viewport_height,
        });
        let outcome = self.controller.reconcile(now, self.has_content, geometry);
        self.scroll_if_following();
        Some(outcome)
    }

    /// New log text was committed.
    pub fn on_content(&mut self, has_content: bool) {
        if self.mounted.is_none() {
            return;
        }
        self.has_content = has_content;
        self.scroll_if_following();
    }

    fn scroll_if_following(&mut self) {
        // The sentinel only exists while there is content to show.
        if self.controller.is_following() && self.has_content {
            self.host.scroll_into_view();
        }
    }
}

impl<H: Host> Drop for ViewportBinding<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, Rect};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::time::Duration;

    /// Observable side of the fake host, shared so it outlives the binding.
    #[derive(Debug, Default)]
    struct Record {
        scrolls: usize,
        requested: Vec<FrameHandle>,
        cancelled: Vec<FrameHandle>,
        listeners: HashSet<ListenerId>,
        unlistened: Vec<ListenerId>,
    }

    struct FakeHost {
        viewport_height: f32,
        sentinel_bottom: Option<f32>,
        next_id: u64,
        record: Rc<RefCell<Record>>,
    }

    impl FakeHost {
        fn new(viewport_height: f32, sentinel_bottom: Option<f32>) -> (Self, Rc<RefCell<Record>>) {
            let record = Rc::new(RefCell::new(Record::default()));
            let host = Self {
                viewport_height,
                sentinel_bottom,
                next_id: 0,
                record: Rc::clone(&record),
            };
            (host, record)
        }
    }

    impl SentinelSurface for FakeHost {
        fn viewport_height(&self) -> f32 {
            self.viewport_height
        }

        fn measure(&self) -> Option<Rect> {
            self.sentinel_bottom
                .map(|bottom| Rect::from_min_max(pos2(0.0, bottom - 16.0), pos2(8.0, bottom)))
        }

        fn scroll_into_view(&mut self) {
            self.record.borrow_mut().scrolls += 1;
        }
    }

    impl FrameScheduler for FakeHost {
        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            let handle = FrameHandle(self.next_id);
            self.record.borrow_mut().requested.push(handle);
            handle
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.record.borrow_mut().cancelled.push(handle);
        }
    }

    impl EventSource for FakeHost {
        fn listen(&mut self, _kind: EventKind) -> ListenerId {
            self.next_id += 1;
            let id = ListenerId(self.next_id);
            self.record.borrow_mut().listeners.insert(id);
            id
        }

        fn unlisten(&mut self, id: ListenerId) {
            let mut record = self.record.borrow_mut();
            record.listeners.remove(&id);
            record.unlistened.push(id);
        }
    }

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    /// Deliver the pending frame, if any.
    fn run_frame(binding: &mut ViewportBinding<FakeHost>, now: Instant) -> Option<Reconciliation> {
        let handle = binding.pending_frame()?;
        binding.on_frame(handle, now)
    }

    #[test]
    fn mount_subscribes_and_scrolls_to_bottom() {
        // line1 + line2 + sentinel fit in a 400px viewport
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        let binding = ViewportBinding::mount(host, true);

        assert_eq!(binding.mode(), ScrollMode::Following);
        assert_eq!(record.borrow().listeners.len(), 2);
        assert_eq!(record.borrow().scrolls, 1);
    }

    #[test]
    fn mount_without_content_does_not_scroll() {
        let (host, record) = FakeHost::new(400.0, None);
        let _binding = ViewportBinding::mount(host, false);
        assert_eq!(record.borrow().scrolls, 0);
    }

    #[test]
    fn appending_while_following_rescrolls() {
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        let mut binding = ViewportBinding::mount(host, true);

        binding.host_mut().sentinel_bottom = Some(64.0);
        binding.on_content(true);

        assert_eq!(binding.mode(), ScrollMode::Following);
        assert_eq!(record.borrow().scrolls, 2);
    }

    #[test]
    fn wheel_down_does_not_pin() {
        let t0 = Instant::now();
        let (host, _record) = FakeHost::new(400.0, Some(48.0));
        let mut binding = ViewportBinding::mount(host, true);

        binding.on_wheel(120.0, at(t0, 1000));
        assert_eq!(binding.mode(), ScrollMode::Following);
        assert_eq!(binding.state().last_manual_scroll, None);
    }

    #[test]
    fn manual_scroll_then_settle_then_appends_stay_put() {
        let t0 = Instant::now();
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        let mut binding = ViewportBinding::mount(host, true);

        binding.on_wheel(-120.0, at(t0, 1000));
        assert_eq!(binding.mode(), ScrollMode::Pinned);
        assert_eq!(binding.state().last_manual_scroll, Some(at(t0, 1000)));

        // The gesture's own scroll notification
        binding.on_scroll();
        assert_eq!(run_frame(&mut binding, at(t0, 1100)), Some(Reconciliation::Debounced));
        assert_eq!(binding.mode(), ScrollMode::Pinned);
        assert_eq!(binding.state().last_manual_scroll, Some(at(t0, 1000)));

        // Settled, sentinel now below the fold
        binding.host_mut().sentinel_bottom = Some(900.0);
        binding.on_scroll();
        assert_eq!(run_frame(&mut binding, at(t0, 1400)), Some(Reconciliation::ManualSettled));
        assert_eq!(binding.mode(), ScrollMode::Pinned);
        assert_eq!(binding.state().last_manual_scroll, None);

        let scrolls = record.borrow().scrolls;
        binding.host_mut().sentinel_bottom = Some(916.0);
        binding.on_content(true);
        binding.on_content(true);
        assert_eq!(record.borrow().scrolls, scrolls);
    }

    #[test]
    fn scrolling_back_to_bottom_resumes_following() {
        let t0 = Instant::now();
        let (host, record) = FakeHost::new(400.0, Some(900.0));
        let mut binding = ViewportBinding::mount(host, true);

        binding.on_scroll();
        run_frame(&mut binding, t0);
        assert_eq!(binding.mode(), ScrollMode::Pinned);
        let scrolls = record.borrow().scrolls;

        binding.host_mut().sentinel_bottom = Some(390.0);
        binding.on_scroll();
        assert_eq!(
            run_frame(&mut binding, at(t0, 16)),
            Some(Reconciliation::Measured(ScrollMode::Following))
        );
        assert_eq!(record.borrow().scrolls, scrolls + 1);
    }

    #[test]
    fn burst_of_scroll_events_keeps_one_pending_frame() {
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        let mut binding = ViewportBinding::mount(host, true);

        for _ in 0..10 {
            binding.on_scroll();
        }

        let pending = binding.pending_frame().unwrap();
        let record = record.borrow();
        assert_eq!(record.requested.len(), 10);
        assert_eq!(record.cancelled.len(), 9);
        let live: Vec<FrameHandle> = record
            .requested
            .iter()
            .copied()
            .filter(|h| !record.cancelled.contains(h))
            .collect();
        assert_eq!(live, vec![pending]);
    }

    #[test]
    fn superseded_frame_is_ignored() {
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        let mut binding = ViewportBinding::mount(host, true);

        binding.on_scroll();
        let first = record.borrow().requested[0];
        binding.on_scroll();

        assert_eq!(binding.on_frame(first, Instant::now()), None);
        assert!(binding.pending_frame().is_some());
    }

    #[test]
    fn unmount_releases_everything() {
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        let mut binding = ViewportBinding::mount(host, true);
        binding.on_scroll();
        let pending = binding.pending_frame().unwrap();

        binding.unmount();

        assert!(!binding.is_mounted());
        assert!(record.borrow().listeners.is_empty());
        assert_eq!(record.borrow().cancelled, vec![pending]);
    }

    #[test]
    fn callbacks_after_unmount_are_noops() {
        let t0 = Instant::now();
        let (host, record) = FakeHost::new(400.0, Some(900.0));
        let mut binding = ViewportBinding::mount(host, true);
        binding.on_scroll();
        let pending = binding.pending_frame().unwrap();
        binding.unmount();

        let state = binding.state();
        let scrolls = record.borrow().scrolls;
        let requested = record.borrow().requested.len();

        assert_eq!(binding.on_frame(pending, t0), None);
        binding.on_wheel(-120.0, t0);
        binding.on_scroll();
        binding.on_content(true);

        assert_eq!(binding.state(), state);
        assert_eq!(record.borrow().scrolls, scrolls);
        assert_eq!(record.borrow().requested.len(), requested);
    }

    #[test]
    fn drop_unmounts_once() {
        let (host, record) = FakeHost::new(400.0, Some(48.0));
        {
            let mut binding = ViewportBinding::mount(host, true);
            binding.unmount();
        }
        assert_eq!(record.borrow().unlistened.len(), 2);

        let (host, record) = FakeHost::new(400.0, Some(48.0));
        drop(ViewportBinding::mount(host, true));
        assert!(record.borrow().listeners.is_empty());
    }

    #[test]
    fn emptied_log_resumes_following() {
        let (host, _record) = FakeHost::new(400.0, Some(900.0));
        let mut binding = ViewportBinding::mount(host, true);
        binding.on_scroll();
        run_frame(&mut binding, Instant::now());
        assert_eq!(binding.mode(), ScrollMode::Pinned);

        binding.host_mut().sentinel_bottom = None;
        binding.on_content(false);
        binding.on_scroll();
        run_frame(&mut binding, Instant::now());
        assert_eq!(binding.mode(), ScrollMode::Following);
    }
}
