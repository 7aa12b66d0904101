use egui::text::LayoutJob;
use egui::{vec2, Align, FontId, Rect, RichText, TextFormat};
use std::time::Instant;

use crate::autoscroll::ScrollMode;
use crate::log_buffer::{LogBuffer, SENTINEL_GLYPH};
use crate::renderer::LineRenderer;
use crate::viewport::{
    EventKind, EventSource, FrameHandle, FrameScheduler, ListenerId, SentinelSurface, ViewportBinding,
};

pub const EMPTY_MESSAGE: &str = "No Logs Found";

/// Space kept below the sentinel so that a view scrolled to the bottom
/// shows it strictly inside the viewport.
const SENTINEL_MARGIN: f32 = 8.0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub pod_ids: Vec<String>,
    pub endpoints: Vec<String>,
}

impl ResourceMetadata {
    pub fn is_empty(&self) -> bool {
        self.pod_ids.is_empty() && self.endpoints.is_empty()
    }

    pub fn pod_ids_label(&self) -> &'static str {
        if self.pod_ids.len() > 1 { "Pod IDs:" } else { "Pod ID:" }
    }

    pub fn endpoints_label(&self) -> &'static str {
        if self.endpoints.len() > 1 { "Endpoints:" } else { "Endpoint:" }
    }
}

/// What the pane shows for the current log text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneContent {
    Empty,
    Log(LogBuffer),
}

impl PaneContent {
    pub fn from_text(log_text: Option<&str>) -> Self {
        match log_text {
            Some(text) if !text.is_empty() => PaneContent::Log(LogBuffer::new(text)),
            _ => PaneContent::Empty,
        }
    }

    pub fn has_content(&self) -> bool {
        matches!(self, PaneContent::Log(_))
    }

    pub fn line_count(&self) -> usize {
        match self {
            PaneContent::Empty => 0,
            PaneContent::Log(buffer) => buffer.len(),
        }
    }
}

/// Host surface backed by the most recent egui layout.
pub struct EguiSurface {
    ctx: egui::Context,
    viewport: Option<Rect>,
    sentinel: Option<Rect>,
    scroll_requested: bool,
    // The last layout ran before a programmatic scroll took effect.
    layout_stale: bool,
    scrolls_applied: u64,
    next_id: u64,
    pending_frame: Option<(FrameHandle, u64)>,
    listeners: Vec<(ListenerId, EventKind)>,
}

impl EguiSurface {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            viewport: None,
            sentinel: None,
            scroll_requested: false,
            layout_stale: false,
            scrolls_applied: 0,
            next_id: 0,
            pending_frame: None,
            listeners: Vec::new(),
        }
    }

    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.listeners.iter().any(|(_, k)| *k == kind)
    }

    /// The pending frame callback, once a later frame has been laid out
    /// at its final scroll offset.
    pub fn take_due_frame(&mut self) -> Option<FrameHandle> {
        let (handle, requested_at) = self.pending_frame?;
        if !self.layout_stale && self.ctx.frame_nr() > requested_at {
            self.pending_frame = None;
            Some(handle)
        } else {
            None
        }
    }

    pub fn scroll_requested(&self) -> bool {
        self.scroll_requested
    }

    /// Programmatic scrolls performed so far.
    pub fn scrolls_applied(&self) -> u64 {
        self.scrolls_applied
    }

    fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = Some(viewport);
    }

    /// Record this frame's sentinel. `scrolled` means the scroll area moves
    /// after this layout, so the rect is not yet where the user sees it.
    fn record_layout(&mut self, sentinel: Rect, scrolled: bool) {
        self.sentinel = Some(sentinel);
        self.layout_stale = scrolled;
        if scrolled {
            self.scrolls_applied += 1;
        }
    }

    fn clear_layout(&mut self) {
        self.sentinel = None;
        self.layout_stale = false;
        self.scroll_requested = false;
    }

    fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl SentinelSurface for EguiSurface {
    fn viewport_height(&self) -> f32 {
        self.viewport.map_or(0.0, |v| v.height())
    }

    fn measure(&self) -> Option<Rect> {
        let viewport = self.viewport?;
        let sentinel = self.sentinel?;
        Some(sentinel.translate(-viewport.min.to_vec2()))
    }

    fn scroll_into_view(&mut self) {
        self.scroll_requested = true;
        self.ctx.request_repaint();
    }
}

impl FrameScheduler for EguiSurface {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending_frame = Some((handle, self.ctx.frame_nr()));
        self.ctx.request_repaint();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if matches!(self.pending_frame, Some((pending, _)) if pending == handle) {
            self.pending_frame = None;
        }
    }
}

impl EventSource for EguiSurface {
    fn listen(&mut self, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.push((id, kind));
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener, _)| *listener != id);
    }
}

/// A scrolling log view that follows new output until the user scrolls up.
pub struct LogPane<R: LineRenderer> {
    binding: ViewportBinding<EguiSurface>,
    renderer: R,
    log_text: String,
    content: PaneContent,
    metadata: ResourceMetadata,
    is_expanded: bool,
    content_dirty: bool,
    last_offset: Option<f32>,
}

impl<R: LineRenderer> LogPane<R> {
    pub fn new(ctx: egui::Context, renderer: R, log_text: String, metadata: ResourceMetadata) -> Self {
        let content = PaneContent::from_text(Some(&log_text));
        let binding = ViewportBinding::mount(EguiSurface::new(ctx), content.has_content());
        Self {
            binding,
            renderer,
            log_text,
            content,
            metadata,
            is_expanded: false,
            content_dirty: false,
            last_offset: None,
        }
    }

    /// Replace the whole log text.
    pub fn set_log(&mut self, log_text: String) {
        if log_text == self.log_text {
            return;
        }
        self.content = PaneContent::from_text(Some(&log_text));
        self.log_text = log_text;
        self.content_dirty = true;
    }

    pub fn set_expanded(&mut self, is_expanded: bool) {
        self.is_expanded = is_expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    pub fn content(&self) -> &PaneContent {
        &self.content
    }

    pub fn mode(&self) -> ScrollMode {
        self.binding.mode()
    }

    pub fn binding(&self) -> &ViewportBinding<EguiSurface> {
        &self.binding
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        self.show_at(ui, Instant::now());
    }

    pub fn show_at(&mut self, ui: &mut egui::Ui, now: Instant) {
        if self.binding.host().is_listening(EventKind::Wheel) {
            // egui reports wheel-up as positive y
            let delta_y = ui.input(|i| i.scroll_delta.y);
            if delta_y != 0.0 {
                self.binding.on_wheel(-delta_y, now);
            }
        }

        if std::mem::take(&mut self.content_dirty) {
            self.binding.on_content(self.content.has_content());
        }

        let buffer = match &self.content {
            PaneContent::Empty => {
                self.binding.host_mut().clear_layout();
                self.last_offset = None;
                show_empty(ui);
                self.run_due_pass(now);
                return;
            }
            PaneContent::Log(buffer) => buffer,
        };

        if !self.metadata.is_empty() {
            show_resource_info(ui, &self.metadata);
            ui.separator();
        }

        let renderer = &self.renderer;
        let surface = self.binding.host_mut();
        let output = egui::ScrollArea::vertical()
            .id_source("log_pane")
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                for line in buffer.lines() {
                    ui.label(layout_line(renderer, &line.text));
                }

                let sentinel = ui
                    .push_id(("sentinel", buffer.sentinel().after_index), |ui| {
                        ui.label(RichText::new(SENTINEL_GLYPH).monospace().weak())
                    })
                    .inner;
                ui.add_space(SENTINEL_MARGIN);

                let scrolled = surface.take_scroll_request();
                if scrolled {
                    let target = sentinel.rect.expand2(vec2(0.0, SENTINEL_MARGIN));
                    ui.scroll_to_rect(target, Some(Align::BOTTOM));
                }
                surface.record_layout(sentinel.rect, scrolled);
            });
        surface.set_viewport(output.inner_rect);

        let offset = output.state.offset.y;
        let scrolled = self.last_offset.is_some_and(|last| last != offset);
        self.last_offset = Some(offset);
        if scrolled && self.binding.host().is_listening(EventKind::Scroll) {
            self.binding.on_scroll();
        }

        self.run_due_pass(now);
    }

    // Runs after layout so the pass measures what this frame drew.
    fn run_due_pass(&mut self, now: Instant) {
        if let Some(handle) = self.binding.host_mut().take_due_frame() {
            self.binding.on_frame(handle, now);
        }
    }
}

fn layout_line<R: LineRenderer>(renderer: &R, line: &str) -> LayoutJob {
    let mut job = LayoutJob::default();
    for run in renderer.render(line) {
        job.append(
            &run.text,
            0.0,
            TextFormat {
                font_id: FontId::monospace(12.0),
                color: run.color,
                ..Default::default()
            },
        );
    }
    job
}

fn show_empty(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.heading(EMPTY_MESSAGE);
    });
}

fn show_resource_info(ui: &mut egui::Ui, metadata: &ResourceMetadata) {
    if !metadata.pod_ids.is_empty() {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(metadata.pod_ids_label()).strong());
            for id in &metadata.pod_ids {
                ui.code(id.as_str());
            }
        });
    }

    if !metadata.endpoints.is_empty() {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(metadata.endpoints_label()).strong());
            for endpoint in &metadata.endpoints {
                ui.add(egui::Hyperlink::from_label_and_url(endpoint.as_str(), endpoint).open_in_new_tab(true));
            }
        });
    }
}
