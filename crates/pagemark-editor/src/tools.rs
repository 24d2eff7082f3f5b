// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool state machine — turns pointer and keyboard events into store
// mutations.
//
// Gestures are mutually exclusive: Idle -> Panning | Dragging | Drawing ->
// Idle. Everything a gesture needs (anchor, drag offset, transient shape)
// lives in the `Gesture` value, so ending a gesture is a single assignment and
// nothing can be left dangling. Pointer input is mapped into the unrotated
// page raster before it reaches the store.

use pagemark_core::annotation::{Annotation, AnnotationPatch, TextAnnotation};
use pagemark_core::config::EditorConfig;
use pagemark_core::geometry::{
    Bounds, CanvasRect, PercentPoint, ScreenPoint, fit_zoom, line_between, normalize_box, pointer_to_page,
};
use pagemark_core::types::{AnnotationId, PageId};
use tracing::debug;

use crate::store::AnnotationStore;

/// Active tool in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Select and move annotations.
    #[default]
    Cursor,
    /// Scroll the viewport.
    Hand,
    /// Place a text box (one-shot).
    Text,
    Line,
    Highlight,
    Erase,
}

impl Tool {
    fn draws(self) -> bool {
        matches!(self, Tool::Line | Tool::Highlight | Tool::Erase)
    }
}

/// Scroll offset and zoom of the editing surface. Zoom scales rendering only,
/// never annotation values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub zoom_percent: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            zoom_percent: 100,
        }
    }
}

/// One pointer sample: position plus the rendered page canvas it fell on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: ScreenPoint,
    pub canvas: CanvasRect,
}

impl PointerEvent {
    pub fn new(position: ScreenPoint, canvas: CanvasRect) -> Self {
        Self { position, canvas }
    }
}

/// In-flight pointer gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        last: ScreenPoint,
    },
    Dragging {
        page: PageId,
        annotation: AnnotationId,
        /// Pointer position minus the annotation origin at grab time.
        offset: PercentPoint,
    },
    Drawing {
        page: PageId,
        anchor: PercentPoint,
        /// Preview only; not in the store until committed.
        transient: Annotation,
    },
}

/// What a pointer event did, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    PanStarted,
    Panned,
    /// Annotation selected and dragging started.
    Grabbed(AnnotationId),
    Dragged,
    SelectionCleared,
    TextPlaced(AnnotationId),
    DrawStarted,
    DrawUpdated,
    Committed(AnnotationId),
    /// Shape too small to keep, or its page vanished mid-gesture.
    Discarded,
    GestureEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Other,
}

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Canvas,
    /// An editable text field; delete keys belong to it.
    TextField,
}

/// Owns the active tool, the current gesture, and the viewport.
#[derive(Debug, Clone)]
pub struct ToolController {
    config: EditorConfig,
    tool: Tool,
    page: Option<PageId>,
    gesture: Gesture,
    viewport: Viewport,
}

impl ToolController {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            tool: Tool::default(),
            page: None,
            gesture: Gesture::Idle,
            viewport: Viewport::default(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Any gesture in flight is cancelled.
    pub fn set_tool(&mut self, tool: Tool) {
        self.cancel_gesture();
        self.tool = tool;
    }

    /// Page currently being edited.
    pub fn page(&self) -> Option<PageId> {
        self.page
    }

    /// Switch the edited page. Any gesture in flight is cancelled.
    pub fn set_page(&mut self, page: Option<PageId>) {
        self.cancel_gesture();
        self.page = page;
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// The shape being drawn, for preview rendering.
    pub fn transient(&self) -> Option<&Annotation> {
        match &self.gesture {
            Gesture::Drawing { transient, .. } => Some(transient),
            _ => None,
        }
    }

    /// Drop the current gesture without touching the store.
    pub fn cancel_gesture(&mut self) {
        if self.gesture != Gesture::Idle {
            debug!("Gesture cancelled");
        }
        self.gesture = Gesture::Idle;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Zoom so the current page fits in the container.
    pub fn fit_to_container(&mut self, store: &AnnotationStore, container_w: f64, container_h: f64) {
        if let Some(page) = self.page.and_then(|id| store.page(id)) {
            self.viewport.zoom_percent = fit_zoom(
                container_w,
                container_h,
                page.preview.width() as f64,
                page.preview.height() as f64,
                page.rotation,
            );
        }
    }

    /// Pointer position in the current page's unrotated percentage space.
    fn locate(&self, store: &AnnotationStore, event: &PointerEvent) -> Option<(PageId, PercentPoint)> {
        if event.canvas.is_degenerate() {
            return None;
        }
        let page = store.page(self.page?)?;
        Some((page.id, pointer_to_page(event.position, event.canvas, page.rotation)))
    }

    pub fn pointer_down(&mut self, store: &mut AnnotationStore, event: PointerEvent) -> PointerOutcome {
        if self.gesture != Gesture::Idle {
            return PointerOutcome::Ignored;
        }
        if self.tool == Tool::Hand {
            self.gesture = Gesture::Panning { last: event.position };
            return PointerOutcome::PanStarted;
        }
        let Some((page, point)) = self.locate(store, &event) else {
            return PointerOutcome::Ignored;
        };

        match self.tool {
            Tool::Cursor => match store.hit_test(page, point, self.config.line_hit_tolerance) {
                Some(id) => {
                    let origin = store
                        .page(page)
                        .and_then(|p| p.annotation(id))
                        .map(|a| a.bounds.origin())
                        .unwrap_or(point);
                    store.select(page, id);
                    self.gesture = Gesture::Dragging {
                        page,
                        annotation: id,
                        offset: PercentPoint::new(point.x - origin.x, point.y - origin.y),
                    };
                    PointerOutcome::Grabbed(id)
                }
                None => {
                    store.clear_selection();
                    PointerOutcome::SelectionCleared
                }
            },
            Tool::Text => {
                let annotation = Annotation::text(
                    Bounds::new(point.x, point.y, self.config.text_box_width, self.config.text_box_height),
                    TextAnnotation::authored(self.config.text_placeholder.clone(), self.config.text_font_size),
                );
                match store.add_annotation(page, annotation) {
                    Some(id) => {
                        store.select(page, id);
                        self.tool = Tool::Cursor;
                        PointerOutcome::TextPlaced(id)
                    }
                    None => PointerOutcome::Ignored,
                }
            }
            tool if tool.draws() => {
                self.gesture = Gesture::Drawing {
                    page,
                    anchor: point,
                    transient: self.new_shape(tool, Bounds::at(point)),
                };
                PointerOutcome::DrawStarted
            }
            _ => PointerOutcome::Ignored,
        }
    }

    fn new_shape(&self, tool: Tool, bounds: Bounds) -> Annotation {
        match tool {
            Tool::Line => Annotation::line(bounds, self.config.stroke_color, self.config.line_width),
            Tool::Highlight => {
                Annotation::highlight(bounds, self.config.highlight_color).with_opacity(self.config.highlight_opacity)
            }
            _ => Annotation::erase(bounds),
        }
    }

    pub fn pointer_move(&mut self, store: &mut AnnotationStore, event: PointerEvent) -> PointerOutcome {
        if let Gesture::Panning { last } = &mut self.gesture {
            let dx = event.position.x - last.x;
            let dy = event.position.y - last.y;
            self.viewport.scroll_x -= dx;
            self.viewport.scroll_y -= dy;
            *last = event.position;
            return PointerOutcome::Panned;
        }
        if self.gesture == Gesture::Idle {
            return PointerOutcome::Ignored;
        }
        let Some((_, point)) = self.locate(store, &event) else {
            return PointerOutcome::Ignored;
        };

        match &mut self.gesture {
            Gesture::Dragging {
                page,
                annotation,
                offset,
            } => {
                let patch = AnnotationPatch::position(point.x - offset.x, point.y - offset.y);
                if store.update_annotation(*page, *annotation, &patch) {
                    PointerOutcome::Dragged
                } else {
                    PointerOutcome::Ignored
                }
            }
            Gesture::Drawing {
                anchor, transient, ..
            } => {
                transient.bounds = if transient.is_line() {
                    line_between(*anchor, point)
                } else {
                    normalize_box(*anchor, point)
                };
                PointerOutcome::DrawUpdated
            }
            Gesture::Idle | Gesture::Panning { .. } => PointerOutcome::Ignored,
        }
    }

    /// End the gesture. A drawn shape is committed only if it grew beyond
    /// the minimum extent.
    pub fn pointer_up(&mut self, store: &mut AnnotationStore) -> PointerOutcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => PointerOutcome::Ignored,
            Gesture::Drawing {
                page,
                mut transient,
                ..
            } => {
                if !transient.bounds.exceeds(self.config.min_draw_extent) {
                    debug!("Shape below minimum extent discarded");
                    return PointerOutcome::Discarded;
                }
                transient.id = AnnotationId::new();
                match store.add_annotation(page, transient) {
                    Some(id) => PointerOutcome::Committed(id),
                    None => PointerOutcome::Discarded,
                }
            }
            Gesture::Panning { .. } | Gesture::Dragging { .. } => PointerOutcome::GestureEnded,
        }
    }

    /// Leaving the canvas ends the gesture exactly like a release.
    pub fn pointer_leave(&mut self, store: &mut AnnotationStore) -> PointerOutcome {
        self.pointer_up(store)
    }

    /// Delete/Backspace removes the selected annotation unless a text field
    /// has focus. Only a selection on the page being edited is removed.
    pub fn key_down(&mut self, store: &mut AnnotationStore, key: Key, focus: Focus) -> Option<Annotation> {
        if focus == Focus::TextField || !matches!(key, Key::Delete | Key::Backspace) {
            return None;
        }
        let selection = store.selection()?;
        if self.page != Some(selection.page) {
            return None;
        }
        store.delete_annotation(selection.page, selection.annotation)
    }
}
