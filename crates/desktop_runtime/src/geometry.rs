//! Pure window geometry: work area, drag translation, edge resizing, and clamping.
//!
//! Nothing here touches the DOM. The window manager feeds pointer deltas in and applies the
//! resulting rectangles to surfaces.

use crate::model::{PointerPosition, ResizeEdge, WindowRect};

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 220;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Browser viewport size plus the strip reserved for the taskbar.
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    pub taskbar_height: i32,
}

impl Viewport {
    /// Area windows may occupy: `[0, width] x [0, height - taskbar_height]`.
    pub fn work_area(self) -> WindowRect {
        WindowRect {
            x: 0,
            y: 0,
            w: self.width.max(0),
            h: (self.height - self.taskbar_height).max(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Set of window edges moved by a resize gesture.
pub struct ResizeEdges {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl ResizeEdges {
    /// Parses the compass token out of a resize handle's class list.
    ///
    /// Accepts bare tokens (`"resize-handle nw"`) and prefixed ones (`"edge-nw"`). Returns `None`
    /// when no token is found or it names opposite edges.
    pub fn from_handle_class(class_name: &str) -> Option<Self> {
        class_name
            .split_whitespace()
            .map(|token| token.strip_prefix("edge-").unwrap_or(token))
            .find_map(Self::from_token)
    }

    fn from_token(token: &str) -> Option<Self> {
        if token.is_empty() || token.len() > 2 {
            return None;
        }
        let mut edges = Self::default();
        for ch in token.chars() {
            let slot = match ch {
                'n' => &mut edges.north,
                's' => &mut edges.south,
                'e' => &mut edges.east,
                'w' => &mut edges.west,
                _ => return None,
            };
            if *slot {
                return None;
            }
            *slot = true;
        }
        if (edges.north && edges.south) || (edges.east && edges.west) {
            return None;
        }
        Some(edges)
    }

    pub fn is_empty(self) -> bool {
        !(self.north || self.south || self.east || self.west)
    }
}

impl From<ResizeEdge> for ResizeEdges {
    fn from(edge: ResizeEdge) -> Self {
        let (north, south, east, west) = match edge {
            ResizeEdge::North => (true, false, false, false),
            ResizeEdge::South => (false, true, false, false),
            ResizeEdge::East => (false, false, true, false),
            ResizeEdge::West => (false, false, false, true),
            ResizeEdge::NorthEast => (true, false, true, false),
            ResizeEdge::NorthWest => (true, false, false, true),
            ResizeEdge::SouthEast => (false, true, true, false),
            ResizeEdge::SouthWest => (false, true, false, true),
        };
        Self {
            north,
            south,
            east,
            west,
        }
    }
}

/// Translates `start` by the pointer delta, keeping the whole window inside `area`.
pub fn drag_rect(
    start: WindowRect,
    pointer_start: PointerPosition,
    pointer_now: PointerPosition,
    area: WindowRect,
) -> WindowRect {
    let moved = start.offset(pointer_now.x - pointer_start.x, pointer_now.y - pointer_start.y);
    clamp_origin(moved, area)
}

/// Applies resize deltas to the active edges of `start`.
///
/// North and west edges shift the origin so the opposite edge stays anchored. Each dimension is
/// floored at `min` and capped by the work-area space left from the anchored edge.
pub fn resize_rect(
    start: WindowRect,
    edges: ResizeEdges,
    dx: i32,
    dy: i32,
    area: WindowRect,
    min: (i32, i32),
) -> WindowRect {
    let (min_w, min_h) = min;
    let mut rect = start;

    if edges.east {
        rect.w = bounded(start.w + dx, min_w, area.right() - start.x);
    } else if edges.west {
        let anchor = start.right();
        rect.w = bounded(start.w - dx, min_w, anchor - area.x);
        rect.x = anchor - rect.w;
    }

    if edges.south {
        rect.h = bounded(start.h + dy, min_h, area.bottom() - start.y);
    } else if edges.north {
        let anchor = start.bottom();
        rect.h = bounded(start.h - dy, min_h, anchor - area.y);
        rect.y = anchor - rect.h;
    }

    rect
}

/// Brings `rect` fully inside `area`: shrink to fit, then shift on-screen.
///
/// `min` is honoured only where the area is large enough to hold it.
pub fn clamp_to_area(rect: WindowRect, area: WindowRect, min: (i32, i32)) -> WindowRect {
    let w = rect.w.max(min.0).min(area.w).max(0);
    let h = rect.h.max(min.1).min(area.h).max(0);
    clamp_origin(WindowRect { w, h, ..rect }, area)
}

/// Cascades `rect` by `step` until no rect in `occupied` shares its origin.
pub fn cascade_origin(
    mut rect: WindowRect,
    occupied: &[WindowRect],
    step: i32,
    area: WindowRect,
) -> WindowRect {
    // Bounded so a crowded desktop cannot loop forever once clamping pins the origin.
    for _ in 0..=occupied.len() {
        if !occupied.iter().any(|other| other.x == rect.x && other.y == rect.y) {
            break;
        }
        rect = rect.offset(step, step);
        if !area.contains(rect) {
            rect.x = area.x + (rect.x - area.x).rem_euclid((area.w - rect.w).max(1));
            rect.y = area.y + (rect.y - area.y).rem_euclid((area.h - rect.h).max(1));
        }
    }
    rect
}

/// Centers a `width` x `height` window in `area`.
pub fn centered_rect(width: i32, height: i32, area: WindowRect) -> WindowRect {
    WindowRect {
        x: area.x + (area.w - width) / 2,
        y: area.y + (area.h - height) / 2,
        w: width,
        h: height,
    }
}

fn clamp_origin(rect: WindowRect, area: WindowRect) -> WindowRect {
    let max_x = (area.right() - rect.w).max(area.x);
    let max_y = (area.bottom() - rect.h).max(area.y);
    WindowRect {
        x: rect.x.clamp(area.x, max_x),
        y: rect.y.clamp(area.y, max_y),
        ..rect
    }
}

/// Caps `value` at `max`, then floors it at `min`. The floor wins when the two cross.
fn bounded(value: i32, min: i32, max: i32) -> i32 {
    value.min(max).max(min)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MIN: (i32, i32) = (MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);

    fn rect(x: i32, y: i32, w: i32, h: i32) -> WindowRect {
        WindowRect { x, y, w, h }
    }

    fn desktop() -> WindowRect {
        Viewport {
            width: 1920,
            height: 1080,
            taskbar_height: 38,
        }
        .work_area()
    }

    #[test]
    fn work_area_excludes_taskbar() {
        assert_eq!(desktop(), rect(0, 0, 1920, 1042));
    }

    #[test]
    fn handle_class_parsing_covers_all_compass_tokens() {
        for edge in ResizeEdge::ALL {
            let parsed = ResizeEdges::from_handle_class(&format!("resize-handle {}", edge.token()));
            assert_eq!(parsed, Some(ResizeEdges::from(edge)), "token {}", edge.token());
            let prefixed =
                ResizeEdges::from_handle_class(&format!("window-resize-handle edge-{}", edge.token()));
            assert_eq!(prefixed, Some(ResizeEdges::from(edge)));
        }
    }

    #[test]
    fn handle_class_parsing_rejects_unknown_and_contradictory_tokens() {
        assert_eq!(ResizeEdges::from_handle_class("resize-handle"), None);
        assert_eq!(ResizeEdges::from_handle_class("resize-handle ns"), None);
        assert_eq!(ResizeEdges::from_handle_class("edge-ew"), None);
        assert_eq!(ResizeEdges::from_handle_class("edge-nn"), None);
        assert_eq!(ResizeEdges::from_handle_class(""), None);
    }

    #[test]
    fn drag_translates_by_pointer_delta() {
        let moved = drag_rect(
            rect(760, 246, 400, 550),
            PointerPosition { x: 800, y: 260 },
            PointerPosition { x: 900, y: 310 },
            desktop(),
        );
        assert_eq!(moved, rect(860, 296, 400, 550));
    }

    #[test]
    fn drag_keeps_whole_window_inside_work_area() {
        let area = desktop();
        let start = rect(100, 100, 400, 300);
        let far = drag_rect(
            start,
            PointerPosition { x: 0, y: 0 },
            PointerPosition { x: 5000, y: 5000 },
            area,
        );
        assert_eq!(far, rect(1520, 742, 400, 300));
        let negative = drag_rect(
            start,
            PointerPosition { x: 0, y: 0 },
            PointerPosition { x: -500, y: -500 },
            area,
        );
        assert_eq!(negative, rect(0, 0, 400, 300));
    }

    #[test]
    fn north_west_resize_keeps_bottom_right_anchored() {
        let start = rect(300, 200, 400, 300);
        let resized = resize_rect(
            start,
            ResizeEdges::from(ResizeEdge::NorthWest),
            -50,
            -40,
            desktop(),
            MIN,
        );
        assert_eq!(resized.w, start.w + 50);
        assert_eq!(resized.h, start.h + 40);
        assert_eq!(resized.right(), start.right());
        assert_eq!(resized.bottom(), start.bottom());

        let shrunk = resize_rect(start, ResizeEdges::from(ResizeEdge::NorthWest), 30, 20, desktop(), MIN);
        assert_eq!(shrunk, rect(330, 220, 370, 280));
    }

    #[test]
    fn resize_floors_at_minimum_size() {
        let start = rect(300, 200, 400, 300);
        let east = resize_rect(start, ResizeEdges::from(ResizeEdge::SouthEast), -1000, -1000, desktop(), MIN);
        assert_eq!(east, rect(300, 200, MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT));

        let west = resize_rect(start, ResizeEdges::from(ResizeEdge::NorthWest), 1000, 1000, desktop(), MIN);
        assert_eq!(west.w, MIN_WINDOW_WIDTH);
        assert_eq!(west.h, MIN_WINDOW_HEIGHT);
        assert_eq!(west.right(), start.right());
        assert_eq!(west.bottom(), start.bottom());
    }

    #[test]
    fn resize_caps_at_space_left_from_anchor() {
        let area = desktop();
        let start = rect(300, 200, 400, 300);
        let east = resize_rect(start, ResizeEdges::from(ResizeEdge::SouthEast), 5000, 5000, area, MIN);
        assert_eq!(east, rect(300, 200, 1620, 842));

        let west = resize_rect(start, ResizeEdges::from(ResizeEdge::NorthWest), -5000, -5000, area, MIN);
        assert_eq!(west, rect(0, 0, 700, 500));
    }

    #[test]
    fn single_edge_resize_leaves_other_axis_alone() {
        let start = rect(300, 200, 400, 300);
        let north = resize_rect(start, ResizeEdges::from(ResizeEdge::North), 77, -60, desktop(), MIN);
        assert_eq!(north, rect(300, 140, 400, 360));
        let east = resize_rect(start, ResizeEdges::from(ResizeEdge::East), 60, 77, desktop(), MIN);
        assert_eq!(east, rect(300, 200, 460, 300));
    }

    #[test]
    fn clamp_keeps_every_restored_window_inside_work_area() {
        let viewports = [(1920, 1080), (1280, 720), (800, 600), (400, 300), (200, 120), (0, 0)];
        let origins = [-5000, -300, 0, 150, 900, 5000];
        let sizes = [(50, 50), (400, 550), (1600, 1200), (4000, 3000)];

        for (width, height) in viewports {
            let area = Viewport {
                width,
                height,
                taskbar_height: 38,
            }
            .work_area();
            for x in origins {
                for y in origins {
                    for (w, h) in sizes {
                        let clamped = clamp_to_area(rect(x, y, w, h), area, MIN);
                        assert!(
                            area.contains(clamped),
                            "{clamped:?} escapes {area:?} (from {x},{y} {w}x{h})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn clamp_leaves_on_screen_window_untouched() {
        let on_screen = rect(100, 100, 400, 300);
        assert_eq!(clamp_to_area(on_screen, desktop(), MIN), on_screen);
    }

    #[test]
    fn clamp_grows_undersized_window_to_minimum() {
        assert_eq!(
            clamp_to_area(rect(10, 10, 20, 20), desktop(), MIN),
            rect(10, 10, MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT)
        );
    }

    #[test]
    fn cascade_steps_past_occupied_origins() {
        let area = desktop();
        let base = centered_rect(400, 550, area);
        assert_eq!(base, rect(760, 246, 400, 550));

        let occupied = [base, base.offset(30, 30)];
        assert_eq!(cascade_origin(base, &occupied, 30, area), base.offset(60, 60));
        assert_eq!(cascade_origin(base, &[], 30, area), base);
    }

    #[test]
    fn cascade_wraps_inside_area_instead_of_running_off_screen() {
        let area = rect(0, 0, 500, 400);
        let start = rect(270, 240, 220, 140);
        let occupied = [start];
        let next = cascade_origin(start, &occupied, 30, area);
        assert!(area.contains(next), "{next:?}");
        assert_ne!((next.x, next.y), (start.x, start.y));
    }
}
