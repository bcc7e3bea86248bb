//! Preview sizing and preview-cell → desktop-pixel mapping.

/// Round to the nearest integer, halves away from zero.
///
/// `f32::round` already has exactly these semantics: `2.5 → 3`, `-2.5 → -3`.
pub fn round_to_int(value: f32) -> i32 {
    value.round() as i32
}

/// Terminal size and the preview area fitted inside it, all in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGeometry {
    pub terminal_width: u16,
    pub terminal_height: u16,
    pub preview_width: i32,
    pub preview_height: i32,
}

impl ViewportGeometry {
    /// Fit the desktop aspect ratio into a `tw` x `th` cell terminal.
    ///
    /// The preview renderer treats a row as twice the height of a column, so
    /// the usable height is `th * 2` half-rows. The `+1`/`-1` corrections
    /// match how the renderer draws partial cells; they were tuned by eye.
    pub fn fit(tw: u16, th: u16, desktop_width: u32, desktop_height: u32) -> Self {
        let width = f32::from(tw);
        let height = f32::from(th) * 2.0;
        let ratio = desktop_width as f32 / desktop_height as f32;

        let best_height = height.min(width / ratio);
        let best_width = width.min(best_height * ratio);

        let geometry = Self {
            terminal_width: tw,
            terminal_height: th,
            preview_width: round_to_int(best_width) + 1,
            preview_height: round_to_int(best_height / 2.0) - 1,
        };
        log::info!(
            "Term dimensions: W: {}, H: {}; preview dimensions: W: {}, H: {}",
            tw,
            th,
            geometry.preview_width,
            geometry.preview_height
        );
        geometry
    }
}

/// Map one axis: `cell * (live_px / preview_cells) + origin`, rounded.
///
/// `live_px` is the size of the magnified source region in desktop pixels.
/// A degenerate preview maps everything onto the origin.
pub fn map_axis(cell: f32, live_px: f32, preview_cells: f32, origin: f32) -> i32 {
    if preview_cells <= 0.0 {
        return round_to_int(origin);
    }
    round_to_int(cell * (live_px / preview_cells) + origin)
}

/// A point in desktop pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopPoint {
    pub x: i32,
    pub y: i32,
}

/// Map a pointer cell into desktop pixels, each axis independently.
pub fn map_point(
    cell: (u16, u16),
    live: (u32, u32),
    preview: (i32, i32),
    origin: (f32, f32),
) -> DesktopPoint {
    let point = DesktopPoint {
        x: map_axis(f32::from(cell.0), live.0 as f32, preview.0 as f32, origin.0),
        y: map_axis(f32::from(cell.1), live.1 as f32, preview.1 as f32, origin.1),
    };
    log::debug!(
        "desktop coords: cell: {:?}, live: {:?}, preview: {:?}, origin: {:?} -> ({}, {})",
        cell,
        live,
        preview,
        origin,
        point.x,
        point.y
    );
    point
}
