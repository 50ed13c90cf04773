//! # Layout Engine
//!
//! Turns the terminal size into named region sizes.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ status (1 row)               │
//! ├──────────────────────────────┤
//! │ top      round(h·0.9) − 1    │  ← bordered box, child "top-inner"
//! ├──────────────────────────────┤
//! │ bottom   round(h·0.1)        │
//! └──────────────────────────────┘
//! ```
//!
//! Sizes travel as addressed [`RegionSize`] messages. Only the node (or
//! component) whose id matches applies one; a bordered box strips one row or
//! column per active edge and forwards the remainder to its child. All
//! arithmetic saturates at zero.

/// Region id of the top box (transcript or history inside it).
pub const REGION_TOP: &str = "top";
/// Region id of the box's child.
pub const REGION_TOP_INNER: &str = "top-inner";
/// Region id of the input area.
pub const REGION_BOTTOM: &str = "bottom";

/// Rows reserved for the status bar.
pub const STATUS_ROWS: u16 = 1;
/// Share of the terminal height given to the top region.
pub const TOP_PERCENT: u16 = 90;
/// Share of the terminal height given to the bottom region.
pub const BOTTOM_PERCENT: u16 = 10;

/// A size addressed to one region id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSize {
    pub id: String,
    pub width: u16,
    pub height: u16,
}

impl RegionSize {
    pub fn new(id: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// `round(total · percent / 100)`, rounding half away from zero.
///
/// Returns 0 when either input is 0.
pub fn percent_of(total: u16, percent: u16) -> u16 {
    if total == 0 || percent == 0 {
        return 0;
    }

    let rows = f64::from(total) * f64::from(percent) / 100.0;
    rows.round() as u16
}

/// Terminal dimensions and the region heights derived from them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub width: u16,
    pub height: u16,
    pub top_height: u16,
    pub bottom_height: u16,
}

impl ScreenLayout {
    /// Apply a terminal resize.
    ///
    /// Returns the two addressed size messages (`top`, `bottom`), or `None`
    /// when the dimensions did not change.
    pub fn resize(&mut self, width: u16, height: u16) -> Option<[RegionSize; 2]> {
        if self.width == width && self.height == height {
            return None;
        }

        self.width = width;
        self.height = height;
        self.top_height = percent_of(height, TOP_PERCENT).saturating_sub(STATUS_ROWS);
        self.bottom_height = percent_of(height, BOTTOM_PERCENT);

        log::info!(
            "Layout: {}x{} -> top={} bottom={}",
            width,
            height,
            self.top_height,
            self.bottom_height
        );

        Some([
            RegionSize::new(REGION_TOP, width, self.top_height),
            RegionSize::new(REGION_BOTTOM, width, self.bottom_height),
        ])
    }
}

/// Which edges of a box draw a border.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Borders {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Borders {
    pub const fn new(top: bool, right: bool, bottom: bool, left: bool) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Rows consumed by the top and bottom edges.
    pub fn rows(&self) -> u16 {
        u16::from(self.top) + u16::from(self.bottom)
    }

    /// Columns consumed by the left and right edges.
    pub fn columns(&self) -> u16 {
        u16::from(self.left) + u16::from(self.right)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf region owned by a component.
    Region,
    /// A box that draws borders and forwards the rest to its children.
    Bordered(Borders),
}

/// A node in the view tree: `{kind, children, geometry}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewNode {
    pub id: String,
    pub kind: NodeKind,
    pub children: Vec<ViewNode>,
    pub width: u16,
    pub height: u16,
}

impl ViewNode {
    pub fn region(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Region,
            children: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    pub fn bordered(id: impl Into<String>, borders: Borders, child: ViewNode) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Bordered(borders),
            children: vec![child],
            width: 0,
            height: 0,
        }
    }

    /// Apply an addressed size to the matching node and return the size
    /// messages the tree forwards as a result.
    pub fn apply(&mut self, size: &RegionSize) -> Vec<RegionSize> {
        let mut forwarded = Vec::new();

        if self.id == size.id {
            self.width = size.width;
            self.height = size.height;

            if let NodeKind::Bordered(borders) = self.kind {
                for child in &self.children {
                    forwarded.push(RegionSize::new(
                        child.id.clone(),
                        size.width.saturating_sub(borders.columns()),
                        size.height.saturating_sub(borders.rows()),
                    ));
                }
            }
        }

        for child in &mut self.children {
            forwarded.extend(child.apply(size));
        }

        forwarded
    }

    pub fn find(&self, id: &str) -> Option<&ViewNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Zero-sized regions are not rendered.
    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        assert_eq!(percent_of(40, 90), 36);
        assert_eq!(percent_of(40, 10), 4);
        // 25 * 0.1 = 2.5 -> 3
        assert_eq!(percent_of(25, 10), 3);
        // 15 * 0.9 = 13.5 -> 14
        assert_eq!(percent_of(15, 90), 14);
    }

    #[test]
    fn test_percent_of_zero_inputs() {
        assert_eq!(percent_of(0, 90), 0);
        assert_eq!(percent_of(40, 0), 0);
    }

    #[test]
    fn test_resize_100_by_40() {
        let mut layout = ScreenLayout::default();
        let sizes = layout.resize(100, 40).unwrap();

        assert_eq!(sizes[0], RegionSize::new(REGION_TOP, 100, 35));
        assert_eq!(sizes[1], RegionSize::new(REGION_BOTTOM, 100, 4));
        assert_eq!(layout.top_height, 35);
        assert_eq!(layout.bottom_height, 4);
    }

    #[test]
    fn test_identical_resize_emits_nothing() {
        let mut layout = ScreenLayout::default();
        assert!(layout.resize(80, 24).is_some());
        assert!(layout.resize(80, 24).is_none());
        assert!(layout.resize(81, 24).is_some());
    }

    #[test]
    fn test_tiny_terminal_clamps_to_zero() {
        let mut layout = ScreenLayout::default();
        let sizes = layout.resize(10, 1).unwrap();
        // round(0.9) = 1, minus the status row
        assert_eq!(sizes[0].height, 0);
        // round(0.1) = 0
        assert_eq!(sizes[1].height, 0);
    }

    #[test]
    fn test_bordered_box_strips_active_edges() {
        let mut tree = ViewNode::bordered(
            REGION_TOP,
            Borders::new(true, true, true, false),
            ViewNode::region(REGION_TOP_INNER),
        );

        let forwarded = tree.apply(&RegionSize::new(REGION_TOP, 80, 20));

        assert_eq!(forwarded, vec![RegionSize::new(REGION_TOP_INNER, 79, 18)]);
        assert_eq!((tree.width, tree.height), (80, 20));
        // The child only changes when its own message arrives.
        assert_eq!(tree.find(REGION_TOP_INNER).unwrap().width, 0);

        assert!(tree.apply(&forwarded[0]).is_empty());
        let child = tree.find(REGION_TOP_INNER).unwrap();
        assert_eq!((child.width, child.height), (79, 18));
    }

    #[test]
    fn test_bordered_box_never_goes_negative() {
        let mut tree = ViewNode::bordered(
            REGION_TOP,
            Borders::new(true, true, true, true),
            ViewNode::region(REGION_TOP_INNER),
        );

        let forwarded = tree.apply(&RegionSize::new(REGION_TOP, 1, 0));
        assert_eq!(forwarded, vec![RegionSize::new(REGION_TOP_INNER, 0, 0)]);
    }

    #[test]
    fn test_unaddressed_size_changes_nothing() {
        let mut tree = ViewNode::bordered(
            REGION_TOP,
            Borders::new(false, false, true, false),
            ViewNode::region(REGION_TOP_INNER),
        );

        assert!(tree.apply(&RegionSize::new(REGION_BOTTOM, 80, 4)).is_empty());
        assert_eq!((tree.width, tree.height), (0, 0));
        assert!(!tree.is_visible());
    }
}
