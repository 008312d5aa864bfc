use serde::{Deserialize, Serialize};
use tracing::trace;

use super::tree::{NodeId, TreeNode};
use crate::common::config::{NotebookTheme, Theme};
use crate::model::{Point, Rect};

const MIN_SELECTED_BOX_WIDTH: i32 = 200;
const MIN_CLIENT_WIDTH: i32 = 100;
const MIN_CLIENT_HEIGHT: i32 = 20;
const MIN_ICONIC_TABS: i32 = 4;

/// Drop targets of a notebook used while dragging a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DropZone {
    Tab,
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotebookButton {
    Close,
    HSplit,
    VSplit,
    Mark,
    Exposay,
    CloseClient,
    Unbind,
    ScrollLeft,
    ScrollRight,
    Tab(NodeId),
    ExposayThumbnail(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotebookHit {
    Button(NotebookButton),
    Zone(DropZone),
}

/// Hit rects of a notebook, all in global coordinates. Null rects are
/// disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotebookAreas {
    pub tab: Rect,
    pub top: Rect,
    pub bottom: Rect,
    pub left: Rect,
    pub right: Rect,
    pub center: Rect,

    pub popup_top: Rect,
    pub popup_bottom: Rect,
    pub popup_left: Rect,
    pub popup_right: Rect,
    pub popup_center: Rect,

    pub close: Rect,
    pub hsplit: Rect,
    pub vsplit: Rect,
    pub mark: Rect,
    pub exposay: Rect,

    pub close_client: Rect,
    pub unbind_client: Rect,
    pub left_scroll_arrow: Rect,
    pub right_scroll_arrow: Rect,
}

#[derive(Debug, Clone)]
pub struct Notebook {
    tabs: Vec<NodeId>,
    selected: Option<NodeId>,
    allocation: Rect,
    client_area: Rect,
    areas: NotebookAreas,
    selected_box: Rect,
    tabs_area: Rect,
    tab_rects: Vec<(NodeId, Rect)>,
    exposay_buttons: Vec<(NodeId, Rect)>,
    scroll_offset: i32,
    pub(crate) rendered_scroll_offset: f64,
    overflowing: bool,
    is_default: bool,
    exposay: bool,
    can_hsplit: bool,
    can_vsplit: bool,
    selected_has_focus: bool,
    mouse_over: Option<NotebookButton>,
    pub(crate) shade_windows: bool,
    theme: NotebookTheme,
}

impl Notebook {
    pub fn new(shade_windows: bool) -> Self {
        Notebook {
            tabs: Vec::new(),
            selected: None,
            allocation: Rect::default(),
            client_area: Rect::default(),
            areas: NotebookAreas::default(),
            selected_box: Rect::default(),
            tabs_area: Rect::default(),
            tab_rects: Vec::new(),
            exposay_buttons: Vec::new(),
            scroll_offset: 0,
            rendered_scroll_offset: 0.0,
            overflowing: false,
            is_default: false,
            exposay: false,
            can_hsplit: false,
            can_vsplit: false,
            selected_has_focus: false,
            mouse_over: None,
            shade_windows,
            theme: NotebookTheme::default(),
        }
    }

    pub fn tabs(&self) -> &[NodeId] { &self.tabs }

    pub fn len(&self) -> usize { self.tabs.len() }

    pub fn is_empty(&self) -> bool { self.tabs.is_empty() }

    pub fn contains(&self, view: NodeId) -> bool { self.tabs.contains(&view) }

    pub fn selected(&self) -> Option<NodeId> { self.selected }

    pub fn allocation(&self) -> Rect { self.allocation }

    pub fn client_area(&self) -> Rect { self.client_area }

    pub fn areas(&self) -> &NotebookAreas { &self.areas }

    pub fn tabs_area(&self) -> Rect { self.tabs_area }

    pub fn selected_box(&self) -> Rect { self.selected_box }

    pub fn tab_rects(&self) -> &[(NodeId, Rect)] { &self.tab_rects }

    pub fn exposay_buttons(&self) -> &[(NodeId, Rect)] { &self.exposay_buttons }

    pub fn scroll_offset(&self) -> i32 { self.scroll_offset }

    pub fn is_default(&self) -> bool { self.is_default }

    pub(crate) fn set_default(&mut self, is_default: bool) { self.is_default = is_default; }

    pub fn in_exposay(&self) -> bool { self.exposay }

    pub fn can_hsplit(&self) -> bool { self.can_hsplit }

    pub fn can_vsplit(&self) -> bool { self.can_vsplit }

    pub fn selected_has_focus(&self) -> bool { self.selected_has_focus }

    pub(crate) fn set_selected_has_focus(&mut self, focused: bool) { self.selected_has_focus = focused; }

    pub fn mouse_over(&self) -> Option<NotebookButton> { self.mouse_over }

    /// True while the tabs overflow the strip, even with zero-width arrows.
    pub fn has_scroll_arrows(&self) -> bool { self.overflowing }

    fn content_width(&self) -> i32 { self.tabs.len() as i32 * self.theme.iconic_tab_width }

    fn max_scroll_offset(&self) -> i32 { (self.content_width() - self.tabs_area.w).max(0) }

    /// Appends a tab. Returns true when the selection changed.
    pub fn add(&mut self, view: NodeId, prefer_activate: bool) -> bool {
        assert!(!self.tabs.contains(&view), "view {view:?} is already a tab of this notebook");
        self.tabs.push(view);
        let select = if self.exposay {
            false
        } else {
            prefer_activate || (self.selected.is_none() && !self.shade_windows)
        };
        if select {
            self.selected = Some(view);
        }
        self.refresh_tabs();
        select
    }

    /// Drops a tab. If it was selected, the most recently added remaining tab
    /// takes its place unless shade mode keeps the notebook unselected.
    pub fn remove(&mut self, view: NodeId) -> bool {
        let Some(index) = self.tabs.iter().position(|t| *t == view) else {
            return false;
        };
        self.tabs.remove(index);
        self.exposay_buttons.retain(|(v, _)| *v != view);
        if matches!(self.mouse_over, Some(NotebookButton::Tab(v) | NotebookButton::ExposayThumbnail(v)) if v == view)
        {
            self.mouse_over = None;
        }
        if self.selected == Some(view) {
            self.selected = None;
            self.selected_has_focus = false;
            if !self.shade_windows && !self.exposay {
                self.selected = self.tabs.last().copied();
            }
        }
        if self.tabs.is_empty() {
            self.exposay = false;
            self.exposay_buttons.clear();
        }
        self.refresh_tabs();
        true
    }

    /// Returns true when the selection changed.
    pub fn select(&mut self, view: NodeId) -> bool {
        if self.selected == Some(view) || !self.tabs.contains(&view) {
            return false;
        }
        self.stop_exposay();
        self.selected = Some(view);
        self.refresh_tabs();
        true
    }

    /// Hides the selected tab without picking another one.
    pub fn iconify_selected(&mut self) -> Option<NodeId> {
        let prev = self.selected.take();
        self.selected_has_focus = false;
        self.refresh_tabs();
        prev
    }

    pub fn start_exposay(&mut self) {
        if self.exposay || self.tabs.is_empty() {
            return;
        }
        self.selected = None;
        self.selected_has_focus = false;
        self.exposay = true;
        self.refresh_tabs();
    }

    pub fn stop_exposay(&mut self) {
        if !self.exposay {
            return;
        }
        self.exposay = false;
        self.exposay_buttons.clear();
        if matches!(self.mouse_over, Some(NotebookButton::ExposayThumbnail(_))) {
            self.mouse_over = None;
        }
    }

    pub fn min_allocation(theme: &NotebookTheme) -> (i32, i32) {
        let w = theme.margin.horizontal()
            + MIN_CLIENT_WIDTH
            + theme.close_width
            + theme.selected_close_width
            + theme.selected_unbind_width
            + theme.vsplit_width
            + theme.hsplit_width
            + theme.mark_width
            + theme.menu_button_width
            + theme.iconic_tab_width * MIN_ICONIC_TABS;
        let h = theme.tab_height + theme.margin.vertical() + MIN_CLIENT_HEIGHT;
        (w, h)
    }

    pub fn set_allocation(&mut self, allocation: Rect, theme: &Theme) {
        self.allocation = allocation;
        self.theme = theme.notebook.clone();
        self.update_layout(theme);
    }

    fn update_layout(&mut self, theme: &Theme) {
        let nt = &theme.notebook;
        let st = &theme.split;
        let a = self.allocation;
        let (min_w, min_h) = Self::min_allocation(nt);

        self.can_vsplit = a.w >= min_w * 2 + st.margin.horizontal() + st.width;
        self.can_hsplit = a.h >= min_h * 2 + st.margin.vertical() + st.width;

        self.client_area = Rect::new(
            a.x + nt.margin.left,
            a.y + nt.margin.top + nt.tab_height,
            (a.w - nt.margin.horizontal()).max(1),
            (a.h - nt.margin.vertical() - nt.tab_height).max(1),
        );

        let body_h = a.h - nt.tab_height;
        let body_y = a.y + nt.tab_height;
        let areas = &mut self.areas;

        areas.tab = Rect::new(a.x, a.y, a.w, nt.tab_height);

        if self.can_hsplit {
            areas.top = Rect::new(a.x, body_y, a.w, fraction(body_h, 0.2));
            areas.bottom =
                Rect::new(a.x, body_y + fraction(body_h, 0.8), a.w, fraction(body_h, 0.2));
        } else {
            areas.top = Rect::default();
            areas.bottom = Rect::default();
        }

        if self.can_vsplit {
            areas.left = Rect::new(a.x, body_y, fraction(a.w, 0.2), body_h);
            areas.right = Rect::new(a.x + fraction(a.w, 0.8), body_y, fraction(a.w, 0.2), body_h);
        } else {
            areas.left = Rect::default();
            areas.right = Rect::default();
        }

        areas.center = Rect::new(
            a.x + fraction(a.w, 0.2),
            body_y + fraction(body_h, 0.2),
            fraction(a.w, 0.6),
            fraction(body_h, 0.6),
        );

        areas.popup_top = Rect::new(a.x, body_y, a.w, fraction(body_h, 0.5));
        areas.popup_bottom =
            Rect::new(a.x, body_y + fraction(body_h, 0.5), a.w, fraction(body_h, 0.5));
        areas.popup_left = Rect::new(a.x, body_y, fraction(a.w, 0.5), body_h);
        areas.popup_right = Rect::new(a.x + fraction(a.w, 0.5), body_y, fraction(a.w, 0.5), body_h);
        areas.popup_center = self.client_area;

        let right = a.right();
        areas.close = Rect::new(right - nt.close_width, a.y, nt.close_width, nt.tab_height);
        areas.hsplit = Rect::new(
            right - nt.close_width - nt.hsplit_width,
            a.y,
            nt.hsplit_width,
            nt.tab_height,
        );
        areas.vsplit = Rect::new(
            right - nt.close_width - nt.hsplit_width - nt.vsplit_width,
            a.y,
            nt.vsplit_width,
            nt.tab_height,
        );
        areas.mark = Rect::new(
            right - nt.close_width - nt.hsplit_width - nt.vsplit_width - nt.mark_width,
            a.y,
            nt.mark_width,
            nt.tab_height,
        );
        areas.exposay = Rect::new(a.x, a.y, nt.menu_button_width, nt.tab_height);

        self.refresh_tabs();
    }

    /// Recomputes tab strip geometry: selected box, iconic tabs, scroll
    /// arrows and the clamped scroll offset.
    fn refresh_tabs(&mut self) {
        let nt = &self.theme;
        let a = self.allocation;
        self.tab_rects.clear();
        self.areas.left_scroll_arrow = Rect::default();
        self.areas.right_scroll_arrow = Rect::default();
        self.areas.close_client = Rect::default();
        self.areas.unbind_client = Rect::default();
        self.overflowing = false;

        if self.tabs.is_empty() || a.is_null() {
            self.selected_box = Rect::default();
            self.tabs_area = Rect::default();
            self.scroll_offset = 0;
            self.rendered_scroll_offset = 0.0;
            self.exposay_buttons.clear();
            return;
        }

        let buttons = nt.buttons_width();
        let count = self.tabs.len() as i32;
        let selected_box_w =
            (a.w - buttons - count * nt.iconic_tab_width).max(MIN_SELECTED_BOX_WIDTH);

        self.selected_box = Rect::new(a.x + nt.menu_button_width, a.y, selected_box_w, nt.tab_height);
        let mut tabs_area = Rect::new(
            a.x + nt.menu_button_width + selected_box_w,
            a.y,
            a.w - buttons - selected_box_w,
            nt.tab_height,
        );

        if self.content_width() > tabs_area.w {
            self.overflowing = true;
            self.areas.left_scroll_arrow =
                Rect::new(tabs_area.x, a.y, nt.left_scroll_arrow_width, nt.tab_height);
            self.areas.right_scroll_arrow = Rect::new(
                tabs_area.right() - nt.right_scroll_arrow_width,
                a.y,
                nt.right_scroll_arrow_width,
                nt.tab_height,
            );
            tabs_area.x += nt.left_scroll_arrow_width;
            tabs_area.w -= nt.left_scroll_arrow_width + nt.right_scroll_arrow_width;
        }
        self.tabs_area = tabs_area;

        let max_offset = self.max_scroll_offset();
        self.scroll_offset = self.scroll_offset.clamp(0, max_offset);
        self.rendered_scroll_offset = self.rendered_scroll_offset.clamp(0.0, max_offset as f64);

        for (k, view) in self.tabs.iter().enumerate() {
            let x = tabs_area.x - self.scroll_offset + k as i32 * nt.iconic_tab_width;
            self.tab_rects.push((*view, Rect::new(x, a.y, nt.iconic_tab_width, nt.tab_height)));
        }

        if self.selected.is_some() && !self.exposay {
            let b = self.selected_box;
            self.areas.close_client = Rect::new(
                b.right() - nt.selected_close_width,
                b.y,
                nt.selected_close_width,
                nt.tab_height,
            );
            self.areas.unbind_client = Rect::new(
                b.right() - nt.selected_close_width - nt.selected_unbind_width,
                b.y,
                nt.selected_unbind_width,
                nt.tab_height,
            );
        }

        self.update_exposay();
    }

    /// Grid of thumbnails over the client area, last row centered.
    fn update_exposay(&mut self) {
        self.exposay_buttons.clear();
        if !self.exposay || self.tabs.is_empty() {
            return;
        }

        let count = self.tabs.len() as i32;
        let n = (count as f64).sqrt().ceil() as i32;
        let m = (count - 1) / n + 1;
        let area = self.client_area;
        let width = area.w / n;
        let height = area.h / m;
        let yoffset = (area.h - height * m) / 2 + area.y;

        for (i, view) in self.tabs.iter().enumerate() {
            let i = i as i32;
            let (row, col) = (i / n, i % n);
            let mut xoffset = (area.w - width * n) / 2 + area.x;
            if row == m - 1 {
                xoffset += (n * m - count) * width / 2;
            }
            let thumb = Rect::new(
                col * width + 1 + xoffset + 8,
                row * height + 1 + yoffset + 8,
                width - 2 - 16,
                height - 2 - 16,
            );
            self.exposay_buttons.push((*view, thumb));
        }
    }

    /// Moves the tab strip right by `px`. Returns the `(from, to)` offsets
    /// when it moved.
    pub fn scroll_right(&mut self, px: i32) -> Option<(i32, i32)> { self.scroll_to(self.scroll_offset + px) }

    pub fn scroll_left(&mut self, px: i32) -> Option<(i32, i32)> { self.scroll_to(self.scroll_offset - px) }

    fn scroll_to(&mut self, target: i32) -> Option<(i32, i32)> {
        if self.tabs.is_empty() || self.content_width() <= self.tabs_area.w {
            return None;
        }
        let target = target.clamp(0, self.max_scroll_offset());
        if target == self.scroll_offset {
            return None;
        }
        let from = std::mem::replace(&mut self.scroll_offset, target);
        trace!(from, to = target, "tab strip scroll");
        self.refresh_tabs();
        Some((from, target))
    }

    /// Tab rects shifted to the rendered (possibly animating) offset.
    pub fn rendered_tab_rects(&self) -> Vec<(NodeId, Rect)> {
        let shift = self.scroll_offset - self.rendered_scroll_offset.round() as i32;
        self.tab_rects
            .iter()
            .map(|(v, r)| (*v, r.translate(Point::new(shift, 0))))
            .collect()
    }

    pub fn button_at(&self, p: Point) -> Option<NotebookButton> {
        let areas = &self.areas;
        let fixed = [
            (areas.close, NotebookButton::Close),
            (areas.hsplit, NotebookButton::HSplit),
            (areas.vsplit, NotebookButton::VSplit),
            (areas.mark, NotebookButton::Mark),
            (areas.exposay, NotebookButton::Exposay),
            (areas.close_client, NotebookButton::CloseClient),
            (areas.unbind_client, NotebookButton::Unbind),
            (areas.left_scroll_arrow, NotebookButton::ScrollLeft),
            (areas.right_scroll_arrow, NotebookButton::ScrollRight),
        ];
        if let Some((_, button)) = fixed.iter().find(|(r, _)| r.contains(p)) {
            return Some(*button);
        }

        if self.selected_box.contains(p)
            && let Some(selected) = self.selected
        {
            return Some(NotebookButton::Tab(selected));
        }

        if self.tabs_area.contains(p)
            && let Some((view, _)) = self.tab_rects.iter().find(|(_, r)| r.contains(p))
        {
            return Some(NotebookButton::Tab(*view));
        }

        self.exposay_buttons
            .iter()
            .find(|(_, r)| r.contains(p))
            .map(|(view, _)| NotebookButton::ExposayThumbnail(*view))
    }

    pub fn drop_zone_at(&self, p: Point) -> Option<DropZone> {
        let areas = &self.areas;
        [
            (areas.tab, DropZone::Tab),
            (areas.right, DropZone::Right),
            (areas.top, DropZone::Top),
            (areas.bottom, DropZone::Bottom),
            (areas.left, DropZone::Left),
            (areas.center, DropZone::Center),
        ]
        .into_iter()
        .find(|(r, _)| r.contains(p))
        .map(|(_, zone)| zone)
    }

    pub fn hit(&self, p: Point) -> Option<NotebookHit> {
        if !self.allocation.contains(p) {
            return None;
        }
        self.button_at(p)
            .map(NotebookHit::Button)
            .or_else(|| self.drop_zone_at(p).map(NotebookHit::Zone))
    }

    /// Preview rect shown while a drag hovers `zone`.
    pub fn drop_preview(&self, zone: DropZone) -> Rect {
        match zone {
            DropZone::Tab | DropZone::Center => self.areas.popup_center,
            DropZone::Top => self.areas.popup_top,
            DropZone::Bottom => self.areas.popup_bottom,
            DropZone::Left => self.areas.popup_left,
            DropZone::Right => self.areas.popup_right,
        }
    }

    /// Updates the hovered button. Returns true when it changed and the
    /// notebook needs a redraw.
    pub fn update_mouse_over(&mut self, p: Point) -> bool {
        let hovered = if self.allocation.contains(p) { self.button_at(p) } else { None };
        if hovered == self.mouse_over {
            return false;
        }
        self.mouse_over = hovered;
        true
    }
}

fn fraction(v: i32, f: f64) -> i32 { (v as f64 * f) as i32 }

impl TreeNode for Notebook {
    fn children(&self) -> Vec<NodeId> { self.tabs.clone() }

    fn push_child(&mut self, child: NodeId) { self.add(child, false); }

    fn remove_child(&mut self, child: NodeId) -> bool { self.remove(child) }

    fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(slot) = self.tabs.iter_mut().find(|t| **t == old) else {
            return false;
        };
        *slot = new;
        if self.selected == Some(old) {
            self.selected = Some(new);
        }
        self.refresh_tabs();
        true
    }

    fn label(&self) -> String {
        format!(
            "Notebook{} {} tabs={} offset={}",
            if self.is_default { " (default)" } else { "" },
            self.allocation,
            self.tabs.len(),
            self.scroll_offset
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use slotmap::SlotMap;

    use super::*;
    use crate::common::config::{Margins, SplitTheme};

    fn keys(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn bare_theme(iconic: i32) -> Theme {
        Theme {
            notebook: NotebookTheme::bare(iconic, 20),
            split: SplitTheme { margin: Margins::default(), width: 0 },
            ..Theme::default()
        }
    }

    fn notebook_with(n: usize, allocation: Rect, theme: &Theme) -> (Notebook, Vec<NodeId>) {
        let views = keys(n);
        let mut nb = Notebook::new(false);
        for v in &views {
            nb.add(*v, true);
        }
        nb.set_allocation(allocation, theme);
        (nb, views)
    }

    #[test]
    fn tab_scroll_is_clamped_to_overflow() {
        let theme = bare_theme(80);
        let (mut nb, _) = notebook_with(10, Rect::new(0, 0, 700, 400), &theme);

        assert_eq!(nb.tabs_area().w, 500);
        assert!(nb.has_scroll_arrows());

        assert_eq!(nb.scroll_right(1000), Some((0, 300)));
        assert_eq!(nb.scroll_offset(), 300);
        assert_eq!(nb.scroll_right(10), None);

        assert_eq!(nb.scroll_left(30), Some((300, 270)));
        assert_eq!(nb.scroll_left(1000), Some((270, 0)));
        assert_eq!(nb.scroll_offset(), 0);
    }

    #[test]
    fn no_scrolling_when_tabs_fit() {
        let theme = bare_theme(80);
        let (mut nb, _) = notebook_with(3, Rect::new(0, 0, 700, 400), &theme);
        assert!(!nb.has_scroll_arrows());
        assert_eq!(nb.scroll_right(100), None);
        assert_eq!(nb.scroll_offset(), 0);
    }

    #[test]
    fn removing_tabs_reclamps_offset() {
        let theme = bare_theme(80);
        let (mut nb, views) = notebook_with(10, Rect::new(0, 0, 700, 400), &theme);
        nb.scroll_right(300);
        for v in &views[..4] {
            nb.remove(*v);
        }
        // Six tabs leave a 220px selected box and a 480px strip that fits them.
        assert_eq!(nb.scroll_offset(), 0);
    }

    #[test]
    fn selected_box_never_narrower_than_minimum() {
        let theme = Theme::default();
        let (nb, _) = notebook_with(30, Rect::new(0, 0, 600, 400), &theme);
        assert_eq!(nb.selected_box().w, 200);
        assert!(nb.has_scroll_arrows());
        let arrows = nb.areas().left_scroll_arrow;
        assert_eq!(arrows.x, theme.notebook.menu_button_width + 200);
    }

    #[test]
    fn remove_selected_picks_last_added_tab() {
        let views = keys(3);
        let mut nb = Notebook::new(false);
        for v in &views {
            nb.add(*v, false);
        }
        assert_eq!(nb.selected(), Some(views[0]));
        nb.select(views[1]);
        assert!(nb.remove(views[1]));
        assert_eq!(nb.selected(), Some(views[2]));
        assert!(!nb.remove(views[1]));
    }

    #[test]
    fn shade_mode_keeps_notebook_unselected() {
        let views = keys(2);
        let mut nb = Notebook::new(true);
        nb.add(views[0], true);
        nb.add(views[1], false);
        assert_eq!(nb.selected(), Some(views[0]));
        nb.remove(views[0]);
        assert_eq!(nb.selected(), None);
        assert!(!nb.is_empty());
    }

    #[test]
    fn select_is_noop_for_selected_or_foreign_views() {
        let views = keys(3);
        let mut nb = Notebook::new(false);
        nb.add(views[0], true);
        nb.add(views[1], false);
        assert!(!nb.select(views[0]));
        assert!(!nb.select(views[2]));
        assert!(nb.select(views[1]));
        assert_eq!(nb.selected(), Some(views[1]));
    }

    #[test]
    fn drop_zones_follow_allocation() {
        let theme = bare_theme(80);
        let (nb, _) = notebook_with(1, Rect::new(0, 0, 1000, 820), &theme);
        let areas = nb.areas();
        assert_eq!(areas.tab, Rect::new(0, 0, 1000, 20));
        assert_eq!(areas.top, Rect::new(0, 20, 1000, 160));
        assert_eq!(areas.bottom, Rect::new(0, 660, 1000, 160));
        assert_eq!(areas.left, Rect::new(0, 20, 200, 800));
        assert_eq!(areas.right, Rect::new(800, 20, 200, 800));
        assert_eq!(areas.center, Rect::new(200, 180, 600, 480));

        assert_eq!(nb.drop_zone_at(Point::new(500, 10)), Some(DropZone::Tab));
        assert_eq!(nb.drop_zone_at(Point::new(500, 400)), Some(DropZone::Center));
        assert_eq!(nb.drop_zone_at(Point::new(900, 400)), Some(DropZone::Right));
        assert_eq!(nb.drop_zone_at(Point::new(50, 400)), Some(DropZone::Left));
        assert_eq!(nb.drop_zone_at(Point::new(500, 30)), Some(DropZone::Top));
        assert_eq!(nb.drop_zone_at(Point::new(500, 700)), Some(DropZone::Bottom));
    }

    #[test]
    fn split_zones_disabled_when_too_small() {
        let theme = Theme::default();
        let (min_w, min_h) = Notebook::min_allocation(&theme.notebook);
        let (nb, _) =
            notebook_with(1, Rect::new(0, 0, min_w * 2 - 1, min_h * 2 + 100), &theme);
        assert!(!nb.can_vsplit());
        assert!(nb.can_hsplit());
        assert!(nb.areas().left.is_null());
        assert!(nb.areas().right.is_null());
        assert!(!nb.areas().top.is_null());
    }

    #[test]
    fn control_buttons_win_over_tabs_and_zones() {
        let theme = Theme::default();
        let (nb, views) = notebook_with(2, Rect::new(0, 0, 1000, 600), &theme);
        let close = nb.areas().close;
        assert_eq!(close, Rect::new(952, 0, 48, 22));
        assert_eq!(
            nb.hit(Point::new(close.x + 1, 1)),
            Some(NotebookHit::Button(NotebookButton::Close))
        );
        assert_eq!(nb.hit(Point::new(1, 1)), Some(NotebookHit::Button(NotebookButton::Exposay)));

        let close_client = nb.areas().close_client;
        assert_eq!(
            nb.hit(close_client.origin()),
            Some(NotebookHit::Button(NotebookButton::CloseClient))
        );

        let (tab, rect) = nb.tab_rects()[0];
        assert_eq!(tab, views[0]);
        assert_eq!(nb.hit(rect.origin()), Some(NotebookHit::Button(NotebookButton::Tab(tab))));
        assert_eq!(nb.hit(Point::new(500, 300)), Some(NotebookHit::Zone(DropZone::Center)));
        assert_eq!(nb.hit(Point::new(1500, 300)), None);
    }

    #[test]
    fn hover_changes_are_reported_once() {
        let theme = Theme::default();
        let (mut nb, _) = notebook_with(2, Rect::new(0, 0, 1000, 600), &theme);
        let close = nb.areas().close.origin();
        assert!(nb.update_mouse_over(close));
        assert!(!nb.update_mouse_over(close + Point::new(1, 1)));
        assert!(nb.update_mouse_over(Point::new(500, 300)));
        assert!(!nb.update_mouse_over(Point::new(501, 300)));
        assert!(!nb.update_mouse_over(Point::new(5000, 300)));
    }

    #[test]
    fn exposay_lays_out_grid_and_ends_on_select() {
        let theme = bare_theme(80);
        let (mut nb, views) = notebook_with(5, Rect::new(0, 0, 900, 620), &theme);
        nb.start_exposay();
        assert!(nb.in_exposay());
        assert_eq!(nb.selected(), None);
        assert_eq!(nb.exposay_buttons().len(), 5);
        let thumbs: Vec<_> = nb.exposay_buttons().iter().map(|(_, r)| *r).collect();
        for (i, a) in thumbs.iter().enumerate() {
            assert!(nb.client_area().contains_rect(a));
            for b in &thumbs[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
        assert!(nb.select(views[3]));
        assert!(!nb.in_exposay());
        assert!(nb.exposay_buttons().is_empty());
    }

    #[test]
    fn min_allocation_accounts_for_every_button() {
        let theme = NotebookTheme::default();
        let (w, h) = Notebook::min_allocation(&theme);
        assert_eq!(w, 8 + 100 + 48 + 48 + 20 + 20 + 20 + 20 + 40 + 33 * 4);
        assert_eq!(h, 22 + 8 + 20);
    }
}
