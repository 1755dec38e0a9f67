use std::borrow::Cow;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use unicode_width::UnicodeWidthStr;

use crate::note::{NoteDocument, Segment, SegmentKind};
use crate::ui::wrap::wrap;

/// Something the virtual list can show.
pub trait Listable {
    fn content(&self) -> Cow<'_, str>;

    fn is_checked(&self) -> bool {
        false
    }
}

/// Measures and draws items for a [`ListViewport`].
pub trait ItemRenderer<T> {
    /// Rendered line count at `width`, including the trailing spacing.
    fn height(&self, item: &T, width: u16) -> usize;

    fn spacing(&self) -> usize;

    fn render(&self, item: &T, width: u16, selected: bool) -> Vec<Line<'static>>;
}

#[derive(Debug, Clone)]
pub struct ItemStyles {
    pub normal: Style,
    pub selected: Style,
    pub dimmed: Style,
}

impl Default for ItemStyles {
    fn default() -> Self {
        Self {
            normal: Style::default(),
            selected: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            dimmed: Style::default().fg(Color::DarkGray),
        }
    }
}

const SELECTED_SYMBOL: &str = "▸ ";
const UNSELECTED_SYMBOL: &str = "  ";

#[derive(Debug, Clone)]
pub struct DefaultRenderer {
    pub styles: ItemStyles,
    spacing: usize,
}

impl Default for DefaultRenderer {
    fn default() -> Self {
        Self {
            styles: ItemStyles::default(),
            spacing: 1,
        }
    }
}

impl DefaultRenderer {
    pub fn with_spacing(spacing: usize) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    fn text_width(width: u16) -> usize {
        (width as usize)
            .saturating_sub(UNSELECTED_SYMBOL.width())
            .max(1)
    }
}

impl<T: Listable> ItemRenderer<T> for DefaultRenderer {
    fn height(&self, item: &T, width: u16) -> usize {
        wrap(&item.content(), Self::text_width(width)).len() + self.spacing
    }

    fn spacing(&self) -> usize {
        self.spacing
    }

    fn render(&self, item: &T, width: u16, selected: bool) -> Vec<Line<'static>> {
        let style = if selected {
            self.styles.selected
        } else if item.is_checked() {
            self.styles.dimmed
        } else {
            self.styles.normal
        };
        wrap(&item.content(), Self::text_width(width))
            .into_iter()
            .enumerate()
            .map(|(row, text)| {
                let gutter = if selected && row == 0 {
                    SELECTED_SYMBOL
                } else {
                    UNSELECTED_SYMBOL
                };
                Line::from(vec![Span::styled(gutter, style), Span::styled(text, style)])
            })
            .collect()
    }
}

/// Cursor and per-item height cache over a list of variable-height items.
///
/// Heights are measured once per item and again only when the item changes
/// or the display width does. [`ListViewport::visible_window`] decides which
/// items fit around the cursor; drawing is left to [`VirtualList`].
pub struct ListViewport<T, R = DefaultRenderer> {
    items: Vec<T>,
    heights: Vec<usize>,
    cursor: usize,
    width: u16,
    height: u16,
    renderer: R,
}

impl<T, R: ItemRenderer<T>> ListViewport<T, R> {
    pub fn new(items: Vec<T>, renderer: R, width: u16, height: u16) -> Self {
        let mut viewport = Self {
            items,
            heights: Vec::new(),
            cursor: 0,
            width,
            height,
            renderer,
        };
        viewport.regenerate_heights();
        viewport
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn heights(&self) -> &[usize] {
        &self.heights
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw cursor position; meaningless while the list is empty.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.cursor)
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    pub fn select(&mut self, index: usize) {
        self.cursor = index.min(self.items.len().saturating_sub(1));
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        let width_changed = self.width != width;
        self.width = width;
        self.height = height;
        if width_changed {
            self.regenerate_heights();
        }
    }

    pub fn insert_at(&mut self, index: usize, item: T) {
        let was_empty = self.items.is_empty();
        let index = index.min(self.items.len());
        let height = self.renderer.height(&item, self.width);
        self.items.insert(index, item);
        self.heights.insert(index, height);
        if was_empty {
            self.cursor = 0;
        } else if index <= self.cursor {
            self.cursor += 1;
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.heights.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }
        self.clamp_cursor();
        Some(removed)
    }

    /// Replaces the item at `index`, returning the previous one.
    pub fn set_at(&mut self, index: usize, item: T) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        self.heights[index] = self.renderer.height(&item, self.width);
        Some(std::mem::replace(&mut self.items[index], item))
    }

    /// Edits the selected item in place and re-measures it.
    pub fn update_selected<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(item) = self.items.get_mut(self.cursor) else {
            return false;
        };
        edit(item);
        self.heights[self.cursor] = self.renderer.height(item, self.width);
        true
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.regenerate_heights();
        self.clamp_cursor();
    }

    /// Grows a window around the cursor, trying one item above and then one
    /// below per round, and accepts a neighbour only while the running total
    /// stays strictly under `available`. Growth stops on each side
    /// independently. If the cursor item alone exceeds `available` the window
    /// is just that item.
    pub fn visible_window(&self, available: usize) -> (&[T], usize, usize) {
        if self.items.is_empty() {
            return (&[], 0, 0);
        }
        let cursor = self.cursor;
        let mut used = self.heights[cursor];
        if used > available {
            return (&self.items[cursor..=cursor], cursor, cursor);
        }
        let (mut min, mut max) = (cursor, cursor);
        loop {
            let mut grew = false;
            if min > 0 && used + self.heights[min - 1] < available {
                min -= 1;
                used += self.heights[min];
                grew = true;
            }
            if max + 1 < self.items.len() && used + self.heights[max + 1] < available {
                max += 1;
                used += self.heights[max];
                grew = true;
            }
            if !grew {
                break;
            }
        }
        (&self.items[min..=max], min, max)
    }

    fn regenerate_heights(&mut self) {
        let width = self.width;
        self.heights = self
            .items
            .iter()
            .map(|item| self.renderer.height(item, width))
            .collect();
    }

    fn clamp_cursor(&mut self) {
        if self.cursor >= self.items.len() {
            self.cursor = self.items.len().saturating_sub(1);
        }
    }
}

/// Draws the visible window of a [`ListViewport`].
///
/// The viewport should already be sized to the inner area (see
/// [`VirtualList::inner_area`]) so that cached heights match what is drawn.
pub struct VirtualList<'a, T, R> {
    viewport: &'a ListViewport<T, R>,
    block: Option<Block<'a>>,
    empty_message: &'a str,
}

impl<'a, T, R: ItemRenderer<T>> VirtualList<'a, T, R> {
    pub fn new(viewport: &'a ListViewport<T, R>) -> Self {
        Self {
            viewport,
            block: None,
            empty_message: "No items found.",
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }

    pub fn inner_area(block: Option<&Block<'_>>, area: Rect) -> Rect {
        match block {
            Some(block) => block.inner(area),
            None => area,
        }
    }
}

impl<'a, T, R: ItemRenderer<T>> Widget for VirtualList<'a, T, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = Self::inner_area(self.block.as_ref(), area);
        if let Some(block) = self.block {
            block.render(area, buf);
        }
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let viewport = self.viewport;
        if viewport.is_empty() {
            Paragraph::new(self.empty_message)
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        let (items, min, _) = viewport.visible_window(inner.height as usize);
        let renderer = viewport.renderer();
        let mut y = inner.y;
        for (offset, item) in items.iter().enumerate() {
            let index = min + offset;
            for line in renderer.render(item, inner.width, index == viewport.cursor()) {
                if y >= inner.bottom() {
                    return;
                }
                buf.set_line(inner.x, y, &line, inner.width);
                y += 1;
            }
            y = y.saturating_add(renderer.spacing() as u16);
        }
    }
}

impl Listable for Segment {
    fn content(&self) -> Cow<'_, str> {
        Segment::content(self)
    }

    fn is_checked(&self) -> bool {
        self.kind() == SegmentKind::Task
            && self
                .task_marker()
                .is_some_and(|marker| !marker.trim().is_empty())
    }
}

impl Listable for NoteDocument {
    fn content(&self) -> Cow<'_, str> {
        if self.tags().is_empty() {
            Cow::Borrowed(self.title())
        } else {
            Cow::Owned(format!("{}: {}", self.title(), self.description()))
        }
    }
}
