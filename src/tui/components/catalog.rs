//! # Catalog Component
//!
//! Marketplace tab: search field over a selectable product list.
//!
//! ```text
//! ╭ Search products ─────────────────╮
//! │ neem                             │
//! ╰──────────────────────────────────╯
//! ┌ 2 products ──────────────────────┐
//! │▶ Neem Oil 1L            $12.50   │
//! │  Neem Cake 5kg          $8.00    │
//! └──────────────────────────────────┘
//! ```
//!
//! The product list arrives asynchronously; until then (or after a failure)
//! the list area shows a loading line or the retry hint.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};
use unicode_width::UnicodeWidthStr;

use super::input_box::{self, InputBox, InputEvent};
use super::truncate_str;
use crate::core::catalog::{Product, filter_products, format_price};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Where the product list is in its fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    /// Open the detail screen for this product id.
    Open(u64),
}

pub struct CatalogState {
    pub products: LoadState<Vec<Product>>,
    pub search: InputBox,
    pub list_state: ListState,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogState {
    pub fn new() -> Self {
        Self {
            products: LoadState::Loading,
            search: InputBox::new(" Search products ").placeholder("Type to filter"),
            list_state: ListState::default(),
        }
    }

    pub fn set_products(&mut self, result: Result<Vec<Product>, String>) {
        self.products = match result {
            Ok(products) => LoadState::Loaded(products),
            Err(message) => LoadState::Failed(message),
        };
        self.reset_selection();
    }

    /// Products matching the current search text.
    pub fn visible(&self) -> Vec<&Product> {
        match &self.products {
            LoadState::Loaded(products) => filter_products(products, self.search.text()),
            _ => Vec::new(),
        }
    }

    pub fn selected_product(&self) -> Option<&Product> {
        let idx = self.list_state.selected()?;
        self.visible().get(idx).copied()
    }

    fn reset_selection(&mut self) {
        let any = !self.visible().is_empty();
        self.list_state.select(any.then_some(0));
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.list_state.select(Some(next as usize));
    }
}

impl EventHandler for CatalogState {
    type Event = CatalogEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::CursorUp | TuiEvent::ScrollUp => {
                self.move_selection(-1);
                None
            }
            TuiEvent::CursorDown | TuiEvent::ScrollDown => {
                self.move_selection(1);
                None
            }
            TuiEvent::ScrollPageUp => {
                self.move_selection(-10);
                None
            }
            TuiEvent::ScrollPageDown => {
                self.move_selection(10);
                None
            }
            TuiEvent::Submit => self.selected_product().map(|p| CatalogEvent::Open(p.id)),
            other => {
                if let Some(InputEvent::ContentChanged) = self.search.handle_event(other) {
                    self.reset_selection();
                }
                None
            }
        }
    }
}

pub struct Catalog<'a> {
    pub state: &'a mut CatalogState,
}

impl<'a> Catalog<'a> {
    pub fn new(state: &'a mut CatalogState) -> Self {
        Self { state }
    }
}

impl<'a> Component for Catalog<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [search_area, list_area] =
            Layout::vertical([Constraint::Length(input_box::HEIGHT), Constraint::Min(1)])
                .areas(area);
        self.state.search.render(frame, search_area);

        let dim = Style::default().fg(Color::DarkGray);
        match &self.state.products {
            LoadState::Loading => {
                frame.render_widget(
                    Paragraph::new("Loading products...").style(dim).block(Block::bordered()),
                    list_area,
                );
            }
            LoadState::Failed(message) => {
                let lines = vec![
                    Line::styled(format!("Could not load products: {message}"), Style::default().fg(Color::Red)),
                    Line::styled("Press Ctrl+R to retry", dim),
                ];
                frame.render_widget(Paragraph::new(lines).block(Block::bordered()), list_area);
            }
            LoadState::Loaded(_) => {
                let visible = self.state.visible();
                let inner_width = list_area.width.saturating_sub(4) as usize;
                let title = format!(" {} products ", visible.len());

                let items: Vec<ListItem> = visible.iter().map(|p| product_line(p, inner_width)).collect();
                let list = if items.is_empty() {
                    List::new([ListItem::new(Line::styled("No products match your search.", dim))])
                } else {
                    List::new(items)
                }
                .block(Block::bordered().title(title))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD))
                .highlight_symbol("▶ ");
                frame.render_stateful_widget(list, list_area, &mut self.state.list_state);
            }
        }
    }
}

/// `Neem Oil 1L ........ $12.50`, name truncated to leave room for the price.
fn product_line(product: &Product, width: usize) -> ListItem<'static> {
    let price = format!("${}", format_price(product.price));
    let name_width = width.saturating_sub(price.width() + 2);
    let name = truncate_str(&product.name, name_width);
    let pad = width.saturating_sub(name.width() + price.width());
    ListItem::new(Line::from(vec![
        Span::raw(name),
        Span::raw(" ".repeat(pad)),
        Span::styled(price, Style::default().fg(Color::Green)),
    ]))
}
