//! # ProductDetail Component
//!
//! Single product: name, price, rating and sales stats, description.
//! Esc goes back to the marketplace.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph, Wrap};

use super::catalog::LoadState;
use crate::core::catalog::{ProductDetail as Detail, format_count, format_price};
use crate::tui::component::Component;

pub struct ProductDetail<'a> {
    pub product: &'a LoadState<Detail>,
}

impl<'a> ProductDetail<'a> {
    pub fn new(product: &'a LoadState<Detail>) -> Self {
        Self { product }
    }
}

fn detail_lines(product: &Detail) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::styled(
            product.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::styled(
            format!("${}", format_price(product.price)),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{:.1}", product.rating)),
            Span::styled(format!("  ({} reviews)", format_count(product.reviews)), dim),
            Span::styled(format!("  {}+ sold", format_count(product.sold)), dim),
        ]),
        Line::default(),
    ];
    if product.description.trim().is_empty() {
        lines.push(Line::styled("No description available.", dim));
    } else {
        lines.extend(product.description.lines().map(|l| Line::from(l.to_string())));
    }
    lines
}

impl<'a> Component for ProductDetail<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(" Product ")
            .title_bottom(Line::from(" Esc Back ").centered())
            .padding(Padding::uniform(1));

        let lines = match self.product {
            LoadState::Loading => vec![Line::styled(
                "Loading product...",
                Style::default().fg(Color::DarkGray),
            )],
            LoadState::Failed(message) => vec![
                Line::styled(
                    format!("Could not load product: {message}"),
                    Style::default().fg(Color::Red),
                ),
                Line::styled("Press Ctrl+R to retry", Style::default().fg(Color::DarkGray)),
            ],
            LoadState::Loaded(product) => detail_lines(product),
        };

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}
