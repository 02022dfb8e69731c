//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (props only)
//! - `TitleBar`: app name, screen, connection indicator, user, status
//! - `Message`: one chat bubble
//! - `ProductDetail`: a single product
//!
//! ### Stateful Components (persistent state + transient wrapper)
//! - `InputBox`: single-line text field
//! - `MessageList` / `MessageListState`: scrollable conversation
//! - `Login` / `LoginState`: sign-in card
//! - `Catalog` / `CatalogState`: searchable product list
//!
//! State structs live in the run loop and implement `EventHandler`; the
//! wrappers borrow them each frame and implement `Component`.
//!
//! ```text
//! components/
//! ├── mod.rs             (this file + layout helpers)
//! ├── title_bar.rs
//! ├── message.rs
//! ├── message_list.rs
//! ├── input_box.rs
//! ├── login.rs
//! ├── catalog.rs
//! └── product_detail.rs
//! ```

use ratatui::layout::{Constraint, Layout, Rect};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub mod catalog;
pub mod input_box;
pub mod login;
pub mod message;
pub mod message_list;
pub mod product_detail;
mod title_bar;

pub use catalog::{Catalog, CatalogEvent, CatalogState, LoadState};
pub use input_box::{InputBox, InputEvent};
pub use login::{Login, LoginEvent, LoginState};
pub use message_list::{MessageList, MessageListState};
pub use product_detail::ProductDetail;
pub use title_bar::TitleBar;

/// Truncate `s` to `max_width` display columns, ending in "..." when cut.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width - 3 {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push_str("...");
    out
}

/// Compute a centered rect using percentage of the outer rect.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
