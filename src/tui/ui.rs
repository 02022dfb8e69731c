use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;

use crate::tui::component::Component;
use crate::tui::components::input_box;
use crate::tui::components::{Catalog, Login, MessageList, ProductDetail, TitleBar};
use crate::tui::{ChatSession, Screen, TuiState};

const CHAT_HELP: &str = " Enter Send  ↑/↓ Scroll  Tab Marketplace  Ctrl+L Log out  Ctrl+C Quit ";
const MARKET_HELP: &str = " ↑/↓ Select  Enter Open  Ctrl+R Reload  Tab Chat  Ctrl+L Log out ";
const PRODUCT_HELP: &str = " Esc Back  Ctrl+R Reload  Ctrl+L Log out ";

pub fn draw(frame: &mut Frame, state: &mut TuiState) {
    use Constraint::{Length, Min};
    let [title_area, body_area, help_area] =
        Layout::vertical([Length(1), Min(0), Length(1)]).areas(frame.area());

    let mut title_bar = TitleBar::new(state.screen.title());
    if let Some(chat) = &state.chat {
        title_bar = title_bar
            .connection(chat.app.connection)
            .user(chat.app.user.display_name());
        if state.screen == Screen::Chat {
            title_bar = title_bar.status(chat.app.status_message.clone());
        }
    }
    title_bar.render(frame, title_area);

    let help = match (state.screen, state.chat.as_mut()) {
        (Screen::Chat, Some(chat)) => {
            draw_chat(frame, body_area, chat);
            CHAT_HELP
        }
        (Screen::Marketplace, _) => {
            Catalog::new(&mut state.catalog).render(frame, body_area);
            MARKET_HELP
        }
        (Screen::Product(_), _) => {
            ProductDetail::new(&state.product).render(frame, body_area);
            PRODUCT_HELP
        }
        _ => {
            Login::new(&mut state.login, &state.identity).render(frame, body_area);
            ""
        }
    };
    frame.render_widget(
        Line::styled(help, Style::default().fg(Color::DarkGray)),
        help_area,
    );
}

fn draw_chat(frame: &mut Frame, area: Rect, chat: &mut ChatSession) {
    let [list_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_box::HEIGHT),
    ])
    .areas(area);

    MessageList::new(&mut chat.list, &chat.app.messages).render(frame, list_area);

    chat.input.disabled = chat.app.is_loading;
    chat.input.render(frame, input_area);
}
