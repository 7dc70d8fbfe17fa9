use iced::widget::{button, column, container, text};
use iced::{alignment, Alignment, Color, Element, Length};

use crate::Message;

pub const VERSION_TITLE: &str = "Mol Converter v2.3";
pub const PROFILE_URL: &str = "https://www.linkedin.com/in/edwinangeli/";

const ATTRIBUTION: &str = "Freeware \u{2013} Free to use and share\n\
                           Created by Edwin Angeli (2025)\n\
                           No warranty or liability assumed";

/// Static attribution panel shown in place of the main controls
pub fn view() -> Element<'static, Message> {
    let content = column![
        text(VERSION_TITLE).size(20),
        text(ATTRIBUTION).size(13).align_x(alignment::Horizontal::Center),
        button(text("Connect on LinkedIn").color(Color::from_rgb(0.0, 0.0, 1.0)))
            .style(button::text)
            .on_press(Message::OpenProfileLink),
        button("Close").on_press(Message::CloseAbout).padding(8),
    ]
    .spacing(12)
    .padding(30)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
