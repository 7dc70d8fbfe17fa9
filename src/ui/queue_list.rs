use iced::widget::{column, container, mouse_area, scrollable, text, Column};
use iced::{Color, Element, Length};

use crate::state::queue::{Queue, VISIBLE_ROWS};
use crate::Message;

/// Height of one list row in logical pixels
const ROW_HEIGHT: f32 = 22.0;

/// The queued-files list.
/// Each row removes its own entry on right-click; a scroll container is only
/// added once the queue outgrows the visible rows.
pub fn view(queue: &Queue) -> Element<'_, Message> {
    let rows: Column<Message> = queue
        .display_rows()
        .enumerate()
        .fold(column![], |list, (row, name)| {
            list.push(
                mouse_area(
                    container(text(name).size(14))
                        .width(Length::Fill)
                        .height(Length::Fixed(ROW_HEIGHT))
                        .padding([2, 6]),
                )
                .on_right_press(Message::RemoveRow(row)),
            )
        });

    let list_height = Length::Fixed(ROW_HEIGHT * VISIBLE_ROWS as f32);
    let body: Element<Message> = if queue.needs_scrollbar() {
        scrollable(rows).height(list_height).into()
    } else {
        container(rows).height(list_height).into()
    };

    container(body)
        .width(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(Color::WHITE.into()),
            text_color: Some(Color::BLACK),
            ..container::Style::default()
        })
        .into()
}
