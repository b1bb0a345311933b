/// Stateless action button with disabled / busy / ready conditions
use iced::alignment::Horizontal;
use iced::widget::{button, text};
use iced::{Element, Length};

use crate::state::flow::Flow;

/// What the control looks like and whether it reacts to presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Preconditions unmet; pressing does nothing
    Disabled,
    /// Work in progress; shows an indeterminate indicator, not pressable
    Busy,
    /// Pressing triggers the action
    Ready,
}

impl Condition {
    /// Condition of the generate button for the given flow
    pub fn for_generate(flow: &Flow) -> Self {
        if flow.is_processing() {
            Condition::Busy
        } else if flow.result().is_some() || !flow.has_inputs() {
            Condition::Disabled
        } else {
            Condition::Ready
        }
    }
}

/// Label shown while busy; `tick` animates the trailing dots
pub fn busy_label(tick: usize) -> String {
    format!("Styling{}", ".".repeat(tick % 4))
}

/// Build the control. The caller owns every piece of state.
pub fn action<'a, M: Clone + 'a>(
    label: &'a str,
    condition: Condition,
    on_press: M,
    tick: usize,
) -> Element<'a, M> {
    let content = match condition {
        Condition::Busy => text(busy_label(tick)),
        Condition::Disabled | Condition::Ready => text(label),
    };

    button(content.width(Length::Fill).align_x(Horizontal::Center))
        .on_press_maybe((condition == Condition::Ready).then_some(on_press))
        .padding(14)
        .width(Length::Fill)
        .into()
}
