//! Advisory warnings: derivation from a report and the collapsible panel state.

use crate::model::{CurrentConditions, ForecastDay};

pub const LEARN_MORE_LABEL: &str = "Learn More";
pub const SHOW_LESS_LABEL: &str = "Show Less";

/// Warnings attributed to one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWarnings {
    pub day: String,
    pub messages: Vec<String>,
}

/// All warnings of a report, in current-then-forecast order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningSummary {
    pub sections: Vec<DayWarnings>,
    pub total: usize,
}

impl WarningSummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Split a `[day_label, message...]` list. Lists of length <= 1 carry nothing.
pub fn split_warnings(list: Option<&[String]>) -> Option<DayWarnings> {
    match list? {
        [day, messages @ ..] if !messages.is_empty() => Some(DayWarnings {
            day: day.clone(),
            messages: messages.to_vec(),
        }),
        _ => None,
    }
}

pub fn collect_warnings(current: &CurrentConditions, forecast: &[ForecastDay]) -> WarningSummary {
    let sections: Vec<DayWarnings> = std::iter::once(current.warnings.as_deref())
        .chain(forecast.iter().map(|day| day.warnings.as_deref()))
        .filter_map(split_warnings)
        .collect();

    let total = sections.iter().map(|s| s.messages.len()).sum();

    WarningSummary { sections, total }
}

/// Visibility of the warning panel and its detail list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Hidden,
    Collapsed,
    Expanded,
}

impl PanelState {
    /// Expand or collapse the details. A hidden panel stays hidden.
    pub fn toggled(self) -> Self {
        match self {
            PanelState::Hidden => PanelState::Hidden,
            PanelState::Collapsed => PanelState::Expanded,
            PanelState::Expanded => PanelState::Collapsed,
        }
    }

    pub fn is_visible(self) -> bool {
        self != PanelState::Hidden
    }

    pub fn is_expanded(self) -> bool {
        self == PanelState::Expanded
    }

    pub fn toggle_label(self) -> &'static str {
        if self.is_expanded() { SHOW_LESS_LABEL } else { LEARN_MORE_LABEL }
    }
}

/// Warning panel as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningPanel {
    pub summary: WarningSummary,
    pub state: PanelState,
}

impl WarningPanel {
    /// Panel for a fresh report: shown collapsed when there is anything to show.
    pub fn from_summary(summary: WarningSummary) -> Self {
        let state = if summary.is_empty() { PanelState::Hidden } else { PanelState::Collapsed };
        Self { summary, state }
    }

    pub fn toggle(&mut self) -> PanelState {
        self.state = self.state.toggled();
        self.state
    }

    pub fn dismiss(&mut self) {
        self.state = PanelState::Hidden;
    }
}
