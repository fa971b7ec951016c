//! Plain-text rendering of a [`ViewModel`].

use std::fmt::{self, Write};

use crate::{
    view::{AWAITING_PERMISSION_MESSAGE, FORECAST_TITLE, ForecastCard, ResultView, UiState, ViewModel},
    warnings::WarningPanel,
};

const SEPARATOR: &str = "  ----------------";

/// Render the whole page. Pure: the same view-model always yields the same text.
pub fn render(vm: &ViewModel) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = render_into(&mut out, vm);
    out
}

fn render_into(out: &mut String, vm: &ViewModel) -> fmt::Result {
    if let Some(alert) = &vm.alert {
        writeln!(out, "! {alert}")?;
    }
    if vm.awaiting_permission {
        writeln!(out, "{AWAITING_PERMISSION_MESSAGE}")?;
    }

    match &vm.state {
        UiState::Idle => {}
        UiState::Loading { location } => writeln!(out, "[{}] {location}", vm.search_label())?,
        UiState::Error(message) => writeln!(out, "Error: {message}")?,
        UiState::Result(view) => render_result(out, view)?,
    }

    if vm.warnings.state.is_visible() {
        render_warnings(out, &vm.warnings)?;
    }

    Ok(())
}

fn render_result(out: &mut String, view: &ResultView) -> fmt::Result {
    let current = &view.current;

    writeln!(out, "{}", current.location)?;
    if let Some(address_type) = &current.address_type {
        writeln!(out, "{address_type}")?;
    }
    writeln!(out, "{}  {}", current.temperature, current.description)?;
    writeln!(out, "  Icon:       {}", current.icon_url)?;
    writeln!(out, "  Feels like: {}", current.feels_like)?;
    writeln!(out, "  Humidity:   {}", current.humidity)?;
    writeln!(out, "  Wind:       {}", current.wind_speed)?;
    writeln!(out, "  Visibility: {}", current.visibility)?;
    writeln!(out, "  Country:    {}", current.country)?;
    writeln!(out, "  Sunrise:    {}", current.sunrise)?;
    writeln!(out, "  Sunset:     {}", current.sunset)?;

    if !view.forecast.is_empty() {
        writeln!(out)?;
        writeln!(out, "{FORECAST_TITLE}")?;
        for card in &view.forecast {
            render_card(out, card)?;
        }
    }

    Ok(())
}

fn render_card(out: &mut String, card: &ForecastCard) -> fmt::Result {
    writeln!(
        out,
        "  {:<10} {:>5}  {} / {}  {}",
        card.label, card.date, card.high, card.low, card.description
    )?;
    writeln!(
        out,
        "             🌡️ Feels {}  ☔ {}  💧 {}  💨 {}",
        card.feels_like, card.rain_chance, card.humidity, card.wind_speed
    )?;
    writeln!(out, "             {}", card.icon_url)
}

fn render_warnings(out: &mut String, panel: &WarningPanel) -> fmt::Result {
    writeln!(out)?;
    writeln!(
        out,
        "⚠️ Weather warnings ({})  [{}]",
        panel.summary.total,
        panel.state.toggle_label()
    )?;

    if !panel.state.is_expanded() {
        return Ok(());
    }

    let last = panel.summary.sections.len().saturating_sub(1);
    for (index, section) in panel.summary.sections.iter().enumerate() {
        writeln!(out, "  {}", section.day)?;
        for message in &section.messages {
            writeln!(out, "    • {message}")?;
        }
        if index < last {
            writeln!(out, "{SEPARATOR}")?;
        }
    }

    Ok(())
}
