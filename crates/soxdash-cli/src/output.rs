use std::io::{self, Write};

use serde_json::Value;
use soxdash_core::view_model::ViewModel;
use soxdash_core::NarrativeBundle;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
    view: Option<&ViewModel>,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => {
            write_meta(&mut out, envelope)?;
            match view {
                Some(view) => write_dashboard(&mut out, view)?,
                None => write_data(&mut out, &envelope.data)?,
            }
            write_errors(&mut out, envelope)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_meta(out: &mut impl Write, envelope: &Envelope<Value>) -> io::Result<()> {
    let meta = &envelope.meta;
    writeln!(out, "request_id  : {}", meta.request_id)?;
    writeln!(out, "generated_at: {}", meta.generated_at)?;
    if !meta.tier_chain.is_empty() {
        writeln!(
            out,
            "tiers       : {}",
            meta.tier_chain
                .iter()
                .map(|tier| tier.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        )?;
        writeln!(out, "latency_ms  : {}", meta.latency_ms)?;
    }
    if !meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    writeln!(out)
}

fn write_data(out: &mut impl Write, data: &Value) -> Result<(), CliError> {
    writeln!(out, "data:")?;
    let pretty_data = serde_json::to_string_pretty(data)?;
    for line in pretty_data.lines() {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

fn write_errors(out: &mut impl Write, envelope: &Envelope<Value>) -> io::Result<()> {
    if envelope.errors.is_empty() {
        return Ok(());
    }
    writeln!(out, "errors:")?;
    for error in &envelope.errors {
        match error.tier {
            Some(tier) => writeln!(out, "  - [{}] {}: {}", tier.label(), error.code, error.message)?,
            None => writeln!(out, "  - {}: {}", error.code, error.message)?,
        }
    }
    Ok(())
}

/// Text rendition of the dashboard: header, instrument table, heatmap and narrative.
pub fn write_dashboard(out: &mut impl Write, view: &ViewModel) -> io::Result<()> {
    writeln!(
        out,
        "SOXDASH  source: {}  updated: {}  refresh #{}",
        view.header.source, view.header.last_updated, view.header.sequence
    )?;
    if let Some(advisory) = &view.header.advisory {
        writeln!(out, "! {advisory}")?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{:<8} {:<28} {:>12} {:>10} {:>9} {:>4} {:<10} {:<21} PRE",
        "TICKER", "NAME", "PRICE", "CHG", "CHG%", "RSI", "ZONE", "HISTORY"
    )?;
    for card in &view.instruments {
        let marker = if card.stale { "*" } else { "" };
        writeln!(
            out,
            "{:<8} {:<28} {:>12} {:>10} {:>9} {:>4} {:<10} {:<21} {}",
            format!("{}{marker}", card.ticker),
            card.name,
            card.price,
            card.change,
            card.change_percent,
            card.rsi,
            card.rsi_zone.label(),
            card.sparkline,
            card.pre_market.as_deref().unwrap_or("")
        )?;
    }
    if view.instruments.iter().any(|card| card.stale) {
        writeln!(out, "* last known value; this refresh did not return it")?;
    }
    writeln!(out)?;

    writeln!(out, "HEATMAP")?;
    for cell in &view.heatmap {
        writeln!(
            out,
            "  {:<6} {:>4} {:>10} {:>8}",
            cell.ticker, cell.weight, cell.price, cell.change_percent
        )?;
    }
    writeln!(out)?;

    write_narrative(out, &view.narrative)
}

fn write_narrative(out: &mut impl Write, narrative: &NarrativeBundle) -> io::Result<()> {
    let focus = &narrative.weekly_focus;
    if !focus.title.is_empty() {
        writeln!(out, "WEEKLY FOCUS: {}", focus.title)?;
        if !focus.description.is_empty() {
            writeln!(out, "  {}", focus.description)?;
        }
        for note in &focus.notes {
            writeln!(out, "  - {}", note.render())?;
        }
        writeln!(out)?;
    }

    if !narrative.schedule.is_empty() {
        writeln!(out, "SCHEDULE")?;
        for day in &narrative.schedule {
            let tags = if day.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", day.tags.join(", "))
            };
            writeln!(out, "  {} {}{tags}", day.day, day.date)?;
            for event in &day.events {
                writeln!(out, "    {event}")?;
            }
            for earnings in &day.earnings {
                writeln!(
                    out,
                    "    earnings: {} ({}) {}",
                    earnings.name,
                    earnings.symbol,
                    String::from(earnings.time)
                )?;
            }
        }
        writeln!(out)?;
    }

    if !narrative.news.is_empty() {
        writeln!(out, "NEWS")?;
        for item in &narrative.news {
            writeln!(
                out,
                "  [{}/{}] {} ({}, {})",
                String::from(item.category),
                String::from(item.sentiment),
                item.title,
                item.source,
                item.time
            )?;
            if !item.impact.is_empty() {
                writeln!(out, "      {}", item.impact)?;
            }
            if let Some(url) = &item.url {
                writeln!(out, "      {url}")?;
            }
        }
    }
    Ok(())
}
