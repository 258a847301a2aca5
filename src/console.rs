//! Terminal front end: redraws a colored memory summary on a fixed cadence.

use std::io::{self, Write};
use std::time::Duration;

use color_eyre::Result;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use tracing::info;

use crate::config::ConsoleConfig;
use crate::format::{gib, kib, mib, truncate_unicode};
use crate::system::collector::{Collector, Sampler};
use crate::system::filter::FilterPolicy;
use crate::system::snapshot::Snapshot;

const NAME_COLUMN_WIDTH: usize = 30;

pub fn render<W: Write>(out: &mut W, snapshot: &Snapshot, bar_width: usize) -> io::Result<()> {
    let usage = snapshot.usage_percent();

    writeln!(out, "{}", "==================================".cyan().bold())?;
    writeln!(out, "{}", "   Memory Allocation Tracker".cyan().bold())?;
    writeln!(out, "{}", "==================================".cyan().bold())?;
    writeln!(out)?;

    writeln!(out, "{}", "Memory Statistics:".yellow().bold())?;
    writeln!(out, "{}", "----------------".yellow().bold())?;
    writeln!(out, "Total Memory:    {:.2} GB", gib(snapshot.total_physical_bytes()))?;
    writeln!(out, "Used Memory:     {:.2} GB", gib(snapshot.used_physical_bytes()))?;
    writeln!(out, "Available:       {:.2} GB", gib(snapshot.available_physical_bytes()))?;
    writeln!(out, "Page Size:       {:.2} KB", kib(snapshot.page_size_bytes()))?;
    writeln!(out, "Pages In Use:    {}", snapshot.page_count())?;
    writeln!(out, "Memory Usage:    {usage:.1}%")?;
    writeln!(out)?;

    writeln!(out, "{}", "Memory Usage Bar:".green().bold())?;
    writeln!(out, "{}", "---------------".green().bold())?;
    let filled = filled_cells(usage, bar_width);
    write!(out, "[")?;
    for cell in 0..bar_width {
        if cell < filled {
            write!(out, "{}", "#".red().bold())?;
        } else {
            write!(out, "{}", "-".green().bold())?;
        }
    }
    writeln!(out, "] {usage:.1}%")?;
    writeln!(out)?;

    writeln!(out, "{}", "Top Memory Processes:".magenta().bold())?;
    writeln!(out, "{}", "-------------------".magenta().bold())?;
    for process in snapshot.processes() {
        let name = truncate_unicode(&process.name, NAME_COLUMN_WIDTH);
        writeln!(
            out,
            "{name:<width$}: {:.1} MB",
            mib(process.working_set_bytes),
            width = NAME_COLUMN_WIDTH
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "Press Ctrl+C to exit".cyan().bold())?;
    Ok(())
}

fn filled_cells(usage_percent: f64, bar_width: usize) -> usize {
    let filled = (usage_percent / 100.0 * bar_width as f64) as usize;
    filled.min(bar_width)
}

/// Redraw stdout every refresh tick until Ctrl+C.
pub async fn run(config: &ConsoleConfig) -> Result<()> {
    let policy = FilterPolicy::with_threshold_mb(config.max_processes, config.min_working_set_mb);
    let mut collector = Collector::new(policy);
    let mut ticker = tokio::time::interval(Duration::from_millis(config.refresh_rate_ms.max(1)));
    let mut stdout = io::stdout();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(refresh_rate_ms = config.refresh_rate_ms, "console view started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let snapshot = collector.sample();
                queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
                render(&mut stdout, &snapshot, config.bar_width)?;
                stdout.flush()?;
            }
        }
    }
    info!("console view stopped");
    Ok(())
}
