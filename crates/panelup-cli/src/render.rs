use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};
use panelup_installer::{
    OutputSink, OutputStream, PipelineStep, StepObserver, StepOutcome, StepStatus, UpgradeReport,
};

pub(crate) const COMMAND_ECHO_PREFIX: &str = "$upgrader>";
pub(crate) const UPGRADE_COMPLETED_MESSAGE: &str = "Upgrade process completed successfully!";
const STILL_IN_MAINTENANCE: &str = "The application is still in maintenance mode. \
    Run 'php artisan up' once the problem is fixed.";
const PROGRESS_TEMPLATE: &str =
    "{spinner:.cyan.bold} {msg:<40} [{bar:20.cyan/blue}] {pos:>2}/{len:2} {elapsed_precise}";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    let requested = std::env::var("PANELUP_OUTPUT").ok();
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    let is_tty = std::io::stdout().is_terminal();
    resolve_output_style(is_tty, requested.as_deref(), no_color)
}

pub(crate) fn resolve_output_style(
    stdout_is_tty: bool,
    requested: Option<&str>,
    no_color: bool,
) -> OutputStyle {
    if no_color {
        return OutputStyle::Plain;
    }
    let requested = requested.map(|value| value.trim().to_ascii_lowercase());
    match requested.as_deref() {
        Some("plain") => OutputStyle::Plain,
        Some("rich") => OutputStyle::Rich,
        _ if stdout_is_tty => OutputStyle::Rich,
        _ => OutputStyle::Plain,
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("[{}] {message}", status_badge(status)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "OK",
        "warn" => "WARN",
        "error" => "ERR",
        "info" => "INFO",
        _ => "..",
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn echo_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn error_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightRed.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub(crate) fn render_command_echo(style: OutputStyle, command_line: &str) -> String {
    let line = format!("{COMMAND_ECHO_PREFIX} {command_line}");
    match style {
        OutputStyle::Plain => line,
        OutputStyle::Rich => colorize(echo_style(), &line),
    }
}

/// Terminal output for one command run. Plain mode writes bare lines; rich
/// mode adds status badges, colors, and a step progress bar.
pub(crate) struct Console {
    style: OutputStyle,
    progress: Option<ProgressBar>,
    captured: Option<Vec<String>>,
}

impl Console {
    pub(crate) fn new(style: OutputStyle) -> Self {
        Self {
            style,
            progress: None,
            captured: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn capturing(style: OutputStyle) -> Self {
        Self {
            style,
            progress: None,
            captured: Some(Vec::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn captured(&self) -> &[String] {
        self.captured.as_deref().unwrap_or_default()
    }

    pub(crate) fn style(&self) -> OutputStyle {
        self.style
    }

    fn emit(&mut self, text: String, to_stderr: bool) {
        if let Some(captured) = &mut self.captured {
            captured.push(text);
            return;
        }
        if let Some(progress) = &self.progress {
            progress.println(text);
            return;
        }
        if to_stderr {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }

    pub(crate) fn status(&mut self, status: &str, message: &str) {
        let line = render_status_line(self.style, status, message);
        self.emit(line, status == "error");
    }

    pub(crate) fn info(&mut self, message: &str) {
        self.status("info", message);
    }

    pub(crate) fn warn(&mut self, message: &str) {
        self.status("warn", message);
    }

    pub(crate) fn error(&mut self, message: &str) {
        self.status("error", message);
    }

    pub(crate) fn section(&mut self, title: &str) {
        if self.style == OutputStyle::Plain {
            return;
        }
        let line = colorize(section_style(), &format!("== {title} =="));
        self.emit(line, false);
    }

    pub(crate) fn lines(&mut self, lines: &[String]) {
        for line in lines {
            self.emit(line.clone(), false);
        }
    }

    fn ensure_progress(&mut self, total: usize) -> Option<&ProgressBar> {
        if self.style != OutputStyle::Rich || self.captured.is_some() {
            return None;
        }
        if self.progress.is_none() {
            let progress = ProgressBar::new(total.max(1) as u64);
            if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
                progress.set_style(style.tick_chars("-=~* ").progress_chars("=>-"));
            }
            progress.enable_steady_tick(Duration::from_millis(80));
            self.progress = Some(progress);
        }
        self.progress.as_ref()
    }

    pub(crate) fn finish_progress(&mut self) {
        if let Some(progress) = self.progress.take() {
            progress.finish_and_clear();
        }
    }
}

impl OutputSink for Console {
    fn line(&mut self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => self.emit(line.to_string(), false),
            OutputStream::Stderr => {
                let rendered = match self.style {
                    OutputStyle::Plain => line.to_string(),
                    OutputStyle::Rich => colorize(error_style(), line),
                };
                self.emit(rendered, true);
            }
        }
    }
}

impl StepObserver for Console {
    fn step_started(
        &mut self,
        index: usize,
        total: usize,
        step: &PipelineStep,
        command_line: &str,
    ) {
        if let Some(progress) = self.ensure_progress(total) {
            progress.set_position(index as u64);
            progress.set_message(step.description);
        }
        let echo = render_command_echo(self.style, command_line);
        self.emit(echo, false);
    }

    fn step_finished(&mut self, outcome: &StepOutcome) {
        if let Some(progress) = &self.progress {
            progress.inc(1);
        }
        if outcome.status == StepStatus::Failed {
            let message = format!(
                "{} failed: {}",
                outcome.description,
                outcome.message.as_deref().unwrap_or("unknown error")
            );
            self.error(&message);
        }
    }
}

pub(crate) fn format_report_summary_lines(
    report: &UpgradeReport,
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.completed {
        let failed = report
            .failed_steps()
            .next()
            .map_or("unknown step", |outcome| outcome.description.as_str());
        lines.push(render_status_line(
            style,
            "error",
            &format!("Upgrade halted: '{failed}' failed; remaining steps were skipped."),
        ));
        if report.left_in_maintenance() {
            lines.push(render_status_line(style, "warn", STILL_IN_MAINTENANCE));
        }
        return lines;
    }

    let failed = report
        .failed_steps()
        .map(|outcome| outcome.step.as_str())
        .collect::<Vec<_>>();
    if !failed.is_empty() {
        lines.push(render_status_line(
            style,
            "warn",
            &format!(
                "{} step(s) reported failures: {}",
                failed.len(),
                failed.join(", ")
            ),
        ));
    }
    lines.push(render_status_line(style, "ok", UPGRADE_COMPLETED_MESSAGE));
    lines
}
