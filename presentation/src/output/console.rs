//! Console output formatter

use chatlist_application::{DispatchReport, SettingEntry};
use chatlist_domain::{ModelDefinition, OutcomeStatus, Prompt, ResultRecord, StagingOutcome};
use colored::{ColoredString, Colorize};

/// Formats runs, catalogs and history for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Every outcome of a run, in model id order
    pub fn format_report(prompt: &str, report: &DispatchReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("ChatList Results"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Prompt:".cyan().bold(), prompt));

        for outcome in report.outcomes.values() {
            output.push_str(&Self::format_outcome(outcome));
        }

        let answered = report.succeeded().count();
        output.push_str(&format!(
            "\n{} {}/{} models answered",
            "Summary:".cyan().bold(),
            answered,
            report.outcomes.len()
        ));
        if report.cancelled {
            output.push_str(&format!(" {}", "(cancelled)".yellow()));
        }
        output.push('\n');
        output.push_str(&Self::footer());

        output
    }

    fn format_outcome(outcome: &StagingOutcome) -> String {
        let title = format!(
            "── {} [{}] ({} attempt{}) ──",
            outcome.model_name,
            outcome.status,
            outcome.attempts,
            if outcome.attempts == 1 { "" } else { "s" }
        );
        match outcome.status {
            OutcomeStatus::Succeeded => {
                format!("\n{}\n{}\n", title.green().bold(), outcome.display_text())
            }
            _ => format!(
                "\n{}\n{} {}\n",
                Self::status_color(outcome.status, &title).bold(),
                "Error:".red(),
                outcome.display_text()
            ),
        }
    }

    fn status_color(status: OutcomeStatus, text: &str) -> ColoredString {
        match status {
            OutcomeStatus::Succeeded => text.green(),
            OutcomeStatus::Failed => text.red(),
            OutcomeStatus::TimedOut => text.yellow(),
            OutcomeStatus::Cancelled | OutcomeStatus::Pending => text.dimmed(),
        }
    }

    /// Format the outcome map as JSON
    pub fn format_json(report: &DispatchReport) -> String {
        let outcomes: Vec<_> = report.outcomes.values().collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "run": report.run_id.get(),
            "cancelled": report.cancelled,
            "outcomes": outcomes,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_models(models: &[ModelDefinition]) -> String {
        if models.is_empty() {
            return format!("{}\n", "No models configured.".dimmed());
        }
        models
            .iter()
            .map(|m| {
                let state = if m.is_active {
                    "active".green()
                } else {
                    "inactive".dimmed()
                };
                format!(
                    "{:>4}  {:<20} {:<8} {}  {}\n",
                    m.id,
                    m.name.bold(),
                    state,
                    m.api_url,
                    format!("${}", m.secret).dimmed()
                )
            })
            .collect()
    }

    pub fn format_prompts(prompts: &[Prompt]) -> String {
        if prompts.is_empty() {
            return format!("{}\n", "No saved prompts.".dimmed());
        }
        prompts
            .iter()
            .map(|p| {
                let mut line = format!(
                    "{:>4}  {}  {}",
                    p.id,
                    p.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    Self::first_line(&p.text, 70)
                );
                if let Some(tags) = p.tags.to_column() {
                    line.push_str(&format!("  [{}]", tags.cyan()));
                }
                line.push('\n');
                line
            })
            .collect()
    }

    pub fn format_results(records: &[ResultRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No saved results.".dimmed());
        }
        records
            .iter()
            .map(|r| {
                format!(
                    "{:>4}  {}  {:<16} {}\n      {}\n",
                    r.id(),
                    r.result.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    r.model_name.yellow().bold(),
                    Self::first_line(&r.prompt_text, 60),
                    Self::first_line(&r.result.response_text, 90)
                )
            })
            .collect()
    }

    /// A prompt followed by its results in full
    pub fn format_prompt_detail(prompt: &Prompt, records: &[ResultRecord]) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} #{} ({})\n{}\n",
            "Prompt".cyan().bold(),
            prompt.id,
            prompt.created_at.format("%Y-%m-%d %H:%M"),
            prompt.text
        ));
        if let Some(tags) = prompt.tags.to_column() {
            output.push_str(&format!("{} {}\n", "Tags:".cyan(), tags));
        }
        for record in records {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} (#{}) ──", record.model_name, record.id())
                    .yellow()
                    .bold(),
                Self::indent(&record.result.response_text, "  ")
            ));
        }
        output
    }

    pub fn format_settings(entries: &[SettingEntry]) -> String {
        if entries.is_empty() {
            return format!("{}\n", "No settings stored; built-in defaults apply.".dimmed());
        }
        entries
            .iter()
            .map(|e| match e.description {
                Some(description) => format!(
                    "{:<18} = {:<8} {}\n",
                    e.key.bold(),
                    e.value,
                    description.dimmed()
                ),
                None => format!("{:<18} = {}\n", e.key.bold(), e.value),
            })
            .collect()
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    /// First line of `text`, cut to `max` characters
    pub fn first_line(text: &str, max: usize) -> String {
        let line = text.lines().next().unwrap_or("");
        if line.chars().count() > max || text.lines().nth(1).is_some() {
            let cut: String = line.chars().take(max).collect();
            format!("{cut}...")
        } else {
            line.to_string()
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
