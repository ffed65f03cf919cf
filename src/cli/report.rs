use reqsync::{CompileStatus, Outcome, domain::Conflict};
use serde_json::{Value, json};

use super::terminal::{Colorize, is_narrow};

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Only print errors
    #[arg(long, short)]
    quiet: bool,
}

impl ReportArgs {
    /// Prints the outcome, then exits with status 1 if the run failed.
    pub fn finish(&self, outcome: &Outcome) -> anyhow::Result<()> {
        match self.output {
            OutputFormat::Table => self.output_table(outcome),
            OutputFormat::Json => Self::output_json(outcome)?,
        }

        if outcome.has_errors() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn output_table(&self, outcome: &Outcome) {
        for (set_name, status) in &outcome.compile_failures {
            println!(
                "{}",
                format!("✗ Compile:   '{set_name}' failed ({})", describe(*status)).error()
            );
        }

        for issue in &outcome.duplicates {
            println!("{}", format!("✗ Duplicate: {issue}").error());
        }

        for conflict in outcome.report.errors() {
            print_conflict("ERROR:  ", conflict, <str as Colorize>::error);
        }

        if !self.quiet {
            for conflict in outcome.report.warnings() {
                print_conflict("WARNING:", conflict, <str as Colorize>::warning);
            }

            println!(
                "{}",
                format!(
                    "Checked {} packages, regenerated {} locked files",
                    outcome.packages,
                    outcome.regenerated.len()
                )
                .dim()
            );
        }

        if outcome.has_errors() {
            println!("\n{}", "!! ERRORS were encountered".error());
        } else if !self.quiet {
            println!("\n{}", "No errors were encountered".success());
        }
    }

    fn output_json(outcome: &Outcome) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(&to_json(outcome))?);
        Ok(())
    }
}

fn to_json(outcome: &Outcome) -> Value {
    let compile_failures: Vec<_> = outcome
        .compile_failures
        .iter()
        .map(|(set_name, status)| {
            json!({
                "set": set_name,
                "status": describe(*status),
            })
        })
        .collect();

    let duplicates: Vec<_> = outcome
        .duplicates
        .iter()
        .map(ToString::to_string)
        .collect();

    json!({
        "status": if outcome.has_errors() { "errors" } else { "ok" },
        "packages": outcome.packages,
        "regenerated": outcome.regenerated,
        "compile_failures": compile_failures,
        "duplicates": duplicates,
        "conflicts": outcome.report.conflicts.iter().map(|conflict| {
            let issues: Vec<_> = conflict.issues().iter().map(|issue| {
                json!({
                    "severity": issue.severity(),
                    "message": issue.to_string(),
                })
            }).collect();
            json!({
                "package": conflict.name,
                "severity": conflict.severity(),
                "issues": issues,
                "versions": conflict.versions,
                "variants": conflict.variants,
                "occurrences": conflict.occurrences,
            })
        }).collect::<Vec<_>>(),
    })
}

fn print_conflict(label: &str, conflict: &Conflict, paint: fn(&str) -> String) {
    let heading = format!(
        "{label} {:26} (cver={}, cvar={})",
        conflict.name,
        conflict.versions.len(),
        conflict.variants.len()
    );
    println!("{}", paint(&heading));
    for issue in conflict.issues() {
        println!("    {issue}");
    }

    if is_narrow() {
        return;
    }

    for occurrence in &conflict.occurrences {
        let location = format!("{}:{}", occurrence.path.display(), occurrence.line_number);
        let variant = if occurrence.variant.is_empty() {
            String::new()
        } else {
            format!("[{}]", occurrence.variant)
        };
        let comment = if occurrence.comment.is_empty() {
            String::new()
        } else {
            format!("  # {}", occurrence.comment)
        };
        println!(
            "    {location:40} {}{variant}{}{}",
            conflict.name,
            occurrence.version,
            comment.dim()
        );
    }
}

fn describe(status: CompileStatus) -> String {
    match status {
        CompileStatus::Success => "success".to_string(),
        CompileStatus::Failed(Some(code)) => format!("exit code {code}"),
        CompileStatus::Failed(None) => "terminated by signal".to_string(),
    }
}
