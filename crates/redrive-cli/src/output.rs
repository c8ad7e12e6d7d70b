//! Human-readable and JSON rendering of command results.

use std::io::{self, Write};

use redrive::TopologyReport;

pub fn queues(out: &mut impl Write, queues: &[String]) -> io::Result<()> {
    if queues.is_empty() {
        return writeln!(out, "No queues found.");
    }

    for url in queues {
        writeln!(out, "{url}")?;
    }
    Ok(())
}

pub fn report(out: &mut impl Write, report: &TopologyReport) -> io::Result<()> {
    if report.is_empty() {
        return writeln!(out, "No queues found.");
    }

    writeln!(out, "SQS Queues found:")?;
    for entry in &report.entries {
        writeln!(out, " - {}", entry.queue_url)?;
        if let Some(policy) = &entry.policy {
            write!(
                out,
                "   -> Has Dead Letter Queue ARN: {}",
                policy.dead_letter_target_arn
            )?;
            match policy.max_receive_count {
                Some(count) => writeln!(out, " (max receive count: {count})")?,
                None => writeln!(out)?,
            }
        }
    }

    if !report.failures.is_empty() {
        writeln!(
            out,
            "\n{} queue(s) could not be inspected:",
            report.failures.len()
        )?;
        for failure in &report.failures {
            writeln!(out, " - {}", failure.queue())?;
        }
    }
    Ok(())
}

/// One JSON object per queue, in enumeration order.
pub fn report_json(out: &mut impl Write, report: &TopologyReport) -> io::Result<()> {
    for entry in &report.entries {
        serde_json::to_writer(&mut *out, entry)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn sources(out: &mut impl Write, dlq_url: &str, sources: &[String]) -> io::Result<()> {
    if sources.is_empty() {
        return writeln!(out, "No source queues found for DLQ: {dlq_url}");
    }

    writeln!(out, "Source queues for DLQ {dlq_url}:")?;
    for source in sources {
        writeln!(out, " - {source}")?;
    }
    Ok(())
}
