use crate::output::{OutputFormatter, Summary};
use std::io::Write;

pub struct MarkdownOutput;

impl MarkdownOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for MarkdownOutput {
    fn format<W: Write>(&self, summary: &Summary, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "# Dataset Summary: {}\n", summary.dataset)?;

        writeln!(writer, "- **Records**: {}", summary.records)?;
        writeln!(
            writer,
            "- **Nodes**: {} source, {} target",
            summary.source_nodes, summary.target_nodes
        )?;
        writeln!(writer, "- **Links**: {}", summary.links)?;
        writeln!(writer, "- **Pairs**: {}", summary.pairs)?;
        if summary.skipped_links > 0 {
            writeln!(
                writer,
                "- **Skipped links**: {} (non-numeric main attribute)",
                summary.skipped_links
            )?;
        }
        if let Some([start, end]) = &summary.date_range {
            writeln!(writer, "- **Dates**: {} to {}", start, end)?;
        }
        match (&summary.main_attribute, summary.mean_range) {
            (Some(attr), Some([lo, hi])) => {
                writeln!(writer, "- **Mean `{}`**: {:.4} to {:.4}", attr, lo, hi)?
            }
            (Some(attr), None) => writeln!(writer, "- **Main attribute**: `{}`", attr)?,
            (None, _) => writeln!(writer, "- **Main attribute**: none")?,
        }

        if !summary.attributes.is_empty() {
            writeln!(writer, "\n## Node Attributes\n")?;
            writeln!(writer, "| Attribute | Side | Distinct values |")?;
            writeln!(writer, "|---|---|---:|")?;
            for attr in &summary.attributes {
                writeln!(
                    writer,
                    "| `{}` | {:?} | {} |",
                    attr.attribute, attr.kind, attr.distinct
                )?;
            }
        }

        if summary.top_pairs.is_empty() {
            writeln!(writer, "\nNo links.")?;
            return Ok(());
        }

        writeln!(writer, "\n## Busiest Pairs\n")?;
        writeln!(writer, "| Source | Target | Links | Mean |")?;
        writeln!(writer, "|---|---|---:|---:|")?;
        for pair in &summary.top_pairs {
            writeln!(
                writer,
                "| {} | {} | {} | {:.4} |",
                pair.source, pair.target, pair.total, pair.mean
            )?;
        }

        Ok(())
    }
}
