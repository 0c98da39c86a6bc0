use crate::cli::{OutputFormat, SummaryArgs};
use crate::fs::{FileSystem, default_fs};
use crate::output::{JsonOutput, MarkdownOutput, OutputFormatter, Summary};
use crate::style;
use std::io;

use super::{CommandContext, emit};

pub fn cmd_summary(args: SummaryArgs) -> i32 {
    let ctx = match CommandContext::new(&args.csv, args.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let summary = Summary::from_dataset(&ctx.dataset, args.top);
    write_summary(&summary, &args, default_fs())
}

fn write_summary(summary: &Summary, args: &SummaryArgs, fs: &dyn FileSystem) -> i32 {
    let mut buffer = Vec::new();
    let result = match args.format {
        OutputFormat::Markdown => MarkdownOutput::new().format(summary, &mut buffer),
        OutputFormat::Json => JsonOutput::new().format(summary, &mut buffer),
    };
    if let Err(e) = result {
        style::error(&format!("Failed to format output: {}", e));
        return 1;
    }
    let text = String::from_utf8_lossy(&buffer);

    // Rendered markdown only makes sense on a terminal
    if args.output.is_none() && matches!(args.format, OutputFormat::Markdown) {
        if let Err(e) = style::render_markdown(&text, &mut io::stdout()) {
            style::error(&format!("Failed to write output: {}", e));
            return 1;
        }
        return 0;
    }

    emit(&text, args.output.as_deref(), fs)
}
