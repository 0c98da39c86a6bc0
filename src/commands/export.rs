use crate::api::{self, ExportOptions, RelvizError};
use crate::cli::ExportArgs;
use crate::filter::{DateRange, parse_date};
use crate::fs::default_fs;
use crate::output::write_json;
use crate::style;
use crate::views::{ViewPayload, ViewSelection};
use indexmap::IndexMap;

use super::{CommandContext, emit};

pub fn cmd_export(args: ExportArgs) -> i32 {
    let options = match export_options(&args) {
        Ok(options) => options,
        Err(msg) => {
            style::error(&msg);
            return 1;
        }
    };

    let ctx = match CommandContext::new(&args.csv, args.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let mut buffer = Vec::new();
    let written = match args.view {
        Some(selection) => export_views(ctx, selection, &options)
            .and_then(|views| write_json(&views, &mut buffer).map_err(RelvizError::from)),
        None => api::filtered_graph(&ctx.dataset, &options)
            .and_then(|data| write_json(&data, &mut buffer).map_err(RelvizError::from)),
    };

    if let Err(e) = written {
        style::error(&e.to_string());
        return 1;
    }

    let json = String::from_utf8_lossy(&buffer);
    emit(&json, args.output.as_deref(), default_fs())
}

fn export_views(
    ctx: CommandContext,
    selection: ViewSelection,
    options: &ExportOptions,
) -> Result<IndexMap<String, ViewPayload>, RelvizError> {
    let payloads = api::view_payloads(ctx.dataset, selection, options)?;
    Ok(payloads
        .into_iter()
        .map(|(kind, payload)| (kind.to_string(), payload))
        .collect())
}

fn export_options(args: &ExportArgs) -> Result<ExportOptions, String> {
    let filters = args
        .filters
        .iter()
        .map(String::as_str)
        .map(parse_filter)
        .collect::<Result<Vec<_>, _>>()?;

    let date_range = match (&args.from, &args.to) {
        (Some(from), Some(to)) => Some(parse_range(from, to)?),
        _ => None,
    };

    Ok(ExportOptions {
        config: args.config.clone(),
        filters,
        date_range,
    })
}

/// `attr=v1,v2` into the attribute and its accepted values. `attr=` accepts nothing.
pub(crate) fn parse_filter(raw: &str) -> Result<(String, Vec<String>), String> {
    let (attribute, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid filter '{}', expected ATTR=VALUE[,VALUE...]", raw))?;

    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(format!("Filter '{}' has no attribute name", raw));
    }

    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((attribute.to_string(), values))
}

pub(crate) fn parse_range(from: &str, to: &str) -> Result<DateRange, String> {
    let start = parse_date(from).ok_or_else(|| format!("Invalid date '{}'", from))?;
    let end = parse_date(to).ok_or_else(|| format!("Invalid date '{}'", to))?;
    DateRange::new(start, end).map_err(|e| e.to_string())
}
