use crate::api;
use crate::cli::{ColumnsArgs, OutputFormat};
use crate::model::ColumnRow;
use crate::output::write_json;
use crate::style;
use std::io;

pub fn cmd_columns(args: ColumnsArgs) -> i32 {
    let columns = match api::columns(&args.csv) {
        Ok(columns) => columns,
        Err(e) => {
            style::error(&e.to_string());
            return 1;
        }
    };

    let result = match args.format {
        OutputFormat::Json => write_json(&columns, &mut io::stdout()),
        OutputFormat::Markdown if style::is_terminal() => {
            print_columns(&columns);
            Ok(())
        }
        OutputFormat::Markdown => style::render_markdown(&columns_table(&columns), &mut io::stdout()),
    };

    if let Err(e) = result {
        style::error(&format!("Failed to write output: {}", e));
        return 1;
    }
    0
}

fn print_columns(columns: &[ColumnRow]) {
    style::header(&format!("{} columns", columns.len()));
    for column in columns {
        println!(
            "  {:<24} {:<16} {}",
            column.name,
            column.attribute,
            style::role(column.useas)
        );
    }
}

fn columns_table(columns: &[ColumnRow]) -> String {
    let mut out = String::from("| Column | Attribute | Role |\n|---|---|---|\n");
    for column in columns {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            column.name, column.attribute, column.useas
        ));
    }
    out
}
