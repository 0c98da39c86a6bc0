use crate::cli::InitArgs;
use crate::config::{config_path_for, generate_config_template};
use crate::fs::{FileSystem, default_fs};
use crate::loader;
use crate::style;

pub fn cmd_init(args: InitArgs) -> i32 {
    cmd_init_with_fs(args, default_fs())
}

pub fn cmd_init_with_fs(args: InitArgs, fs: &dyn FileSystem) -> i32 {
    let config_path = config_path_for(&args.csv);
    if fs.exists(&config_path) && !args.force {
        style::error(&format!(
            ".relviz.toml already exists at {}",
            style::path(&config_path)
        ));
        style::hint("Pass --force to overwrite it");
        return 1;
    }

    let table = match loader::read_table(fs, &args.csv) {
        Ok(table) => table,
        Err(e) => {
            style::error(&e.to_string());
            return 1;
        }
    };

    let template = generate_config_template(&table.columns());
    if let Err(e) = fs.write(&config_path, &template) {
        style::error(&format!("Failed to write config file: {}", e));
        return 1;
    }

    style::success(&format!(
        "Created .relviz.toml at {}",
        style::path(&config_path)
    ));
    0
}
