use crate::api;
use crate::cli::ServeArgs;
use crate::style;

use super::CommandContext;

pub fn cmd_serve(args: ServeArgs) -> i32 {
    let ctx = match CommandContext::new(&args.csv, args.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let store = &ctx.dataset.store;
    style::status(&format!("Loaded {}", style::path(&ctx.path)));
    style::section("Dataset");
    println!("{}", style::metric("records", store.len()));
    if let Some(main) = store.mapping().main_link_attribute() {
        println!("{}", style::metric("main attribute", &main.attribute));
    }
    if let Some(bounds) = store.date_bounds() {
        let [start, end] = bounds.formatted();
        println!("{}", style::metric("dates", format!("{} to {}", start, end)));
    }
    let views: Vec<String> = args.view.kinds().iter().map(|k| k.to_string()).collect();
    println!("{}", style::metric("views", views.join(", ")));
    println!();

    let controller = api::session(ctx.dataset, args.view);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            style::error(&format!("Failed to create tokio runtime: {}", e));
            return 1;
        }
    };

    if let Err(e) = rt.block_on(crate::server::serve(controller, args.port, args.open)) {
        style::error(&format!("Server failed: {}", e));
        return 1;
    }

    0
}
